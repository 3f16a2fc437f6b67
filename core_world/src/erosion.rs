use std::f32::consts::SQRT_2;

use crate::config::ErosionConfig;
use crate::heightfield::{contrast_stretch, HeightField};

// 8-neighbourhood with step distances: E, SE, S, SW, W, NW, N, NE.
const NEIGHBORS: [(i32, i32, f32); 8] = [
    (1, 0, 1.0),
    (1, 1, SQRT_2),
    (0, 1, 1.0),
    (-1, 1, SQRT_2),
    (-1, 0, 1.0),
    (-1, -1, SQRT_2),
    (0, -1, 1.0),
    (1, -1, SQRT_2),
];

/// Hydraulic erosion over the finished noise field: route rainfall down
/// D8 flow directions, then cut channels where flow and slope concentrate.
/// Runs `iterations` full passes and finishes with one more contrast
/// stretch above `plains_threshold`.
pub fn erode(field: &mut HeightField, config: &ErosionConfig, plains_threshold: f32) {
    for _ in 0..config.iterations {
        erosion_pass(field, config);
    }
    contrast_stretch(field, plains_threshold);
}

fn erosion_pass(field: &mut HeightField, config: &ErosionConfig) {
    let (flow_dir, slope) = compute_flow_directions(field);
    let flow = accumulate_flow(field, &flow_dir, config.rainfall);

    let eroded = apply_erosion(field, &slope, &flow, config);
    tracing::debug!(
        target: "meridian::worldgen",
        eroded_cells = eroded,
        strength = config.strength,
        flow_exponent = config.flow_exponent,
        "erosion.pass"
    );

    for _ in 0..config.smoothing_iterations {
        smooth(field, config.smoothing_blend);
    }
}

/// D8 steepest-descent directions. A cell with no lower neighbour is a
/// sink: direction -1, slope 0.
fn compute_flow_directions(field: &HeightField) -> (Vec<i32>, Vec<f32>) {
    let w = field.width as i32;
    let h = field.height as i32;
    let n = field.len();
    let mut flow_dir = vec![-1i32; n];
    let mut slope = vec![0.0f32; n];

    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            let here = field.get(idx);
            let mut best_slope = 0.0f32;
            let mut best_target = -1i32;
            for &(dx, dy, dist) in &NEIGHBORS {
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || ny < 0 || nx >= w || ny >= h {
                    continue;
                }
                let nidx = (ny * w + nx) as usize;
                let drop = here - field.get(nidx);
                if drop <= 0.0 {
                    continue;
                }
                let s = drop / dist;
                if s > best_slope {
                    best_slope = s;
                    best_target = nidx as i32;
                }
            }
            flow_dir[idx] = best_target;
            slope[idx] = best_slope;
        }
    }
    (flow_dir, slope)
}

/// Posts every cell's rainfall to its downstream target in elevation-
/// descending order, so all upstream contributions arrive before a cell is
/// processed. The sort key is (elevation desc, cell index asc) to keep the
/// total order, and therefore the accumulation result, reproducible.
fn accumulate_flow(field: &HeightField, flow_dir: &[i32], rainfall: f32) -> Vec<f32> {
    let n = field.len();
    let mut flow = vec![rainfall; n];

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        field
            .get(b)
            .total_cmp(&field.get(a))
            .then_with(|| a.cmp(&b))
    });

    for idx in order {
        let target = flow_dir[idx];
        if target >= 0 {
            flow[target as usize] = flow[target as usize] + flow[idx];
        }
    }
    flow
}

fn apply_erosion(
    field: &mut HeightField,
    slope: &[f32],
    flow: &[f32],
    config: &ErosionConfig,
) -> usize {
    let mut eroded = 0usize;
    let values = field.values_mut();
    for idx in 0..values.len() {
        if slope[idx] > config.min_slope {
            let delta = config.strength * flow[idx].powf(config.flow_exponent) * slope[idx];
            values[idx] = (values[idx] - delta).clamp(0.0, 1.0);
            eroded += 1;
        }
    }
    eroded
}

/// One 9-cell mean blend pass. Boundary cells average over the neighbours
/// that exist.
fn smooth(field: &mut HeightField, blend: f32) {
    let w = field.width as i32;
    let h = field.height as i32;
    let old = field.values().to_vec();
    let values = field.values_mut();

    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            let mut sum = old[idx];
            let mut count = 1.0f32;
            for &(dx, dy, _) in &NEIGHBORS {
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || ny < 0 || nx >= w || ny >= h {
                    continue;
                }
                sum += old[(ny * w + nx) as usize];
                count += 1.0;
            }
            let mean = sum / count;
            values[idx] = old[idx] + (mean - old[idx]) * blend;
        }
    }
}
