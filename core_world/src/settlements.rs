use std::collections::HashMap;

use glam::Vec2;

use crate::config::SettlementConfig;
use crate::heightfield::HeightField;
use crate::islands::IslandMap;
use crate::rng::Mulberry32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettlementCategory {
    #[default]
    Village,
    Town,
    City,
}

impl SettlementCategory {
    pub fn as_u8(self) -> u8 {
        match self {
            SettlementCategory::Village => world_proto::CATEGORY_VILLAGE,
            SettlementCategory::Town => world_proto::CATEGORY_TOWN,
            SettlementCategory::City => world_proto::CATEGORY_CITY,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            world_proto::CATEGORY_VILLAGE => Some(SettlementCategory::Village),
            world_proto::CATEGORY_TOWN => Some(SettlementCategory::Town),
            world_proto::CATEGORY_CITY => Some(SettlementCategory::City),
            _ => None,
        }
    }
}

/// One sampled settlement. The positional index in the settlement list is
/// its identity and its node id in the road graph. The four classifier
/// annotations start zeroed and are filled in exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub position: Vec2,
    pub elevation: f32,
    pub suitability: f32,
    pub island_id: i32,
    pub island_area: u32,
    pub road_degree: u32,
    pub second_hop_reach: u32,
    pub city_score: f32,
    pub category: SettlementCategory,
}

/// Uniform-grid spatial index over placed settlements; bucket side equals
/// the minimum spacing so a 3x3 bucket scan covers every possible
/// conflict.
struct SpatialGrid {
    cell_size: f32,
    buckets: HashMap<(i32, i32), Vec<Vec2>>,
}

impl SpatialGrid {
    fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            buckets: HashMap::new(),
        }
    }

    fn key(&self, position: Vec2) -> (i32, i32) {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    fn too_close(&self, position: Vec2, min_distance: f32) -> bool {
        let (kx, ky) = self.key(position);
        let limit = min_distance * min_distance;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if let Some(bucket) = self.buckets.get(&(kx + dx, ky + dy)) {
                    if bucket
                        .iter()
                        .any(|&other| position.distance_squared(other) < limit)
                    {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn insert(&mut self, position: Vec2) {
        let key = self.key(position);
        self.buckets.entry(key).or_default().push(position);
    }
}

fn suitability_for(elevation: f32, coast_threshold: f32, fade_out: f32) -> f32 {
    if elevation < coast_threshold || elevation >= fade_out {
        0.0
    } else {
        1.0 - (elevation - coast_threshold) / (fade_out - coast_threshold)
    }
}

/// Strided Bernoulli sampling over the grid. Every strided cell consumes
/// exactly one uniform draw, accepted or not, so the stream position is a
/// pure function of the scan order and the settlement list is reproducible
/// from the seed alone.
pub fn sample_settlements(
    field: &HeightField,
    islands: &IslandMap,
    config: &SettlementConfig,
    coast_threshold: f32,
    rng: &mut Mulberry32,
) -> Vec<Settlement> {
    let mut settlements: Vec<Settlement> = Vec::new();
    let mut grid = SpatialGrid::new(config.min_distance);
    let stride = config.stride as usize;
    let max_area = islands.max_area.max(1) as f32;

    'scan: for y in (0..field.height as usize).step_by(stride) {
        for x in (0..field.width as usize).step_by(stride) {
            let idx = y * field.width as usize + x;
            let elevation = field.get(idx);
            let suitability =
                suitability_for(elevation, coast_threshold, config.fade_out_height);

            let island_id = islands.ids[idx];
            let island_area = islands.area_of(island_id);
            let island_factor = config.island_factor_base
                + (1.0 - config.island_factor_base)
                    * (island_area as f32 / max_area).powf(config.island_factor_exponent);

            let probability =
                config.base_chance * (suitability as f64).powi(2) * island_factor as f64;

            let roll = rng.next_f64();
            if roll >= probability {
                continue;
            }

            let position = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            if grid.too_close(position, config.min_distance) {
                continue;
            }

            grid.insert(position);
            settlements.push(Settlement {
                position,
                elevation,
                suitability,
                island_id,
                island_area,
                road_degree: 0,
                second_hop_reach: 0,
                city_score: 0.0,
                category: SettlementCategory::Village,
            });
            if settlements.len() >= config.max_settlements {
                break 'scan;
            }
        }
    }

    tracing::debug!(
        target: "meridian::worldgen",
        settlements = settlements.len(),
        stride = config.stride,
        "settlements.sampled"
    );
    settlements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::islands::label_islands;

    fn uniform_land(width: u32, height: u32, elevation: f32) -> (HeightField, IslandMap) {
        let field = HeightField::new(width, height, vec![elevation; (width * height) as usize]);
        let islands = label_islands(&field, 0.35);
        (field, islands)
    }

    #[test]
    fn sampler_is_deterministic() {
        let (field, islands) = uniform_land(96, 96, 0.6);
        let config = SettlementConfig::default();
        let a = sample_settlements(&field, &islands, &config, 0.35, &mut Mulberry32::new(1));
        let b = sample_settlements(&field, &islands, &config, 0.35, &mut Mulberry32::new(1));
        assert_eq!(a, b);
        assert!(!a.is_empty(), "uniform land should yield settlements");
    }

    #[test]
    fn spacing_constraint_holds() {
        let (field, islands) = uniform_land(128, 128, 0.55);
        let config = SettlementConfig::default();
        let settlements =
            sample_settlements(&field, &islands, &config, 0.35, &mut Mulberry32::new(7));
        for (i, a) in settlements.iter().enumerate() {
            for b in settlements.iter().skip(i + 1) {
                assert!(
                    a.position.distance(b.position) >= config.min_distance,
                    "settlements at {:?} and {:?} are too close",
                    a.position,
                    b.position
                );
            }
        }
    }

    #[test]
    fn elevation_window_is_respected() {
        let mut values = vec![0.1f32; 64 * 64];
        // A land band, a mountain band above the fade-out, and water.
        for (i, v) in values.iter_mut().enumerate() {
            match (i / 64) % 3 {
                0 => *v = 0.5,
                1 => *v = 0.95,
                _ => {}
            }
        }
        let field = HeightField::new(64, 64, values);
        let islands = label_islands(&field, 0.35);
        let config = SettlementConfig::default();
        let settlements =
            sample_settlements(&field, &islands, &config, 0.35, &mut Mulberry32::new(3));
        for s in &settlements {
            assert!(s.elevation >= 0.35 && s.elevation < config.fade_out_height);
            assert!(s.suitability > 0.0 && s.suitability <= 1.0);
            assert!(s.island_id >= 0);
            assert!(s.island_area > 0);
        }
    }

    #[test]
    fn water_world_yields_nothing() {
        let (field, islands) = uniform_land(64, 64, 0.1);
        let settlements = sample_settlements(
            &field,
            &islands,
            &SettlementConfig::default(),
            0.35,
            &mut Mulberry32::new(1),
        );
        assert!(settlements.is_empty());
    }

    #[test]
    fn cap_stops_the_scan() {
        let (field, islands) = uniform_land(128, 128, 0.5);
        let config = SettlementConfig {
            max_settlements: 3,
            ..SettlementConfig::default()
        };
        let settlements =
            sample_settlements(&field, &islands, &config, 0.35, &mut Mulberry32::new(1));
        assert_eq!(settlements.len(), 3);
    }

    #[test]
    fn suitability_is_one_at_the_coast() {
        assert_eq!(suitability_for(0.35, 0.35, 0.92), 1.0);
        assert_eq!(suitability_for(0.92, 0.35, 0.92), 0.0);
        assert_eq!(suitability_for(0.2, 0.35, 0.92), 0.0);
        let mid = suitability_for(0.635, 0.35, 0.92);
        assert!((mid - 0.5).abs() < 1e-6);
    }
}
