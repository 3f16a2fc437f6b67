use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::f32::consts::SQRT_2;

use glam::Vec2;

use crate::config::RoadConfig;
use crate::heightfield::HeightField;
use crate::settlements::Settlement;

/// A built road: an ordered polyline from settlement `a` to settlement
/// `b`, with `length` equal to the measured polyline length (not the
/// straight-line distance).
#[derive(Debug, Clone, PartialEq)]
pub struct RoadSegment {
    pub a: usize,
    pub b: usize,
    pub start: Vec2,
    pub end: Vec2,
    pub length: f32,
    pub points: Vec<Vec2>,
}

pub fn polyline_length(points: &[Vec2]) -> f32 {
    points.windows(2).map(|pair| pair[0].distance(pair[1])).sum()
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    a: usize,
    b: usize,
    straight: f32,
}

/// Union-find with path compression and union by rank.
struct DisjointSets {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            Ordering::Less => self.parent[ra] = rb,
            Ordering::Greater => self.parent[rb] = ra,
            Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

/// Undirected k-nearest candidate edges, deduplicated on the unordered
/// pair and sorted by (straight length, a, b) so ties cannot reorder
/// between runs.
fn candidate_edges(settlements: &[Settlement], config: &RoadConfig) -> Vec<Candidate> {
    let n = settlements.len();
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    let mut candidates: Vec<Candidate> = Vec::new();

    for i in 0..n {
        let mut near: Vec<(f32, usize)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| (settlements[i].position.distance(settlements[j].position), j))
            .filter(|&(d, _)| d <= config.max_distance)
            .collect();
        near.sort_by(|x, y| x.0.total_cmp(&y.0).then_with(|| x.1.cmp(&y.1)));
        for &(d, j) in near.iter().take(config.k_nearest) {
            let key = (i.min(j), i.max(j));
            if seen.insert(key) {
                candidates.push(Candidate {
                    a: key.0,
                    b: key.1,
                    straight: d,
                });
            }
        }
    }

    candidates.sort_by(|x, y| {
        x.straight
            .total_cmp(&y.straight)
            .then_with(|| x.a.cmp(&y.a))
            .then_with(|| x.b.cmp(&y.b))
    });
    candidates
}

/// Coarse grid the per-edge A* runs on; heights are sampled once at cell
/// centres and shared across all edges of a planning run.
struct PathGrid {
    width: usize,
    height: usize,
    step: f32,
    heights: Vec<f32>,
}

impl PathGrid {
    fn new(field: &HeightField, step: f32) -> Self {
        let width = ((field.width as f32 / step).ceil() as usize).max(1);
        let height = ((field.height as f32 / step).ceil() as usize).max(1);
        let mut heights = Vec::with_capacity(width * height);
        for gy in 0..height {
            for gx in 0..width {
                heights.push(field.sample_world(
                    (gx as f32 + 0.5) * step,
                    (gy as f32 + 0.5) * step,
                ));
            }
        }
        Self {
            width,
            height,
            step,
            heights,
        }
    }

    fn cell_of(&self, position: Vec2) -> usize {
        let gx = ((position.x / self.step).floor().max(0.0) as usize).min(self.width - 1);
        let gy = ((position.y / self.step).floor().max(0.0) as usize).min(self.height - 1);
        gy * self.width + gx
    }

    fn center(&self, idx: usize) -> Vec2 {
        let gx = (idx % self.width) as f32;
        let gy = (idx / self.width) as f32;
        Vec2::new((gx + 0.5) * self.step, (gy + 0.5) * self.step)
    }
}

#[derive(Clone, Copy)]
struct HeapEntry {
    cost: f32,
    idx: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.idx == other.idx
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.idx.cmp(&other.idx))
    }
}

const GRID_DIRS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Weighted A* between two settlement positions. Stepping uphill or
/// downhill and touching water both inflate the per-step cost, so paths
/// hug contours and cross water only when the detour would cost more.
/// Euclidean distance is an admissible heuristic because every step costs
/// at least its own length.
fn refine_path(grid: &PathGrid, from: Vec2, to: Vec2, config: &RoadConfig) -> Option<Vec<Vec2>> {
    let start = grid.cell_of(from);
    let goal = grid.cell_of(to);
    if start == goal {
        return Some(vec![from, to]);
    }

    let n = grid.heights.len();
    let mut g_score = vec![f32::INFINITY; n];
    let mut parent = vec![usize::MAX; n];
    let mut closed = vec![false; n];
    let mut open = BinaryHeap::new();

    g_score[start] = 0.0;
    open.push(HeapEntry {
        cost: grid.center(start).distance(to),
        idx: start,
    });

    while let Some(HeapEntry { idx, .. }) = open.pop() {
        if closed[idx] {
            continue;
        }
        closed[idx] = true;
        if idx == goal {
            let mut points = Vec::new();
            let mut cursor = goal;
            while cursor != usize::MAX {
                points.push(grid.center(cursor));
                cursor = parent[cursor];
            }
            points.reverse();
            // Snap the quantised endpoints back onto the settlements.
            points[0] = from;
            let last = points.len() - 1;
            points[last] = to;
            return Some(points);
        }

        let x = (idx % grid.width) as i32;
        let y = (idx / grid.width) as i32;
        let here = grid.heights[idx];
        for &(dx, dy) in &GRID_DIRS {
            let nx = x + dx;
            let ny = y + dy;
            if nx < 0 || ny < 0 || nx >= grid.width as i32 || ny >= grid.height as i32 {
                continue;
            }
            let nidx = (ny as usize) * grid.width + nx as usize;
            if closed[nidx] {
                continue;
            }
            let there = grid.heights[nidx];
            let base = if dx == 0 || dy == 0 {
                grid.step
            } else {
                grid.step * SQRT_2
            };
            let water = if here < config.water_threshold || there < config.water_threshold {
                config.water_penalty
            } else {
                0.0
            };
            let step_cost = base * (1.0 + (there - here).abs() * config.slope_cost + water);
            let tentative = g_score[idx] + step_cost;
            if tentative < g_score[nidx] {
                g_score[nidx] = tentative;
                parent[nidx] = idx;
                open.push(HeapEntry {
                    cost: tentative + grid.center(nidx).distance(to),
                    idx: nidx,
                });
            }
        }
    }
    None
}

/// Dijkstra over the in-progress adjacency, used by the redundancy filter
/// to ask what the network already offers between two endpoints.
fn shortest_distance(adjacency: &[Vec<(usize, f32)>], from: usize, to: usize) -> Option<f32> {
    let n = adjacency.len();
    let mut dist = vec![f32::INFINITY; n];
    let mut heap = BinaryHeap::new();
    dist[from] = 0.0;
    heap.push(HeapEntry {
        cost: 0.0,
        idx: from,
    });
    while let Some(HeapEntry { cost, idx }) = heap.pop() {
        if cost > dist[idx] {
            continue;
        }
        if idx == to {
            return Some(cost);
        }
        for &(next, weight) in &adjacency[idx] {
            let candidate = cost + weight;
            if candidate < dist[next] {
                dist[next] = candidate;
                heap.push(HeapEntry {
                    cost: candidate,
                    idx: next,
                });
            }
        }
    }
    None
}

/// Plans the full road network: k-nearest candidates, Kruskal MST for
/// global connectivity, a shortest-path redundancy filter for everything
/// else, and terrain-aware A* refinement of every admitted edge.
pub fn plan_roads(
    field: &HeightField,
    settlements: &[Settlement],
    config: &RoadConfig,
) -> Vec<RoadSegment> {
    if settlements.len() < 2 {
        return Vec::new();
    }

    let candidates = candidate_edges(settlements, config);
    let grid = PathGrid::new(field, config.grid_step);

    let mut roads: Vec<RoadSegment> = Vec::new();
    let mut adjacency: Vec<Vec<(usize, f32)>> = vec![Vec::new(); settlements.len()];
    let mut in_mst = vec![false; candidates.len()];

    let admit = |cand: &Candidate,
                 roads: &mut Vec<RoadSegment>,
                 adjacency: &mut Vec<Vec<(usize, f32)>>| {
        let start = settlements[cand.a].position;
        let end = settlements[cand.b].position;
        let points = refine_path(&grid, start, end, config)
            .unwrap_or_else(|| vec![start, end]);
        let length = polyline_length(&points);
        adjacency[cand.a].push((cand.b, length));
        adjacency[cand.b].push((cand.a, length));
        roads.push(RoadSegment {
            a: cand.a,
            b: cand.b,
            start,
            end,
            length,
            points,
        });
    };

    if config.force_connectivity {
        let mut sets = DisjointSets::new(settlements.len());
        for (ci, cand) in candidates.iter().enumerate() {
            if sets.union(cand.a, cand.b) {
                in_mst[ci] = true;
                admit(cand, &mut roads, &mut adjacency);
            }
        }
        // The k-nearest candidate set can strand far-apart clusters (two
        // remote islands, say). Connectivity is enforced, so bridge each
        // remaining component pair with its closest crossing.
        loop {
            let mut bridge: Option<Candidate> = None;
            for a in 0..settlements.len() {
                for b in (a + 1)..settlements.len() {
                    if sets.find(a) == sets.find(b) {
                        continue;
                    }
                    let d = settlements[a].position.distance(settlements[b].position);
                    if bridge.map_or(true, |best| d < best.straight) {
                        bridge = Some(Candidate { a, b, straight: d });
                    }
                }
            }
            let Some(cand) = bridge else {
                break;
            };
            sets.union(cand.a, cand.b);
            admit(&cand, &mut roads, &mut adjacency);
        }
    }
    let mst_edges = roads.len();

    for (ci, cand) in candidates.iter().enumerate() {
        if in_mst[ci] {
            continue;
        }
        let existing = shortest_distance(&adjacency, cand.a, cand.b);
        let redundant = match existing {
            Some(d) => d <= cand.straight * config.path_factor,
            None => false,
        };
        if !redundant {
            admit(cand, &mut roads, &mut adjacency);
        }
    }

    tracing::debug!(
        target: "meridian::roads",
        candidates = candidates.len(),
        mst_edges,
        roads = roads.len(),
        "roads.planned"
    );
    roads
}
