use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};

use glam::Vec2;

use crate::roads::RoadSegment;
use crate::settlements::Settlement;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadGraphEdge {
    pub neighbor: usize,
    pub length: f32,
    pub road: usize,
}

/// Immutable adjacency view over the final road list, shared by the
/// travel service and the settlement classifier.
#[derive(Debug, Clone, Default)]
pub struct RoadGraph {
    adjacency: Vec<Vec<RoadGraphEdge>>,
    pair_index: HashMap<(usize, usize), usize>,
}

/// A resolved travel request: the node walk, the stitched world-space
/// polyline, and the total path length.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelPath {
    pub nodes: Vec<usize>,
    pub polyline: Vec<Vec2>,
    pub distance: f32,
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

impl RoadGraph {
    pub fn build(node_count: usize, roads: &[RoadSegment]) -> Self {
        let mut adjacency = vec![Vec::new(); node_count];
        let mut pair_index = HashMap::with_capacity(roads.len());
        for (road_idx, road) in roads.iter().enumerate() {
            adjacency[road.a].push(RoadGraphEdge {
                neighbor: road.b,
                length: road.length,
                road: road_idx,
            });
            adjacency[road.b].push(RoadGraphEdge {
                neighbor: road.a,
                length: road.length,
                road: road_idx,
            });
            pair_index.insert((road.a.min(road.b), road.a.max(road.b)), road_idx);
        }
        Self {
            adjacency,
            pair_index,
        }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn neighbors(&self, node: usize) -> &[RoadGraphEdge] {
        &self.adjacency[node]
    }

    pub fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }

    pub fn road_between(&self, a: usize, b: usize) -> Option<usize> {
        self.pair_index.get(&(a.min(b), a.max(b))).copied()
    }

    /// Dijkstra with early termination on the target pop. `None` when
    /// either index is out of range or the endpoints live in different
    /// components.
    pub fn shortest_path(&self, from: usize, to: usize) -> Option<(Vec<usize>, f32)> {
        let n = self.adjacency.len();
        if from >= n || to >= n {
            return None;
        }
        if from == to {
            return Some((vec![from], 0.0));
        }

        let mut dist = vec![f32::INFINITY; n];
        let mut prev = vec![usize::MAX; n];
        let mut visited = vec![false; n];
        let mut heap = BinaryHeap::new();
        dist[from] = 0.0;
        heap.push(HeapEntry {
            cost: 0.0,
            idx: from,
        });

        while let Some(HeapEntry { cost, idx }) = heap.pop() {
            if visited[idx] {
                continue;
            }
            visited[idx] = true;
            if idx == to {
                let mut nodes = Vec::new();
                let mut cursor = to;
                while cursor != usize::MAX {
                    nodes.push(cursor);
                    cursor = prev[cursor];
                }
                nodes.reverse();
                return Some((nodes, cost));
            }
            for edge in &self.adjacency[idx] {
                if visited[edge.neighbor] {
                    continue;
                }
                let candidate = cost + edge.length;
                if candidate < dist[edge.neighbor] {
                    dist[edge.neighbor] = candidate;
                    prev[edge.neighbor] = idx;
                    heap.push(HeapEntry {
                        cost: candidate,
                        idx: edge.neighbor,
                    });
                }
            }
        }
        None
    }

    /// True when `to` is reachable from `from` in fewer than `bound` hops.
    /// The BFS abandons a frontier as soon as it would exceed the bound.
    pub fn within_hops(&self, from: usize, to: usize, bound: u32) -> bool {
        if from == to {
            return true;
        }
        let mut seen = vec![false; self.adjacency.len()];
        let mut queue = VecDeque::new();
        seen[from] = true;
        queue.push_back((from, 0u32));
        while let Some((node, hops)) = queue.pop_front() {
            if hops >= bound {
                continue;
            }
            for edge in &self.adjacency[node] {
                if edge.neighbor == to {
                    return true;
                }
                if !seen[edge.neighbor] {
                    seen[edge.neighbor] = true;
                    queue.push_back((edge.neighbor, hops + 1));
                }
            }
        }
        false
    }

    /// Stitches the polyline for a node walk produced by
    /// [`RoadGraph::shortest_path`]. Each road's stored point order is
    /// oriented to the walk direction, and the join point shared by
    /// consecutive roads appears once.
    pub fn polyline(
        &self,
        nodes: &[usize],
        roads: &[RoadSegment],
        settlements: &[Settlement],
    ) -> Vec<Vec2> {
        match nodes {
            [] => Vec::new(),
            [only] => vec![settlements[*only].position],
            _ => {
                let mut polyline: Vec<Vec2> = vec![settlements[nodes[0]].position];
                for pair in nodes.windows(2) {
                    let (here, next) = (pair[0], pair[1]);
                    let road_idx = self
                        .road_between(here, next)
                        .expect("consecutive path nodes must share a road");
                    let road = &roads[road_idx];
                    if road.a == here {
                        polyline.extend(road.points.iter().skip(1).copied());
                    } else {
                        polyline.extend(road.points.iter().rev().skip(1).copied());
                    }
                }
                polyline
            }
        }
    }
}
