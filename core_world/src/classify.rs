use std::collections::HashSet;

use crate::config::ClassifierConfig;
use crate::road_graph::RoadGraph;
use crate::settlements::{Settlement, SettlementCategory};

const SCORE_CEILING: f32 = 1.4;

/// Annotates every settlement with its road-network metrics and blended
/// city score, then promotes the best-connected candidates to cities and
/// towns. Cities keep a minimum hop spacing on the road graph so they
/// spread across the network instead of clustering.
pub fn classify_settlements(
    settlements: &mut [Settlement],
    graph: &RoadGraph,
    config: &ClassifierConfig,
) {
    let n = settlements.len();
    if n == 0 {
        return;
    }

    let mut degrees = vec![0u32; n];
    let mut reaches = vec![0u32; n];
    let mut mean_neighbor_suits = vec![0.0f32; n];
    for i in 0..n {
        let edges = graph.neighbors(i);
        degrees[i] = edges.len() as u32;
        if !edges.is_empty() {
            mean_neighbor_suits[i] = edges
                .iter()
                .map(|e| settlements[e.neighbor].suitability)
                .sum::<f32>()
                / edges.len() as f32;
        }

        let mut reachable: HashSet<usize> = HashSet::new();
        for edge in edges {
            reachable.insert(edge.neighbor);
            for second in graph.neighbors(edge.neighbor) {
                if second.neighbor != i {
                    reachable.insert(second.neighbor);
                }
            }
        }
        reaches[i] = reachable.len() as u32;
    }

    let max_suit = settlements
        .iter()
        .map(|s| s.suitability)
        .fold(0.0f32, f32::max);
    let max_degree = degrees.iter().copied().max().unwrap_or(0);
    let max_reach = reaches.iter().copied().max().unwrap_or(0);

    let ratio = |value: f32, max: f32| if max > 0.0 { value / max } else { 0.0 };

    for i in 0..n {
        let bonus = if degrees[i] >= 4 {
            0.05
        } else if degrees[i] >= 2 {
            0.02
        } else {
            0.0
        };
        let raw = 0.55 * ratio(settlements[i].suitability, max_suit)
            + 0.20 * ratio(degrees[i] as f32, max_degree as f32)
            + 0.15 * mean_neighbor_suits[i]
            + 0.25 * ratio(reaches[i] as f32, max_reach as f32)
            + bonus;
        settlements[i].road_degree = degrees[i];
        settlements[i].second_hop_reach = reaches[i];
        settlements[i].city_score = raw.clamp(0.0, SCORE_CEILING) / SCORE_CEILING;
        settlements[i].category = SettlementCategory::Village;
    }

    // City pass: best scores first, spaced out along the road graph.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        settlements[b]
            .city_score
            .total_cmp(&settlements[a].city_score)
            .then_with(|| a.cmp(&b))
    });

    let share_target = (n as f32 * config.city_share).round() as usize;
    let target = share_target
        .clamp(config.min_cities, config.max_cities)
        .min(n);

    let mut cities: Vec<usize> = Vec::new();
    for &candidate in &order {
        if cities.len() >= target {
            break;
        }
        if settlements[candidate].city_score < config.min_score_for_city {
            break;
        }
        let spaced = config.min_city_hops == 0
            || cities
                .iter()
                .all(|&city| !graph.within_hops(candidate, city, config.min_city_hops - 1));
        if spaced {
            cities.push(candidate);
        }
    }
    for &city in &cities {
        settlements[city].category = SettlementCategory::City;
    }

    // Town pass: well-connected or high-scoring leftovers.
    let max_city_score = cities
        .iter()
        .map(|&c| settlements[c].city_score)
        .fold(0.0f32, f32::max);
    let town_score = (0.55 * config.min_score_for_city).max(0.4 * max_city_score);
    let mut towns = 0usize;
    for s in settlements.iter_mut() {
        if s.category == SettlementCategory::City {
            continue;
        }
        if s.road_degree >= 2 || s.city_score >= town_score {
            s.category = SettlementCategory::Town;
            towns += 1;
        }
    }

    tracing::debug!(
        target: "meridian::worldgen",
        cities = cities.len(),
        towns,
        villages = n - cities.len() - towns,
        "settlements.classified"
    );
}
