mod common;

use std::collections::HashSet;

use common::reference_world;
use core_world::{SettlementCategory, World};

/// Recomputes the k-nearest candidate pairs the planner saw, so the
/// detour property can be checked against the final network.
fn candidate_pairs(world: &World) -> Vec<(usize, usize, f32)> {
    let settlements = world.settlements();
    let config = &world.config().road;
    let n = settlements.len();
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    let mut pairs = Vec::new();
    for i in 0..n {
        let mut near: Vec<(f32, usize)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| {
                (
                    settlements[i].position.distance(settlements[j].position),
                    j,
                )
            })
            .filter(|&(d, _)| d <= config.max_distance)
            .collect();
        near.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        for &(d, j) in near.iter().take(config.k_nearest) {
            let key = (i.min(j), i.max(j));
            if seen.insert(key) {
                pairs.push((key.0, key.1, d));
            }
        }
    }
    pairs
}

#[test]
fn road_invariants_hold() {
    let world = reference_world(true);
    let settlements = world.settlements();
    let mut pairs = HashSet::new();

    for road in world.roads() {
        assert_ne!(road.a, road.b);
        assert!(road.a < settlements.len() && road.b < settlements.len());
        assert!(
            pairs.insert((road.a.min(road.b), road.a.max(road.b))),
            "duplicate road between {} and {}",
            road.a,
            road.b
        );

        let measured: f32 = road
            .points
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum();
        assert!(
            (road.length - measured).abs() < 1e-3,
            "stored length {} disagrees with polyline {measured}",
            road.length
        );
        assert_eq!(road.points.first().copied(), Some(road.start));
        assert_eq!(road.points.last().copied(), Some(road.end));
        assert_eq!(road.start, settlements[road.a].position);
        assert_eq!(road.end, settlements[road.b].position);
    }
}

#[test]
fn rejected_candidates_are_within_the_detour_bound() {
    let world = reference_world(true);
    let factor = world.config().road.path_factor;
    let mut checked = 0usize;
    for (a, b, straight) in candidate_pairs(&world) {
        if world.graph().road_between(a, b).is_some() {
            continue;
        }
        let path = world
            .shortest_path(a, b)
            .unwrap_or_else(|| panic!("rejected candidate {a}-{b} must stay connected"));
        assert!(
            path.distance <= straight * factor + 1e-2,
            "candidate {a}-{b}: network path {} exceeds {straight} * {factor}",
            path.distance
        );
        checked += 1;
    }
    assert!(checked > 0, "expected the filter to reject some candidates");
}

#[test]
fn settlement_constraints_hold() {
    let world = reference_world(true);
    let config = world.config();
    let settlements = world.settlements();

    for (i, a) in settlements.iter().enumerate() {
        assert!(a.elevation >= config.coast_threshold);
        assert!(a.elevation < config.settlement.fade_out_height);
        assert!((0.0..=1.0).contains(&a.suitability));
        assert!(a.island_id >= 0, "settlements only spawn on land");
        for b in settlements.iter().skip(i + 1) {
            assert!(
                a.position.distance(b.position) >= config.settlement.min_distance,
                "settlements too close: {:?} / {:?}",
                a.position,
                b.position
            );
        }
    }
}

#[test]
fn classification_invariants_hold() {
    let world = reference_world(true);
    let config = &world.config().classifier;
    let settlements = world.settlements();
    let n = settlements.len();

    let cities: Vec<usize> = settlements
        .iter()
        .enumerate()
        .filter(|(_, s)| s.category == SettlementCategory::City)
        .map(|(i, _)| i)
        .collect();

    let target = ((n as f32 * config.city_share).round() as usize)
        .clamp(config.min_cities, config.max_cities)
        .min(n);
    assert!(cities.len() <= target);

    for &city in &cities {
        assert!(settlements[city].city_score >= config.min_score_for_city);
    }
    for (i, &a) in cities.iter().enumerate() {
        for &b in cities.iter().skip(i + 1) {
            assert!(
                !world.graph().within_hops(a, b, config.min_city_hops - 1),
                "cities {a} and {b} violate the hop spacing"
            );
        }
    }

    for (i, s) in settlements.iter().enumerate() {
        assert!((0.0..=1.0).contains(&s.city_score));
        assert_eq!(s.road_degree as usize, world.graph().degree(i));
        if s.road_degree >= 2 {
            assert_ne!(
                s.category,
                SettlementCategory::Village,
                "settlement {i} has degree {} but is a village",
                s.road_degree
            );
        }
    }
}
