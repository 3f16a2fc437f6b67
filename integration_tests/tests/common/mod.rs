use core_world::{World, WorldConfig};

/// The reference scenario: seed 1 at 256x256 with default thresholds.
pub fn reference_config(enable_erosion: bool) -> WorldConfig {
    WorldConfig {
        seed: 1,
        width: 256,
        height: 256,
        enable_erosion,
        ..WorldConfig::default()
    }
}

pub fn reference_world(enable_erosion: bool) -> World {
    World::build(reference_config(enable_erosion)).expect("reference world builds")
}
