//! Deterministic world-generation core for the Meridian strategy
//! prototype.
//!
//! [`World::build`] runs the whole offline pipeline from a seed (noise,
//! erosion, island labelling, settlement sampling, road planning and
//! classification), and the resulting value owns the two online services:
//! road-graph travel queries and the game-day clock. Saving and loading go
//! through the `world_proto` record schemas.

pub mod calendar;
pub mod classify;
pub mod config;
pub mod erosion;
pub mod heightfield;
pub mod islands;
pub mod noise;
pub mod preset;
pub mod rng;
pub mod road_graph;
pub mod roads;
pub mod settlements;
pub mod world;

pub use calendar::{CalendarDate, GameClock, SpecialDay, TimeSpeed};
pub use config::{ConfigError, WorldConfig};
pub use heightfield::HeightField;
pub use islands::IslandMap;
pub use preset::{load_world_presets_from_env, WorldPreset, WorldPresets};
pub use rng::Mulberry32;
pub use road_graph::{RoadGraph, RoadGraphEdge, TravelPath};
pub use roads::RoadSegment;
pub use settlements::{Settlement, SettlementCategory};
pub use world::{LoadError, PlayerPlacement, World};

/// Build a world from a config. Thin wrapper over [`World::build`] for
/// hosts that prefer a free function entry point.
pub fn build_world(config: WorldConfig) -> Result<World, ConfigError> {
    World::build(config)
}
