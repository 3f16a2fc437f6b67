use glam::Vec2;
use thiserror::Error;

use world_proto::{
    DecodedRecord, PlayerState, RoadBlob, RoadMetadata, SaveError, SaveRecord, SettlementState,
    TimeState, SAVE_VERSION,
};

use crate::calendar::{CalendarDate, GameClock, TimeSpeed};
use crate::classify::classify_settlements;
use crate::config::{ConfigError, WorldConfig};
use crate::erosion::erode;
use crate::heightfield::{build_height_field, contrast_stretch, HeightField};
use crate::islands::{label_islands, IslandMap};
use crate::noise::NoiseField;
use crate::rng::Mulberry32;
use crate::road_graph::{RoadGraph, TravelPath};
use crate::roads::{plan_roads, RoadSegment};
use crate::settlements::{sample_settlements, Settlement, SettlementCategory};

/// Where the player currently stands; carried through saves untouched by
/// the generation pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPlacement {
    pub position: Vec2,
    pub settlement: Option<usize>,
}

/// A fully generated world. Exclusively owned by whoever built or loaded
/// it; collaborators read through the accessors and never mutate core
/// data. Everything except the clock and the player placement is fixed at
/// construction.
#[derive(Debug, Clone)]
pub struct World {
    config: WorldConfig,
    height_field: HeightField,
    islands: IslandMap,
    settlements: Vec<Settlement>,
    roads: Vec<RoadSegment>,
    graph: RoadGraph,
    clock: GameClock,
    player: Option<PlayerPlacement>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Format(#[from] SaveError),
    #[error("road {road} endpoint {index} is outside the settlement list of {count}")]
    RoadEndpoint {
        road: usize,
        index: u32,
        count: usize,
    },
    #[error("road {road} polyline has {count} points; need at least 2")]
    RoadPoints { road: usize, count: usize },
    #[error("settlement {index} carries unknown category {value}")]
    UnknownCategory { index: usize, value: u8 },
    #[error("save carries unknown time speed {0}")]
    UnknownTimeSpeed(u32),
    #[error("player placement references settlement {index} of {count}")]
    PlayerSettlement { index: u32, count: usize },
}

impl World {
    /// Runs the whole pipeline: noise, contrast, optional erosion, island
    /// labelling, settlement sampling, road planning and classification.
    /// Strictly ordered; every stage sees the finalised output of the one
    /// before it, and all randomness flows from the config seed.
    pub fn build(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let noise = NoiseField::new(config.seed, &config.noise);
        let mut height_field = build_height_field(config.width, config.height, &noise);
        contrast_stretch(&mut height_field, config.plains_threshold);
        if config.enable_erosion {
            erode(&mut height_field, &config.erosion, config.plains_threshold);
        }

        let islands = label_islands(&height_field, config.coast_threshold);

        let mut rng = Mulberry32::new(config.seed);
        let mut settlements = sample_settlements(
            &height_field,
            &islands,
            &config.settlement,
            config.coast_threshold,
            &mut rng,
        );

        let roads = plan_roads(&height_field, &settlements, &config.road);
        let graph = RoadGraph::build(settlements.len(), &roads);
        classify_settlements(&mut settlements, &graph, &config.classifier);

        tracing::info!(
            target: "meridian::worldgen",
            seed = config.seed,
            width = config.width,
            height = config.height,
            land_cells = height_field.land_cells(config.coast_threshold),
            islands = islands.island_count(),
            settlements = settlements.len(),
            roads = roads.len(),
            "world.built"
        );

        Ok(Self {
            config,
            height_field,
            islands,
            settlements,
            roads,
            graph,
            clock: GameClock::new(),
            player: None,
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn height_field(&self) -> &HeightField {
        &self.height_field
    }

    pub fn islands(&self) -> &IslandMap {
        &self.islands
    }

    pub fn settlements(&self) -> &[Settlement] {
        &self.settlements
    }

    pub fn roads(&self) -> &[RoadSegment] {
        &self.roads
    }

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    pub fn player(&self) -> Option<&PlayerPlacement> {
        self.player.as_ref()
    }

    pub fn set_player(&mut self, placement: Option<PlayerPlacement>) {
        self.player = placement;
    }

    /// Travel query over the road graph. `None` when either index is out
    /// of range or no road route connects the two settlements.
    pub fn shortest_path(&self, from: usize, to: usize) -> Option<TravelPath> {
        let (nodes, distance) = self.graph.shortest_path(from, to)?;
        let polyline = self.graph.polyline(&nodes, &self.roads, &self.settlements);
        Some(TravelPath {
            nodes,
            polyline,
            distance,
        })
    }

    pub fn tick(&mut self, now_ms: f64) {
        self.clock.tick(now_ms);
    }

    pub fn set_time_speed(&mut self, speed: TimeSpeed) {
        self.clock.set_speed(speed);
    }

    pub fn time_speed(&self) -> TimeSpeed {
        self.clock.speed()
    }

    pub fn total_days(&self) -> u64 {
        self.clock.total_days()
    }

    pub fn current_date(&self) -> CalendarDate {
        self.clock.date()
    }

    /// Snapshots the world into the version-2 record layout. `created_at`
    /// is supplied by the host; the core never reads the wall clock.
    pub fn save_record(&self, created_at: u64) -> SaveRecord {
        let mut metadata = Vec::with_capacity(self.roads.len());
        let mut points_data = Vec::new();
        for road in &self.roads {
            let points_offset = (points_data.len() / 2) as u32;
            for point in &road.points {
                points_data.push(point.x);
                points_data.push(point.y);
            }
            metadata.push(RoadMetadata {
                x1: road.start.x,
                y1: road.start.y,
                x2: road.end.x,
                y2: road.end.y,
                length: road.length,
                a_index: road.a as u32,
                b_index: road.b as u32,
                points_offset,
                points_count: road.points.len() as u32,
            });
        }

        SaveRecord {
            version: SAVE_VERSION,
            seed: self.config.seed,
            width: self.config.width,
            height: self.config.height,
            use_shading: self.config.use_shading,
            enable_erosion: self.config.enable_erosion,
            created_at,
            heightmap: world_proto::heightmap_to_bytes(self.height_field.values()),
            settlements: self
                .settlements
                .iter()
                .map(|s| SettlementState {
                    x: s.position.x,
                    y: s.position.y,
                    elevation: s.elevation,
                    suitability: s.suitability,
                    island_id: s.island_id,
                    island_area: s.island_area,
                    road_degree: s.road_degree,
                    second_hop_reach: s.second_hop_reach,
                    city_score: s.city_score,
                    category: s.category.as_u8(),
                })
                .collect(),
            roads: RoadBlob {
                metadata,
                points_data,
            },
            time: TimeState {
                total_days: self.clock.total_days(),
                time_speed: self.clock.speed().days_per_second(),
            },
            player: self.player.map(|p| PlayerState {
                x: p.position.x,
                y: p.position.y,
                current_settlement: p.settlement.map(|s| s as u32),
            }),
        }
    }

    /// Materialises a decoded record of either schema version into a
    /// world. The record is the source of truth: nothing is regenerated
    /// except the island labelling and road graph, which are derived
    /// views over the stored heightmap and road list.
    pub fn from_record(record: DecodedRecord) -> Result<Self, LoadError> {
        match record {
            DecodedRecord::V2(rec) => {
                let roads = roads_from_blob(&rec.roads)?;
                Self::materialise(
                    rec.seed,
                    rec.width,
                    rec.height,
                    rec.use_shading,
                    rec.enable_erosion,
                    rec.heightmap,
                    rec.settlements,
                    roads,
                    rec.time,
                    rec.player,
                )
            }
            DecodedRecord::V1(rec) => {
                let roads = rec
                    .roads
                    .iter()
                    .enumerate()
                    .map(|(road, state)| {
                        if state.points.len() < 2 {
                            return Err(LoadError::RoadPoints {
                                road,
                                count: state.points.len(),
                            });
                        }
                        let points: Vec<Vec2> = state
                            .points
                            .iter()
                            .map(|&[x, y]| Vec2::new(x, y))
                            .collect();
                        Ok(RoadSegment {
                            a: state.a_index as usize,
                            b: state.b_index as usize,
                            start: points[0],
                            end: points[points.len() - 1],
                            length: state.length,
                            points,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Self::materialise(
                    rec.seed,
                    rec.width,
                    rec.height,
                    rec.use_shading,
                    rec.enable_erosion,
                    rec.heightmap,
                    rec.settlements,
                    roads,
                    rec.time,
                    rec.player,
                )
            }
        }
    }

    /// Encodes the world straight to save-blob bytes.
    pub fn encode(&self, created_at: u64) -> Result<Vec<u8>, SaveError> {
        world_proto::encode_record(&self.save_record(created_at))
    }

    /// Decodes save-blob bytes straight to a world.
    pub fn decode(bytes: &[u8]) -> Result<Self, LoadError> {
        Self::from_record(world_proto::decode_record(bytes)?)
    }

    #[allow(clippy::too_many_arguments)]
    fn materialise(
        seed: u32,
        width: u32,
        height: u32,
        use_shading: bool,
        enable_erosion: bool,
        heightmap: Vec<u8>,
        settlement_states: Vec<SettlementState>,
        roads: Vec<RoadSegment>,
        time: TimeState,
        player: Option<PlayerState>,
    ) -> Result<Self, LoadError> {
        let config = WorldConfig {
            seed,
            width,
            height,
            use_shading,
            enable_erosion,
            ..WorldConfig::default()
        };

        let cells = (width as usize) * (height as usize);
        let values = world_proto::heightmap_from_bytes(&heightmap, cells)?;
        let height_field = HeightField::new(width, height, values);
        let islands = label_islands(&height_field, config.coast_threshold);

        let settlements = settlement_states
            .into_iter()
            .enumerate()
            .map(|(index, state)| {
                let category = SettlementCategory::from_u8(state.category).ok_or(
                    LoadError::UnknownCategory {
                        index,
                        value: state.category,
                    },
                )?;
                Ok(Settlement {
                    position: Vec2::new(state.x, state.y),
                    elevation: state.elevation,
                    suitability: state.suitability,
                    island_id: state.island_id,
                    island_area: state.island_area,
                    road_degree: state.road_degree,
                    second_hop_reach: state.second_hop_reach,
                    city_score: state.city_score,
                    category,
                })
            })
            .collect::<Result<Vec<_>, LoadError>>()?;

        for (road_idx, road) in roads.iter().enumerate() {
            for endpoint in [road.a, road.b] {
                if endpoint >= settlements.len() {
                    return Err(LoadError::RoadEndpoint {
                        road: road_idx,
                        index: endpoint as u32,
                        count: settlements.len(),
                    });
                }
            }
        }

        if let Some(state) = &player {
            if let Some(index) = state.current_settlement {
                if index as usize >= settlements.len() {
                    return Err(LoadError::PlayerSettlement {
                        index,
                        count: settlements.len(),
                    });
                }
            }
        }

        let graph = RoadGraph::build(settlements.len(), &roads);
        let clock = GameClock::from_state(
            time.total_days,
            TimeSpeed::from_u32(time.time_speed)
                .map_err(|_| LoadError::UnknownTimeSpeed(time.time_speed))?,
        );

        tracing::info!(
            target: "meridian::save",
            seed,
            width,
            height,
            settlements = settlements.len(),
            roads = roads.len(),
            "world.loaded"
        );

        Ok(Self {
            config,
            height_field,
            islands,
            settlements,
            roads,
            graph,
            clock,
            player: player.map(|p| PlayerPlacement {
                position: Vec2::new(p.x, p.y),
                settlement: p.current_settlement.map(|s| s as usize),
            }),
        })
    }
}

fn roads_from_blob(blob: &RoadBlob) -> Result<Vec<RoadSegment>, LoadError> {
    blob.validate()?;
    let mut roads = Vec::with_capacity(blob.metadata.len());
    for (road_idx, meta) in blob.metadata.iter().enumerate() {
        let pairs = blob
            .points(road_idx)
            .expect("validated blob entry resolves");
        let points: Vec<Vec2> = pairs
            .chunks_exact(2)
            .map(|xy| Vec2::new(xy[0], xy[1]))
            .collect();
        roads.push(RoadSegment {
            a: meta.a_index as usize,
            b: meta.b_index as usize,
            start: Vec2::new(meta.x1, meta.y1),
            end: Vec2::new(meta.x2, meta.y2),
            length: meta.length,
            points,
        });
    }
    Ok(roads)
}
