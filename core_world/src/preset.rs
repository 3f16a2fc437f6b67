use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::config::{
    ClassifierConfig, ErosionConfig, NoiseConfig, RoadConfig, SettlementConfig, WorldConfig,
};

pub const BUILTIN_WORLD_PRESETS: &str = include_str!("data/world_presets.json");

#[derive(Debug, Clone, Deserialize)]
pub struct WorldPresetDimensions {
    pub width: u32,
    pub height: u32,
}

/// A named bundle of generation parameters. Anything a preset leaves out
/// falls back to the stage defaults, so the catalog only spells out what
/// makes each world type distinct.
#[derive(Debug, Clone, Deserialize)]
pub struct WorldPreset {
    pub id: String,
    pub name: String,
    pub description: String,
    pub dimensions: WorldPresetDimensions,
    #[serde(default)]
    pub map_seed: Option<u32>,
    #[serde(default = "default_use_shading")]
    pub use_shading: bool,
    #[serde(default = "default_enable_erosion")]
    pub enable_erosion: bool,
    #[serde(default = "default_coast_threshold")]
    pub coast_threshold: f32,
    #[serde(default = "default_plains_threshold")]
    pub plains_threshold: f32,
    #[serde(default)]
    pub noise: NoiseConfig,
    #[serde(default)]
    pub erosion: ErosionConfig,
    #[serde(default)]
    pub settlement: SettlementConfig,
    #[serde(default)]
    pub road: RoadConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

const fn default_use_shading() -> bool {
    true
}

const fn default_enable_erosion() -> bool {
    true
}

const fn default_coast_threshold() -> f32 {
    0.35
}

const fn default_plains_threshold() -> f32 {
    0.48
}

impl WorldPreset {
    /// Expands the preset into a full build config. The preset's pinned
    /// seed wins over `seed` when one is present.
    pub fn to_config(&self, seed: u32) -> WorldConfig {
        WorldConfig {
            seed: self.map_seed.unwrap_or(seed),
            width: self.dimensions.width,
            height: self.dimensions.height,
            use_shading: self.use_shading,
            enable_erosion: self.enable_erosion,
            coast_threshold: self.coast_threshold,
            plains_threshold: self.plains_threshold,
            noise: self.noise.clone(),
            erosion: self.erosion.clone(),
            settlement: self.settlement.clone(),
            road: self.road.clone(),
            classifier: self.classifier.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorldPresetsFile {
    pub presets: Vec<WorldPreset>,
}

#[derive(Debug, Clone)]
pub struct WorldPresets {
    by_id: HashMap<String, WorldPreset>,
}

impl WorldPresets {
    pub fn builtin() -> Arc<Self> {
        let parsed: WorldPresetsFile = serde_json::from_str(BUILTIN_WORLD_PRESETS)
            .expect("builtin world presets should parse");
        let mut by_id = HashMap::new();
        for p in parsed.presets.into_iter() {
            by_id.insert(p.id.clone(), p);
        }
        Arc::new(Self { by_id })
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let parsed: WorldPresetsFile = serde_json::from_str(json)?;
        let mut by_id = HashMap::new();
        for p in parsed.presets.into_iter() {
            by_id.insert(p.id.clone(), p);
        }
        Ok(Self { by_id })
    }

    pub fn from_file(path: &Path) -> Result<Self, WorldPresetsError> {
        let contents = fs::read_to_string(path).map_err(|source| WorldPresetsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let presets = WorldPresets::from_json_str(&contents)?;
        Ok(presets)
    }

    pub fn get(&self, id: &str) -> Option<&WorldPreset> {
        self.by_id.get(id)
    }

    pub fn first(&self) -> Option<&WorldPreset> {
        self.by_id.values().next()
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.by_id.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum WorldPresetsError {
    #[error("failed to parse world presets: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read world presets from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Loads the preset catalog, preferring a `WORLD_PRESETS_PATH` override
/// and falling back to the builtin catalog when no file loads.
pub fn load_world_presets_from_env() -> Arc<WorldPresets> {
    if let Some(path) = env::var("WORLD_PRESETS_PATH").ok().map(PathBuf::from) {
        match WorldPresets::from_file(&path) {
            Ok(presets) => {
                tracing::info!(
                    target: "meridian::worldgen",
                    path = %path.display(),
                    "world_presets.loaded=file"
                );
                return Arc::new(presets);
            }
            Err(err) => {
                tracing::warn!(
                    target: "meridian::worldgen",
                    path = %path.display(),
                    error = %err,
                    "world_presets.load_failed"
                );
            }
        }
    }
    tracing::info!(target: "meridian::worldgen", "world_presets.loaded=builtin");
    WorldPresets::builtin()
}
