use serde::Deserialize;
use thiserror::Error;

/// Full configuration for one world build. Everything downstream of the
/// seed is derived from this value; two equal configs produce bit-identical
/// worlds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub seed: u32,
    pub width: u32,
    pub height: u32,
    /// Renderer hint carried through saves; generation ignores it.
    pub use_shading: bool,
    pub enable_erosion: bool,
    /// Elevation separating water from land.
    pub coast_threshold: f32,
    /// Lower bound of the contrast-stretch band.
    pub plains_threshold: f32,
    pub noise: NoiseConfig,
    pub erosion: ErosionConfig,
    pub settlement: SettlementConfig,
    pub road: RoadConfig,
    pub classifier: ClassifierConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            width: 256,
            height: 256,
            use_shading: true,
            enable_erosion: true,
            coast_threshold: 0.35,
            plains_threshold: 0.48,
            noise: NoiseConfig::default(),
            erosion: ErosionConfig::default(),
            settlement: SettlementConfig::default(),
            road: RoadConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Dimensions {
                width: self.width,
                height: self.height,
            });
        }
        check_range("coast_threshold", self.coast_threshold, 0.0, 1.0)?;
        check_range("plains_threshold", self.plains_threshold, 0.0, 1.0)?;
        check_range(
            "settlement.fade_out_height",
            self.settlement.fade_out_height,
            self.coast_threshold,
            1.0,
        )?;
        check_range("settlement.base_chance", self.settlement.base_chance as f32, 0.0, 1.0)?;
        check_range(
            "settlement.island_factor_base",
            self.settlement.island_factor_base,
            0.0,
            1.0,
        )?;
        if self.settlement.stride == 0 {
            return Err(ConfigError::ZeroStride);
        }
        if self.settlement.min_distance <= 0.0 {
            return Err(ConfigError::Range {
                name: "settlement.min_distance",
                value: self.settlement.min_distance,
                min: f32::EPSILON,
                max: f32::INFINITY,
            });
        }
        if self.road.k_nearest == 0 {
            return Err(ConfigError::Range {
                name: "road.k_nearest",
                value: 0.0,
                min: 1.0,
                max: f32::INFINITY,
            });
        }
        if self.road.path_factor < 1.0 {
            return Err(ConfigError::Range {
                name: "road.path_factor",
                value: self.road.path_factor,
                min: 1.0,
                max: f32::INFINITY,
            });
        }
        if self.road.grid_step <= 0.0 {
            return Err(ConfigError::Range {
                name: "road.grid_step",
                value: self.road.grid_step,
                min: f32::EPSILON,
                max: f32::INFINITY,
            });
        }
        check_range("classifier.city_share", self.classifier.city_share, 0.0, 1.0)?;
        check_range(
            "classifier.min_score_for_city",
            self.classifier.min_score_for_city,
            0.0,
            1.0,
        )?;
        if self.classifier.min_cities > self.classifier.max_cities {
            return Err(ConfigError::CityBounds {
                min: self.classifier.min_cities,
                max: self.classifier.max_cities,
            });
        }
        check_range("erosion.smoothing_blend", self.erosion.smoothing_blend, 0.0, 1.0)?;
        Ok(())
    }
}

fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ConfigError::Range {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    pub warp_strength: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            octaves: 6,
            persistence: 0.5,
            lacunarity: 2.0,
            warp_strength: 0.08,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ErosionConfig {
    pub iterations: u32,
    pub strength: f32,
    pub flow_exponent: f32,
    pub min_slope: f32,
    pub rainfall: f32,
    pub smoothing_iterations: u32,
    pub smoothing_blend: f32,
}

impl Default for ErosionConfig {
    fn default() -> Self {
        Self {
            iterations: 1,
            strength: 0.02,
            flow_exponent: 0.5,
            min_slope: 1e-4,
            rainfall: 1.0,
            smoothing_iterations: 1,
            smoothing_blend: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    pub stride: u32,
    pub base_chance: f64,
    /// Suitability fades to zero as elevation approaches this height.
    pub fade_out_height: f32,
    pub island_factor_base: f32,
    pub island_factor_exponent: f32,
    pub min_distance: f32,
    pub max_settlements: usize,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            stride: 4,
            base_chance: 0.3,
            fade_out_height: 0.92,
            island_factor_base: 0.35,
            island_factor_exponent: 0.75,
            min_distance: 12.0,
            max_settlements: 400,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    pub k_nearest: usize,
    pub max_distance: f32,
    /// Admit the Kruskal MST first so the network is always connected.
    pub force_connectivity: bool,
    /// Detour tolerance: an extra road is admitted only if the current
    /// shortest path exceeds the candidate's straight length by this factor.
    pub path_factor: f32,
    pub grid_step: f32,
    pub slope_cost: f32,
    pub water_threshold: f32,
    pub water_penalty: f32,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            k_nearest: 6,
            max_distance: 360.0,
            force_connectivity: true,
            path_factor: 1.15,
            grid_step: 1.0,
            slope_cost: 15.0,
            water_threshold: 0.35,
            water_penalty: 8.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub city_share: f32,
    pub min_cities: usize,
    pub max_cities: usize,
    pub min_score_for_city: f32,
    pub min_city_hops: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            city_share: 0.05,
            min_cities: 5,
            max_cities: 75,
            min_score_for_city: 0.35,
            min_city_hops: 4,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("world dimensions must be positive (got {width}x{height})")]
    Dimensions { width: u32, height: u32 },
    #[error("{name} must lie in [{min}, {max}] (got {value})")]
    Range {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("settlement stride must be at least 1")]
    ZeroStride,
    #[error("minimum city count {min} exceeds maximum {max}")]
    CityBounds { min: usize, max: usize },
    #[error("unknown time speed {0}; expected 0, 1, 2 or 4")]
    UnknownTimeSpeed(u32),
}
