// ============================================================================
// config.rs — GeneLife
// World construction parameters, their validation, and render mode names.
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::habitat::HabitatLayout;

/// Construction-time world parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    pub width: usize,
    pub height: usize,
    /// Probability that a cell starts alive under clustered-random seeding,
    /// and the Bernoulli thinning used by pattern presets.
    pub initial_density: f32,
    /// Milliseconds between generations when a driver paces ticks.
    pub tick_rate_ms: u64,
    pub habitat_layout: HabitatLayout,
    /// Fixed RNG seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 120,
            initial_density: 0.3,
            tick_rate_ms: 100,
            habitat_layout: HabitatLayout::Zones,
            seed: None,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("world width must be positive")]
    ZeroWidth,
    #[error("world height must be positive")]
    ZeroHeight,
    #[error("initial density {0} must be between 0.0 and 1.0")]
    InvalidDensity(f32),
    #[error("tick rate must be positive")]
    ZeroTickRate,
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_dimensions(self.width, self.height)?;
        if !(0.0..=1.0).contains(&self.initial_density) {
            return Err(ConfigError::InvalidDensity(self.initial_density));
        }
        if self.tick_rate_ms == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}

pub fn validate_dimensions(width: usize, height: usize) -> Result<(), ConfigError> {
    if width == 0 {
        return Err(ConfigError::ZeroWidth);
    }
    if height == 0 {
        return Err(ConfigError::ZeroHeight);
    }
    Ok(())
}

/// Number of snapshot render modes.
pub const RENDER_MODE_COUNT: u32 = 3;

/// Returns the display name for a given render mode index.
pub fn render_mode_name(mode: u32) -> &'static str {
    match mode {
        0 => "Species Color",
        1 => "Energy Heatmap",
        2 => "Habitat Map",
        _ => "Unknown",
    }
}
