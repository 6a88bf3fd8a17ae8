//! Replay settings.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{Error, GridSize, Result};

/// How default-symbol placements are treated during replay
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayMode {
    /// 2-D for single-layer grids, 3-D otherwise
    #[default]
    Auto,
    /// Every change is shown
    TwoD,
    /// Placements of the default symbol are skipped
    ThreeD,
}

impl ReplayMode {
    pub fn is_two_d(self, size: GridSize) -> bool {
        match self {
            ReplayMode::Auto => size.is_flat(),
            ReplayMode::TwoD => true,
            ReplayMode::ThreeD => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Frames per second
    pub playback_speed: f32,
    pub mode: ReplayMode,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { playback_speed: 1.0, mode: ReplayMode::Auto }
    }
}

impl ReplayConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.playback_speed.is_finite() && self.playback_speed > 0.0) {
            return Err(Error::Config(format!(
                "playback_speed must be positive, got {}",
                self.playback_speed
            )));
        }
        Ok(())
    }

    pub fn tick(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.playback_speed)
    }

    /// Load and validate from file (sync)
    pub fn load_sync(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
