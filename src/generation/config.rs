//! Configured model: which model to run, how often and how fast.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{Error, GridSize, Result};
use crate::palette::MappingItem;
use super::rng::SimpleRng;

/// Generation settings of one configured model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model identifier, also the recording name prefix
    #[serde(alias = "Model")]
    pub model: String,
    #[serde(alias = "SizeX")]
    pub size_x: u32,
    #[serde(alias = "SizeY")]
    pub size_y: u32,
    #[serde(alias = "SizeZ")]
    pub size_z: u32,
    /// Number of iterations (independent runs)
    #[serde(alias = "Amount")]
    pub amount: u32,
    /// Max generator steps per iteration
    #[serde(alias = "Steps")]
    pub steps: u32,
    /// Generator steps pulled per tick
    #[serde(alias = "StepsPerRefresh")]
    pub steps_per_refresh: u32,
    #[serde(alias = "Animated")]
    pub animated: bool,
    pub record: bool,
    /// Explicit seeds for the first iterations
    #[serde(alias = "Seeds")]
    pub seeds: Vec<i32>,
    /// Seed for deriving the remaining seeds; clock-based when unset
    pub base_seed: Option<u64>,
    /// Ticks per second
    pub playback_speed: f32,
    #[serde(alias = "CustomMapping")]
    pub custom_mapping: Vec<MappingItem>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            size_x: 16,
            size_y: 16,
            size_z: 1,
            amount: 1,
            steps: 50_000,
            steps_per_refresh: 1,
            animated: true,
            record: false,
            seeds: Vec::new(),
            base_seed: None,
            playback_speed: 1.0,
            custom_mapping: Vec::new(),
        }
    }
}

impl ModelConfig {
    pub fn size(&self) -> GridSize {
        GridSize::new(self.size_x, self.size_y, self.size_z)
    }

    /// Duration of one tick
    pub fn tick(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.playback_speed)
    }

    pub fn validate(&self) -> Result<()> {
        if self.size().volume() == 0 {
            return Err(Error::Config(format!("Grid size {} has no cells", self.size())));
        }
        if self.amount == 0 {
            return Err(Error::Config("amount must be at least 1".into()));
        }
        if self.steps_per_refresh == 0 {
            return Err(Error::Config("steps_per_refresh must be at least 1".into()));
        }
        if !(self.playback_speed.is_finite() && self.playback_speed > 0.0) {
            return Err(Error::Config(format!(
                "playback_speed must be positive, got {}",
                self.playback_speed
            )));
        }
        Ok(())
    }

    /// Seed of every iteration, in order.
    ///
    /// Explicit seeds come first; the rest are drawn from `base_seed`.
    pub fn resolve_seeds(&self) -> Vec<i32> {
        let mut rng = match self.base_seed {
            Some(seed) => SimpleRng::new(seed),
            None => SimpleRng::from_clock(),
        };
        (0..self.amount as usize)
            .map(|k| self.seeds.get(k).copied().unwrap_or_else(|| rng.next_seed()))
            .collect()
    }

    /// Save to file (sync)
    pub fn save_sync(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate from file (sync)
    pub fn load_sync(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        log::info!(
            "Model config loaded from {}: {} ({} iterations, {} custom mappings)",
            path.display(),
            config.model,
            config.amount,
            config.custom_mapping.len()
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Rgb;

    #[test]
    fn test_default_is_valid() {
        let config = ModelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick(), Duration::from_secs(1));
    }

    #[test]
    fn test_validation() {
        let mut config = ModelConfig { amount: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.amount = 1;
        config.size_z = 0;
        assert!(config.validate().is_err());

        config.size_z = 1;
        config.playback_speed = 0.0;
        assert!(config.validate().is_err());

        config.playback_speed = 4.0;
        config.steps_per_refresh = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_seeds_explicit_then_derived() {
        let config = ModelConfig {
            amount: 4,
            seeds: vec![10, 20],
            base_seed: Some(5),
            ..Default::default()
        };
        let seeds = config.resolve_seeds();
        assert_eq!(seeds.len(), 4);
        assert_eq!(&seeds[..2], &[10, 20]);
        assert_eq!(seeds, config.resolve_seeds());
        assert!(seeds[2..].iter().all(|&s| s >= 0));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let config = ModelConfig {
            model: "Maze".into(),
            record: true,
            custom_mapping: vec![MappingItem::new('W', Rgb::WHITE).with_block("white_wool")],
            ..Default::default()
        };
        config.save_sync(&path).unwrap();
        assert_eq!(ModelConfig::load_sync(&path).unwrap(), config);
    }

    #[test]
    fn test_legacy_fields_and_defaults() {
        let json = r#"{"Model": "Growth", "Amount": 2, "StepsPerRefresh": 5, "Seeds": [1]}"#;
        let config: ModelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.model, "Growth");
        assert_eq!(config.amount, 2);
        assert_eq!(config.steps_per_refresh, 5);
        assert_eq!(config.seeds, vec![1]);
        assert_eq!(config.size(), GridSize::new(16, 16, 1));
    }
}
