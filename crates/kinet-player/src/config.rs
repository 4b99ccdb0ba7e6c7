//! Player configuration
//!
//! Loaded from a TOML file; every field has a default so a partial or
//! missing file works.

use crate::{PlayerError, Result};
use kinet_control::{ProtocolVersion, DEFAULT_KINET_PORT};
use kinet_core::{Color, ColorStrategy, EffectKind, HueSweep, LogConfig, SolidColor, Sparkle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Complete player configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub engine: EngineConfig,
    pub output: OutputConfig,
    pub effect: EffectConfig,
    pub grid: GridConfig,
    pub logging: LogConfig,
}

/// Scheduling loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sleep between ticks, in milliseconds
    pub tick_interval_ms: u64,
    /// Strategy time added per tick
    pub time_step: f32,
    /// Packet variant to emit
    pub protocol: ProtocolVersion,
    /// Number packets per universe instead of sending sequence 0
    pub increment_sequence: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 33,
            time_step: 0.1,
            protocol: ProtocolVersion::V1,
            increment_sequence: false,
        }
    }
}

impl EngineConfig {
    /// Tick interval as a duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Where packets go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Controller host; overrides the show's fixture address
    pub destination: Option<String>,
    /// UDP port
    pub port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            destination: None,
            port: DEFAULT_KINET_PORT,
        }
    }
}

/// Color strategy used when no media is playing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    pub kind: EffectKind,
    /// Fill color for the solid strategy (`#RRGGBB` or a color name)
    pub color: String,
    /// Fixed seed for reproducible sparkle output
    pub sparkle_seed: Option<u64>,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            kind: EffectKind::default(),
            color: Color::BLUE.to_string(),
            sparkle_seed: None,
        }
    }
}

impl EffectConfig {
    /// Construct the configured strategy
    pub fn build_strategy(&self) -> Result<ColorStrategy> {
        Ok(match self.kind {
            EffectKind::HueSweep => ColorStrategy::HueSweep(HueSweep),
            EffectKind::Solid => {
                let color: Color = self
                    .color
                    .parse()
                    .map_err(|e| PlayerError::InvalidConfig(format!("effect.color: {}", e)))?;
                ColorStrategy::Solid(SolidColor::new(color))
            }
            EffectKind::Sparkle => ColorStrategy::Sparkle(match self.sparkle_seed {
                Some(seed) => Sparkle::with_seed(seed),
                None => Sparkle::new(),
            }),
        })
    }
}

/// Procedural grid used when no show is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: u32,
    pub height: u32,
    pub start_universe: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 16,
            height: 16,
            start_universe: 0,
        }
    }
}

impl PlayerConfig {
    /// Load configuration from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.engine.tick_interval_ms == 0 {
            return Err(PlayerError::InvalidConfig(
                "engine.tick_interval_ms must be greater than 0".to_string(),
            ));
        }
        if !self.engine.time_step.is_finite() {
            return Err(PlayerError::InvalidConfig(
                "engine.time_step must be a finite number".to_string(),
            ));
        }
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(PlayerError::InvalidConfig(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid.width, self.grid.height
            )));
        }
        if self.output.destination.as_deref().is_some_and(|d| d.trim().is_empty()) {
            return Err(PlayerError::InvalidConfig(
                "output.destination must not be empty".to_string(),
            ));
        }
        self.effect.build_strategy().map(|_| ())
    }
}
