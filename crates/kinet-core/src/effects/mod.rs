//! Color strategies
//!
//! A strategy writes every fixture's color from the grid position and the
//! engine time. Time is measured in engine ticks (the engine adds a fixed
//! step each tick), not wall-clock seconds.
//!
//! Strategies form a closed set and are dispatched through one `match`, so
//! the per-tick call does no boxing or allocation.

mod sparkle;

pub use sparkle::{Sparkle, DECAY_FACTOR, IGNITE_PROBABILITY, OFF_THRESHOLD};

use crate::{Color, CoreError, PixelMap};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The active color strategy
#[derive(Debug, Clone)]
pub enum ColorStrategy {
    /// Rainbow moving across the grid
    HueSweep(HueSweep),
    /// Every fixture one fixed color
    Solid(SolidColor),
    /// Random white flashes that fade out
    Sparkle(Sparkle),
}

impl ColorStrategy {
    /// Overwrite every fixture's color for time `time`
    pub fn update(&mut self, pixel_map: &mut PixelMap, time: f32) {
        match self {
            Self::HueSweep(effect) => effect.update(pixel_map, time),
            Self::Solid(effect) => effect.update(pixel_map, time),
            Self::Sparkle(effect) => effect.update(pixel_map, time),
        }
    }

    /// Which kind of strategy this is
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::HueSweep(_) => EffectKind::HueSweep,
            Self::Solid(_) => EffectKind::Solid,
            Self::Sparkle(_) => EffectKind::Sparkle,
        }
    }
}

impl Default for ColorStrategy {
    fn default() -> Self {
        Self::HueSweep(HueSweep)
    }
}

/// Strategy selector used in configuration and on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EffectKind {
    /// [`HueSweep`]
    #[default]
    HueSweep,
    /// [`SolidColor`]
    Solid,
    /// [`Sparkle`]
    Sparkle,
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HueSweep => write!(f, "hue-sweep"),
            Self::Solid => write!(f, "solid"),
            Self::Sparkle => write!(f, "sparkle"),
        }
    }
}

impl FromStr for EffectKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hue-sweep" | "hue_sweep" | "rainbow" => Ok(Self::HueSweep),
            "solid" | "solid-color" => Ok(Self::Solid),
            "sparkle" => Ok(Self::Sparkle),
            _ => Err(CoreError::UnknownEffect(s.to_string())),
        }
    }
}

/// Hue sweep over position and time.
///
/// `hue = (10x + 10y + 20t) mod 360` at full saturation and value.
#[derive(Debug, Clone, Copy, Default)]
pub struct HueSweep;

impl HueSweep {
    /// Hue in degrees for a grid position at time `time`
    pub fn hue_at(x: u32, y: u32, time: f32) -> f32 {
        (x as f32 * 10.0 + y as f32 * 10.0 + time * 20.0).rem_euclid(360.0)
    }

    /// Write the sweep into every fixture
    pub fn update(&self, pixel_map: &mut PixelMap, time: f32) {
        for fixture in pixel_map.fixtures_mut() {
            fixture.color = Color::from_hsv(Self::hue_at(fixture.x, fixture.y, time), 1.0, 1.0);
        }
    }
}

/// Constant fill
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidColor {
    /// Fill color
    pub color: Color,
}

impl SolidColor {
    /// Create a fill with the given color
    pub fn new(color: Color) -> Self {
        Self { color }
    }

    /// Set every fixture to the fill color
    pub fn update(&self, pixel_map: &mut PixelMap, _time: f32) {
        for fixture in pixel_map.fixtures_mut() {
            fixture.color = self.color;
        }
    }
}

impl Default for SolidColor {
    fn default() -> Self {
        Self::new(Color::BLUE)
    }
}
