//! KinetPlayer Core - Lighting Domain Model
//!
//! This crate contains the core domain model for KinetPlayer, including:
//! - Colors and DMX conversion
//! - Fixtures and the pixel map (grid topology + DMX addressing)
//! - Show manifest structures
//! - Color strategies (hue sweep, solid fill, sparkle)
//! - Bitmap sampling from video frames onto fixtures
//! - Logging configuration

#![warn(missing_docs)]

use thiserror::Error;

pub mod color;
pub mod effects;
pub mod fixture;
pub mod logging;
pub mod manifest;
pub mod pixel_map;
pub mod sampler;

// --- Re-exports grouped by category ---

// Addressing model
pub use color::Color;
pub use fixture::{Fixture, CHANNELS_PER_FIXTURE, DMX_UNIVERSE_SIZE};
pub use pixel_map::{ColorSnapshot, FixtureColor, PixelMap, UniverseFrame};

// Show description
pub use manifest::{
    CropRect, DmxInfo, FixtureDefinition, MediaTransform, PixelDefinition, PlaybackSettings,
    ShowManifest,
};

// Rendering
pub use effects::{ColorStrategy, EffectKind, HueSweep, SolidColor, Sparkle};
pub use sampler::BitmapSampler;

// Logging
pub use logging::LogConfig;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// A color string could not be parsed
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Unknown color strategy name
    #[error("Unknown effect: {0}")]
    UnknownEffect(String),

    /// I/O error (log directory handling)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::InvalidColor("#12".to_string());
        assert_eq!(err.to_string(), "Invalid color: #12");
    }
}
