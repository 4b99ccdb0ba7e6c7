//! KinetPlayer - streams lighting shows to KiNET fixture controllers
//!
//! The player ties the workspace together: a show bundle (or a procedural
//! grid) becomes a [`PixelMap`](kinet_core::PixelMap), media becomes a
//! [`FrameSource`](kinet_media::FrameSource), and the [`Engine`] renders and
//! sends one packet per universe every tick.

use thiserror::Error;

pub mod config;
pub mod engine;
pub mod logging_setup;

pub use config::PlayerConfig;
pub use engine::{Engine, EngineSettings, EngineStats};

/// Player errors
#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Media error: {0}")]
    Media(#[from] kinet_media::MediaError),

    #[error("No tokio runtime: {0}")]
    NoRuntime(String),
}

/// Result type for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;
