//! Normalized RGBA color used as the per-fixture state.

use crate::{CoreError, Result};
use palette::{FromColor, Hsv, Srgb};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A color with normalized components in `[0, 1]`.
///
/// Only red, green and blue reach the wire. Alpha is carried for strategies
/// that fade (sparkle) and for snapshot readers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Color {
    /// Opaque black
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    /// Fully off (black with zero alpha)
    pub const OFF: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };
    /// Opaque white
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    /// Opaque red
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    /// Opaque green
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    /// Opaque blue
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);

    /// Opaque color from normalized components
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Opaque color from 8-bit components
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Opaque color from HSV (hue in degrees, saturation and value in `[0, 1]`)
    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let hsv: Hsv = Hsv::new(hue, saturation, value);
        let rgb: Srgb = Srgb::from_color(hsv);
        Self::rgb(rgb.red, rgb.green, rgb.blue)
    }

    /// Same color with a different alpha
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// DMX bytes for red, green and blue: `round(c * 255)` per component.
    pub fn to_dmx(self) -> [u8; 3] {
        [to_dmx_level(self.r), to_dmx_level(self.g), to_dmx_level(self.b)]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

fn to_dmx_level(component: f32) -> u8 {
    (component.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl FromStr for Color {
    type Err = CoreError;

    /// Parses `#RRGGBB` / `RRGGBB` hex, or one of the names
    /// `black`, `white`, `red`, `green`, `blue`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "black" => return Ok(Self::BLACK),
            "white" => return Ok(Self::WHITE),
            "red" => return Ok(Self::RED),
            "green" => return Ok(Self::GREEN),
            "blue" => return Ok(Self::BLUE),
            _ => {}
        }

        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(CoreError::InvalidColor(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| CoreError::InvalidColor(s.to_string()))
        };
        Ok(Self::from_rgb8(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.to_dmx();
        write!(f, "#{:02X}{:02X}{:02X}", r, g, b)
    }
}
