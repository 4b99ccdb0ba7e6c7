//! A single addressable pixel with a grid position and a DMX address.

use crate::Color;
use serde::{Deserialize, Serialize};

/// Number of channels in one DMX universe
pub const DMX_UNIVERSE_SIZE: usize = 512;

/// Channels used per fixture (red, green, blue)
pub const CHANNELS_PER_FIXTURE: u16 = 3;

/// A fixture instance with a grid position, a starting DMX address and its
/// current color.
///
/// `channel` is 1-based and is the red channel; green and blue follow at
/// `channel + 1` and `channel + 2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    /// Opaque identity
    pub id: u32,
    /// Grid column
    pub x: u32,
    /// Grid row
    pub y: u32,
    /// DMX universe (port id for KiNET v2)
    pub universe: u32,
    /// First of three RGB channels (1-512)
    pub channel: u16,
    /// Current color, overwritten every tick
    #[serde(default)]
    pub color: Color,
}

impl Fixture {
    /// Create a new fixture, initially black
    pub fn new(id: u32, x: u32, y: u32, universe: u32, channel: u16) -> Self {
        Self {
            id,
            x,
            y,
            universe,
            channel,
            color: Color::BLACK,
        }
    }

    /// Get the last channel used by this fixture
    pub fn end_address(&self) -> u32 {
        self.channel as u32 + CHANNELS_PER_FIXTURE as u32 - 1
    }

    /// Whether all three channels fit inside one universe.
    ///
    /// Fixtures that fail this are never packed into a payload.
    pub fn is_transmittable(&self) -> bool {
        self.channel >= 1 && self.end_address() <= DMX_UNIVERSE_SIZE as u32
    }

    /// Write this fixture's RGB levels into a universe payload.
    ///
    /// Returns `false` (and leaves the payload untouched) when the fixture's
    /// address does not fit.
    pub fn write_rgb(&self, dmx_data: &mut [u8; DMX_UNIVERSE_SIZE]) -> bool {
        if !self.is_transmittable() {
            return false;
        }
        let start = self.channel as usize - 1;
        dmx_data[start..start + CHANNELS_PER_FIXTURE as usize].copy_from_slice(&self.color.to_dmx());
        true
    }
}
