//! The pixel map: grid bounds plus the ordered fixture list.
//!
//! The fixture list (positions and addresses) is fixed once built; only
//! fixture colors change. Colors are written by one owner per tick, so the
//! map itself holds no locks. Readers on other threads should use a
//! [`ColorSnapshot`] instead of borrowing the map.

use crate::fixture::{Fixture, CHANNELS_PER_FIXTURE, DMX_UNIVERSE_SIZE};
use crate::manifest::ShowManifest;
use crate::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The entire grid of fixtures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelMap {
    width: u32,
    height: u32,
    fixtures: Vec<Fixture>,
}

/// One packed universe payload, ready for encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniverseFrame {
    /// Universe the payload belongs to
    pub universe: u32,
    /// Full 512-byte DMX payload
    pub data: [u8; DMX_UNIVERSE_SIZE],
}

impl PixelMap {
    /// Create a pixel map from explicit bounds and fixtures
    pub fn new(width: u32, height: u32, fixtures: Vec<Fixture>) -> Self {
        Self {
            width,
            height,
            fixtures,
        }
    }

    /// Build a pixel map by flattening every pixel of every fixture definition.
    ///
    /// Bounds are `max(x) + 1` by `max(y) + 1`; an empty manifest gives 1x1.
    /// Fixture ids are assigned in flattening order.
    pub fn from_manifest(manifest: &ShowManifest) -> Self {
        let fixtures: Vec<Fixture> = manifest
            .fixtures
            .iter()
            .flat_map(|definition| definition.pixels.iter())
            .enumerate()
            .map(|(index, pixel)| {
                Fixture::new(
                    index as u32,
                    pixel.x,
                    pixel.y,
                    pixel.dmx_info.universe,
                    pixel.dmx_info.channel,
                )
            })
            .collect();

        // Saturates for coordinates at u32::MAX
        let width = fixtures.iter().map(|f| f.x).max().unwrap_or(0).saturating_add(1);
        let height = fixtures.iter().map(|f| f.y).max().unwrap_or(0).saturating_add(1);

        tracing::debug!(
            "Pixel map from manifest '{}': {} fixtures, {}x{}",
            manifest.name,
            fixtures.len(),
            width,
            height
        );

        Self::new(width, height, fixtures)
    }

    /// Create a rectangular grid with sequential RGB addressing.
    ///
    /// Fixtures are laid out row by row. Addressing starts at channel 1 of
    /// `start_universe` and advances by 3; when the next fixture would not
    /// fit, the universe increments and the channel resets to 1. That gives
    /// 170 fixtures per universe (channels 1, 4, ..., 508). The universe
    /// counter saturates at `u32::MAX`.
    pub fn create_grid(width: u32, height: u32, start_universe: u32) -> Self {
        let mut fixtures = Vec::with_capacity((width as usize) * (height as usize));
        let mut universe = start_universe;
        let mut channel: u16 = 1;
        let mut id = 0u32;

        for y in 0..height {
            for x in 0..width {
                if channel as usize + CHANNELS_PER_FIXTURE as usize - 1 > DMX_UNIVERSE_SIZE {
                    universe = universe.saturating_add(1);
                    channel = 1;
                }
                fixtures.push(Fixture::new(id, x, y, universe, channel));
                id += 1;
                channel += CHANNELS_PER_FIXTURE;
            }
        }

        Self::new(width, height, fixtures)
    }

    /// Grid width (bounding box)
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height (bounding box)
    pub fn height(&self) -> u32 {
        self.height
    }

    /// All fixtures in topology order
    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// Mutable access to fixture colors.
    ///
    /// Returns a slice so the fixture set itself cannot grow or shrink.
    pub fn fixtures_mut(&mut self) -> &mut [Fixture] {
        &mut self.fixtures
    }

    /// Number of fixtures
    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    /// Whether the map has no fixtures
    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    /// Group fixture indices by universe.
    ///
    /// Universes appear in first-seen order and fixtures keep their topology
    /// order within each group. No sorting is applied.
    pub fn partition_by_universe(&self) -> Vec<(u32, Vec<usize>)> {
        let mut groups: Vec<(u32, Vec<usize>)> = Vec::new();
        let mut slots: HashMap<u32, usize> = HashMap::new();

        for (index, fixture) in self.fixtures.iter().enumerate() {
            let slot = *slots.entry(fixture.universe).or_insert_with(|| {
                groups.push((fixture.universe, Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(index);
        }

        groups
    }

    /// Pack current colors into one zeroed 512-byte payload per universe.
    ///
    /// Fixtures whose address does not fit are skipped silently.
    pub fn pack_universes(&self) -> Vec<UniverseFrame> {
        self.partition_by_universe()
            .into_iter()
            .map(|(universe, indices)| {
                let mut data = [0u8; DMX_UNIVERSE_SIZE];
                for index in indices {
                    self.fixtures[index].write_rgb(&mut data);
                }
                UniverseFrame { universe, data }
            })
            .collect()
    }

    /// Copy out the current colors for readers outside the render loop
    pub fn snapshot(&self) -> ColorSnapshot {
        ColorSnapshot {
            width: self.width,
            height: self.height,
            fixtures: self
                .fixtures
                .iter()
                .map(|f| FixtureColor {
                    x: f.x,
                    y: f.y,
                    color: f.color,
                })
                .collect(),
        }
    }
}

/// A fixture's position and color at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixtureColor {
    /// Grid column
    pub x: u32,
    /// Grid row
    pub y: u32,
    /// Color at snapshot time
    pub color: Color,
}

/// Immutable copy of all fixture colors, taken once per tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorSnapshot {
    /// Grid width
    pub width: u32,
    /// Grid height
    pub height: u32,
    /// One entry per fixture, in topology order
    pub fixtures: Vec<FixtureColor>,
}
