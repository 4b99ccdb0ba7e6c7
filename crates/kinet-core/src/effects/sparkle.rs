use crate::{Color, PixelMap};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Alpha multiplier applied each tick while a fixture is still lit
pub const DECAY_FACTOR: f32 = 0.9;

/// At or below this alpha a fixture snaps to [`Color::OFF`]
pub const OFF_THRESHOLD: f32 = 0.05;

/// Per-fixture, per-tick chance of igniting to full white
pub const IGNITE_PROBABILITY: f32 = 0.02;

/// Random white flashes that fade out.
///
/// Each tick every fixture first decays, then independently ignites with
/// [`IGNITE_PROBABILITY`]. The random source is owned by the effect so it can
/// be seeded.
#[derive(Debug, Clone)]
pub struct Sparkle {
    rng: StdRng,
}

impl Sparkle {
    /// Sparkle seeded from the thread-local random source
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Sparkle with a fixed seed, for reproducible output
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// One decay step for a single color.
    ///
    /// Lit colors lose 10% alpha; anything at or below the threshold is
    /// forced fully off rather than left to approach zero.
    pub fn decay(color: Color) -> Color {
        if color.a > OFF_THRESHOLD {
            color.with_alpha(color.a * DECAY_FACTOR)
        } else {
            Color::OFF
        }
    }

    /// Decay, then maybe ignite, every fixture
    pub fn update(&mut self, pixel_map: &mut PixelMap, _time: f32) {
        for fixture in pixel_map.fixtures_mut() {
            fixture.color = Self::decay(fixture.color);
            if self.rng.random::<f32>() < IGNITE_PROBABILITY {
                fixture.color = Color::WHITE;
            }
        }
    }
}

impl Default for Sparkle {
    fn default() -> Self {
        Self::new()
    }
}
