//! Bitmap sampling: copy frame pixels onto fixtures.

use crate::{Color, Fixture};
use image::RgbaImage;

/// Reads one frame pixel per fixture.
///
/// The frame must already be scaled to the pixel map's width and height;
/// the lookup is a direct `(x, y)` index with no interpolation.
pub struct BitmapSampler;

impl BitmapSampler {
    /// Write the frame pixel under each fixture into the fixture's color.
    ///
    /// Fixtures outside the frame keep their previous color. Returns the
    /// number of fixtures that were updated.
    pub fn sample(frame: &RgbaImage, fixtures: &mut [Fixture]) -> usize {
        let (width, height) = frame.dimensions();
        let mut sampled = 0;

        for fixture in fixtures.iter_mut() {
            if fixture.x < width && fixture.y < height {
                let [r, g, b, _] = frame.get_pixel(fixture.x, fixture.y).0;
                fixture.color = Color::from_rgb8(r, g, b);
                sampled += 1;
            }
        }

        sampled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_out_of_bounds_keeps_previous_color() {
        let frame = RgbaImage::from_pixel(1, 1, Rgba([0, 255, 0, 255]));
        let mut fixtures = vec![Fixture::new(0, 0, 0, 0, 1), Fixture::new(1, 3, 0, 0, 4)];
        fixtures[1].color = Color::RED;

        let sampled = BitmapSampler::sample(&frame, &mut fixtures);

        assert_eq!(sampled, 1);
        assert_eq!(fixtures[0].color, Color::GREEN);
        assert_eq!(fixtures[1].color, Color::RED);
    }

    #[test]
    fn test_frame_alpha_is_ignored() {
        let frame = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 0]));
        let mut fixtures = vec![Fixture::new(0, 0, 0, 0, 1)];

        BitmapSampler::sample(&frame, &mut fixtures);
        assert_eq!(fixtures[0].color, Color::RED);
    }
}
