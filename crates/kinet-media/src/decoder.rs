//! Decoder abstraction and the synthetic test pattern source

use crate::{MediaError, Result};
use image::RgbaImage;
use std::time::Duration;

/// One decoded frame, tightly packed RGBA8
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Presentation timestamp
    pub pts: Duration,
}

impl DecodedFrame {
    /// Wrap the pixel data as an image buffer.
    ///
    /// Returns `None` if the buffer is shorter than `width * height * 4`.
    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
    }
}

/// Sequential frame decoder.
///
/// Implementations return [`MediaError::EndOfStream`] once the last frame has
/// been produced; `seek(Duration::ZERO)` rewinds. Decoders are created and
/// driven on a single thread, so they are not required to be `Send`.
pub trait VideoDecoder {
    /// Decode the next frame
    fn next_frame(&mut self) -> Result<DecodedFrame>;

    /// Reposition to `timestamp`
    fn seek(&mut self, timestamp: Duration) -> Result<()>;

    /// Total duration
    fn duration(&self) -> Duration;

    /// Frame size in pixels
    fn resolution(&self) -> (u32, u32);

    /// Nominal frame rate
    fn fps(&self) -> f64;
}

/// Decoder producing solid color frames.
///
/// Used as a media stand-in for tests and when no real media is available.
#[derive(Debug, Clone)]
pub struct TestPatternDecoder {
    width: u32,
    height: u32,
    fps: f64,
    colors: Vec<[u8; 4]>,
    frame_count: usize,
    current_frame: usize,
}

impl TestPatternDecoder {
    /// `frame_count` frames of a single color
    pub fn solid(width: u32, height: u32, color: [u8; 4], frame_count: usize, fps: f64) -> Self {
        Self::cycle(width, height, vec![color], frame_count, fps)
    }

    /// `frame_count` frames stepping through `colors` one per frame.
    ///
    /// An empty color list yields black frames.
    pub fn cycle(
        width: u32,
        height: u32,
        colors: Vec<[u8; 4]>,
        frame_count: usize,
        fps: f64,
    ) -> Self {
        let colors = if colors.is_empty() {
            vec![[0, 0, 0, 255]]
        } else {
            colors
        };
        Self {
            width,
            height,
            fps: if fps > 0.0 { fps } else { 30.0 },
            colors,
            frame_count,
            current_frame: 0,
        }
    }

    fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps)
    }
}

impl VideoDecoder for TestPatternDecoder {
    fn next_frame(&mut self) -> Result<DecodedFrame> {
        if self.current_frame >= self.frame_count {
            return Err(MediaError::EndOfStream);
        }

        let color = self.colors[self.current_frame % self.colors.len()];
        let pixels = (self.width as usize) * (self.height as usize);
        let data = color.repeat(pixels);
        let pts = self.frame_period() * self.current_frame as u32;
        self.current_frame += 1;

        Ok(DecodedFrame {
            data,
            width: self.width,
            height: self.height,
            pts,
        })
    }

    fn seek(&mut self, timestamp: Duration) -> Result<()> {
        let index = (timestamp.as_secs_f64() * self.fps) as usize;
        if index > self.frame_count {
            return Err(MediaError::SeekError(format!(
                "Frame {} beyond end ({} frames)",
                index, self.frame_count
            )));
        }
        self.current_frame = index;
        Ok(())
    }

    fn duration(&self) -> Duration {
        self.frame_period() * self.frame_count as u32
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fps(&self) -> f64 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_runs_to_end_of_stream() {
        let mut decoder = TestPatternDecoder::solid(2, 1, [255, 0, 0, 255], 2, 10.0);

        let first = decoder.next_frame().unwrap();
        assert_eq!(first.data, vec![255, 0, 0, 255, 255, 0, 0, 255]);
        assert_eq!(first.pts, Duration::ZERO);

        let second = decoder.next_frame().unwrap();
        assert_eq!(second.pts, Duration::from_millis(100));

        assert!(matches!(
            decoder.next_frame(),
            Err(MediaError::EndOfStream)
        ));

        decoder.seek(Duration::ZERO).unwrap();
        assert!(decoder.next_frame().is_ok());
    }

    #[test]
    fn test_pattern_cycles_colors() {
        let mut decoder =
            TestPatternDecoder::cycle(1, 1, vec![[1, 1, 1, 255], [2, 2, 2, 255]], 3, 30.0);
        let firsts: Vec<u8> = (0..3)
            .map(|_| decoder.next_frame().unwrap().data[0])
            .collect();
        assert_eq!(firsts, vec![1, 2, 1]);
    }

    #[test]
    fn test_frame_to_image() {
        let frame = DecodedFrame {
            data: vec![0, 255, 0, 255],
            width: 1,
            height: 1,
            pts: Duration::ZERO,
        };
        let image = frame.to_image().unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [0, 255, 0, 255]);

        let short = DecodedFrame {
            width: 2,
            ..frame
        };
        assert!(short.to_image().is_none());
    }
}
