//! Still image and animated GIF decoders
//!
//! Both are backed by the `image` crate and decode everything up front.

use crate::{DecodedFrame, MediaError, Result, VideoDecoder};
use image::{AnimationDecoder, RgbaImage};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// File extensions handled by [`StillImageDecoder`]
pub const STILL_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "webp"];

/// Upper bound on GIF frames held in memory
pub const MAX_GIF_FRAMES: usize = 500;

/// Frame delay used when a GIF frame declares none
const DEFAULT_GIF_DELAY: Duration = Duration::from_millis(100);

pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(MediaError::FileOpen(format!(
            "File not found: {}",
            path.display()
        )))
    }
}

/// A single image played as a one-frame video
pub struct StillImageDecoder {
    image: RgbaImage,
    has_been_read: bool,
}

impl StillImageDecoder {
    /// Load a still image from a file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        ensure_exists(path)?;

        let image = image::open(path)
            .map_err(|e| MediaError::DecoderError(format!("Failed to load image: {}", e)))?
            .to_rgba8();

        info!(
            "Still image loaded: {}x{} from {}",
            image.width(),
            image.height(),
            path.display()
        );

        Ok(Self {
            image,
            has_been_read: false,
        })
    }

    /// Check if the file format is supported
    pub fn supports_format<P: AsRef<Path>>(path: P) -> bool {
        has_extension(path.as_ref(), STILL_IMAGE_EXTENSIONS)
    }
}

impl VideoDecoder for StillImageDecoder {
    fn next_frame(&mut self) -> Result<DecodedFrame> {
        if self.has_been_read {
            return Err(MediaError::EndOfStream);
        }
        self.has_been_read = true;

        Ok(DecodedFrame {
            data: self.image.as_raw().clone(),
            width: self.image.width(),
            height: self.image.height(),
            pts: Duration::ZERO,
        })
    }

    fn seek(&mut self, _timestamp: Duration) -> Result<()> {
        self.has_been_read = false;
        Ok(())
    }

    fn duration(&self) -> Duration {
        Duration::ZERO
    }

    fn resolution(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn fps(&self) -> f64 {
        1.0
    }
}

/// Animated GIF, frame by frame with the file's own delays
pub struct GifDecoder {
    frames: Vec<(RgbaImage, Duration)>,
    current_frame: usize,
    current_time: Duration,
    total_duration: Duration,
}

impl GifDecoder {
    /// Load an animated GIF from a file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        ensure_exists(path)?;

        let file = std::fs::File::open(path)
            .map_err(|e| MediaError::FileOpen(format!("Failed to open file: {}", e)))?;
        let decoder = image::codecs::gif::GifDecoder::new(std::io::BufReader::new(file))
            .map_err(|e| MediaError::DecoderError(format!("Failed to decode GIF: {}", e)))?;

        let mut frames = Vec::new();
        let mut total_duration = Duration::ZERO;

        for frame in decoder.into_frames() {
            if frames.len() >= MAX_GIF_FRAMES {
                return Err(MediaError::DecoderError(format!(
                    "GIF has too many frames (limit {})",
                    MAX_GIF_FRAMES
                )));
            }

            let frame = frame
                .map_err(|e| MediaError::DecoderError(format!("Failed to decode frame: {}", e)))?;

            let (numer, denom) = frame.delay().numer_denom_ms();
            let delay = match Duration::from_secs_f64(numer as f64 / denom.max(1) as f64 / 1000.0) {
                d if d.is_zero() => DEFAULT_GIF_DELAY,
                d => d,
            };
            total_duration += delay;
            frames.push((frame.into_buffer(), delay));
        }

        if frames.is_empty() {
            return Err(MediaError::DecoderError("GIF has no frames".to_string()));
        }

        let decoder = Self {
            frames,
            current_frame: 0,
            current_time: Duration::ZERO,
            total_duration,
        };

        let (width, height) = decoder.resolution();
        info!(
            "GIF loaded: {}x{}, {} frames, {:.2}s from {}",
            width,
            height,
            decoder.frames.len(),
            total_duration.as_secs_f64(),
            path.display()
        );

        Ok(decoder)
    }

    /// Check if the file is a GIF
    pub fn supports_format<P: AsRef<Path>>(path: P) -> bool {
        has_extension(path.as_ref(), &["gif"])
    }

    /// Number of frames in the animation
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl VideoDecoder for GifDecoder {
    fn next_frame(&mut self) -> Result<DecodedFrame> {
        if self.current_frame >= self.frames.len() {
            return Err(MediaError::EndOfStream);
        }

        let (image, delay) = &self.frames[self.current_frame];
        let frame = DecodedFrame {
            data: image.as_raw().clone(),
            width: image.width(),
            height: image.height(),
            pts: self.current_time,
        };

        self.current_time += *delay;
        self.current_frame += 1;
        Ok(frame)
    }

    fn seek(&mut self, timestamp: Duration) -> Result<()> {
        if timestamp > self.total_duration {
            return Err(MediaError::SeekError(
                "Timestamp beyond duration".to_string(),
            ));
        }

        let mut accumulated = Duration::ZERO;
        for (index, (_, delay)) in self.frames.iter().enumerate() {
            if accumulated + *delay > timestamp {
                self.current_frame = index;
                self.current_time = accumulated;
                return Ok(());
            }
            accumulated += *delay;
        }

        self.current_frame = self.frames.len();
        self.current_time = self.total_duration;
        Ok(())
    }

    fn duration(&self) -> Duration {
        self.total_duration
    }

    fn resolution(&self) -> (u32, u32) {
        self.frames
            .first()
            .map(|(image, _)| image.dimensions())
            .unwrap_or((0, 0))
    }

    fn fps(&self) -> f64 {
        self.frames.len() as f64 / self.total_duration.as_secs_f64()
    }
}
