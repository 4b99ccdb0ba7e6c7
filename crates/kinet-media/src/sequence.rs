//! Image sequence decoder (directory of numbered frames)

use crate::image_decoder::{has_extension, STILL_IMAGE_EXTENSIONS};
use crate::{DecodedFrame, MediaError, Result, VideoDecoder};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Maximum number of frames to load in a sequence
#[cfg(not(test))]
pub const MAX_SEQUENCE_FRAMES: usize = 5000;
#[cfg(test)]
pub const MAX_SEQUENCE_FRAMES: usize = 10;

/// Frame rate used for sequences unless one is given
pub const DEFAULT_SEQUENCE_FPS: f64 = 30.0;

/// Directory of images played back in file-name order at a fixed rate.
///
/// Frames are read from disk lazily, one at a time.
pub struct ImageSequenceDecoder {
    frames: Vec<PathBuf>,
    width: u32,
    height: u32,
    fps: f64,
    current_frame: usize,
}

impl ImageSequenceDecoder {
    /// Scan `directory` (non-recursively) for supported images
    pub fn open<P: AsRef<Path>>(directory: P, fps: f64) -> Result<Self> {
        let directory = directory.as_ref();

        if !directory.is_dir() {
            return Err(MediaError::FileOpen(format!(
                "Not a directory: {}",
                directory.display()
            )));
        }
        if fps <= 0.0 {
            return Err(MediaError::DecoderError(format!("Invalid frame rate {}", fps)));
        }

        let mut frames = Vec::new();
        for entry in WalkDir::new(directory)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !Self::is_supported_image(path) {
                continue;
            }
            if frames.len() >= MAX_SEQUENCE_FRAMES {
                warn!(
                    "Image sequence exceeded limit of {} frames. Truncating sequence from {}",
                    MAX_SEQUENCE_FRAMES,
                    directory.display()
                );
                break;
            }
            frames.push(path.to_path_buf());
        }

        let first = frames.first().ok_or_else(|| {
            MediaError::DecoderError(format!(
                "No image files found in directory: {}",
                directory.display()
            ))
        })?;

        let (width, height) = image::image_dimensions(first)
            .map_err(|e| MediaError::DecoderError(format!("Failed to read first frame: {}", e)))?;

        info!(
            "Image sequence loaded: {}x{}, {} frames @ {:.2} fps from {}",
            width,
            height,
            frames.len(),
            fps,
            directory.display()
        );

        Ok(Self {
            frames,
            width,
            height,
            fps,
            current_frame: 0,
        })
    }

    /// Number of frames found
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn is_supported_image(path: &Path) -> bool {
        has_extension(path, STILL_IMAGE_EXTENSIONS)
    }

    fn load(&self, index: usize) -> Result<RgbaImage> {
        let image = image::open(&self.frames[index])
            .map_err(|e| MediaError::DecoderError(format!("Failed to load frame: {}", e)))?
            .to_rgba8();

        // Odd-sized frames are fitted to the first frame's size
        if image.dimensions() != (self.width, self.height) {
            return Ok(image::imageops::resize(
                &image,
                self.width,
                self.height,
                image::imageops::FilterType::Triangle,
            ));
        }
        Ok(image)
    }
}

impl VideoDecoder for ImageSequenceDecoder {
    fn next_frame(&mut self) -> Result<DecodedFrame> {
        if self.current_frame >= self.frames.len() {
            return Err(MediaError::EndOfStream);
        }

        let image = self.load(self.current_frame)?;
        let pts = Duration::from_secs_f64(self.current_frame as f64 / self.fps);
        self.current_frame += 1;

        Ok(DecodedFrame {
            data: image.into_raw(),
            width: self.width,
            height: self.height,
            pts,
        })
    }

    fn seek(&mut self, timestamp: Duration) -> Result<()> {
        if timestamp > self.duration() {
            return Err(MediaError::SeekError(
                "Timestamp beyond duration".to_string(),
            ));
        }
        let index = (timestamp.as_secs_f64() * self.fps) as usize;
        self.current_frame = index.min(self.frames.len());
        Ok(())
    }

    fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames.len() as f64 / self.fps)
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
    use image::Rgba;

    fn write_frames(dir: &Path, count: usize) {
        for i in 0..count {
            let shade = (i * 20) as u8;
            RgbaImage::from_pixel(2, 2, Rgba([shade, 0, 0, 255]))
                .save(dir.join(format!("frame_{:03}.png", i)))
                .unwrap();
        }
    }

    #[test]
    fn test_is_supported_image() {
        assert!(ImageSequenceDecoder::is_supported_image(Path::new(
            "frame001.png"
        )));
        assert!(!ImageSequenceDecoder::is_supported_image(Path::new(
            "frame001.mp4"
        )));
    }

    #[test]
    fn test_frames_play_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 3);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut decoder = ImageSequenceDecoder::open(dir.path(), 10.0).unwrap();
        assert_eq!(decoder.frame_count(), 3);
        assert_eq!(decoder.resolution(), (2, 2));

        let reds: Vec<u8> = (0..3)
            .map(|_| decoder.next_frame().unwrap().data[0])
            .collect();
        assert_eq!(reds, vec![0, 20, 40]);
        assert!(matches!(
            decoder.next_frame(),
            Err(MediaError::EndOfStream)
        ));
    }

    #[test]
    fn test_sequence_truncated_at_limit() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), MAX_SEQUENCE_FRAMES + 2);

        let decoder = ImageSequenceDecoder::open(dir.path(), 30.0).unwrap();
        assert_eq!(decoder.frame_count(), MAX_SEQUENCE_FRAMES);
    }

    #[test]
    fn test_empty_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageSequenceDecoder::open(dir.path(), 30.0).is_err());
    }
}
