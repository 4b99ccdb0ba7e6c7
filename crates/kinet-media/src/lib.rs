//! KinetPlayer Media - frame sources for the lighting engine
//!
//! This crate turns show media into frames the engine can sample:
//! - Decoder abstraction with still image, GIF, image sequence and test
//!   pattern decoders
//! - Video files via FFmpeg (`ffmpeg` feature)
//! - A looping background-decoded [`VideoFrameSource`]
//! - [`FrameSource`], the engine's choice between no media and video

use image::RgbaImage;
use std::path::Path;
use thiserror::Error;

pub mod decoder;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg_decoder;
pub mod image_decoder;
pub mod sequence;
pub mod video_source;

pub use decoder::{DecodedFrame, TestPatternDecoder, VideoDecoder};
#[cfg(feature = "ffmpeg")]
pub use ffmpeg_decoder::FFmpegDecoder;
pub use image_decoder::{GifDecoder, StillImageDecoder};
pub use sequence::ImageSequenceDecoder;
pub use video_source::VideoFrameSource;

/// Media errors
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Failed to open file: {0}")]
    FileOpen(String),

    #[error("Unsupported media format: {0}")]
    UnsupportedFormat(String),

    #[error("No video stream found")]
    NoVideoStream,

    #[error("Decoder error: {0}")]
    DecoderError(String),

    #[error("End of stream")]
    EndOfStream,

    #[error("Seek error: {0}")]
    SeekError(String),
}

/// Result type for media operations
pub type Result<T> = std::result::Result<T, MediaError>;

/// Open a media file or image sequence
///
/// The decoder is picked from the path:
/// - A directory is an image sequence at [`sequence::DEFAULT_SEQUENCE_FPS`].
/// - `.gif` uses [`GifDecoder`].
/// - Still image extensions use [`StillImageDecoder`].
/// - Anything else goes to FFmpeg when the `ffmpeg` feature is enabled.
pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Box<dyn VideoDecoder>> {
    let path = path.as_ref();

    if path.is_dir() {
        let decoder = ImageSequenceDecoder::open(path, sequence::DEFAULT_SEQUENCE_FPS)?;
        return Ok(Box::new(decoder));
    }

    if !path.exists() {
        return Err(MediaError::FileOpen(format!(
            "File not found: {}",
            path.display()
        )));
    }

    if GifDecoder::supports_format(path) {
        return Ok(Box::new(GifDecoder::open(path)?));
    }
    if StillImageDecoder::supports_format(path) {
        return Ok(Box::new(StillImageDecoder::open(path)?));
    }

    open_video(path)
}

#[cfg(feature = "ffmpeg")]
fn open_video(path: &Path) -> Result<Box<dyn VideoDecoder>> {
    Ok(Box::new(FFmpegDecoder::open(path)?))
}

#[cfg(not(feature = "ffmpeg"))]
fn open_video(path: &Path) -> Result<Box<dyn VideoDecoder>> {
    Err(MediaError::UnsupportedFormat(format!(
        "{} (video playback requires the `ffmpeg` feature)",
        path.display()
    )))
}

/// Where the engine gets frames from
#[derive(Debug, Clone, Default)]
pub enum FrameSource {
    /// No media; the color strategy renders every tick
    #[default]
    None,
    /// Sampled video
    Video(VideoFrameSource),
}

impl FrameSource {
    /// Whether there is media attached
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Begin producing frames. Does not block.
    pub fn start(&self) -> Result<()> {
        match self {
            Self::None => Ok(()),
            Self::Video(source) => source.start(),
        }
    }

    /// Stop producing frames
    pub fn stop(&self) {
        if let Self::Video(source) = self {
            source.stop();
        }
    }

    /// Current frame sized to the pixel map, if one is available
    pub fn current_frame(&self) -> Option<RgbaImage> {
        match self {
            Self::None => None,
            Self::Video(source) => source.current_frame(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_path_missing_file() {
        assert!(matches!(
            open_path("/nonexistent/show.mp4"),
            Err(MediaError::FileOpen(_))
        ));
    }

    #[test]
    fn test_none_source_has_no_frames() {
        let source = FrameSource::default();
        assert!(source.is_none());
        source.start().unwrap();
        assert!(source.current_frame().is_none());
        source.stop();
    }

    #[test]
    fn test_open_path_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let still = dir.path().join("frame.png");
        RgbaImage::from_pixel(4, 3, image::Rgba([1, 2, 3, 255]))
            .save(&still)
            .unwrap();

        let decoder = open_path(&still).unwrap();
        assert_eq!(decoder.resolution(), (4, 3));

        let sequence = open_path(dir.path()).unwrap();
        assert_eq!(sequence.fps(), sequence::DEFAULT_SEQUENCE_FPS);
    }
}
