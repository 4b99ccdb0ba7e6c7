//! Video file decoding through FFmpeg
//!
//! Frames are converted to RGBA8 at the source resolution; fitting them to
//! the pixel map happens later in [`crate::VideoFrameSource`].

use crate::{DecodedFrame, MediaError, Result, VideoDecoder};
use ffmpeg_next as ffmpeg;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

fn decoder_error(e: ffmpeg::Error) -> MediaError {
    MediaError::DecoderError(e.to_string())
}

/// Software video decoder.
///
/// Holds a scaler context, which is not `Send`; create it on the thread that
/// drives it.
pub struct FFmpegDecoder {
    input: ffmpeg::format::context::Input,
    decoder: ffmpeg::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    stream_index: usize,
    time_base: f64,
    width: u32,
    height: u32,
    fps: f64,
    duration: Duration,
    flushed: bool,
}

impl FFmpegDecoder {
    /// Open the best video stream in `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        ffmpeg::init().map_err(decoder_error)?;

        let input =
            ffmpeg::format::input(&path).map_err(|e| MediaError::FileOpen(e.to_string()))?;

        let stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or(MediaError::NoVideoStream)?;
        let stream_index = stream.index();
        let time_base = f64::from(stream.time_base());

        let rate = stream.avg_frame_rate();
        let fps = if rate.denominator() != 0 && rate.numerator() > 0 {
            f64::from(rate)
        } else {
            30.0
        };

        let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .map_err(decoder_error)?;
        let decoder = context.decoder().video().map_err(decoder_error)?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg::format::Pixel::RGBA,
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )
        .map_err(decoder_error)?;

        let duration = if input.duration() > 0 {
            Duration::from_micros(input.duration() as u64)
        } else {
            Duration::ZERO
        };

        info!(
            "Video opened: {}x{} @ {:.2} fps, {:.2}s from {}",
            width,
            height,
            fps,
            duration.as_secs_f64(),
            path.display()
        );

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            time_base,
            width,
            height,
            fps,
            duration,
            flushed: false,
        })
    }

    fn convert(&mut self, frame: &ffmpeg::frame::Video) -> Result<DecodedFrame> {
        let mut rgba = ffmpeg::frame::Video::empty();
        self.scaler.run(frame, &mut rgba).map_err(decoder_error)?;

        // Rows may be padded; copy them out tightly packed
        let row_len = self.width as usize * 4;
        let stride = rgba.stride(0);
        let plane = rgba.data(0);
        let mut data = Vec::with_capacity(row_len * self.height as usize);
        for row in 0..self.height as usize {
            let start = row * stride;
            data.extend_from_slice(&plane[start..start + row_len]);
        }

        let pts = frame
            .timestamp()
            .map(|ts| Duration::from_secs_f64((ts as f64 * self.time_base).max(0.0)))
            .unwrap_or_default();

        Ok(DecodedFrame {
            data,
            width: self.width,
            height: self.height,
            pts,
        })
    }
}

impl VideoDecoder for FFmpegDecoder {
    fn next_frame(&mut self) -> Result<DecodedFrame> {
        let mut decoded = ffmpeg::frame::Video::empty();

        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                return self.convert(&decoded);
            }
            if self.flushed {
                return Err(MediaError::EndOfStream);
            }

            let next = self
                .input
                .packets()
                .find(|(stream, _)| stream.index() == self.stream_index);

            match next {
                Some((_, packet)) => {
                    self.decoder.send_packet(&packet).map_err(decoder_error)?;
                }
                None => {
                    self.decoder.send_eof().map_err(decoder_error)?;
                    self.flushed = true;
                }
            }
        }
    }

    fn seek(&mut self, timestamp: Duration) -> Result<()> {
        let ts = (timestamp.as_secs_f64() * f64::from(ffmpeg::ffi::AV_TIME_BASE)) as i64;
        self.input
            .seek(ts, ..)
            .map_err(|e| MediaError::SeekError(e.to_string()))?;
        self.decoder.flush();
        self.flushed = false;
        debug!("Video seeked to {:.3}s", timestamp.as_secs_f64());
        Ok(())
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fps(&self) -> f64 {
        self.fps
    }
}
