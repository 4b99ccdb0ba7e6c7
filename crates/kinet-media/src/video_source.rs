//! Looping video source sampled by the engine
//!
//! A background thread decodes frames at the media's own rate and keeps only
//! the latest one. The engine asks for that frame once per tick, scaled to the
//! pixel map's size.

use crate::{DecodedFrame, MediaError, Result, VideoDecoder};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use parking_lot::Mutex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Creates a decoder on the decode thread
pub type DecoderOpener = dyn Fn() -> Result<Box<dyn VideoDecoder>> + Send + Sync;

/// Bounds for the decode pacing interval
const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(1);
const MAX_FRAME_INTERVAL: Duration = Duration::from_secs(1);

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

struct Inner {
    name: String,
    width: u32,
    height: u32,
    opener: Arc<DecoderOpener>,
    latest: Arc<Mutex<Option<Arc<DecodedFrame>>>>,
    worker: Mutex<Option<Worker>>,
}

/// Continuously looping decoded media, sized for one pixel map.
///
/// Cloning yields another handle to the same source.
#[derive(Clone)]
pub struct VideoFrameSource {
    inner: Arc<Inner>,
}

impl VideoFrameSource {
    /// Source for a media path, opened with [`crate::open_path`].
    ///
    /// The media is opened once on the calling thread, so a missing,
    /// unsupported or corrupt file fails here rather than on the decode
    /// thread.
    pub fn open<P: AsRef<Path>>(path: P, width: u32, height: u32) -> Result<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let name = path.display().to_string();
        let source = Self::with_opener(name, width, height, move || crate::open_path(&path));
        source.verify()?;
        Ok(source)
    }

    /// Source backed by a custom decoder factory.
    ///
    /// The factory runs on the decode thread each time the source starts.
    pub fn with_opener<F>(name: impl Into<String>, width: u32, height: u32, opener: F) -> Self
    where
        F: Fn() -> Result<Box<dyn VideoDecoder>> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                width: width.max(1),
                height: height.max(1),
                opener: Arc::new(opener),
                latest: Arc::new(Mutex::new(None)),
                worker: Mutex::new(None),
            }),
        }
    }

    /// Output size of [`current_frame`](Self::current_frame)
    pub fn target_size(&self) -> (u32, u32) {
        (self.inner.width, self.inner.height)
    }

    /// Open and drop one decoder on the calling thread, returning the media
    /// resolution. Blocks for as long as the opener does.
    pub fn verify(&self) -> Result<(u32, u32)> {
        let opener: &DecoderOpener = &*self.inner.opener;
        let decoder = opener()?;
        let resolution = decoder.resolution();
        debug!(
            "Verified {}: {}x{} at {:.2} fps",
            self.inner.name,
            resolution.0,
            resolution.1,
            decoder.fps()
        );
        Ok(resolution)
    }

    /// Whether the decode thread is running
    pub fn is_running(&self) -> bool {
        self.inner.worker.lock().is_some()
    }

    /// Whether a frame has been decoded since the last start
    pub fn is_ready(&self) -> bool {
        self.inner.latest.lock().is_some()
    }

    /// Start decoding in the background.
    ///
    /// Returns immediately. Frames become available once the decoder has
    /// opened and produced its first frame; until then
    /// [`current_frame`](Self::current_frame) returns `None`.
    pub fn start(&self) -> Result<()> {
        let mut worker = self.inner.worker.lock();
        if worker.is_some() {
            return Ok(());
        }

        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let opener = Arc::clone(&self.inner.opener);
        let latest = Arc::clone(&self.inner.latest);
        let name = self.inner.name.clone();

        let handle = std::thread::Builder::new()
            .name("kinet-video-decode".to_string())
            .spawn(move || decode_loop(&name, opener.as_ref(), &latest, &stop_rx))
            .map_err(|e| MediaError::DecoderError(format!("Failed to spawn decode thread: {}", e)))?;

        info!("Video source started: {}", self.inner.name);
        *worker = Some(Worker { stop_tx, handle });
        Ok(())
    }

    /// Stop decoding and drop the latest frame. Safe to call repeatedly.
    ///
    /// Joins the decode thread, so this blocks until a pending open or
    /// decode returns. Async callers should run it on a blocking pool.
    pub fn stop(&self) {
        let worker = self.inner.worker.lock().take();
        if let Some(Worker { stop_tx, handle }) = worker {
            // Disconnecting wakes the thread out of its pacing wait
            drop(stop_tx);
            if handle.join().is_err() {
                error!("Video decode thread panicked: {}", self.inner.name);
            }
            *self.inner.latest.lock() = None;
            info!("Video source stopped: {}", self.inner.name);
        }
    }

    /// Latest frame scaled to the target size, if one is ready.
    ///
    /// Scaling runs on the caller's thread and costs time proportional to
    /// the source resolution.
    pub fn current_frame(&self) -> Option<RgbaImage> {
        let frame = self.inner.latest.lock().clone()?;
        let image = match frame.to_image() {
            Some(image) => image,
            None => {
                warn!(
                    "Discarding malformed {}x{} frame from {}",
                    frame.width, frame.height, self.inner.name
                );
                return None;
            }
        };

        let (width, height) = self.target_size();
        if image.dimensions() == (width, height) {
            Some(image)
        } else {
            Some(imageops::resize(&image, width, height, FilterType::Triangle))
        }
    }
}

impl fmt::Debug for VideoFrameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoFrameSource")
            .field("name", &self.inner.name)
            .field("width", &self.inner.width)
            .field("height", &self.inner.height)
            .field("running", &self.is_running())
            .finish()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(Worker { stop_tx, handle }) = self.worker.get_mut().take() {
            drop(stop_tx);
            let _ = handle.join();
        }
    }
}

fn frame_interval(fps: f64) -> Duration {
    if fps.is_finite() && fps > 0.0 {
        Duration::from_secs_f64(1.0 / fps).clamp(MIN_FRAME_INTERVAL, MAX_FRAME_INTERVAL)
    } else {
        Duration::from_millis(33)
    }
}

fn decode_loop(
    name: &str,
    opener: &DecoderOpener,
    latest: &Mutex<Option<Arc<DecodedFrame>>>,
    stop_rx: &Receiver<()>,
) {
    let mut decoder = match opener() {
        Ok(decoder) => decoder,
        Err(e) => {
            error!("Failed to open video source {}: {}", name, e);
            return;
        }
    };

    let interval = frame_interval(decoder.fps());
    let mut decoded_since_rewind = 0usize;
    debug!(
        "Decoding {} at {:?} per frame ({}x{})",
        name,
        interval,
        decoder.resolution().0,
        decoder.resolution().1
    );

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                *latest.lock() = Some(Arc::new(frame));
                decoded_since_rewind += 1;
            }
            Err(MediaError::EndOfStream) => {
                if decoded_since_rewind == 0 {
                    warn!("Video source {} produced no frames; holding last frame", name);
                    return;
                }
                debug!("Looping video source {}", name);
                if let Err(e) = decoder.seek(Duration::ZERO) {
                    error!("Failed to rewind video source {}: {}", name, e);
                    return;
                }
                decoded_since_rewind = 0;
                continue;
            }
            Err(e) => {
                error!("Video decode failed for {}: {}", name, e);
                return;
            }
        }

        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_interval_bounds() {
        assert_eq!(frame_interval(10.0), Duration::from_millis(100));
        assert_eq!(frame_interval(0.0), Duration::from_millis(33));
        assert_eq!(frame_interval(f64::NAN), Duration::from_millis(33));
        assert_eq!(frame_interval(0.1), MAX_FRAME_INTERVAL);
    }
}
