//! The lighting engine: a fixed-delay loop that renders fixture colors and
//! streams one KiNET packet per universe each tick.
//!
//! Each tick:
//! 1. Take a frame from the [`FrameSource`]; sample it onto the fixtures, or
//!    run the [`ColorStrategy`] when there is no frame.
//! 2. Publish a [`ColorSnapshot`] for readers on other threads.
//! 3. Pack universes in first-seen order and send them one after another.
//! 4. Advance strategy time by a fixed step and sleep for the tick interval.
//!
//! The sleep is a fixed delay after the work, so under load the effective
//! rate drops rather than catching up.

use crate::config::EngineConfig;
use crate::{PlayerError, Result};
use arc_swap::ArcSwap;
use image::RgbaImage;
use kinet_control::{KinetPacket, KinetSender, ProtocolVersion};
use kinet_core::{BitmapSampler, ColorSnapshot, ColorStrategy, PixelMap};
use kinet_media::FrameSource;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Loop settings, resolved from [`EngineConfig`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub tick_interval: Duration,
    pub time_step: f32,
    pub protocol: ProtocolVersion,
    pub increment_sequence: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EngineSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            time_step: config.time_step,
            protocol: config.protocol,
            increment_sequence: config.increment_sequence,
        }
    }
}

/// Counters since the engine was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Completed render passes
    pub ticks: u64,
    /// Packets handed to the socket
    pub packets_sent: u64,
    /// Packets dropped by resolution or socket errors
    pub send_failures: u64,
    /// Ticks rendered from a media frame
    pub frames_sampled: u64,
    /// Ticks rendered by the color strategy
    pub strategy_ticks: u64,
}

#[derive(Default)]
struct Counters {
    ticks: AtomicU64,
    packets_sent: AtomicU64,
    send_failures: AtomicU64,
    frames_sampled: AtomicU64,
    strategy_ticks: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn read(&self) -> EngineStats {
        EngineStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            frames_sampled: self.frames_sampled.load(Ordering::Relaxed),
            strategy_ticks: self.strategy_ticks.load(Ordering::Relaxed),
        }
    }
}

/// Mutable per-run state. Locked only around the synchronous render step,
/// never across an await.
struct TickState {
    pixel_map: PixelMap,
    strategy: ColorStrategy,
    time: f32,
    sequences: HashMap<u32, u32>,
}

/// Everything the loop task needs, shared with the [`Engine`] handle
struct Shared {
    state: Mutex<TickState>,
    sender: KinetSender,
    frame_source: FrameSource,
    settings: EngineSettings,
    running: AtomicBool,
    snapshot: ArcSwap<ColorSnapshot>,
    counters: Counters,
}

/// Real-time lighting engine for one pixel map and one destination
pub struct Engine {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// Engine rendering `pixel_map` to `sender` with the default hue sweep
    /// and no media
    pub fn new(pixel_map: PixelMap, sender: KinetSender, settings: EngineSettings) -> Self {
        Self::with_sources(
            pixel_map,
            ColorStrategy::default(),
            FrameSource::None,
            sender,
            settings,
        )
    }

    /// Engine with an explicit strategy and frame source
    pub fn with_sources(
        pixel_map: PixelMap,
        strategy: ColorStrategy,
        frame_source: FrameSource,
        sender: KinetSender,
        settings: EngineSettings,
    ) -> Self {
        let snapshot = ArcSwap::from_pointee(pixel_map.snapshot());
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(TickState {
                    pixel_map,
                    strategy,
                    time: 0.0,
                    sequences: HashMap::new(),
                }),
                sender,
                frame_source,
                settings,
                running: AtomicBool::new(false),
                snapshot,
                counters: Counters::default(),
            }),
            task: Mutex::new(None),
        }
    }

    /// Start the loop on the current tokio runtime. No-op if running.
    ///
    /// Starts the frame source first; it loads in the background, and the
    /// strategy renders until its first frame arrives.
    pub fn start(&self) -> Result<()> {
        let mut task = self.task.lock();
        if task.is_some() && self.shared.running.load(Ordering::Acquire) {
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PlayerError::NoRuntime(e.to_string()))?;

        self.shared.frame_source.start()?;
        self.shared.running.store(true, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        *task = Some(runtime.spawn(run_loop(shared)));

        let state = self.shared.state.lock();
        info!(
            "Engine started: {} fixtures, strategy {}, protocol {}, destination {}:{}",
            state.pixel_map.len(),
            state.strategy.kind(),
            self.shared.settings.protocol,
            self.shared.sender.destination(),
            self.shared.sender.port()
        );
        Ok(())
    }

    /// Stop the loop and release the socket and frame source.
    ///
    /// A datagram already handed to the socket is not recalled. The decode
    /// thread is joined on the blocking pool, so a slow decoder delays this
    /// future without stalling the runtime. Safe to call repeatedly.
    pub async fn stop(&self) {
        let was_running = self.shared.running.swap(false, Ordering::AcqRel);

        let task = self.task.lock().take();
        if let Some(task) = task {
            task.abort();
            // Cancelled or finished; either way the loop no longer runs
            let _ = task.await;
        }

        self.shared.sender.close();

        if !self.shared.frame_source.is_none() {
            let source = self.shared.frame_source.clone();
            if let Err(e) = tokio::task::spawn_blocking(move || source.stop()).await {
                warn!("Failed to stop frame source: {}", e);
            }
        }

        if was_running {
            info!("Engine stopped after {} ticks", self.stats().ticks);
        }
    }

    /// Whether the loop is running
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire) && self.task.lock().is_some()
    }

    /// Whether the loop task exists (running or not yet reaped)
    pub fn has_task(&self) -> bool {
        self.task.lock().is_some()
    }

    /// Whether the transport currently holds a socket
    pub fn has_open_socket(&self) -> bool {
        self.shared.sender.has_socket()
    }

    /// Colors as of the last render
    pub fn snapshot(&self) -> Arc<ColorSnapshot> {
        self.shared.snapshot.load_full()
    }

    /// Counters so far
    pub fn stats(&self) -> EngineStats {
        self.shared.counters.read()
    }

    /// Current strategy time
    pub fn time(&self) -> f32 {
        self.shared.state.lock().time
    }

    /// Loop settings
    pub fn settings(&self) -> EngineSettings {
        self.shared.settings
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
        if self.shared.frame_source.is_none() {
            return;
        }
        let source = self.shared.frame_source.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(move || source.stop());
            }
            Err(_) => source.stop(),
        }
    }
}

async fn run_loop(shared: Arc<Shared>) {
    let interval = shared.settings.tick_interval;
    let mut failing = false;

    while shared.running.load(Ordering::Acquire) {
        let frame = shared.capture_frame().await;
        let packets = shared.render(frame);

        for packet in &packets {
            if !shared.running.load(Ordering::Acquire) {
                break;
            }
            match shared.sender.try_send(packet).await {
                Ok(_) => {
                    Counters::bump(&shared.counters.packets_sent);
                    if failing {
                        info!("KiNET output recovered");
                        failing = false;
                    }
                }
                Err(e) => {
                    Counters::bump(&shared.counters.send_failures);
                    if failing {
                        trace!("Dropped packet for universe {}: {}", packet.universe(), e);
                    } else {
                        warn!("Dropped packet for universe {}: {}", packet.universe(), e);
                        failing = true;
                    }
                }
            }
        }

        shared.advance_time();
        tokio::time::sleep(interval).await;
    }

    debug!("Engine loop exited");
}

impl Shared {
    /// Latest media frame. The rescale runs on the blocking pool.
    async fn capture_frame(&self) -> Option<RgbaImage> {
        if self.frame_source.is_none() {
            return None;
        }
        let source = self.frame_source.clone();
        match tokio::task::spawn_blocking(move || source.current_frame()).await {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Frame capture failed: {}", e);
                None
            }
        }
    }

    /// Render one tick and encode its packets
    fn render(&self, frame: Option<RgbaImage>) -> Vec<KinetPacket> {
        let mut guard = self.state.lock();
        let TickState {
            pixel_map,
            strategy,
            time,
            sequences,
        } = &mut *guard;

        match frame {
            Some(frame) => {
                BitmapSampler::sample(&frame, pixel_map.fixtures_mut());
                Counters::bump(&self.counters.frames_sampled);
            }
            None => {
                strategy.update(pixel_map, *time);
                Counters::bump(&self.counters.strategy_ticks);
            }
        }

        self.snapshot.store(Arc::new(pixel_map.snapshot()));

        let packets: Vec<KinetPacket> = pixel_map
            .pack_universes()
            .iter()
            .map(|frame| {
                let sequence = if self.settings.increment_sequence {
                    let next = sequences.entry(frame.universe).or_insert(0);
                    let current = *next;
                    *next = next.wrapping_add(1);
                    current
                } else {
                    0
                };
                KinetPacket::from_frame(self.settings.protocol, frame, sequence)
            })
            .collect();

        Counters::bump(&self.counters.ticks);
        trace!("Tick at t={:.1}: {} packets", *time, packets.len());
        packets
    }

    fn advance_time(&self) {
        self.state.lock().time += self.settings.time_step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinet_core::{Color, SolidColor};

    fn engine(settings: EngineSettings) -> Engine {
        Engine::with_sources(
            PixelMap::create_grid(2, 1, 3),
            ColorStrategy::Solid(SolidColor::new(Color::RED)),
            FrameSource::None,
            KinetSender::with_port("127.0.0.1", 9),
            settings,
        )
    }

    #[test]
    fn test_render_uses_strategy_without_frame() {
        let engine = engine(EngineSettings::default());
        let packets = engine.shared.render(None);

        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].universe(), 3);
        assert_eq!(packets[0].payload()[0..6], [255, 0, 0, 255, 0, 0]);
        assert_eq!(engine.stats().strategy_ticks, 1);
        assert_eq!(engine.snapshot().fixtures[1].color, Color::RED);
    }

    #[test]
    fn test_render_samples_frame_when_present() {
        let engine = engine(EngineSettings::default());
        let frame = RgbaImage::from_pixel(2, 1, image::Rgba([0, 0, 255, 255]));
        let packets = engine.shared.render(Some(frame));

        assert_eq!(packets[0].payload()[0..6], [0, 0, 255, 0, 0, 255]);
        let stats = engine.stats();
        assert_eq!(stats.frames_sampled, 1);
        assert_eq!(stats.strategy_ticks, 0);
    }

    #[test]
    fn test_sequence_numbers() {
        let fixed = engine(EngineSettings::default());
        fixed.shared.render(None);
        let packets = fixed.shared.render(None);
        assert_eq!(packets[0].encode()[8..12], [0, 0, 0, 0]);

        let counting = engine(EngineSettings {
            increment_sequence: true,
            ..EngineSettings::default()
        });
        counting.shared.render(None);
        let packets = counting.shared.render(None);
        assert_eq!(packets[0].encode()[8..12], [1, 0, 0, 0]);
    }

    #[test]
    fn test_time_advances_by_step() {
        let engine = engine(EngineSettings {
            time_step: 0.5,
            ..EngineSettings::default()
        });
        engine.shared.advance_time();
        engine.shared.advance_time();
        assert_eq!(engine.time(), 1.0);
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let engine = engine(EngineSettings::default());
        assert!(matches!(engine.start(), Err(PlayerError::NoRuntime(_))));
        assert!(!engine.is_running());
    }
}
