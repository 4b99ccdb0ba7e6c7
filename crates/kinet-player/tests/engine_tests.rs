use kinet_control::{KinetSender, ProtocolVersion, KINET_MAGIC};
use kinet_core::{Color, ColorStrategy, PixelMap, SolidColor};
use kinet_media::{FrameSource, TestPatternDecoder, VideoDecoder, VideoFrameSource};
use kinet_player::{Engine, EngineSettings};
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;

const TIMEOUT: Duration = Duration::from_secs(5);

async fn receiver() -> (UdpSocket, u16) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = socket.local_addr().unwrap().port();
    (socket, port)
}

async fn recv(socket: &UdpSocket) -> Vec<u8> {
    let mut buf = vec![0u8; 2048];
    let (len, _) = tokio::time::timeout(TIMEOUT, socket.recv_from(&mut buf))
        .await
        .expect("timed out waiting for packet")
        .unwrap();
    buf.truncate(len);
    buf
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

fn settings() -> EngineSettings {
    EngineSettings {
        tick_interval: Duration::from_millis(5),
        ..EngineSettings::default()
    }
}

fn solid_engine(grid: PixelMap, color: Color, port: u16, settings: EngineSettings) -> Engine {
    Engine::with_sources(
        grid,
        ColorStrategy::Solid(SolidColor::new(color)),
        FrameSource::None,
        KinetSender::with_port("127.0.0.1", port),
        settings,
    )
}

#[tokio::test]
async fn test_one_packet_per_universe_in_order() {
    let (rx, port) = receiver().await;
    // 200 fixtures: 170 in universe 4, 30 in universe 5
    let engine = solid_engine(PixelMap::create_grid(20, 10, 4), Color::RED, port, settings());

    engine.start().unwrap();
    let first = recv(&rx).await;
    let second = recv(&rx).await;
    engine.stop().await;

    assert_eq!(u32_at(&first, 0), KINET_MAGIC);
    assert_eq!(u32_at(&first, 20), 4);
    assert_eq!(u32_at(&second, 20), 5);

    assert_eq!(first.len(), 24 + 512);
    assert_eq!(first[24..27], [255, 0, 0]);
    assert_eq!(first[24 + 507..24 + 510], [255, 0, 0]);
    assert_eq!(first[24 + 510..], [0, 0]);

    assert_eq!(second[24 + 87..24 + 90], [255, 0, 0]);
    assert_eq!(second[24 + 90], 0);
}

#[tokio::test]
async fn test_v2_packets_with_sequence() {
    let (rx, port) = receiver().await;
    let engine = solid_engine(
        PixelMap::create_grid(1, 1, 2),
        Color::GREEN,
        port,
        EngineSettings {
            protocol: ProtocolVersion::V2,
            increment_sequence: true,
            ..settings()
        },
    );

    engine.start().unwrap();
    let first = recv(&rx).await;
    let second = recv(&rx).await;
    engine.stop().await;

    assert_eq!(first.len(), 26 + 512);
    assert_eq!(u32_at(&first, 12), 2);
    assert_eq!(first[22..25], [0, 255, 0]);
    assert_eq!(u32_at(&first, 8), 0);
    assert_eq!(u32_at(&second, 8), 1);
}

#[tokio::test]
async fn test_stop_twice_leaves_nothing_running() {
    let (rx, port) = receiver().await;
    let engine = solid_engine(PixelMap::create_grid(2, 2, 0), Color::BLUE, port, settings());

    engine.start().unwrap();
    assert!(engine.is_running());
    recv(&rx).await;

    engine.stop().await;
    engine.stop().await;

    assert!(!engine.is_running());
    assert!(!engine.has_task());
    assert!(!engine.has_open_socket());

    // Restartable after stop
    engine.start().unwrap();
    recv(&rx).await;
    engine.stop().await;
    assert!(!engine.has_open_socket());
}

#[tokio::test]
async fn test_start_is_noop_when_running() {
    let (_rx, port) = receiver().await;
    let engine = solid_engine(PixelMap::create_grid(1, 1, 0), Color::WHITE, port, settings());

    engine.start().unwrap();
    engine.start().unwrap();
    assert!(engine.is_running());
    engine.stop().await;
}

#[tokio::test]
async fn test_snapshot_and_stats() {
    let (rx, port) = receiver().await;
    let engine = solid_engine(PixelMap::create_grid(3, 1, 0), Color::RED, port, settings());
    assert_eq!(engine.snapshot().fixtures.len(), 3);

    engine.start().unwrap();
    recv(&rx).await;
    recv(&rx).await;
    engine.stop().await;

    let snapshot = engine.snapshot();
    assert_eq!((snapshot.width, snapshot.height), (3, 1));
    assert!(snapshot.fixtures.iter().all(|f| f.color == Color::RED));

    let stats = engine.stats();
    assert!(stats.ticks >= 2);
    assert!(stats.packets_sent >= 2);
    assert_eq!(stats.frames_sampled, 0);
    assert!(engine.time() > 0.0);
}

#[tokio::test]
async fn test_unresolvable_destination_keeps_ticking() {
    let engine = Engine::with_sources(
        PixelMap::create_grid(1, 1, 0),
        ColorStrategy::default(),
        FrameSource::None,
        KinetSender::with_port("kinet-controller.invalid", 6038),
        settings(),
    );

    engine.start().unwrap();
    let deadline = Instant::now() + TIMEOUT;
    while engine.stats().send_failures < 2 {
        assert!(Instant::now() < deadline, "engine stopped ticking");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(engine.is_running());
    engine.stop().await;
    assert_eq!(engine.stats().packets_sent, 0);
}

#[tokio::test]
async fn test_video_frames_replace_strategy() {
    let (rx, port) = receiver().await;
    let video = VideoFrameSource::with_opener("pattern", 2, 1, || {
        Ok(Box::new(TestPatternDecoder::solid(4, 2, [0, 0, 255, 255], 10, 100.0))
            as Box<dyn VideoDecoder>)
    });
    let engine = Engine::with_sources(
        PixelMap::create_grid(2, 1, 0),
        ColorStrategy::Solid(SolidColor::new(Color::RED)),
        FrameSource::Video(video.clone()),
        KinetSender::with_port("127.0.0.1", port),
        settings(),
    );

    engine.start().unwrap();
    assert!(video.is_running());

    // Red until the decoder delivers, then blue
    let deadline = Instant::now() + TIMEOUT;
    loop {
        let packet = recv(&rx).await;
        if packet[24..30] == [0, 0, 255, 0, 0, 255] {
            break;
        }
        assert_eq!(packet[24..27], [255, 0, 0]);
        assert!(Instant::now() < deadline, "video frames never arrived");
    }

    engine.stop().await;
    assert!(!video.is_running());
    assert!(engine.stats().frames_sampled >= 1);
}

#[tokio::test]
async fn test_stop_does_not_stall_runtime_on_slow_decoder() {
    let (_rx, port) = receiver().await;
    let video = VideoFrameSource::with_opener("slow", 2, 1, || {
        std::thread::sleep(Duration::from_millis(500));
        Ok(Box::new(TestPatternDecoder::solid(2, 1, [0, 0, 255, 255], 1, 100.0))
            as Box<dyn VideoDecoder>)
    });
    let engine = Engine::with_sources(
        PixelMap::create_grid(2, 1, 0),
        ColorStrategy::Solid(SolidColor::new(Color::RED)),
        FrameSource::Video(video.clone()),
        KinetSender::with_port("127.0.0.1", port),
        settings(),
    );

    engine.start().unwrap();
    let started = Instant::now();
    let stopped = tokio::time::timeout(Duration::from_millis(100), engine.stop()).await;

    // The decode thread is still opening, so stopping it is not done yet,
    // but the runtime stays free to fire the timeout
    assert!(stopped.is_err());
    assert!(started.elapsed() < Duration::from_millis(400));
    assert!(!engine.is_running());
    assert!(!engine.has_open_socket());

    // A second stop finishes without waiting on the first join
    engine.stop().await;
    assert!(!engine.has_task());
}
