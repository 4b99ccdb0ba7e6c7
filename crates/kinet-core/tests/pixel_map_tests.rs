use kinet_core::{
    Color, DmxInfo, Fixture, FixtureDefinition, PixelDefinition, PixelMap, PlaybackSettings,
    ShowManifest,
};
use proptest::prelude::*;

fn pixel(id: &str, x: u32, y: u32, universe: u32, channel: u16) -> PixelDefinition {
    PixelDefinition {
        id: id.to_string(),
        x,
        y,
        fixture_id: "f".to_string(),
        dmx_info: DmxInfo { universe, channel },
    }
}

fn manifest(pixels: Vec<PixelDefinition>) -> ShowManifest {
    ShowManifest {
        version: 1,
        name: "test".to_string(),
        media_file: "media.mp4".to_string(),
        media_transform: None,
        fixtures: vec![FixtureDefinition {
            id: "f".to_string(),
            name: "Fixture".to_string(),
            ip: "127.0.0.1".to_string(),
            port: 0,
            protocol: "kinet-v1".to_string(),
            width: 0,
            height: 0,
            pixels,
        }],
        settings: PlaybackSettings::default(),
    }
}

#[test]
fn test_grid_rolls_over_after_170_fixtures() {
    let map = PixelMap::create_grid(20, 10, 3);
    let fixtures = map.fixtures();

    for (index, fixture) in fixtures.iter().take(170).enumerate() {
        assert_eq!(fixture.universe, 3);
        assert_eq!(fixture.channel as usize, 1 + index * 3);
    }
    assert_eq!(fixtures[169].channel, 508);
    assert_eq!(fixtures[170].universe, 4);
    assert_eq!(fixtures[170].channel, 1);
    assert_eq!(fixtures[171].channel, 4);
}

#[test]
fn test_grid_addressing_is_row_major() {
    let map = PixelMap::create_grid(3, 2, 0);
    let positions: Vec<(u32, u32)> = map.fixtures().iter().map(|f| (f.x, f.y)).collect();
    assert_eq!(positions, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
    let ids: Vec<u32> = map.fixtures().iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_empty_grid() {
    let map = PixelMap::create_grid(0, 5, 0);
    assert!(map.is_empty());
    assert!(map.pack_universes().is_empty());
}

#[test]
fn test_from_manifest_bounds() {
    let map = PixelMap::from_manifest(&manifest(vec![
        pixel("a", 0, 0, 1, 1),
        pixel("b", 4, 2, 1, 4),
        pixel("c", 2, 7, 2, 1),
    ]));

    assert_eq!(map.width(), 5);
    assert_eq!(map.height(), 8);
    assert_eq!(map.len(), 3);
    assert_eq!(map.fixtures()[2].universe, 2);
}

#[test]
fn test_from_empty_manifest_is_one_by_one() {
    let map = PixelMap::from_manifest(&manifest(Vec::new()));
    assert_eq!((map.width(), map.height()), (1, 1));
    assert!(map.is_empty());
}

#[test]
fn test_from_manifest_with_max_coordinates() {
    let map = PixelMap::from_manifest(&manifest(vec![
        pixel("a", u32::MAX, 0, 1, 1),
        pixel("b", 0, u32::MAX, 1, 4),
    ]));

    assert_eq!(map.width(), u32::MAX);
    assert_eq!(map.height(), u32::MAX);
    assert_eq!(map.len(), 2);
}

#[test]
fn test_grid_universe_saturates() {
    let map = PixelMap::create_grid(171, 1, u32::MAX);
    let fixtures = map.fixtures();

    assert_eq!(fixtures.len(), 171);
    assert_eq!(fixtures[169].universe, u32::MAX);
    assert_eq!(fixtures[170].universe, u32::MAX);
    assert_eq!(fixtures[170].channel, 1);
}

#[test]
fn test_pack_writes_rgb_at_channel_offsets() {
    let mut map = PixelMap::from_manifest(&manifest(vec![
        pixel("a", 0, 0, 1, 1),
        pixel("b", 1, 0, 1, 10),
        pixel("c", 2, 0, 5, 1),
    ]));
    map.fixtures_mut()[0].color = Color::RED;
    map.fixtures_mut()[1].color = Color::rgb(0.0, 0.5, 1.0);
    map.fixtures_mut()[2].color = Color::WHITE;

    let frames = map.pack_universes();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].universe, 1);
    assert_eq!(frames[0].data[0..3], [255, 0, 0]);
    assert_eq!(frames[0].data[9..12], [0, 128, 255]);
    assert_eq!(frames[1].universe, 5);
    assert_eq!(frames[1].data[0..3], [255, 255, 255]);
    assert!(frames[1].data[3..].iter().all(|&b| b == 0));
}

#[test]
fn test_overflowing_fixture_stays_in_topology_but_not_payload() {
    let mut map = PixelMap::from_manifest(&manifest(vec![
        pixel("ok", 0, 0, 0, 508),
        pixel("overflow", 1, 0, 0, 511),
    ]));
    for fixture in map.fixtures_mut() {
        fixture.color = Color::WHITE;
    }

    assert_eq!(map.len(), 2);
    let frames = map.pack_universes();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].data[507..510], [255, 255, 255]);
    assert_eq!(frames[0].data[510..512], [0, 0]);
}

fn arb_fixture() -> impl Strategy<Value = Fixture> {
    (0u32..4, 0u16..=520, 0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0).prop_map(
        |(universe, channel, r, g, b)| {
            let mut fixture = Fixture::new(0, 0, 0, universe, channel);
            fixture.color = Color::rgb(r, g, b);
            fixture
        },
    )
}

proptest! {
    #[test]
    fn prop_packing_matches_transmittable_fixtures(fixtures in prop::collection::vec(arb_fixture(), 0..64)) {
        let map = PixelMap::new(1, 1, fixtures.clone());
        let frames = map.pack_universes();

        // One frame per distinct universe, in first-seen order
        let mut seen = Vec::new();
        for fixture in &fixtures {
            if !seen.contains(&fixture.universe) {
                seen.push(fixture.universe);
            }
        }
        let universes: Vec<u32> = frames.iter().map(|f| f.universe).collect();
        prop_assert_eq!(universes, seen);

        // Rebuild the expected payloads with last-writer-wins per channel
        for frame in &frames {
            let mut expected = [0u8; 512];
            for fixture in fixtures.iter().filter(|f| f.universe == frame.universe) {
                if fixture.channel >= 1 && fixture.channel as usize + 2 <= 512 {
                    let start = fixture.channel as usize - 1;
                    expected[start..start + 3].copy_from_slice(&fixture.color.to_dmx());
                }
            }
            prop_assert_eq!(frame.data.to_vec(), expected.to_vec());
        }
    }
}
