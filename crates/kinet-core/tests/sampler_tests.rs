use image::{Rgba, RgbaImage};
use kinet_core::{BitmapSampler, Color, Fixture, PixelMap};

#[test]
fn test_sample_maps_bitmap_colors_to_fixtures() {
    let mut frame = RgbaImage::new(2, 2);
    frame.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    frame.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
    frame.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
    frame.put_pixel(1, 1, Rgba([255, 255, 255, 255]));

    let mut map = PixelMap::new(
        2,
        2,
        vec![
            Fixture::new(0, 0, 0, 1, 1),
            Fixture::new(1, 1, 0, 1, 4),
            Fixture::new(2, 0, 1, 1, 7),
            Fixture::new(3, 1, 1, 1, 10),
        ],
    );

    let sampled = BitmapSampler::sample(&frame, map.fixtures_mut());

    assert_eq!(sampled, 4);
    assert_eq!(map.fixtures()[0].color, Color::RED);
    assert_eq!(map.fixtures()[1].color, Color::GREEN);
    assert_eq!(map.fixtures()[2].color, Color::BLUE);
    assert_eq!(map.fixtures()[3].color, Color::WHITE);
}

#[test]
fn test_sample_then_pack() {
    let frame = RgbaImage::from_pixel(3, 1, Rgba([10, 20, 30, 255]));
    let mut map = PixelMap::create_grid(3, 1, 0);

    BitmapSampler::sample(&frame, map.fixtures_mut());
    let frames = map.pack_universes();

    assert_eq!(frames[0].data[0..9], [10, 20, 30, 10, 20, 30, 10, 20, 30]);
}
