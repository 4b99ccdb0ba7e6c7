//! Show manifest structures
//!
//! These mirror `manifest.json` inside a show bundle. Field names are
//! camelCase on disk.

use serde::{Deserialize, Serialize};

/// Top-level description of a packaged show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowManifest {
    /// Manifest format version
    pub version: u32,
    /// Show name
    pub name: String,
    /// Media file, relative to the bundle root
    pub media_file: String,
    /// Optional placement of the media over the grid
    #[serde(default)]
    pub media_transform: Option<MediaTransform>,
    /// Physical fixtures and their pixels
    #[serde(default)]
    pub fixtures: Vec<FixtureDefinition>,
    /// Playback settings
    #[serde(default)]
    pub settings: PlaybackSettings,
}

impl ShowManifest {
    /// Network address of the first fixture definition, if any
    pub fn primary_address(&self) -> Option<&str> {
        self.fixtures
            .iter()
            .map(|f| f.ip.as_str())
            .find(|ip| !ip.is_empty())
    }

    /// Total number of pixels across all fixture definitions
    pub fn pixel_count(&self) -> usize {
        self.fixtures.iter().map(|f| f.pixels.len()).sum()
    }
}

/// Placement of the media relative to the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaTransform {
    /// Horizontal scale factor
    pub scale_x: f32,
    /// Vertical scale factor
    pub scale_y: f32,
    /// Horizontal offset in grid cells
    pub translate_x: f32,
    /// Vertical offset in grid cells
    pub translate_y: f32,
    /// Rotation in degrees
    pub rotation: f32,
    /// Region of the media to use
    #[serde(default)]
    pub crop: Option<CropRect>,
}

/// Crop rectangle in media coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

/// One physical fixture (controller output) and its pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureDefinition {
    /// Identifier referenced by pixels
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Controller network address
    pub ip: String,
    /// Controller output port
    #[serde(default)]
    pub port: u16,
    /// Protocol tag, e.g. "kinet-v1"
    #[serde(default)]
    pub protocol: String,
    /// Width in pixels, informational
    #[serde(default)]
    pub width: u32,
    /// Height in pixels, informational
    #[serde(default)]
    pub height: u32,
    /// Pixels driven by this fixture
    #[serde(default)]
    pub pixels: Vec<PixelDefinition>,
}

/// One pixel of a fixture definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelDefinition {
    /// Pixel identifier
    pub id: String,
    /// Grid column
    pub x: u32,
    /// Grid row
    pub y: u32,
    /// Owning fixture definition
    #[serde(default)]
    pub fixture_id: String,
    /// Where the pixel's RGB channels live
    pub dmx_info: DmxInfo,
}

/// DMX address of a pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmxInfo {
    /// Logical universe
    pub universe: u32,
    /// First of three channels, 1-based
    pub channel: u16,
}

/// Playback behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSettings {
    /// Restart the media at its end
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Start playing once loaded
    pub auto_play: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            looping: true,
            auto_play: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "version": 1,
        "name": "Lobby Wall",
        "mediaFile": "wall.mp4",
        "mediaTransform": {
            "scaleX": 1.0, "scaleY": 1.0, "translateX": 0.0, "translateY": 0.0,
            "rotation": 0.0, "crop": {"x": 0, "y": 0, "width": 64, "height": 32}
        },
        "fixtures": [{
            "id": "f1", "name": "Panel A", "ip": "10.0.0.20", "port": 1,
            "protocol": "kinet-v1", "width": 2, "height": 1,
            "pixels": [
                {"id": "p1", "x": 0, "y": 0, "fixtureId": "f1", "dmxInfo": {"universe": 0, "channel": 1}},
                {"id": "p2", "x": 1, "y": 0, "fixtureId": "f1", "dmxInfo": {"universe": 0, "channel": 4}}
            ]
        }],
        "settings": {"loop": true, "autoPlay": false}
    }"#;

    #[test]
    fn test_manifest_parses_camel_case() {
        let manifest: ShowManifest = serde_json::from_str(MANIFEST).unwrap();
        assert_eq!(manifest.name, "Lobby Wall");
        assert_eq!(manifest.media_file, "wall.mp4");
        assert_eq!(manifest.pixel_count(), 2);
        assert_eq!(manifest.fixtures[0].pixels[1].dmx_info.channel, 4);
        assert!(manifest.settings.looping);
        assert!(!manifest.settings.auto_play);
        let crop = manifest.media_transform.unwrap().crop.unwrap();
        assert_eq!(crop.width, 64.0);
    }

    #[test]
    fn test_primary_address() {
        let manifest: ShowManifest = serde_json::from_str(MANIFEST).unwrap();
        assert_eq!(manifest.primary_address(), Some("10.0.0.20"));
    }

    #[test]
    fn test_negative_channel_is_rejected() {
        let bad = MANIFEST.replace("\"channel\": 4", "\"channel\": -4");
        assert!(serde_json::from_str::<ShowManifest>(&bad).is_err());
    }
}
