//! KinetPlayer I/O - show bundles
//!
//! A show bundle (`.kshow`) is a zip archive holding `manifest.json` and the
//! media it references. This crate unpacks bundles into a working directory
//! and reads the manifest back as a [`kinet_core::ShowManifest`].

pub mod bundle;
pub mod error;

pub use bundle::{extract_bundle, load_show, parse_manifest, LoadedShow, MANIFEST_FILE_NAME};
pub use error::{IoError, Result};
