//! Show bundle extraction and manifest parsing

use crate::error::{IoError, Result};
use kinet_core::ShowManifest;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Name of the manifest at the bundle root
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// A bundle unpacked on disk
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedShow {
    /// Parsed manifest
    pub manifest: ShowManifest,
    /// Directory the bundle was extracted to
    pub directory: PathBuf,
    /// Media named by the manifest, resolved against `directory`
    pub media_path: Option<PathBuf>,
}

impl LoadedShow {
    /// Whether the referenced media is present on disk
    pub fn media_exists(&self) -> bool {
        self.media_path.as_deref().is_some_and(Path::exists)
    }
}

/// Unpack every entry of `bundle` into `out_dir`.
///
/// Entries naming a path outside `out_dir` abort extraction with
/// [`IoError::PathTraversal`]. Files written before the offending entry are
/// left in place. Returns the number of files written.
pub fn extract_bundle(bundle: &Path, out_dir: &Path) -> Result<usize> {
    fs::create_dir_all(out_dir)?;

    let mut archive = zip::ZipArchive::new(BufReader::new(File::open(bundle)?))?;
    let mut written = 0;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| IoError::PathTraversal(entry.name().to_string()))?;
        let target = out_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        written += 1;

        debug!("Extracted {}", target.display());
    }

    info!(
        "Extracted {} files from {} into {}",
        written,
        bundle.display(),
        out_dir.display()
    );
    Ok(written)
}

/// Read `manifest.json` from an extracted bundle directory
pub fn parse_manifest(dir: &Path) -> Result<ShowManifest> {
    let path = dir.join(MANIFEST_FILE_NAME);
    if !path.is_file() {
        return Err(IoError::ManifestMissing(path));
    }

    let manifest: ShowManifest = serde_json::from_reader(BufReader::new(File::open(&path)?))?;
    info!(
        "Loaded show '{}' (v{}): {} fixtures, {} pixels",
        manifest.name,
        manifest.version,
        manifest.fixtures.len(),
        manifest.pixel_count()
    );
    Ok(manifest)
}

/// Relative form of a manifest path if it stays inside the bundle directory.
///
/// Absolute paths, drive prefixes and `..` components are rejected.
fn enclosed_path(name: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(relative)
}

/// Extract `bundle` into `out_dir` and parse its manifest.
///
/// A `mediaFile` that points outside `out_dir` fails with
/// [`IoError::PathTraversal`].
pub fn load_show(bundle: &Path, out_dir: &Path) -> Result<LoadedShow> {
    extract_bundle(bundle, out_dir)?;
    let manifest = parse_manifest(out_dir)?;

    let media_file = manifest.media_file.trim();
    let media_path = if media_file.is_empty() {
        None
    } else {
        let relative = enclosed_path(media_file)
            .ok_or_else(|| IoError::PathTraversal(media_file.to_string()))?;
        Some(out_dir.join(relative))
    };

    Ok(LoadedShow {
        manifest,
        directory: out_dir.to_path_buf(),
        media_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enclosed_path() {
        assert_eq!(
            enclosed_path("media/loop.mp4"),
            Some(PathBuf::from("media").join("loop.mp4"))
        );
        assert_eq!(enclosed_path("./loop.mp4"), Some(PathBuf::from("loop.mp4")));
        assert_eq!(enclosed_path("../loop.mp4"), None);
        assert_eq!(enclosed_path("media/../../loop.mp4"), None);
        assert_eq!(enclosed_path("/etc/passwd"), None);
    }
}
