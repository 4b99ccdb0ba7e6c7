//! Error types for show bundle handling.

use std::path::PathBuf;

/// Result type alias for bundle operations.
pub type Result<T> = std::result::Result<T, IoError>;

/// Errors raised while unpacking or reading a show bundle.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The bundle is not a readable zip archive
    #[error("Invalid bundle archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// `manifest.json` is not valid show JSON
    #[error("Invalid manifest: {0}")]
    Json(#[from] serde_json::Error),

    /// The extracted bundle has no `manifest.json`
    #[error("Manifest not found: {0}")]
    ManifestMissing(PathBuf),

    /// An archive entry or the manifest's media file points outside the
    /// output directory
    #[error("Path escapes output directory: {0}")]
    PathTraversal(String),
}
