//! Error types for the control system
use thiserror::Error;

/// Control system errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// Destination host could not be resolved
    #[error("Failed to resolve {host}: {reason}")]
    Resolve {
        /// Host name or address that was looked up
        host: String,
        /// Resolver message
        reason: String,
    },

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
