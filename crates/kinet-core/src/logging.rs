//! Logging configuration
//!
//! Describes where and how verbosely the player logs. The subscriber itself
//! is installed by the binary.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

const LOG_FILE_PREFIX: &str = "kinet-player_";
const LOG_FILE_EXTENSION: &str = "log";

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default level ("error", "warn", "info", "debug", "trace")
    pub level: String,
    /// Log to stderr
    pub console_output: bool,
    /// Log to a daily file in `log_directory`
    pub file_output: bool,
    /// Directory for log files
    pub log_directory: PathBuf,
    /// Number of log files kept; older ones are deleted at startup
    pub max_log_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_directory: PathBuf::from("logs"),
            max_log_files: 10,
        }
    }
}

impl LogConfig {
    /// Parse the configured level, falling back to INFO
    pub fn parse_level(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::INFO)
    }

    /// Create the log directory if file output is enabled
    pub fn ensure_log_directory(&self) -> Result<()> {
        if self.file_output {
            fs::create_dir_all(&self.log_directory)?;
        }
        Ok(())
    }

    /// Path of today's log file
    pub fn current_log_path(&self) -> PathBuf {
        let date = chrono::Local::now().format("%Y-%m-%d");
        self.log_directory
            .join(format!("{}{}.{}", LOG_FILE_PREFIX, date, LOG_FILE_EXTENSION))
    }

    /// Delete the oldest log files beyond `max_log_files`.
    ///
    /// Returns how many files were removed.
    pub fn cleanup_old_logs(&self) -> Result<usize> {
        if !self.log_directory.is_dir() {
            return Ok(0);
        }

        let mut logs: Vec<(std::time::SystemTime, PathBuf)> = fs::read_dir(&self.log_directory)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                let is_log = path.extension().and_then(|e| e.to_str()) == Some(LOG_FILE_EXTENSION);
                let ours = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX));
                is_log && ours
            })
            .filter_map(|path| {
                let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
                Some((modified, path))
            })
            .collect();

        if logs.len() <= self.max_log_files {
            return Ok(0);
        }

        // Newest first
        logs.sort_by(|a, b| b.0.cmp(&a.0));
        let mut removed = 0;
        for (_, path) in logs.into_iter().skip(self.max_log_files) {
            fs::remove_file(&path)?;
            removed += 1;
        }
        Ok(removed)
    }
}
