//! LogSink port
//! Interface for per-start log files

use crate::domain::{DomainError, LogChunk};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[async_trait]
pub trait LogSink: Send + Sync {
    /// Create a new, empty, timestamped log file for one start of `service`
    async fn create_log_file(&self, service: &str) -> Result<PathBuf, DomainError>;

    /// Path of an existing log file of `service`, validating the caller-supplied file name
    fn log_path(&self, service: &str, file: &str) -> Result<PathBuf, DomainError>;

    /// Append text to a log file
    async fn append(&self, path: &Path, text: &str) -> Result<(), DomainError>;

    /// Truncate a log file in place
    async fn clear(&self, path: &Path) -> Result<(), DomainError>;

    /// Log file names of `service`, newest first; empty when none were ever written
    async fn list(&self, service: &str) -> Result<Vec<String>, DomainError>;

    /// Whole file content; a missing file reads as empty
    async fn read(&self, path: &Path) -> Result<String, DomainError>;

    /// Up to `limit` bytes starting at `offset`
    async fn read_range(&self, path: &Path, offset: u64, limit: u64)
        -> Result<LogChunk, DomainError>;

    /// Last `max_bytes` bytes of the file
    async fn tail(&self, path: &Path, max_bytes: u64) -> Result<String, DomainError>;
}
