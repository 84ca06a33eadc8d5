//! Service log queries
//! Listing, reading, clearing and live-tailing the log files of a service

use crate::domain::ports::LogSink;
use crate::domain::services::{LogStreamBroadcaster, LogSubscription};
use crate::domain::{DomainError, LogChunk};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub struct ServiceLogsUseCase {
    log_sink: Arc<dyn LogSink>,
    broadcaster: LogStreamBroadcaster,
}

impl ServiceLogsUseCase {
    pub fn new(log_sink: Arc<dyn LogSink>, broadcaster: LogStreamBroadcaster) -> Self {
        Self {
            log_sink,
            broadcaster,
        }
    }

    /// Log file names of a service, newest first
    pub async fn list(&self, service: &str) -> Result<Vec<String>, DomainError> {
        self.log_sink.list(service).await
    }

    pub async fn read(&self, service: &str, file: &str) -> Result<String, DomainError> {
        let path = self.log_sink.log_path(service, file)?;
        self.log_sink.read(&path).await
    }

    pub async fn read_range(
        &self,
        service: &str,
        file: &str,
        offset: u64,
        limit: u64,
    ) -> Result<LogChunk, DomainError> {
        let path = self.log_sink.log_path(service, file)?;
        self.log_sink.read_range(&path, offset, limit).await
    }

    pub async fn clear(&self, service: &str, file: &str) -> Result<(), DomainError> {
        let path = self.log_sink.log_path(service, file)?;
        self.log_sink.clear(&path).await?;
        info!(service = %service, file = %file, "Log file cleared");
        Ok(())
    }

    /// Live stream of one log file
    pub fn subscribe(&self, service: &str, file: &str) -> Result<LogSubscription, DomainError> {
        let path = self.log_sink.log_path(service, file)?;
        Ok(self.broadcaster.subscribe(path))
    }

    pub fn active_subscriptions(&self) -> usize {
        self.broadcaster.active_subscriptions()
    }

    /// Last bytes of a log file, for attaching to error reports
    pub async fn tail(&self, path: &Path, max_bytes: u64) -> Option<String> {
        match self.log_sink.tail(path, max_bytes).await {
            Ok(tail) => Some(tail),
            Err(e) => {
                debug!(log_file = %path.display(), error = %e, "Failed to read log tail");
                None
            }
        }
    }
}
