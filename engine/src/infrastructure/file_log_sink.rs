//! File log sink
//!
//! Layout: `<root>/<service>/<service>-<UTC timestamp>.log`, one file per start.
//! Timestamps are ISO 8601 with milliseconds, `:` and `.` replaced by `-`, so names sort
//! chronologically.

use crate::constants::logs::LOG_EXTENSION;
use crate::domain::ports::LogSink;
use crate::domain::{DomainError, LogChunk};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::debug;

/// Attempts at a unique name when two starts land in the same millisecond
const MAX_NAME_ATTEMPTS: u32 = 100;

pub struct FileLogSink {
    root: PathBuf,
}

impl FileLogSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn service_dir(&self, service: &str) -> Result<PathBuf, DomainError> {
        validate_segment(service)?;
        Ok(self.root.join(service))
    }
}

/// Reject names that could escape the log root
fn validate_segment(name: &str) -> Result<(), DomainError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(DomainError::InvalidLogFile(name.to_string()));
    }
    Ok(())
}

fn validate_file_name(file: &str) -> Result<(), DomainError> {
    validate_segment(file)?;
    let has_extension = Path::new(file)
        .extension()
        .map_or(false, |ext| ext == LOG_EXTENSION);
    if !has_extension || file.contains("..") {
        return Err(DomainError::InvalidLogFile(file.to_string()));
    }
    Ok(())
}

fn timestamp() -> String {
    Utc::now()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

#[async_trait]
impl LogSink for FileLogSink {
    async fn create_log_file(&self, service: &str) -> Result<PathBuf, DomainError> {
        let dir = self.service_dir(service)?;
        fs::create_dir_all(&dir).await?;

        let stem = format!("{}-{}", service, timestamp());
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = match attempt {
                0 => format!("{}.{}", stem, LOG_EXTENSION),
                n => format!("{}-{}.{}", stem, n, LOG_EXTENSION),
            };
            let path = dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(_) => {
                    debug!(service = %service, log_file = %path.display(), "Log file created");
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::Io(format!(
            "could not allocate a log file name for {}",
            service
        )))
    }

    fn log_path(&self, service: &str, file: &str) -> Result<PathBuf, DomainError> {
        validate_file_name(file)?;
        Ok(self.service_dir(service)?.join(file))
    }

    async fn append(&self, path: &Path, text: &str) -> Result<(), DomainError> {
        let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn clear(&self, path: &Path) -> Result<(), DomainError> {
        OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    DomainError::Io(format!("log file not found: {}", path.display()))
                }
                _ => e.into(),
            })?;
        Ok(())
    }

    async fn list(&self, service: &str) -> Result<Vec<String>, DomainError> {
        let dir = self.service_dir(service)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if validate_file_name(&name).is_ok() {
                names.push(name);
            }
        }
        names.sort_unstable_by(|a, b| b.cmp(a));
        Ok(names)
    }

    async fn read(&self, path: &Path) -> Result<String, DomainError> {
        match fs::read(path).await {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_range(
        &self,
        path: &Path,
        offset: u64,
        limit: u64,
    ) -> Result<LogChunk, DomainError> {
        let mut file = match fs::File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LogChunk::empty(0, 0)),
            Err(e) => return Err(e.into()),
        };
        let size = file.metadata().await?.len();
        let start = offset.min(size);
        if start == size || limit == 0 {
            return Ok(LogChunk::empty(start, size));
        }

        file.seek(SeekFrom::Start(start)).await?;
        let mut bytes = Vec::new();
        file.take(limit).read_to_end(&mut bytes).await?;

        Ok(LogChunk {
            content: String::from_utf8_lossy(&bytes).into_owned(),
            offset: start,
            next_offset: start + bytes.len() as u64,
            size,
        })
    }

    async fn tail(&self, path: &Path, max_bytes: u64) -> Result<String, DomainError> {
        let size = match fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(String::new()),
            Err(e) => return Err(e.into()),
        };
        let chunk = self
            .read_range(path, size.saturating_sub(max_bytes), max_bytes)
            .await?;
        Ok(chunk.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink() -> (tempfile::TempDir, FileLogSink) {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileLogSink::new(dir.path());
        (dir, sink)
    }

    #[tokio::test]
    async fn test_create_log_file_layout() {
        let (dir, sink) = sink();

        let path = sink.create_log_file("redis").await.unwrap();

        assert_eq!(path.parent().unwrap(), dir.path().join("redis"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("redis-"));
        assert!(name.ends_with("Z.log"), "unexpected name {}", name);
        assert!(!name.contains(':'));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[tokio::test]
    async fn test_same_millisecond_starts_get_distinct_files() {
        let (_dir, sink) = sink();

        let mut paths = Vec::new();
        for _ in 0..5 {
            paths.push(sink.create_log_file("api").await.unwrap());
        }
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 5);
    }

    #[tokio::test]
    async fn test_list_newest_first_and_missing_dir_is_empty() {
        let (dir, sink) = sink();
        assert!(sink.list("api").await.unwrap().is_empty());

        let api_dir = dir.path().join("api");
        std::fs::create_dir_all(&api_dir).unwrap();
        std::fs::write(api_dir.join("api-2024-01-01T00-00-00-000Z.log"), "").unwrap();
        std::fs::write(api_dir.join("api-2024-03-01T00-00-00-000Z.log"), "").unwrap();
        std::fs::write(api_dir.join("notes.txt"), "").unwrap();

        assert_eq!(
            sink.list("api").await.unwrap(),
            vec![
                "api-2024-03-01T00-00-00-000Z.log".to_string(),
                "api-2024-01-01T00-00-00-000Z.log".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_append_read_clear() {
        let (_dir, sink) = sink();
        let path = sink.create_log_file("api").await.unwrap();

        sink.append(&path, "one\n").await.unwrap();
        sink.append(&path, "two\n").await.unwrap();
        assert_eq!(sink.read(&path).await.unwrap(), "one\ntwo\n");

        sink.clear(&path).await.unwrap();
        assert_eq!(sink.read(&path).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let (dir, sink) = sink();
        assert_eq!(sink.read(&dir.path().join("gone.log")).await.unwrap(), "");
        assert!(sink.clear(&dir.path().join("gone.log")).await.is_err());
    }

    #[tokio::test]
    async fn test_read_range_and_tail() {
        let (_dir, sink) = sink();
        let path = sink.create_log_file("api").await.unwrap();
        sink.append(&path, "0123456789").await.unwrap();

        let page = sink.read_range(&path, 2, 3).await.unwrap();
        assert_eq!(page.content, "234");
        assert_eq!(page.next_offset, 5);
        assert_eq!(page.size, 10);
        assert!(!page.is_eof());

        let past_end = sink.read_range(&path, 50, 3).await.unwrap();
        assert_eq!(past_end.content, "");
        assert_eq!(past_end.offset, 10);
        assert!(past_end.is_eof());

        assert_eq!(sink.tail(&path, 4).await.unwrap(), "6789");
        assert_eq!(sink.tail(&path, 100).await.unwrap(), "0123456789");
    }

    #[test]
    fn test_log_path_validation() {
        let sink = FileLogSink::new("/var/log/devsvc");

        assert_eq!(
            sink.log_path("api", "api-1.log").unwrap(),
            PathBuf::from("/var/log/devsvc/api/api-1.log")
        );
        for bad in ["../api.log", "a/b.log", "a\\b.log", "api.txt", "..log", ""] {
            assert!(
                matches!(sink.log_path("api", bad), Err(DomainError::InvalidLogFile(_))),
                "{:?} should be rejected",
                bad
            );
        }
        assert!(sink.log_path("..", "api.log").is_err());
    }
}
