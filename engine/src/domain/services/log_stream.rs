//! Log stream broadcaster
//!
//! Turns a growing log file into a stream of events: the whole file once, then only the
//! bytes added since the previous poll, a full replacement when the file shrinks, and a
//! heartbeat on a fixed cadence. Each subscription owns one polling task that ends as soon
//! as the subscriber goes away.

use crate::constants::logs::{
    STREAM_CHANNEL_CAPACITY, STREAM_HEARTBEAT_INTERVAL_MS, STREAM_POLL_INTERVAL_MS,
};
use crate::domain::LogStreamEvent;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct LogStreamConfig {
    pub poll_interval: Duration,
    pub heartbeat_interval: Duration,
    pub channel_capacity: usize,
}

impl Default for LogStreamConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(STREAM_POLL_INTERVAL_MS),
            heartbeat_interval: Duration::from_millis(STREAM_HEARTBEAT_INTERVAL_MS),
            channel_capacity: STREAM_CHANNEL_CAPACITY,
        }
    }
}

/// Spawns one polling task per subscription and counts the live ones
#[derive(Clone, Default)]
pub struct LogStreamBroadcaster {
    config: LogStreamConfig,
    active: Arc<AtomicUsize>,
}

impl LogStreamBroadcaster {
    pub fn new(config: LogStreamConfig) -> Self {
        Self {
            config,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start streaming `path`; the first event is always `Initial`
    pub fn subscribe(&self, path: PathBuf) -> LogSubscription {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let cancel = CancellationToken::new();
        let active = ActiveSubscription::register(self.active.clone());

        debug!(
            log_file = %path.display(),
            active = self.active_subscriptions(),
            "Log subscription opened"
        );
        tokio::spawn(poll_log_file(
            path,
            tx,
            cancel.clone(),
            self.config.clone(),
            active,
        ));

        LogSubscription { rx, cancel }
    }

    /// Number of polling tasks still running
    pub fn active_subscriptions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Receiving end of a subscription; dropping it stops the polling task
pub struct LogSubscription {
    rx: mpsc::Receiver<LogStreamEvent>,
    cancel: CancellationToken,
}

impl LogSubscription {
    pub async fn next(&mut self) -> Option<LogStreamEvent> {
        self.rx.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Stream for LogSubscription {
    type Item = LogStreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for LogSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct ActiveSubscription(Arc<AtomicUsize>);

impl ActiveSubscription {
    fn register(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ActiveSubscription {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn poll_log_file(
    path: PathBuf,
    tx: mpsc::Sender<LogStreamEvent>,
    cancel: CancellationToken,
    config: LogStreamConfig,
    _active: ActiveSubscription,
) {
    let mut tracker = OffsetTracker::default();
    let content = match read_from(&path, 0).await {
        Ok(bytes) => tracker.advance(bytes),
        Err(e) => {
            warn!(log_file = %path.display(), error = %e, "Failed to read log file");
            String::new()
        }
    };

    if !deliver(&tx, &cancel, LogStreamEvent::Initial { content }).await {
        return;
    }

    let now = Instant::now();
    let mut poll = interval_at(now + config.poll_interval, config.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut heartbeat = interval_at(now + config.heartbeat_interval, config.heartbeat_interval);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tx.closed() => break,
            _ = heartbeat.tick() => Some(LogStreamEvent::Heartbeat),
            _ = poll.tick() => match tracker.observe(&path).await {
                Ok(event) => event,
                Err(e) => {
                    debug!(log_file = %path.display(), error = %e, "Log poll failed");
                    None
                }
            },
        };

        if let Some(event) = event {
            if !deliver(&tx, &cancel, event).await {
                break;
            }
        }
    }

    debug!(log_file = %path.display(), "Log subscription closed");
}

async fn deliver(
    tx: &mpsc::Sender<LogStreamEvent>,
    cancel: &CancellationToken,
    event: LogStreamEvent,
) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        sent = tx.send(event) => sent.is_ok(),
    }
}

/// Read position in the file plus bytes held back because they end mid-character
#[derive(Debug, Default)]
struct OffsetTracker {
    offset: u64,
    pending: Vec<u8>,
}

impl OffsetTracker {
    /// Consume freshly read bytes and return the text that can be emitted
    fn advance(&mut self, bytes: Vec<u8>) -> String {
        self.offset += bytes.len() as u64;
        self.pending.extend_from_slice(&bytes);
        take_complete_utf8(&mut self.pending)
    }

    async fn observe(&mut self, path: &Path) -> std::io::Result<Option<LogStreamEvent>> {
        let size = file_size(path).await?;

        if size > self.offset {
            let bytes = read_from(path, self.offset).await?;
            let content = self.advance(bytes);
            Ok((!content.is_empty()).then_some(LogStreamEvent::Append { content }))
        } else if size < self.offset {
            let bytes = read_from(path, 0).await?;
            *self = Self::default();
            let content = self.advance(bytes);
            Ok(Some(LogStreamEvent::Replace { content }))
        } else {
            Ok(None)
        }
    }
}

/// Drain the longest valid UTF-8 prefix; an incomplete trailing sequence stays pending
fn take_complete_utf8(buffer: &mut Vec<u8>) -> String {
    let split = match std::str::from_utf8(buffer) {
        Ok(_) => buffer.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(_) => buffer.len(),
    };
    let rest = buffer.split_off(split);
    let text = String::from_utf8_lossy(buffer).into_owned();
    *buffer = rest;
    text
}

async fn file_size(path: &Path) -> std::io::Result<u64> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e),
    }
}

async fn read_from(path: &Path, offset: u64) -> std::io::Result<Vec<u8>> {
    let mut file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    file.seek(SeekFrom::Start(offset)).await?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).await?;
    Ok(bytes)
}
