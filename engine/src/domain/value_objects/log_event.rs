//! Log value objects
//! Events pushed to log stream subscribers and pages returned by ranged reads

use serde::{Deserialize, Serialize};

/// One event of a live log stream
///
/// Serialized as `{"type": "...", "content": "..."}`; heartbeats carry no content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogStreamEvent {
    /// Whole file at subscription time
    Initial { content: String },
    /// Bytes written since the previous event
    Append { content: String },
    /// File shrank (cleared or rotated): full new content
    Replace { content: String },
    Heartbeat,
}

impl LogStreamEvent {
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Initial { content } | Self::Append { content } | Self::Replace { content } => {
                Some(content)
            }
            Self::Heartbeat => None,
        }
    }
}

/// A byte range of a log file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogChunk {
    pub content: String,
    pub offset: u64,
    pub next_offset: u64,
    /// File size when the chunk was read
    pub size: u64,
}

impl LogChunk {
    pub fn empty(offset: u64, size: u64) -> Self {
        Self {
            content: String::new(),
            offset,
            next_offset: offset,
            size,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.next_offset >= self.size
    }
}
