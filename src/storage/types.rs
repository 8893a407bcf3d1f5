use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::capture::types::LinkType;

/// A frame as retained by the packet store. Immutable once inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    pub id: u64,
    pub raw_bytes: Arc<[u8]>,
    pub link_type: LinkType,
    pub captured_at: DateTime<Utc>,
    pub original_len: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Identifier the next insert will receive, equal to the number of frames ever inserted.
    pub next_id: u64,
    pub retained: usize,
    pub evicted: u64,
}
