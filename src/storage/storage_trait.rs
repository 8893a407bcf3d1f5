//! Packet Store Trait
//!
//! This module defines the `PacketStore` trait, the interface between the
//! capture pipeline, the query service and the frame retention backend.
//!
//! Implementors are responsible for:
//! - Assigning identifiers: gapless, strictly increasing from 0, never reused
//! - Keeping the raw bytes of a frame unchanged after insertion
//! - Answering lookups for unknown or evicted identifiers with `NotFound`

use chrono::{DateTime, Utc};

use crate::capture::types::LinkType;
use crate::error_handling::types::StoreError;
use crate::storage::types::{CapturedFrame, StoreStats};

/// Append-only registry of captured frames indexed by sequential identifier.
///
/// `insert` is the only mutation. Lookups may run concurrently with it.
pub trait PacketStore: Send + Sync {
    /// Appends a frame and returns the identifier assigned to it.
    fn insert(
        &self,
        raw_bytes: Vec<u8>,
        link_type: LinkType,
        captured_at: DateTime<Utc>,
        original_len: u32,
    ) -> Result<u64, StoreError>;

    /// Retrieves a frame by identifier.
    fn get(&self, id: u64) -> Result<CapturedFrame, StoreError>;

    fn stats(&self) -> Result<StoreStats, StoreError>;
}
