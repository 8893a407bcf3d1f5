use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use log::{debug, error, info};

use crate::capture::types::LinkType;
use crate::error_handling::types::StoreError;
use crate::storage::storage_trait::PacketStore;
use crate::storage::types::{CapturedFrame, StoreStats};

/// In-memory packet store with optional bounded retention.
///
/// Frames live in a ring ordered by identifier. With a non-zero `max_frames`
/// the oldest frame is dropped once the ring is full; its identifier is never
/// handed out again and looking it up yields `NotFound`.
pub struct MemoryStore {
    inner: RwLock<Ring>,
    max_frames: usize,
}

#[derive(Default)]
struct Ring {
    frames: VecDeque<CapturedFrame>,
    /// Identifier of `frames[0]`.
    first_id: u64,
    next_id: u64,
}

impl MemoryStore {
    /// `max_frames == 0` keeps every frame.
    pub fn new(max_frames: usize) -> Self {
        if max_frames == 0 {
            info!("MemoryStore initialized without a retention bound");
        } else {
            info!("MemoryStore initialized, retaining up to {} frames", max_frames);
        }
        Self {
            inner: RwLock::new(Ring::default()),
            max_frames,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0)
    }
}

impl PacketStore for MemoryStore {
    fn insert(
        &self,
        raw_bytes: Vec<u8>,
        link_type: LinkType,
        captured_at: DateTime<Utc>,
        original_len: u32,
    ) -> Result<u64, StoreError> {
        let mut ring = self.inner.write().map_err(|_| {
            error!("Packet store lock poisoned on insert");
            StoreError::LockPoisoned
        })?;

        let id = ring.next_id;
        ring.next_id += 1;
        ring.frames.push_back(CapturedFrame {
            id,
            raw_bytes: Arc::from(raw_bytes),
            link_type,
            captured_at,
            original_len,
        });

        if self.max_frames > 0 && ring.frames.len() > self.max_frames {
            if let Some(old) = ring.frames.pop_front() {
                ring.first_id = old.id + 1;
                debug!("Evicted packet {}", old.id);
            }
        }

        Ok(id)
    }

    fn get(&self, id: u64) -> Result<CapturedFrame, StoreError> {
        let ring = self.inner.read().map_err(|_| {
            error!("Packet store lock poisoned on read");
            StoreError::LockPoisoned
        })?;

        if id < ring.first_id || id >= ring.next_id {
            return Err(StoreError::NotFound(id));
        }
        ring.frames
            .get((id - ring.first_id) as usize)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let ring = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(StoreStats {
            next_id: ring.next_id,
            retained: ring.frames.len(),
            evicted: ring.first_id,
        })
    }
}
