//! Storage subsystem
//!
//! This module provides the packet store: the append-only registry that maps
//! sequential identifiers to the raw bytes of captured frames.
//!
//! Components:
//! - `storage_trait`: the PacketStore trait defining a uniform API.
//! - `types`: the stored frame and store statistics.
//! - `memory_store`: RwLock-guarded in-memory ring with bounded retention.

pub mod memory_store;
pub mod storage_trait;
pub mod types;

pub use memory_store::MemoryStore;
pub use storage_trait::PacketStore;
pub use types::{CapturedFrame, StoreStats};
