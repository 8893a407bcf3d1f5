//! On-demand detail queries.
//!
//! The query path reads a stored frame and runs the dissector on it again.
//! It takes read locks only and never touches the live broadcast path.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

use crate::capture::types::LinkType;
use crate::dissector::{self, Layer};
use crate::error_handling::types::QueryError;
use crate::storage::PacketStore;

/// Full per-layer breakdown of one stored frame.
///
/// `Display` renders the human-readable, line-oriented form served to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedDetail {
    pub id: u64,
    pub captured_at: DateTime<Utc>,
    pub link_type: LinkType,
    pub captured_len: usize,
    pub original_len: u32,
    pub layers: Vec<Layer>,
}

impl DecodedDetail {
    pub fn tags(&self) -> Vec<&'static str> {
        self.layers.iter().filter_map(Layer::tag).collect()
    }
}

impl fmt::Display for DecodedDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Packet {}", self.id)?;
        writeln!(f, "\tCaptured at: {}", self.captured_at.to_rfc3339())?;
        writeln!(f, "\tLink type: {}", self.link_type)?;
        writeln!(
            f,
            "\tLength: {} bytes captured, {} on the wire",
            self.captured_len, self.original_len
        )?;
        for layer in &self.layers {
            write!(f, "{}", layer)?;
        }
        Ok(())
    }
}

pub struct QueryService {
    store: Arc<dyn PacketStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn PacketStore>) -> Self {
        Self { store }
    }

    /// Re-decodes the frame stored under `id`.
    ///
    /// # Errors
    ///
    /// [`QueryError::NotFound`] when `id` was never assigned or has been evicted.
    pub fn describe(&self, id: u64) -> Result<DecodedDetail, QueryError> {
        let frame = self.store.get(id)?;
        let summary = dissector::decode(&frame.raw_bytes, frame.link_type);
        debug!("Described packet {} as {}", id, summary.capas());

        Ok(DecodedDetail {
            id: frame.id,
            captured_at: frame.captured_at,
            link_type: frame.link_type,
            captured_len: frame.raw_bytes.len(),
            original_len: frame.original_len,
            layers: summary.into_layers(),
        })
    }
}
