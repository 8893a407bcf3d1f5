use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dissector::LayerSummary;

pub type SubscriberId = Uuid;

/// Serialized message as handed to subscriber channels; shared, never re-encoded per subscriber.
pub type Payload = Arc<str>;

/// Per-frame summary pushed to every subscriber.
///
/// Wire form: `{"Id": 0, "Capas": "[Ethernet IPv4 TCP]"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    #[serde(rename = "Id")]
    pub id: u64,
    #[serde(rename = "Capas")]
    pub capas: String,
}

impl BroadcastMessage {
    pub fn new(id: u64, summary: &LayerSummary) -> Self {
        Self {
            id,
            capas: summary.capas(),
        }
    }
}

/// Outcome of one publish, for logging and tests. Never an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub evicted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let msg = BroadcastMessage {
            id: 0,
            capas: "[Ethernet IPv4 TCP]".into(),
        };
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"Id":0,"Capas":"[Ethernet IPv4 TCP]"}"#
        );
    }
}
