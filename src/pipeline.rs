//! The capture pipeline.
//!
//! [`Pipeline`] owns the packet store, the broadcast hub and the query
//! service. All shared state of the program is reached through it; nothing
//! lives in globals.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use log::trace;
use serde::Serialize;

use crate::broadcast::{BroadcastHub, BroadcastMessage, SubscriberRegistry};
use crate::capture::types::{LinkType, RawFrame};
use crate::dissector;
use crate::error_handling::types::StoreError;
use crate::query::QueryService;
use crate::storage::PacketStore;

/// State of the live capture task, exposed as the operator health signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "lowercase")]
pub enum CaptureStatus {
    Starting,
    Running,
    Stopped,
    Failed(String),
}

impl fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureStatus::Starting => write!(f, "starting"),
            CaptureStatus::Running => write!(f, "running"),
            CaptureStatus::Stopped => write!(f, "stopped"),
            CaptureStatus::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub capture_status: CaptureStatus,
    pub next_id: u64,
    pub retained: usize,
    pub evicted: u64,
    pub subscribers: usize,
}

pub struct Pipeline {
    store: Arc<dyn PacketStore>,
    hub: BroadcastHub,
    query: QueryService,
    status: Mutex<CaptureStatus>,
}

impl Pipeline {
    pub fn new(store: Arc<dyn PacketStore>, registry: Arc<SubscriberRegistry>) -> Self {
        Self {
            query: QueryService::new(Arc::clone(&store)),
            hub: BroadcastHub::new(registry),
            store,
            status: Mutex::new(CaptureStatus::Starting),
        }
    }

    /// Decodes, stores and broadcasts one frame, returning its identifier.
    ///
    /// Must only be called from the capture task: it is the single writer of
    /// the store, which keeps identifier order equal to capture order.
    pub fn ingest(&self, frame: RawFrame, link_type: LinkType) -> Result<u64, StoreError> {
        let summary = dissector::decode(&frame.data, link_type);
        let id = self
            .store
            .insert(frame.data, link_type, frame.captured_at, frame.original_len)?;

        let message = BroadcastMessage::new(id, &summary);
        let report = self.hub.publish(&message);
        trace!(
            "Packet {} {} -> {} subscriber(s)",
            id,
            message.capas,
            report.delivered
        );
        Ok(id)
    }

    pub fn query(&self) -> &QueryService {
        &self.query
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        self.hub.registry()
    }

    pub fn set_status(&self, status: CaptureStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    pub fn status(&self) -> CaptureStatus {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stats(&self) -> Result<PipelineStats, StoreError> {
        let store = self.store.stats()?;
        Ok(PipelineStats {
            capture_status: self.status(),
            next_id: store.next_id,
            retained: store.retained,
            evicted: store.evicted,
            subscribers: self.registry().len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::test_utils::{tcp_frame, udp_frame};
    use chrono::Utc;

    fn pipeline() -> Pipeline {
        Pipeline::new(
            Arc::new(MemoryStore::unbounded()),
            Arc::new(SubscriberRegistry::new(16)),
        )
    }

    #[tokio::test]
    async fn test_ingest_stores_then_broadcasts() {
        let pipeline = pipeline();
        let mut a = pipeline.registry().register();
        let mut b = pipeline.registry().register();

        let id = pipeline
            .ingest(RawFrame::new(tcp_frame(&[]), Utc::now()), LinkType::Ethernet)
            .unwrap();
        assert_eq!(id, 0);

        let expected = r#"{"Id":0,"Capas":"[Ethernet IPv4 TCP]"}"#;
        assert_eq!(&*a.receiver.recv().await.unwrap(), expected);
        assert_eq!(&*b.receiver.recv().await.unwrap(), expected);
        assert!(pipeline.query().describe(0).is_ok());
    }

    #[tokio::test]
    async fn test_subscriber_leaves_between_frames() {
        let pipeline = pipeline();
        let a = pipeline.registry().register();
        let mut b = pipeline.registry().register();

        pipeline
            .ingest(RawFrame::new(tcp_frame(&[]), Utc::now()), LinkType::Ethernet)
            .unwrap();
        let a_id = a.id;
        drop(a);

        pipeline
            .ingest(RawFrame::new(udp_frame(&[]), Utc::now()), LinkType::Ethernet)
            .unwrap();

        assert!(b.receiver.recv().await.unwrap().contains(r#""Id":0"#));
        assert_eq!(
            &*b.receiver.recv().await.unwrap(),
            r#"{"Id":1,"Capas":"[Ethernet IPv4 UDP]"}"#
        );
        assert!(!pipeline.registry().contains(a_id));
    }

    #[test]
    fn test_stats_reflect_store_and_status() {
        let pipeline = pipeline();
        let _sub = pipeline.registry().register();
        pipeline
            .ingest(RawFrame::new(udp_frame(b"x"), Utc::now()), LinkType::Ethernet)
            .unwrap();
        pipeline.set_status(CaptureStatus::Running);

        let stats = pipeline.stats().unwrap();
        assert_eq!(stats.capture_status, CaptureStatus::Running);
        assert_eq!(stats.next_id, 1);
        assert_eq!(stats.retained, 1);
        assert_eq!(stats.subscribers, 1);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["capture_status"]["state"], "running");
    }
}
