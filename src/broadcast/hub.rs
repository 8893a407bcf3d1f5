use std::sync::Arc;

use log::{debug, error, trace, warn};
use tokio::sync::mpsc::error::TrySendError;

use super::subscriber_registry::SubscriberRegistry;
use super::types::{BroadcastMessage, Payload, PublishReport, SubscriberId};

/// Fans one message out to every registered subscriber.
///
/// Delivery is a non-blocking `try_send` per subscriber. A subscriber whose
/// channel is closed or whose backlog is full is unregistered on the spot;
/// the failure stays inside the hub.
pub struct BroadcastHub {
    registry: Arc<SubscriberRegistry>,
}

impl BroadcastHub {
    pub fn new(registry: Arc<SubscriberRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    pub fn publish(&self, message: &BroadcastMessage) -> PublishReport {
        let payload: Payload = match serde_json::to_string(message) {
            Ok(json) => Payload::from(json),
            Err(e) => {
                error!("Unable to encode broadcast for packet {}: {}", message.id, e);
                return PublishReport::default();
            }
        };

        let mut report = PublishReport::default();
        let mut failed: Vec<SubscriberId> = Vec::new();

        self.registry.for_each(|id, sender| match sender.try_send(Payload::clone(&payload)) {
            Ok(()) => report.delivered += 1,
            Err(TrySendError::Full(_)) => {
                warn!("Subscriber {} is not keeping up, dropping it", id);
                failed.push(id);
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Subscriber {} channel closed", id);
                failed.push(id);
            }
        });

        for id in failed {
            if self.registry.unregister(id) {
                report.evicted += 1;
            }
        }

        trace!(
            "Packet {} delivered to {} subscriber(s), {} evicted",
            message.id,
            report.delivered,
            report.evicted
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn message(id: u64) -> BroadcastMessage {
        BroadcastMessage {
            id,
            capas: "[Ethernet IPv4 TCP]".to_string(),
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let registry = Arc::new(SubscriberRegistry::new(8));
        let hub = BroadcastHub::new(Arc::clone(&registry));
        let mut handles: Vec<_> = (0..3).map(|_| registry.register()).collect();

        let report = hub.publish(&message(0));
        assert_eq!(report, PublishReport { delivered: 3, evicted: 0 });

        for h in handles.iter_mut() {
            let got = h.receiver.recv().await.unwrap();
            assert_eq!(&*got, r#"{"Id":0,"Capas":"[Ethernet IPv4 TCP]"}"#);
        }
    }

    #[tokio::test]
    async fn test_two_subscribers_receive_identical_payload() {
        let registry = Arc::new(SubscriberRegistry::new(8));
        let hub = BroadcastHub::new(Arc::clone(&registry));
        let mut a = registry.register();
        let mut b = registry.register();

        hub.publish(&message(0));

        let from_a = a.receiver.recv().await.unwrap();
        let from_b = b.receiver.recv().await.unwrap();
        assert_eq!(from_a, from_b);
        let decoded: BroadcastMessage = assert_ok!(serde_json::from_str(&from_a));
        assert_eq!(decoded, message(0));
    }

    #[tokio::test]
    async fn test_broken_subscriber_is_evicted_others_still_served() {
        let registry = Arc::new(SubscriberRegistry::new(8));
        let hub = BroadcastHub::new(Arc::clone(&registry));
        let mut alive: Vec<_> = (0..3).map(|_| registry.register()).collect();
        let broken = registry.register();
        let broken_id = broken.id;
        drop(broken);

        let report = hub.publish(&message(7));
        assert_eq!(report, PublishReport { delivered: 3, evicted: 1 });
        assert!(!registry.contains(broken_id));
        assert_eq!(registry.len(), 3);

        for h in alive.iter_mut() {
            assert!(h.receiver.recv().await.is_some());
        }
    }

    #[tokio::test]
    async fn test_disconnected_subscriber_no_longer_in_registry() {
        let registry = Arc::new(SubscriberRegistry::new(8));
        let hub = BroadcastHub::new(Arc::clone(&registry));
        let a = registry.register();
        let mut b = registry.register();

        registry.unregister(a.id);
        drop(a);

        let report = hub.publish(&message(1));
        assert_eq!(report.delivered, 1);
        assert_eq!(report.evicted, 0);
        let got = b.receiver.recv().await.unwrap();
        assert!(got.contains(r#""Id":1"#));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_full_backlog_evicts_slow_subscriber() {
        let registry = Arc::new(SubscriberRegistry::new(2));
        let hub = BroadcastHub::new(Arc::clone(&registry));
        let slow = registry.register();

        assert_eq!(hub.publish(&message(0)).delivered, 1);
        assert_eq!(hub.publish(&message(1)).delivered, 1);
        let report = hub.publish(&message(2));
        assert_eq!(report, PublishReport { delivered: 0, evicted: 1 });
        assert!(!registry.contains(slow.id));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let hub = BroadcastHub::new(Arc::new(SubscriberRegistry::new(1)));
        assert_eq!(hub.publish(&message(0)), PublishReport::default());
    }
}
