//! Real-time fan-out of per-packet summaries.
//!
//! - `subscriber_registry`: connected clients and their bounded channels.
//! - `hub`: best-effort delivery with eviction of broken subscribers.
//! - `types`: the wire message and identifiers.

pub mod hub;
pub mod subscriber_registry;
pub mod types;

pub use hub::BroadcastHub;
pub use subscriber_registry::{SubscriberHandle, SubscriberRegistry};
pub use types::{BroadcastMessage, Payload, PublishReport, SubscriberId};
