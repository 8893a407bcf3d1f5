//! One WebSocket subscriber connection.
//!
//! The connection registers itself, then runs two halves concurrently:
//! outbound forwards broadcast payloads from its channel to the socket,
//! inbound drains client messages, which carry nothing the server acts on.
//! Whichever half finishes first ends the connection, and the
//! [`Registration`] guard unregisters the subscriber on every exit path.

use std::fmt::Display;
use std::sync::Arc;

use futures::{Sink, SinkExt, Stream, StreamExt};
use log::{debug, info};
use warp::ws::Message;

use crate::broadcast::{SubscriberHandle, SubscriberId, SubscriberRegistry};

struct Registration {
    id: SubscriberId,
    registry: Arc<SubscriberRegistry>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}

pub async fn serve_subscriber<Tx, Rx, E>(registry: Arc<SubscriberRegistry>, mut ws_tx: Tx, mut ws_rx: Rx)
where
    Tx: Sink<Message> + Unpin,
    Tx::Error: Display,
    Rx: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let SubscriberHandle { id, mut receiver } = registry.register();
    let _registration = Registration {
        id,
        registry: Arc::clone(&registry),
    };

    let outbound = async {
        while let Some(payload) = receiver.recv().await {
            if let Err(e) = ws_tx.send(Message::text(payload.to_string())).await {
                debug!("Subscriber {} write failed: {}", id, e);
                break;
            }
        }
    };

    let inbound = async {
        while let Some(result) = ws_rx.next().await {
            match result {
                Ok(msg) if msg.is_close() => break,
                Ok(msg) => match msg.to_str() {
                    Ok(text) => debug!("Subscriber {} says: {}", id, text),
                    Err(_) => debug!("Subscriber {} sent a non-text message", id),
                },
                Err(e) => {
                    debug!("Subscriber {} read failed: {}", id, e);
                    break;
                }
            }
        }
    };

    tokio::select! {
        _ = outbound => {},
        _ = inbound => {},
    }

    info!("Subscriber {} connection closed", id);
}
