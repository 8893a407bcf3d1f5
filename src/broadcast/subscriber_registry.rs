use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use log::{debug, info};
use tokio::sync::mpsc::{self, Receiver, Sender};
use uuid::Uuid;

use super::types::{Payload, SubscriberId};

/// Receiving side of a registration, owned by the connection that registered.
pub struct SubscriberHandle {
    pub id: SubscriberId,
    pub receiver: Receiver<Payload>,
}

/// Set of currently connected real-time clients.
///
/// Each subscriber gets a bounded channel of `backlog` messages. The registry
/// keeps the sending halves; the connection keeps the [`SubscriberHandle`].
pub struct SubscriberRegistry {
    subscribers: Mutex<HashMap<SubscriberId, Sender<Payload>>>,
    backlog: usize,
}

impl SubscriberRegistry {
    pub fn new(backlog: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            backlog: backlog.max(1),
        }
    }

    pub fn register(&self) -> SubscriberHandle {
        let (tx, rx) = mpsc::channel(self.backlog);
        let id = Uuid::new_v4();
        let count = {
            let mut subs = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
            subs.insert(id, tx);
            subs.len()
        };
        info!("Subscriber {} registered ({} connected)", id, count);
        SubscriberHandle { id, receiver: rx }
    }

    /// Removes a subscriber. Returns `true` only for the call that actually removed it.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let (removed, count) = {
            let mut subs = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
            (subs.remove(&id).is_some(), subs.len())
        };
        if removed {
            info!("Subscriber {} unregistered ({} connected)", id, count);
        } else {
            debug!("Subscriber {} already unregistered", id);
        }
        removed
    }

    /// Applies `f` to a snapshot of the registered subscribers.
    ///
    /// The lock is released before `f` runs, so `f` may register or
    /// unregister subscribers itself.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(SubscriberId, &Sender<Payload>),
    {
        let snapshot: Vec<(SubscriberId, Sender<Payload>)> = {
            let subs = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
            subs.iter().map(|(id, tx)| (*id, tx.clone())).collect()
        };
        for (id, tx) in &snapshot {
            f(*id, tx);
        }
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
