//! Change notifications layered over the shared store.
//!
//! Every write through a [`StoreHandle`] is broadcast to all *other*
//! attached contexts; the writing context never receives its own
//! notification. Delivery is best effort (lagging receivers skip old
//! events), which is why the display side also polls.

use crate::error::Result;
use crate::storage::SharedStore;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Broadcast channel capacity. Enough for burst handling without memory
/// bloat; only the latest state matters to a renderer.
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct Notification {
    origin: Uuid,
    pub key: String,
    /// `None` when the key was removed.
    pub value: Option<String>,
}

/// Owner of one shared store plus its notification channel. Each window-like
/// context attaches its own [`StoreHandle`].
pub struct StoreHub {
    store: Arc<SharedStore>,
    sender: broadcast::Sender<Notification>,
}

impl StoreHub {
    pub fn new(store: SharedStore) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            store: Arc::new(store),
            sender,
        }
    }

    /// Attach a new context. Each handle gets its own identity so its writes
    /// are never echoed back to it.
    pub fn attach(&self) -> StoreHandle {
        StoreHandle {
            context_id: Uuid::new_v4(),
            store: self.store.clone(),
            sender: self.sender.clone(),
        }
    }
}

/// One context's view of the shared store: durable reads/writes plus
/// change notifications to everyone else.
#[derive(Clone)]
pub struct StoreHandle {
    context_id: Uuid,
    store: Arc<SharedStore>,
    sender: broadcast::Sender<Notification>,
}

impl StoreHandle {
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.store.set(key, value).await?;
        let _ = self.sender.send(Notification {
            origin: self.context_id,
            key: key.to_string(),
            value: Some(value.to_string()),
        });
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        self.store.get(key).await
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        self.store.remove(key).await?;
        let _ = self.sender.send(Notification {
            origin: self.context_id,
            key: key.to_string(),
            value: None,
        });
        Ok(())
    }

    /// Subscribe to changes made by other contexts. Drop the subscription on
    /// teardown; a forgotten receiver only makes the channel lag.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.sender.subscribe(),
            own: self.context_id,
        }
    }
}

pub struct Subscription {
    rx: broadcast::Receiver<Notification>,
    own: Uuid,
}

impl Subscription {
    /// Next notification from another context, or `None` once the hub and
    /// all handles are gone.
    pub async fn recv(&mut self) -> Option<(String, Option<String>)> {
        loop {
            match self.rx.recv().await {
                Ok(n) if n.origin == self.own => continue,
                Ok(n) => return Some((n.key, n.value)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("notification subscription lagged, skipped {}", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
