//! Event bus contract. Delivery is fire-and-forget from the engine's view.

use async_trait::async_trait;
use catalogue_core::{ChangeEvent, Result};
use tokio::sync::broadcast;
use tracing::debug;

#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, event: ChangeEvent) -> Result<()>;
}

/// In-process bus over a tokio broadcast channel.
pub struct BroadcastBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl BroadcastBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EventBus for BroadcastBus {
    async fn publish(&self, event: ChangeEvent) -> Result<()> {
        let topic = event.topic.clone();
        // No subscribers is not a delivery failure.
        match self.tx.send(event) {
            Ok(n) => debug!("event {} delivered to {} subscribers", topic, n),
            Err(_) => debug!("event {} had no subscribers", topic),
        }
        Ok(())
    }
}

/// Discards every event.
#[derive(Default)]
pub struct NullBus;

#[async_trait]
impl EventBus for NullBus {
    async fn publish(&self, _event: ChangeEvent) -> Result<()> {
        Ok(())
    }
}
