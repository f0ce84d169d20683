use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events emitted by the services after their transaction commits. Dispatch
/// is fire-and-forget: a consumer failure never propagates back into the
/// request that produced the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// A buyer finalized a basket into a placed order.
    OrderPlaced { order_id: Uuid, user_id: Uuid },
    /// A vendor feed replaced a shop's listings.
    FeedImported { shop_id: Uuid, listings: u64 },
    /// A vendor toggled its shop's visibility.
    ShopStateChanged { shop_id: Uuid, active: bool },
    /// Basket contents changed (add/update/remove).
    BasketChanged { order_id: Uuid },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("failed to send event: {e}"))
    }

    /// Send an event, logging instead of failing when the channel is closed
    /// or full. Used on every post-commit publish path.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("dropping event: {e}");
        }
    }
}

/// Consumer seam for order-placement notifications. The production
/// implementation hands the event to the external notification pipeline;
/// tests substitute their own.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn order_placed(&self, order_id: Uuid, user_id: Uuid) -> Result<(), String>;
}

/// Default notifier: records the event in the log stream. Actual delivery
/// (email etc.) belongs to the external notification service.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn order_placed(&self, order_id: Uuid, user_id: Uuid) -> Result<(), String> {
        info!(%order_id, %user_id, "order placed, notifying buyer");
        Ok(())
    }
}

/// Drains the event channel and distributes events to the notifier.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, notifier: std::sync::Arc<dyn Notifier>) {
    info!("starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::OrderPlaced { order_id, user_id } => {
                if let Err(e) = notifier.order_placed(order_id, user_id).await {
                    error!(%order_id, "notifier failed: {e}");
                }
            }
            Event::FeedImported { shop_id, listings } => {
                info!(%shop_id, listings, "feed import committed");
            }
            Event::ShopStateChanged { shop_id, active } => {
                info!(%shop_id, active, "shop visibility changed");
            }
            Event::BasketChanged { order_id } => {
                tracing::debug!(%order_id, "basket contents changed");
            }
        }
    }

    info!("event channel closed, stopping event processing loop");
}
