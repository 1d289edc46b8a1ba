//! Order event publishing over NATS.

use tracing::{debug, warn};

use crate::domain::events::OrderEvent;

/// Publishes order events when a NATS client is configured. Otherwise a no-op.
#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }
    pub fn disabled() -> Self { Self { nats: None } }
    pub fn is_enabled(&self) -> bool { self.nats.is_some() }

    /// Delivery is best effort: failures are logged and never surface to the caller.
    pub async fn publish(&self, event: &OrderEvent) {
        let Some(client) = &self.nats else { return };
        let subject = event.subject();

        let payload = match serde_json::to_vec(event) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(%error, subject, "failed to encode order event");
                return;
            }
        };

        match client.publish(subject.to_string(), payload.into()).await {
            Ok(()) => debug!(subject, "published order event"),
            Err(error) => warn!(%error, subject, "failed to publish order event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::OrderStatus;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_disabled_publisher_is_noop() {
        let publisher = EventPublisher::disabled();
        assert!(!publisher.is_enabled());
        publisher
            .publish(&OrderEvent::StatusChanged { order_id: Uuid::nil(), from: OrderStatus::Paid, to: OrderStatus::Shipped })
            .await;
    }
}
