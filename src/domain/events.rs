//! Order lifecycle events, published to NATS when a client is configured.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::status::OrderStatus;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StoreEvent {
    OrderPlaced { order_id: Uuid, user_id: Uuid, total: Decimal },
    OrderCancelled { order_id: Uuid, user_id: Uuid },
    ReturnRequested { order_id: Uuid, user_id: Uuid },
    StatusChanged { order_id: Uuid, status: OrderStatus },
}

impl StoreEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::OrderPlaced { .. } => "orders.placed",
            Self::OrderCancelled { .. } => "orders.cancelled",
            Self::ReturnRequested { .. } => "orders.return_requested",
            Self::StatusChanged { .. } => "orders.status_changed",
        }
    }
}

/// Fire-and-forget publish; event delivery is best-effort and never fails the
/// originating request.
pub async fn publish(nats: &Option<async_nats::Client>, event: StoreEvent) {
    let Some(client) = nats else { return };
    match serde_json::to_vec(&event) {
        Ok(payload) => {
            if let Err(e) = client.publish(event.subject(), payload.into()).await {
                tracing::warn!(subject = event.subject(), error = %e, "failed to publish event");
            }
        }
        Err(e) => tracing::warn!(error = %e, "failed to serialize event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn events_serialize_with_tag_and_subject() {
        let event = StoreEvent::OrderPlaced {
            order_id: Uuid::nil(),
            user_id: Uuid::nil(),
            total: dec!(25.00),
        };
        assert_eq!(event.subject(), "orders.placed");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "order_placed");
        assert_eq!(json["total"], "25.00");
    }
}
