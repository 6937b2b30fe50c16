use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the services.
///
/// Events are observational: every state change is already committed by
/// the time its event is sent, so consumers never affect request
/// outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Account events
    UserRegistered(Uuid),

    // Catalog events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),

    // Cart events
    CartItemAdded {
        cart_id: Uuid,
        product_id: Uuid,
    },
    CartItemUpdated {
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    CartItemRemoved {
        cart_id: Uuid,
        product_id: Uuid,
    },
    CartCleared(Uuid),

    // Order events
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderCancelled(Uuid),

    // Payment events
    PaymentInitiated {
        order_id: Uuid,
        transaction_id: Uuid,
    },
    PaymentConfirmed {
        order_id: Uuid,
        transaction_id: Uuid,
    },
    PaymentFailed {
        order_id: Uuid,
        transaction_id: Uuid,
    },
    PaymentRefunded {
        order_id: Uuid,
        transaction_id: Uuid,
    },

    // Warehouse events
    StockMovementRecorded {
        warehouse_id: Uuid,
        product_id: Uuid,
        direction: String,
        quantity: i32,
    },

    // Review events
    ReviewSubmitted {
        product_id: Uuid,
        buyer_id: Uuid,
        rating: i32,
    },

    // Verification events
    OtpSent(Uuid),
    PhoneVerified(Uuid),
    VerificationSubmitted(Uuid),
    VerificationReviewed { user_id: Uuid, approved: bool },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging failure instead of returning it. State
    /// changes are committed before their events are sent, so a full or
    /// closed channel must not fail the request.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping event: {}", e);
        }
    }
}

/// Processes incoming events until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        counter!("farmconnect_events.processed", 1);

        match event {
            Event::OrderCreated(order_id) => {
                info!(order_id = %order_id, "Order created");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(
                    order_id = %order_id,
                    from = %old_status,
                    to = %new_status,
                    "Order status changed"
                );
            }
            Event::OrderCancelled(order_id) => {
                info!(order_id = %order_id, "Order cancelled");
            }
            Event::PaymentConfirmed {
                order_id,
                transaction_id,
            } => {
                info!(
                    order_id = %order_id,
                    transaction_id = %transaction_id,
                    "Payment confirmed"
                );
            }
            Event::PaymentFailed {
                order_id,
                transaction_id,
            } => {
                warn!(
                    order_id = %order_id,
                    transaction_id = %transaction_id,
                    "Payment failed"
                );
            }
            Event::StockMovementRecorded {
                warehouse_id,
                product_id,
                direction,
                quantity,
            } => {
                info!(
                    warehouse_id = %warehouse_id,
                    product_id = %product_id,
                    direction = %direction,
                    quantity = quantity,
                    "Stock movement recorded"
                );
            }
            Event::VerificationReviewed { user_id, approved } => {
                info!(
                    user_id = %user_id,
                    approved = approved,
                    "Farmer verification reviewed"
                );
            }
            other => {
                info!("Event: {:?}", other);
            }
        }
    }

    warn!("Event processing loop has ended");
}
