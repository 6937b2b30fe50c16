use crate::{
    config::AppConfig,
    entities::{
        order::{self, OrderStatus, PaymentMethod, PaymentStatus},
        order_tracking,
        payment_transaction::{self, TransactionStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::notifications,
    validation,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

type HmacSha256 = Hmac<Sha256>;

const DEFAULT_TIMESTAMP_TOLERANCE_SECS: u64 = 300;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct InitiatePaymentInput {
    pub order_id: Uuid,
    /// Overrides the method chosen at checkout when present
    pub method: Option<PaymentMethod>,
}

/// Outcome reported by the gateway callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CallbackOutcome {
    Success,
    Failed,
}

/// Raw callback body, parsed only after the signature checks out.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CallbackPayload {
    pub provider_reference: String,
    pub status: CallbackOutcome,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CallbackAck {
    pub provider_reference: String,
    pub status: TransactionStatus,
}

/// Mobile-money payments against orders.
///
/// The gateway is a stub: `initiate` fabricates a provider reference and
/// logs the call it would make, and the provider's asynchronous answer
/// arrives through [`PaymentService::handle_callback`]. Payment status
/// changes obey [`PaymentStatus::can_transition_to`].
pub struct PaymentService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

impl PaymentService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            event_sender,
            config,
        }
    }

    /// Starts a payment attempt for the user's own order.
    #[instrument(skip(self, input), fields(order_id = %input.order_id))]
    pub async fn initiate(
        &self,
        user_id: Uuid,
        input: InitiatePaymentInput,
    ) -> Result<payment_transaction::Model, ServiceError> {
        input.validate()?;
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let found = order::Entity::find_by_id(input.order_id)
            .filter(order::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {}", input.order_id)))?;
        if !found
            .payment_status
            .can_transition_to(PaymentStatus::Processing)
        {
            return Err(ServiceError::InvalidTransition {
                from: found.payment_status.to_string(),
                to: PaymentStatus::Processing.to_string(),
            });
        }

        let method = input.method.unwrap_or(found.payment_method);
        let provider_reference = format!("MM-{}", validation::random_reference_suffix(16));

        let transaction = payment_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(found.id),
            amount: Set(found.total_amount),
            currency: Set(found.currency.clone()),
            method: Set(method),
            provider_reference: Set(provider_reference),
            status: Set(TransactionStatus::Pending),
            failure_reason: Set(None),
            completed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let order_id = found.id;
        let mut active: order::ActiveModel = found.into();
        active.payment_status = Set(PaymentStatus::Processing);
        active.payment_method = Set(method);
        active.updated_at = Set(Some(now));
        active.update(&txn).await?;

        txn.commit().await?;

        // Gateway stub: a real integration would call the provider here and
        // hand it the reference to echo back in the callback.
        info!(
            order_id = %order_id,
            transaction_id = %transaction.id,
            provider_reference = %transaction.provider_reference,
            method = %method,
            amount = %transaction.amount,
            "Payment initiated (provider call stubbed)"
        );
        self.event_sender
            .send_or_log(Event::PaymentInitiated {
                order_id,
                transaction_id: transaction.id,
            })
            .await;
        Ok(transaction)
    }

    /// Applies a gateway callback.
    ///
    /// The raw body is authenticated first when a webhook secret is
    /// configured; only then is it parsed. Callbacks that land on a
    /// transaction already in a terminal state are acknowledged unchanged.
    #[instrument(skip_all)]
    pub async fn handle_callback(
        &self,
        body: &[u8],
        signature: Option<&str>,
        timestamp: Option<&str>,
    ) -> Result<CallbackAck, ServiceError> {
        if let Some(secret) = self.config.payment_webhook_secret.as_deref() {
            let signature = signature.ok_or(ServiceError::InvalidSignature)?;
            let timestamp = timestamp.ok_or(ServiceError::InvalidSignature)?;
            self.verify_signature(secret, body, signature, timestamp)?;
        }

        let payload: CallbackPayload = serde_json::from_slice(body)
            .map_err(|e| ServiceError::BadRequest(format!("Invalid callback payload: {}", e)))?;

        let now = Utc::now();
        let txn = self.db.begin().await?;

        let transaction = payment_transaction::Entity::find()
            .filter(
                payment_transaction::Column::ProviderReference.eq(&payload.provider_reference),
            )
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Payment transaction '{}'",
                    payload.provider_reference
                ))
            })?;

        if transaction.status.is_terminal() {
            info!(
                provider_reference = %payload.provider_reference,
                status = %transaction.status,
                "Replayed callback on settled transaction, acknowledging without effect"
            );
            return Ok(CallbackAck {
                provider_reference: transaction.provider_reference,
                status: transaction.status,
            });
        }

        let found = order::Entity::find_by_id(transaction.order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {}", transaction.order_id))
            })?;

        let ack = match payload.status {
            CallbackOutcome::Success => {
                self.settle_success(&txn, transaction, found, now).await?
            }
            CallbackOutcome::Failed => {
                self.settle_failure(&txn, transaction, found, payload.failure_reason, now)
                    .await?
            }
        };

        txn.commit().await?;
        Ok(ack)
    }

    /// Admin refund of a paid order: flips the order to `Refunded` and
    /// appends a compensating transaction row.
    #[instrument(skip(self))]
    pub async fn refund(&self, order_id: Uuid) -> Result<payment_transaction::Model, ServiceError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let found = order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {}", order_id)))?;
        if !found
            .payment_status
            .can_transition_to(PaymentStatus::Refunded)
        {
            return Err(ServiceError::InvalidTransition {
                from: found.payment_status.to_string(),
                to: PaymentStatus::Refunded.to_string(),
            });
        }

        let refund_row = payment_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(found.id),
            amount: Set(-found.total_amount),
            currency: Set(found.currency.clone()),
            method: Set(found.payment_method),
            provider_reference: Set(format!("RF-{}", validation::random_reference_suffix(16))),
            status: Set(TransactionStatus::Refunded),
            failure_reason: Set(None),
            completed_at: Set(Some(now)),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let user_id = found.user_id;
        let order_number = found.order_number.clone();
        let mut active: order::ActiveModel = found.into();
        active.payment_status = Set(PaymentStatus::Refunded);
        active.updated_at = Set(Some(now));
        active.update(&txn).await?;

        notifications::record(
            &txn,
            user_id,
            "Payment refunded",
            format!("Payment for order {} was refunded", order_number),
        )
        .await?;

        txn.commit().await?;
        self.event_sender
            .send_or_log(Event::PaymentRefunded {
                order_id,
                transaction_id: refund_row.id,
            })
            .await;
        info!(order_id = %order_id, "Payment refunded");
        Ok(refund_row)
    }

    /// Payment attempts for an order, newest first, visible to the order's
    /// owner and admins.
    #[instrument(skip(self))]
    pub async fn list_for_order(
        &self,
        order_id: Uuid,
        requester: Uuid,
        is_admin: bool,
    ) -> Result<Vec<payment_transaction::Model>, ServiceError> {
        let found = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {}", order_id)))?;
        if !is_admin && found.user_id != requester {
            return Err(ServiceError::NotFound(format!("Order {}", order_id)));
        }
        let rows = payment_transaction::Entity::find()
            .filter(payment_transaction::Column::OrderId.eq(order_id))
            .order_by_desc(payment_transaction::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(rows)
    }

    async fn settle_success(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        transaction: payment_transaction::Model,
        found: order::Model,
        now: chrono::DateTime<Utc>,
    ) -> Result<CallbackAck, ServiceError> {
        let transaction_id = transaction.id;
        let provider_reference = transaction.provider_reference.clone();
        let mut tx_active: payment_transaction::ActiveModel = transaction.into();
        tx_active.status = Set(TransactionStatus::Succeeded);
        tx_active.completed_at = Set(Some(now));
        tx_active.updated_at = Set(Some(now));
        tx_active.update(txn).await?;

        if !found.payment_status.can_transition_to(PaymentStatus::Paid) {
            return Err(ServiceError::InvalidTransition {
                from: found.payment_status.to_string(),
                to: PaymentStatus::Paid.to_string(),
            });
        }

        let order_id = found.id;
        let user_id = found.user_id;
        let order_number = found.order_number.clone();
        let auto_confirm = found.status == OrderStatus::Pending;
        let mut active: order::ActiveModel = found.into();
        active.payment_status = Set(PaymentStatus::Paid);
        active.paid_at = Set(Some(now));
        if auto_confirm {
            active.status = Set(OrderStatus::Confirmed);
        }
        active.updated_at = Set(Some(now));
        active.update(txn).await?;

        if auto_confirm {
            order_tracking::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                status: Set(OrderStatus::Confirmed),
                note: Set(Some("Payment received".to_string())),
                created_at: Set(now),
            }
            .insert(txn)
            .await?;
        }

        notifications::record(
            txn,
            user_id,
            "Payment received",
            format!("Payment for order {} was received", order_number),
        )
        .await?;

        self.event_sender
            .send_or_log(Event::PaymentConfirmed {
                order_id,
                transaction_id,
            })
            .await;
        info!(order_id = %order_id, "Payment confirmed via callback");
        Ok(CallbackAck {
            provider_reference,
            status: TransactionStatus::Succeeded,
        })
    }

    async fn settle_failure(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        transaction: payment_transaction::Model,
        found: order::Model,
        failure_reason: Option<String>,
        now: chrono::DateTime<Utc>,
    ) -> Result<CallbackAck, ServiceError> {
        let transaction_id = transaction.id;
        let provider_reference = transaction.provider_reference.clone();
        let mut tx_active: payment_transaction::ActiveModel = transaction.into();
        tx_active.status = Set(TransactionStatus::Failed);
        tx_active.failure_reason = Set(failure_reason);
        tx_active.completed_at = Set(Some(now));
        tx_active.updated_at = Set(Some(now));
        tx_active.update(txn).await?;

        let order_id = found.id;
        if found
            .payment_status
            .can_transition_to(PaymentStatus::Failed)
        {
            let mut active: order::ActiveModel = found.into();
            active.payment_status = Set(PaymentStatus::Failed);
            active.updated_at = Set(Some(now));
            active.update(txn).await?;
        } else {
            warn!(
                order_id = %order_id,
                "Failure callback for an order whose payment is already settled"
            );
        }

        self.event_sender
            .send_or_log(Event::PaymentFailed {
                order_id,
                transaction_id,
            })
            .await;
        Ok(CallbackAck {
            provider_reference,
            status: TransactionStatus::Failed,
        })
    }

    /// HMAC-SHA256 over `"{timestamp}.{body}"` with a hex signature,
    /// constant-time comparison and a bounded timestamp skew.
    fn verify_signature(
        &self,
        secret: &str,
        body: &[u8],
        signature: &str,
        timestamp: &str,
    ) -> Result<(), ServiceError> {
        let ts: i64 = timestamp
            .parse()
            .map_err(|_| ServiceError::InvalidSignature)?;
        let tolerance = self
            .config
            .payment_webhook_tolerance_secs
            .unwrap_or(DEFAULT_TIMESTAMP_TOLERANCE_SECS) as i64;
        if (Utc::now().timestamp() - ts).abs() > tolerance {
            warn!("Webhook timestamp outside tolerance");
            return Err(ServiceError::InvalidSignature);
        }

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| ServiceError::InternalError(format!("HMAC key error: {}", e)))?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);

        let sig_bytes = hex::decode(signature).map_err(|_| ServiceError::InvalidSignature)?;
        mac.verify_slice(&sig_bytes)
            .map_err(|_| ServiceError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tokio::sync::mpsc;

    fn service_with_secret(secret: &str) -> PaymentService {
        let (tx, _rx) = mpsc::channel(8);
        let mut config = AppConfig::new(
            "sqlite::memory:".into(),
            "x".repeat(64),
            3600,
            "127.0.0.1".into(),
            0,
            "development".into(),
        );
        config.payment_webhook_secret = Some(secret.to_string());
        PaymentService::new(
            Arc::new(DatabaseConnection::default()),
            Arc::new(EventSender::new(tx)),
            Arc::new(config),
        )
    }

    fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn valid_signature_passes() {
        let svc = service_with_secret("webhook-secret");
        let body = br#"{"provider_reference":"MM-X","status":"success"}"#;
        let ts = Utc::now().timestamp().to_string();
        let sig = sign("webhook-secret", &ts, body);
        assert!(svc
            .verify_signature("webhook-secret", body, &sig, &ts)
            .is_ok());
    }

    #[test]
    fn tampered_body_is_rejected() {
        let svc = service_with_secret("webhook-secret");
        let ts = Utc::now().timestamp().to_string();
        let sig = sign("webhook-secret", &ts, b"original");
        assert_matches!(
            svc.verify_signature("webhook-secret", b"tampered", &sig, &ts),
            Err(ServiceError::InvalidSignature)
        );
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let svc = service_with_secret("webhook-secret");
        let body = b"{}";
        let ts = (Utc::now().timestamp() - 3600).to_string();
        let sig = sign("webhook-secret", &ts, body);
        assert_matches!(
            svc.verify_signature("webhook-secret", body, &sig, &ts),
            Err(ServiceError::InvalidSignature)
        );
    }

    #[test]
    fn non_hex_signature_is_rejected() {
        let svc = service_with_secret("webhook-secret");
        let ts = Utc::now().timestamp().to_string();
        assert_matches!(
            svc.verify_signature("webhook-secret", b"{}", "zzzz", &ts),
            Err(ServiceError::InvalidSignature)
        );
    }

    #[test]
    fn callback_payload_parses_snake_case_status() {
        let payload: CallbackPayload = serde_json::from_str(
            r#"{"provider_reference":"MM-ABC","status":"success","failure_reason":null}"#,
        )
        .unwrap();
        assert_eq!(payload.status, CallbackOutcome::Success);
    }
}
