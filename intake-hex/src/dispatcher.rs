//! Settlement Dispatcher.
//!
//! Hands accepted transactions to the settlement queue. Delivery is
//! at-least-once; the dedupe key collapses repeated sends for the same
//! logical transaction at the queue.

use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use intake_types::domain::{NotificationPayload, TransactionPayload};
use intake_types::{AppError, MessageQueue, MessageType, QueueMessage, QueueName, TransactionId};

/// Operation tag for a plain intake hand-off.
pub const DEFAULT_OPERATION: &str = "default";

/// SHA-256 hex of `<type>:<key>`. Always 64 chars regardless of key length.
pub fn dedupe_key(message_type: MessageType, key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(message_type.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

pub struct SettlementDispatcher {
    queue: Arc<dyn MessageQueue>,
}

impl SettlementDispatcher {
    pub fn new(queue: Arc<dyn MessageQueue>) -> Self {
        Self { queue }
    }

    /// Publishes a `transaction` message and returns the queue's message id.
    #[tracing::instrument(skip(self))]
    pub async fn enqueue_transaction(
        &self,
        transaction_id: TransactionId,
        idempotency_key: &str,
        operation: &str,
    ) -> Result<String, AppError> {
        let payload = TransactionPayload {
            transaction_id,
            idempotency_key: idempotency_key.to_string(),
            operation: operation.to_string(),
        };

        self.publish(
            MessageType::Transaction,
            &payload,
            &dedupe_key(MessageType::Transaction, idempotency_key),
        )
        .await
    }

    /// Publishes a `notification` message for a user.
    pub async fn enqueue_notification(
        &self,
        user_id: Uuid,
        template_id: &str,
        destination: &str,
        data: serde_json::Value,
    ) -> Result<String, AppError> {
        let dedupe = format!("notify:{}:{}:{}", user_id, template_id, destination);
        let payload = NotificationPayload {
            user_id,
            template_id: template_id.to_string(),
            destination: destination.to_string(),
            data,
        };

        self.publish(MessageType::Notification, &payload, &dedupe)
            .await
    }

    async fn publish<P: Serialize>(
        &self,
        message_type: MessageType,
        payload: &P,
        dedupe: &str,
    ) -> Result<String, AppError> {
        let payload = serde_json::to_value(payload)
            .map_err(|e| AppError::Internal(format!("encode {} payload: {}", message_type, e)))?;
        let message = QueueMessage::new(message_type, payload);
        let body = serde_json::to_string(&message)
            .map_err(|e| AppError::Internal(format!("encode {} message: {}", message_type, e)))?;

        let message_id = self
            .queue
            .send(
                QueueName::for_message(message_type),
                &body,
                dedupe,
                message_type.as_str(),
            )
            .await
            .map_err(|e| AppError::from(e).context("enqueue"))?;

        tracing::debug!(%message_type, %message_id, "message enqueued");
        Ok(message_id)
    }
}
