//! Settlement queue message envelope.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::TransactionId;

/// Kind of work a queue message carries. Doubles as the queue group key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Transaction,
    Notification,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::Notification => "notification",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope written to the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub payload: serde_json::Value,
    /// Delivery attempt counter; producers always start at 1
    pub attempts: u32,
    /// Unix seconds at creation
    pub timestamp: i64,
}

impl QueueMessage {
    /// A first-attempt message stamped with the current time.
    pub fn new(message_type: MessageType, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            message_type,
            payload,
            attempts: 1,
            timestamp: Utc::now().timestamp(),
        }
    }
}

/// Payload of a `transaction` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPayload {
    pub transaction_id: TransactionId,
    pub idempotency_key: String,
    pub operation: String,
}

/// Payload of a `notification` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub user_id: Uuid,
    pub template_id: String,
    pub destination: String,
    pub data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_message_starts_at_first_attempt() {
        let msg = QueueMessage::new(MessageType::Transaction, serde_json::json!({}));
        assert_eq!(msg.attempts, 1);
        assert!(msg.timestamp > 0);
    }

    #[test]
    fn test_envelope_uses_type_tag() {
        let msg = QueueMessage::new(MessageType::Notification, serde_json::json!({ "a": 1 }));
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "notification");
        assert_eq!(json["payload"]["a"], 1);
    }
}
