//! Durable message queue port.

use crate::domain::MessageType;
use crate::error::QueueError;

/// Queues provisioned for intake. Dead-letter queues are populated by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueName {
    Transaction,
    TransactionDlq,
    Notification,
    NotificationDlq,
}

impl QueueName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::TransactionDlq => "transactiondlq",
            Self::Notification => "notification",
            Self::NotificationDlq => "notificationdlq",
        }
    }

    /// Queue a message type is published to.
    pub fn for_message(message_type: MessageType) -> Self {
        match message_type {
            MessageType::Transaction => Self::Transaction,
            MessageType::Notification => Self::Notification,
        }
    }

    pub fn dead_letter(&self) -> Self {
        match self {
            Self::Transaction | Self::TransactionDlq => Self::TransactionDlq,
            Self::Notification | Self::NotificationDlq => Self::NotificationDlq,
        }
    }
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leased message, deletable by its receipt handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub message_id: String,
    pub receipt_handle: String,
    pub body: String,
    pub receive_count: u32,
}

/// At-least-once queue with producer-side deduplication.
#[async_trait::async_trait]
pub trait MessageQueue: Send + Sync + 'static {
    /// Publishes `body`. Sends sharing a `dedupe_key` on the same queue collapse
    /// into one message and return its id.
    async fn send(
        &self,
        queue: QueueName,
        body: &str,
        dedupe_key: &str,
        group_key: &str,
    ) -> Result<String, QueueError>;

    /// Leases up to `max_messages` visible messages.
    async fn receive(
        &self,
        queue: QueueName,
        max_messages: usize,
    ) -> Result<Vec<ReceivedMessage>, QueueError>;

    /// Acknowledges a leased message.
    async fn delete(&self, queue: QueueName, receipt_handle: &str) -> Result<(), QueueError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing() {
        assert_eq!(
            QueueName::for_message(MessageType::Transaction),
            QueueName::Transaction
        );
        assert_eq!(
            QueueName::Notification.dead_letter(),
            QueueName::NotificationDlq
        );
        assert_eq!(QueueName::TransactionDlq.as_str(), "transactiondlq");
    }
}
