//! In-memory message queue.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use uuid::Uuid;

use intake_types::{MessageQueue, QueueError, QueueName, ReceivedMessage};

struct StoredMessage {
    id: String,
    queue: QueueName,
    dedupe_key: String,
    group_key: String,
    body: String,
    receive_count: u32,
    receipt_handle: Option<String>,
    visible_at: Instant,
    deleted: bool,
}

/// Queue with the same dedupe and lease semantics as the Postgres queue.
/// Deleted messages stay as tombstones so their dedupe keys keep collapsing sends.
pub struct MemoryQueue {
    messages: Mutex<Vec<StoredMessage>>,
    visibility_timeout: Duration,
    unavailable: AtomicBool,
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl MemoryQueue {
    pub fn new(visibility_timeout: Duration) -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            visibility_timeout,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Simulates an outage: every call fails until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Bodies of the undeleted messages on `queue`, oldest first.
    pub fn bodies(&self, queue: QueueName) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| {
                messages
                    .iter()
                    .filter(|m| m.queue == queue && !m.deleted)
                    .map(|m| m.body.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Group keys of the undeleted messages on `queue`, oldest first.
    pub fn group_keys(&self, queue: QueueName) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| {
                messages
                    .iter()
                    .filter(|m| m.queue == queue && !m.deleted)
                    .map(|m| m.group_key.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of undeleted messages on `queue`.
    pub fn len(&self, queue: QueueName) -> usize {
        self.bodies(queue).len()
    }

    pub fn is_empty(&self, queue: QueueName) -> bool {
        self.len(queue) == 0
    }

    fn check_available(&self) -> Result<(), QueueError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QueueError::Unavailable("queue endpoint unreachable".into()));
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<StoredMessage>>, QueueError> {
        self.messages
            .lock()
            .map_err(|e| QueueError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn send(
        &self,
        queue: QueueName,
        body: &str,
        dedupe_key: &str,
        group_key: &str,
    ) -> Result<String, QueueError> {
        self.check_available()?;
        let mut messages = self.lock()?;

        if let Some(existing) = messages
            .iter()
            .find(|m| m.queue == queue && m.dedupe_key == dedupe_key)
        {
            tracing::debug!(%queue, message_id = %existing.id, "duplicate send collapsed");
            return Ok(existing.id.clone());
        }

        let id = Uuid::new_v4().to_string();
        messages.push(StoredMessage {
            id: id.clone(),
            queue,
            dedupe_key: dedupe_key.to_string(),
            group_key: group_key.to_string(),
            body: body.to_string(),
            receive_count: 0,
            receipt_handle: None,
            visible_at: Instant::now(),
            deleted: false,
        });
        Ok(id)
    }

    async fn receive(
        &self,
        queue: QueueName,
        max_messages: usize,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        self.check_available()?;
        let mut messages = self.lock()?;
        let now = Instant::now();

        let leased = messages
            .iter_mut()
            .filter(|m| m.queue == queue && !m.deleted && m.visible_at <= now)
            .take(max_messages)
            .map(|m| {
                let handle = Uuid::new_v4().to_string();
                m.receive_count += 1;
                m.receipt_handle = Some(handle.clone());
                m.visible_at = now + self.visibility_timeout;
                ReceivedMessage {
                    message_id: m.id.clone(),
                    receipt_handle: handle,
                    body: m.body.clone(),
                    receive_count: m.receive_count,
                }
            })
            .collect();
        Ok(leased)
    }

    async fn delete(&self, queue: QueueName, receipt_handle: &str) -> Result<(), QueueError> {
        self.check_available()?;
        let mut messages = self.lock()?;

        let message = messages
            .iter_mut()
            .find(|m| {
                m.queue == queue && !m.deleted && m.receipt_handle.as_deref() == Some(receipt_handle)
            })
            .ok_or_else(|| QueueError::UnknownReceipt(receipt_handle.to_string()))?;
        message.deleted = true;
        Ok(())
    }
}
