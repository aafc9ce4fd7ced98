//! Durable queue on PostgreSQL.
//!
//! Receivers lease rows with `FOR UPDATE SKIP LOCKED`, so competing consumers
//! never see the same message inside one visibility window.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use intake_types::{MessageQueue, QueueError, QueueName, ReceivedMessage};

use super::types::DbLeasedMessage;

fn unavailable(e: sqlx::Error) -> QueueError {
    QueueError::Unavailable(e.to_string())
}

#[derive(Clone)]
pub struct PostgresQueue {
    pool: PgPool,
    visibility_timeout: Duration,
}

impl PostgresQueue {
    pub fn new(pool: PgPool, visibility_timeout: Duration) -> Self {
        Self {
            pool,
            visibility_timeout,
        }
    }
}

#[async_trait]
impl MessageQueue for PostgresQueue {
    async fn send(
        &self,
        queue: QueueName,
        body: &str,
        dedupe_key: &str,
        group_key: &str,
    ) -> Result<String, QueueError> {
        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO queue_messages (id, queue, dedupe_key, group_key, body)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (queue, dedupe_key) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(queue.as_str())
        .bind(dedupe_key)
        .bind(group_key)
        .bind(body)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        let id = match inserted {
            Some(id) => id,
            None => {
                let existing: Uuid = sqlx::query_scalar(
                    "SELECT id FROM queue_messages WHERE queue = $1 AND dedupe_key = $2",
                )
                .bind(queue.as_str())
                .bind(dedupe_key)
                .fetch_one(&self.pool)
                .await
                .map_err(unavailable)?;
                tracing::debug!(%queue, message_id = %existing, "duplicate send collapsed");
                existing
            }
        };

        Ok(id.to_string())
    }

    async fn receive(
        &self,
        queue: QueueName,
        max_messages: usize,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        if max_messages == 0 {
            return Ok(Vec::new());
        }

        let rows: Vec<DbLeasedMessage> = sqlx::query_as(
            r#"
            UPDATE queue_messages
            SET receipt_handle = gen_random_uuid(),
                receive_count = receive_count + 1,
                visible_at = NOW() + make_interval(secs => $3)
            WHERE id IN (
                SELECT id FROM queue_messages
                WHERE queue = $1 AND deleted_at IS NULL AND visible_at <= NOW()
                ORDER BY created_at
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, receipt_handle, body, receive_count
            "#,
        )
        .bind(queue.as_str())
        .bind(i64::try_from(max_messages).unwrap_or(i64::MAX))
        .bind(self.visibility_timeout.as_secs_f64())
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(rows
            .into_iter()
            .map(|row| ReceivedMessage {
                message_id: row.id.to_string(),
                receipt_handle: row.receipt_handle.to_string(),
                body: row.body,
                receive_count: u32::try_from(row.receive_count).unwrap_or(0),
            })
            .collect())
    }

    async fn delete(&self, queue: QueueName, receipt_handle: &str) -> Result<(), QueueError> {
        let handle: Uuid = receipt_handle
            .parse()
            .map_err(|_| QueueError::UnknownReceipt(receipt_handle.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE queue_messages SET deleted_at = NOW()
            WHERE queue = $1 AND receipt_handle = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(queue.as_str())
        .bind(handle)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(QueueError::UnknownReceipt(receipt_handle.to_string()));
        }
        Ok(())
    }
}
