use super::LedgerStore;
use crate::{error::LedgerError, model::NotificationRecord};

impl LedgerStore {
    /// Persist a notification into the outbox so clients can list history.
    pub async fn insert_notification(
        &self,
        user_id: i64,
        kind: &str,
        title: &str,
        body: &str,
    ) -> Result<NotificationRecord, LedgerError> {
        Ok(sqlx::query_as::<_, NotificationRecord>(
            "INSERT INTO notifications (user_id, kind, title, body) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(user_id)
        .bind(kind)
        .bind(title)
        .bind(body)
        .fetch_one(&self.pool)
        .await?)
    }

    /// Unread notifications of one user, newest first.
    pub async fn unread_notifications(
        &self,
        user_id: i64,
    ) -> Result<Vec<NotificationRecord>, LedgerError> {
        Ok(sqlx::query_as::<_, NotificationRecord>(
            "SELECT * FROM notifications WHERE user_id = $1 AND NOT read \
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
