use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted copy of every queued notification so clients can list history.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, sqlx::FromRow)]
pub struct NotificationRecord {
    pub id: i64,
    pub user_id: i64,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
