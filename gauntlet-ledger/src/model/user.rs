use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform role, elevated on funding and downgraded when the last active challenge
/// fails.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, sqlx::Type,
)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Guest,
    Challenger,
    Funded,
    Elite,
    Admin,
    SuperAdmin,
}

/// Stable platform identity. Created on first contact, never destroyed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    /// Identity from the external messaging platform.
    pub external_id: i64,
    pub role: UserRole,
    /// Unique code generated at creation, shared for referral attribution.
    pub referral_code: String,
    pub referred_by: Option<i64>,
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
