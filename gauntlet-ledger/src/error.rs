use thiserror::Error;

/// All errors generated by the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Unique-constraint or state conflicts (duplicate active plan, pending payout
    /// outstanding, replayed order reference).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl LedgerError {
    /// Whether the underlying failure is a unique-constraint violation, which mutating
    /// operations treat as an idempotent replay rather than a bug.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            LedgerError::Database(sqlx::Error::Database(db)) => {
                db.code().as_deref() == Some("23505")
            }
            _ => false,
        }
    }
}
