use gauntlet_data::FeedError;
use gauntlet_exchange::ExchangeError;
use gauntlet_ledger::LedgerError;
use thiserror::Error;

/// All errors generated in the engine layer.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("price feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("security error: {0}")]
    Security(#[from] crate::security::SecurityError),

    /// Credentials failed to unseal; the challenge is quarantined for manual review.
    #[error("credentials for challenge {challenge_id} cannot be unsealed")]
    CredentialUnseal { challenge_id: i64 },

    /// The per-challenge wall-clock budget (one tick interval) was exhausted.
    #[error("tick budget exhausted for challenge {challenge_id}")]
    TickBudget { challenge_id: i64 },

    /// A §3-style data invariant no longer holds; processing of this challenge is
    /// halted until a human clears it.
    #[error("invariant breach on challenge {challenge_id}: {detail}")]
    InvariantBreach { challenge_id: i64, detail: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

impl EngineError {
    /// Transient errors leave no committed state and are retried on the next tick.
    pub fn is_transient(&self) -> bool {
        match self {
            EngineError::Exchange(err) => err.is_transient(),
            EngineError::TickBudget { .. } => true,
            EngineError::Redis(_) => true,
            EngineError::Feed(FeedError::Stale { .. }) => true,
            _ => false,
        }
    }
}
