use crate::error::LedgerError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

mod challenges;
mod notifications;
mod payouts;
mod plans;
mod scaling;
mod trades;
mod users;
mod violations;

pub use challenges::NewChallenge;
pub use payouts::NewPayout;
pub use trades::{NewTrade, SyncedTrade, TradePage};
pub use violations::NewViolation;

/// Embedded schema migrations, applied at startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Pooled, transactional access to the Gauntlet ledger.
///
/// Mutating challenge operations commit in a single transaction and hold a
/// `SELECT … FOR UPDATE` row lock on the challenge only for the duration of that
/// commit.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    pool: PgPool,
}

impl LedgerStore {
    /// Connect a bounded pool to the provided Postgres url.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, LedgerError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool (tests).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply any pending schema migrations.
    pub async fn migrate(&self) -> Result<(), LedgerError> {
        MIGRATOR.run(&self.pool).await?;
        info!("ledger migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close the pool, draining checked-out connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
