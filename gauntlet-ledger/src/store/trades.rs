use super::LedgerStore;
use crate::{
    error::LedgerError,
    model::{CloseReason, Trade, TradeDirection},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Inputs for opening a synthetic (paper) trade.
#[derive(Debug, Clone)]
pub struct NewTrade {
    pub challenge_id: i64,
    pub symbol: String,
    pub direction: TradeDirection,
    pub entry_price: Decimal,
    pub quantity: Decimal,
    pub leverage: i32,
    pub notional: Decimal,
    pub margin: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
}

/// A closed execution synced from the exchange, deduplicated on `order_ref`.
#[derive(Debug, Clone)]
pub struct SyncedTrade {
    pub challenge_id: i64,
    pub symbol: String,
    pub direction: TradeDirection,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: Decimal,
    pub leverage: i32,
    pub realized_pnl: Decimal,
    pub order_ref: String,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
}

/// Cursor-paginated page of closed-trade history.
#[derive(Debug, Clone)]
pub struct TradePage {
    pub items: Vec<Trade>,
    pub next_cursor: Option<i64>,
    pub has_more: bool,
}

impl LedgerStore {
    pub async fn trade(&self, trade_id: i64) -> Result<Trade, LedgerError> {
        sqlx::query_as::<_, Trade>("SELECT * FROM trades WHERE id = $1")
            .bind(trade_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LedgerError::NotFound {
                entity: "trade",
                id: trade_id,
            })
    }

    /// Open synthetic trades of one challenge, newest first.
    pub async fn open_trades(&self, challenge_id: i64) -> Result<Vec<Trade>, LedgerError> {
        Ok(sqlx::query_as::<_, Trade>(
            "SELECT * FROM trades WHERE challenge_id = $1 AND status = 'open' \
             ORDER BY opened_at DESC",
        )
        .bind(challenge_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Open a synthetic trade.
    pub async fn insert_trade(&self, new: NewTrade) -> Result<Trade, LedgerError> {
        Ok(sqlx::query_as::<_, Trade>(
            "INSERT INTO trades ( \
                 challenge_id, symbol, direction, entry_price, quantity, leverage, \
                 notional, margin, stop_loss, take_profit \
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING *",
        )
        .bind(new.challenge_id)
        .bind(&new.symbol)
        .bind(new.direction)
        .bind(new.entry_price)
        .bind(new.quantity)
        .bind(new.leverage)
        .bind(new.notional)
        .bind(new.margin)
        .bind(new.stop_loss)
        .bind(new.take_profit)
        .fetch_one(&self.pool)
        .await?)
    }

    /// Close an open trade, recording the realised P&L and duration.
    ///
    /// Returns the closed row, or `None` if the trade was already closed (a concurrent
    /// sweep won the race).
    pub async fn close_trade(
        &self,
        trade_id: i64,
        exit_price: Decimal,
        realized_pnl: Decimal,
        pnl_pct: Decimal,
        close_reason: CloseReason,
        closed_at: DateTime<Utc>,
    ) -> Result<Option<Trade>, LedgerError> {
        Ok(sqlx::query_as::<_, Trade>(
            "UPDATE trades SET \
                 status = 'closed', exit_price = $2, realized_pnl = $3, pnl_pct = $4, \
                 close_reason = $5, closed_at = $6, \
                 duration_seconds = EXTRACT(EPOCH FROM ($6 - opened_at))::BIGINT \
             WHERE id = $1 AND status = 'open' \
             RETURNING *",
        )
        .bind(trade_id)
        .bind(exit_price)
        .bind(realized_pnl)
        .bind(pnl_pct)
        .bind(close_reason)
        .bind(closed_at)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Append a closed execution synced from the exchange. Replays of the same
    /// `order_ref` are no-ops.
    ///
    /// Returns `true` if a new row was appended.
    pub async fn insert_synced_trade(&self, synced: SyncedTrade) -> Result<bool, LedgerError> {
        let pnl_pct = if synced.entry_price.is_zero() {
            Decimal::ZERO
        } else {
            (synced.realized_pnl / (synced.entry_price * synced.quantity) * Decimal::ONE_HUNDRED)
                .round_dp(4)
        };

        let result = sqlx::query(
            "INSERT INTO trades ( \
                 challenge_id, symbol, direction, status, entry_price, exit_price, \
                 quantity, leverage, notional, margin, realized_pnl, pnl_pct, \
                 close_reason, order_ref, opened_at, closed_at, duration_seconds \
             ) VALUES ( \
                 $1, $2, $3, 'closed', $4, $5, $6, $7, $8, $9, $10, $11, \
                 'manual', $12, $13, $14, EXTRACT(EPOCH FROM ($14 - $13))::BIGINT \
             ) ON CONFLICT (challenge_id, order_ref) WHERE order_ref IS NOT NULL DO NOTHING",
        )
        .bind(synced.challenge_id)
        .bind(&synced.symbol)
        .bind(synced.direction)
        .bind(synced.entry_price)
        .bind(synced.exit_price)
        .bind(synced.quantity)
        .bind(synced.leverage)
        .bind((synced.entry_price * synced.quantity).round_dp(2))
        .bind(
            ((synced.entry_price * synced.quantity) / Decimal::from(synced.leverage.max(1)))
                .round_dp(2),
        )
        .bind(synced.realized_pnl)
        .bind(pnl_pct)
        .bind(&synced.order_ref)
        .bind(synced.opened_at)
        .bind(synced.closed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record the high-water mark of exchange trade syncing.
    pub async fn set_last_trade_sync_at(
        &self,
        challenge_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        sqlx::query(
            "UPDATE challenges SET last_trade_sync_at = $2, updated_at = now() WHERE id = $1",
        )
        .bind(challenge_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Sum of realised P&L on trades closed in `[from, to)`.
    pub async fn sum_pnl_closed_between(
        &self,
        challenge_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Decimal, LedgerError> {
        Ok(sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT sum(realized_pnl) FROM trades \
             WHERE challenge_id = $1 AND status = 'closed' \
               AND closed_at >= $2 AND closed_at < $3",
        )
        .bind(challenge_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?
        .unwrap_or(Decimal::ZERO))
    }

    /// Number of trades closed in `[from, to)`.
    pub async fn count_trades_closed_between(
        &self,
        challenge_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, LedgerError> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM trades \
             WHERE challenge_id = $1 AND status = 'closed' \
               AND closed_at >= $2 AND closed_at < $3",
        )
        .bind(challenge_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?)
    }

    /// Cursor-paginated closed-trade history, newest first. The cursor is the last
    /// trade id of the previous page.
    pub async fn trade_history(
        &self,
        challenge_id: i64,
        cursor: Option<i64>,
        limit: i64,
        symbol: Option<&str>,
    ) -> Result<TradePage, LedgerError> {
        let limit = limit.clamp(1, 100);

        let mut items = sqlx::query_as::<_, Trade>(
            "SELECT * FROM trades \
             WHERE challenge_id = $1 AND status = 'closed' \
               AND ($2::BIGINT IS NULL OR id < $2) \
               AND ($3::VARCHAR IS NULL OR symbol = $3) \
             ORDER BY id DESC LIMIT $4",
        )
        .bind(challenge_id)
        .bind(cursor)
        .bind(symbol)
        .bind(limit + 1)
        .fetch_all(&self.pool)
        .await?;

        let has_more = items.len() as i64 > limit;
        if has_more {
            items.truncate(limit as usize);
        }
        let next_cursor = has_more.then(|| items.last().map(|t| t.id)).flatten();

        Ok(TradePage {
            items,
            next_cursor,
            has_more,
        })
    }
}
