use crate::{
    error::EngineError,
    notify::{Notification, Notifier},
    risk::{self, round_fiat},
};
use chrono::Utc;
use gauntlet_data::{PriceCache, PriceRestClient};
use gauntlet_ledger::{
    model::{Challenge, CloseReason, Trade, TradeDirection},
    store::NewTrade,
    LedgerStore,
};
use rust_decimal::Decimal;
use tracing::{info, warn};

/// Per-account view of paper state for the orchestrator.
pub mod account;

pub use account::PaperAccount;

/// Inputs for opening a synthetic position.
#[derive(Debug, Clone)]
pub struct OpenTradeRequest {
    pub symbol: String,
    pub direction: TradeDirection,
    pub leverage: u32,
    /// Percent of balance at risk if the stop is hit.
    pub risk_pct: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
}

/// Validate protective prices against the entry for the chosen direction.
///
/// Long requires `take_profit > entry > stop_loss`; short mirrors it.
pub fn validate_protective_prices(
    direction: TradeDirection,
    entry_price: Decimal,
    take_profit: Decimal,
    stop_loss: Decimal,
) -> Result<(), EngineError> {
    let ok = match direction {
        TradeDirection::Long => take_profit > entry_price && stop_loss < entry_price,
        TradeDirection::Short => take_profit < entry_price && stop_loss > entry_price,
    };
    if ok {
        Ok(())
    } else {
        Err(EngineError::Validation(
            "take profit and stop loss must bracket the entry price for this direction".into(),
        ))
    }
}

/// Protective price crossed by the latest mark, if any. Returns the trigger price and
/// the close reason; take profit wins when both are crossed in one observation.
pub fn protective_trigger(trade: &Trade, mark_price: Decimal) -> Option<(Decimal, CloseReason)> {
    let hit_tp = trade.take_profit.is_some_and(|tp| match trade.direction {
        TradeDirection::Long => mark_price >= tp,
        TradeDirection::Short => mark_price <= tp,
    });
    if hit_tp {
        return trade.take_profit.map(|tp| (tp, CloseReason::TakeProfit));
    }

    let hit_sl = trade.stop_loss.is_some_and(|sl| match trade.direction {
        TradeDirection::Long => mark_price <= sl,
        TradeDirection::Short => mark_price >= sl,
    });
    if hit_sl {
        return trade.stop_loss.map(|sl| (sl, CloseReason::StopLoss));
    }

    None
}

/// Synthetic-trade matching engine for paper (demo) challenges.
///
/// Fills simulate against the live price feed: opening sizes the position from risk
/// and reserves margin, closing realises P&L at the observed price, and the TP/SL
/// sweep closes positions whose protective price the feed has crossed.
#[derive(Debug, Clone)]
pub struct PaperEngine {
    ledger: LedgerStore,
    cache: PriceCache,
    rest: PriceRestClient,
    notifier: Notifier,
}

impl PaperEngine {
    pub fn new(
        ledger: LedgerStore,
        cache: PriceCache,
        rest: PriceRestClient,
        notifier: Notifier,
    ) -> Self {
        Self {
            ledger,
            cache,
            rest,
            notifier,
        }
    }

    /// Open a synthetic position at the current market price.
    pub async fn open_trade(
        &self,
        challenge: &Challenge,
        request: OpenTradeRequest,
    ) -> Result<Trade, EngineError> {
        if !challenge.is_active() {
            return Err(EngineError::Conflict(format!(
                "challenge is {:?}, trading unavailable",
                challenge.status
            )));
        }

        let entry_price = self
            .rest
            .price_or_fetch(&self.cache, &request.symbol)
            .await?;

        validate_protective_prices(
            request.direction,
            entry_price,
            request.take_profit,
            request.stop_loss,
        )?;

        let size = risk::position_size_from_risk(
            challenge.current_balance,
            request.risk_pct,
            entry_price,
            request.stop_loss,
            request.direction,
            request.leverage,
        )
        .map_err(|err| EngineError::Validation(err.to_string()))?;

        if !self
            .ledger
            .reserve_margin(challenge.id, size.margin)
            .await?
        {
            return Err(EngineError::Validation(
                "insufficient balance to cover the position margin".into(),
            ));
        }

        let trade = self
            .ledger
            .insert_trade(NewTrade {
                challenge_id: challenge.id,
                symbol: request.symbol,
                direction: request.direction,
                entry_price,
                quantity: size.quantity,
                leverage: request.leverage as i32,
                notional: size.notional,
                margin: size.margin,
                stop_loss: Some(request.stop_loss),
                take_profit: Some(request.take_profit),
            })
            .await?;

        info!(
            challenge_id = challenge.id,
            trade_id = trade.id,
            symbol = %trade.symbol,
            quantity = %trade.quantity,
            "paper trade opened"
        );
        Ok(trade)
    }

    /// Close one open synthetic position at `exit_price`.
    ///
    /// Returns `None` if the trade was already closed by a concurrent sweep.
    pub async fn close_trade(
        &self,
        trade: &Trade,
        exit_price: Decimal,
        reason: CloseReason,
    ) -> Result<Option<Trade>, EngineError> {
        let pnl = risk::trade_pnl(trade.direction, trade.entry_price, exit_price, trade.quantity);
        let pnl_pct = if trade.notional.is_zero() {
            Decimal::ZERO
        } else {
            round_fiat(pnl / trade.notional * Decimal::ONE_HUNDRED)
        };

        let Some(closed) = self
            .ledger
            .close_trade(trade.id, exit_price, pnl, pnl_pct, reason, Utc::now())
            .await?
        else {
            return Ok(None);
        };

        self.ledger
            .settle_trade_close(trade.challenge_id, trade.margin, pnl)
            .await?;

        info!(
            challenge_id = trade.challenge_id,
            trade_id = trade.id,
            %pnl,
            ?reason,
            "paper trade closed"
        );
        Ok(Some(closed))
    }

    /// Close one open synthetic position at the current market price.
    pub async fn close_trade_at_market(
        &self,
        trade: &Trade,
        reason: CloseReason,
    ) -> Result<Option<Trade>, EngineError> {
        let exit_price = self.rest.price_or_fetch(&self.cache, &trade.symbol).await?;
        self.close_trade(trade, exit_price, reason).await
    }

    /// Close every open position whose protective price the feed has crossed.
    ///
    /// Returns the closed trades. A missing or stale price skips that position
    /// rather than failing the sweep.
    pub async fn sweep_protective_triggers(
        &self,
        challenge: &Challenge,
    ) -> Result<Vec<Trade>, EngineError> {
        let open = self.ledger.open_trades(challenge.id).await?;
        if open.is_empty() {
            return Ok(Vec::new());
        }

        let prices = self.cache.prices_all();
        let mut closed = Vec::new();

        for trade in open {
            let Some(mark) = prices.get(&trade.symbol).copied() else {
                continue;
            };
            let Some((trigger_price, reason)) = protective_trigger(&trade, mark) else {
                continue;
            };

            match self.close_trade(&trade, trigger_price, reason).await {
                Ok(Some(done)) => {
                    let notification = Notification::TradeClosed {
                        user_id: challenge.user_id,
                        challenge_id: challenge.id,
                        symbol: done.symbol.clone(),
                        pnl: done.realized_pnl.unwrap_or(Decimal::ZERO),
                        close_reason: format!("{reason:?}"),
                    };
                    if let Err(err) = self.notifier.enqueue(notification).await {
                        warn!(%err, "trade-closed notification failed");
                    }
                    closed.push(done);
                }
                Ok(None) => {}
                Err(err) => warn!(trade_id = trade.id, %err, "sweep close failed"),
            }
        }

        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gauntlet_ledger::model::TradeStatus;
    use rust_decimal_macros::dec;

    fn trade(direction: TradeDirection, tp: Decimal, sl: Decimal) -> Trade {
        Trade {
            id: 1,
            challenge_id: 1,
            symbol: "BTCUSDT".into(),
            direction,
            status: TradeStatus::Open,
            entry_price: dec!(16500),
            exit_price: None,
            quantity: dec!(1),
            leverage: 10,
            notional: dec!(16500),
            margin: dec!(1650),
            stop_loss: Some(sl),
            take_profit: Some(tp),
            realized_pnl: None,
            pnl_pct: None,
            close_reason: None,
            order_ref: None,
            opened_at: Utc::now(),
            closed_at: None,
            duration_seconds: None,
        }
    }

    #[test]
    fn test_validate_protective_prices() {
        struct TestCase {
            direction: TradeDirection,
            tp: Decimal,
            sl: Decimal,
            expected_ok: bool,
        }

        let entry = dec!(16500);
        let tests = vec![
            // TC0: long with tp above, sl below
            TestCase { direction: TradeDirection::Long, tp: dec!(17000), sl: dec!(16000), expected_ok: true },
            // TC1: long with tp below entry
            TestCase { direction: TradeDirection::Long, tp: dec!(16400), sl: dec!(16000), expected_ok: false },
            // TC2: short with tp below, sl above
            TestCase { direction: TradeDirection::Short, tp: dec!(16000), sl: dec!(17000), expected_ok: true },
            // TC3: short with sl below entry
            TestCase { direction: TradeDirection::Short, tp: dec!(16000), sl: dec!(16400), expected_ok: false },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual =
                validate_protective_prices(test.direction, entry, test.tp, test.sl).is_ok();
            assert_eq!(actual, test.expected_ok, "TC{index} failed");
        }
    }

    #[test]
    fn test_protective_trigger() {
        let long = trade(TradeDirection::Long, dec!(17000), dec!(16000));

        // Between the protective prices: no trigger
        assert_eq!(protective_trigger(&long, dec!(16500)), None);
        // Above take profit: closes at the tp price, not the observed mark
        assert_eq!(
            protective_trigger(&long, dec!(17100)),
            Some((dec!(17000), CloseReason::TakeProfit))
        );
        // Below stop loss
        assert_eq!(
            protective_trigger(&long, dec!(15900)),
            Some((dec!(16000), CloseReason::StopLoss))
        );

        let short = trade(TradeDirection::Short, dec!(16000), dec!(17000));
        assert_eq!(
            protective_trigger(&short, dec!(15950)),
            Some((dec!(16000), CloseReason::TakeProfit))
        );
        assert_eq!(
            protective_trigger(&short, dec!(17050)),
            Some((dec!(17000), CloseReason::StopLoss))
        );
    }
}
