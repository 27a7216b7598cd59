use crate::risk;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gauntlet_data::PriceCache;
use gauntlet_exchange::{
    bybit::{
        account::{AccountExchange, CloseOutcome},
        model::{
            balance::AccountBalance,
            order::{OrderAck, Side},
            position::{ClosedPnlEntry, Position},
        },
    },
    ExchangeError,
};
use gauntlet_ledger::{
    model::{CloseReason, TradeDirection},
    LedgerStore,
};
use rust_decimal::Decimal;

/// Paper-backed implementation of the per-account exchange view.
///
/// Balance and positions derive from the ledger's open synthetic trades marked at the
/// live feed, so the orchestrator reconciles paper challenges through the same code
/// path as exchange-backed ones. Closed-trade syncing is a no-op: paper fills are
/// written to the ledger at close time.
#[derive(Debug, Clone)]
pub struct PaperAccount {
    engine: super::PaperEngine,
    ledger: LedgerStore,
    cache: PriceCache,
    challenge_id: i64,
}

impl PaperAccount {
    pub fn new(
        engine: super::PaperEngine,
        ledger: LedgerStore,
        cache: PriceCache,
        challenge_id: i64,
    ) -> Self {
        Self {
            engine,
            ledger,
            cache,
            challenge_id,
        }
    }

    fn ledger_error(err: gauntlet_ledger::LedgerError) -> ExchangeError {
        ExchangeError::Api {
            code: -1,
            message: format!("paper ledger error: {err}"),
        }
    }
}

#[async_trait]
impl AccountExchange for PaperAccount {
    async fn balance(&self) -> Result<AccountBalance, ExchangeError> {
        let challenge = self
            .ledger
            .challenge(self.challenge_id)
            .await
            .map_err(Self::ledger_error)?;
        let open = self
            .ledger
            .open_trades(self.challenge_id)
            .await
            .map_err(Self::ledger_error)?;

        let prices = self.cache.prices_all();
        let equity = risk::equity(challenge.current_balance, &open, &prices);

        Ok(AccountBalance {
            wallet: challenge.current_balance,
            unrealized_pnl: equity - challenge.current_balance,
            equity,
            available: challenge.current_balance,
        })
    }

    async fn positions(&self) -> Result<Vec<Position>, ExchangeError> {
        let open = self
            .ledger
            .open_trades(self.challenge_id)
            .await
            .map_err(Self::ledger_error)?;
        let prices = self.cache.prices_all();

        Ok(open
            .into_iter()
            .map(|trade| {
                let mark = prices.get(&trade.symbol).copied();
                Position {
                    symbol: trade.symbol.clone(),
                    side: Some(match trade.direction {
                        TradeDirection::Long => Side::Buy,
                        TradeDirection::Short => Side::Sell,
                    }),
                    size: Some(trade.quantity),
                    entry_price: Some(trade.entry_price),
                    leverage: Some(Decimal::from(trade.leverage)),
                    unrealised_pnl: mark.map(|mark| risk::unrealized_pnl(&trade, mark)),
                    mark_price: mark,
                }
            })
            .collect())
    }

    async fn close_all_positions(&self) -> Result<Vec<CloseOutcome>, ExchangeError> {
        let open = self
            .ledger
            .open_trades(self.challenge_id)
            .await
            .map_err(Self::ledger_error)?;

        let mut outcomes = Vec::with_capacity(open.len());
        for trade in open {
            let result = self
                .engine
                .close_trade_at_market(&trade, CloseReason::Forced)
                .await;

            outcomes.push(CloseOutcome {
                symbol: trade.symbol,
                result: match result {
                    Ok(_) => Ok(OrderAck {
                        order_id: format!("paper-{}", trade.id),
                        order_link_id: String::new(),
                    }),
                    Err(err) => Err(ExchangeError::Api {
                        code: -1,
                        message: format!("paper close failed: {err}"),
                    }),
                },
            });
        }

        Ok(outcomes)
    }

    async fn closed_pnl_since(
        &self,
        _since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ClosedPnlEntry>, ExchangeError> {
        Ok(Vec::new())
    }
}
