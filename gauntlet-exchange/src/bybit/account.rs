use crate::{
    bybit::{
        execute,
        model::{
            balance::{AccountBalance, GetWalletBalance},
            instrument::{GetInstruments, Instrument},
            kline::{GetKlines, Kline},
            order::{
                CancelOrder, CancelOrderBody, GetOpenOrders, OpenOrder, OrderAck, PlaceOrder,
                PlaceOrderBody,
            },
            position::{ClosedPnlEntry, GetClosedPnl, GetPositions, Position},
        },
        Environment, RequestSigner, ResponseParser, V5Client,
    },
    credentials::ApiCredentials,
    error::ExchangeError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gauntlet_integration::{
    protocol::http::client::SignedClient,
    rate_limit::{Priority, RateLimiter},
};
use tracing::{error, info, warn};

/// Venue operations the rule-check loop needs from one challenge's account.
///
/// Implemented by [`AccountClient`] in production and by in-memory fakes in tests.
#[async_trait]
pub trait AccountExchange: Send + Sync {
    /// USDT balance snapshot: wallet, unrealized P&L, equity, available.
    async fn balance(&self) -> Result<AccountBalance, ExchangeError>;

    /// Open positions (flat slots filtered out).
    async fn positions(&self) -> Result<Vec<Position>, ExchangeError>;

    /// Close every open position with reduce-only market orders.
    ///
    /// Per-symbol failures are reported in the result and do not abort the batch.
    async fn close_all_positions(&self) -> Result<Vec<CloseOutcome>, ExchangeError>;

    /// Closed-position P&L records updated after `since`, oldest first.
    async fn closed_pnl_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ClosedPnlEntry>, ExchangeError>;
}

/// Result of attempting to flatten one symbol during a close-all batch.
#[derive(Debug)]
pub struct CloseOutcome {
    pub symbol: String,
    pub result: Result<OrderAck, ExchangeError>,
}

/// Per-account client, constructed from one challenge's decrypted credentials.
///
/// Demo and funded accounts speak the identical wire protocol against different base
/// urls. All requests are signed and flow through the shared per-host [`RateLimiter`].
#[derive(Debug, Clone)]
pub struct AccountClient {
    rest: V5Client,
    rate_limiter: RateLimiter,
}

impl AccountClient {
    /// Construct a new [`Self`] for the provided environment.
    ///
    /// Credentials are consumed here and live only inside the request signer.
    pub fn new(
        credentials: ApiCredentials,
        environment: Environment,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            rest: SignedClient::new(
                environment.rest_url(),
                RequestSigner::new(credentials),
                ResponseParser,
            ),
            rate_limiter,
        }
    }

    async fn throttled<F, T>(&self, priority: Priority, call: F) -> Result<T, ExchangeError>
    where
        F: std::future::Future<Output = Result<T, ExchangeError>>,
    {
        self.rate_limiter.acquire(priority).await;
        let result = call.await;
        match &result {
            Err(error) if error.is_rate_limited() => self.rate_limiter.report_throttled().await,
            Ok(_) => self.rate_limiter.reset_backoff().await,
            Err(_) => {}
        }
        result
    }

    /// Fetch active (unfilled) orders.
    pub async fn open_orders(&self) -> Result<Vec<OpenOrder>, ExchangeError> {
        self.throttled(Priority::Normal, async {
            execute(&self.rest, GetOpenOrders::all())
                .await
                .map(|result| result.list)
        })
        .await
    }

    /// Place an order.
    pub async fn place_order(&self, body: PlaceOrderBody) -> Result<OrderAck, ExchangeError> {
        let symbol = body.symbol.clone();
        let side = body.side;
        let ack = self
            .throttled(Priority::Normal, execute(&self.rest, PlaceOrder { body }))
            .await?;
        info!(%symbol, %side, order_id = %ack.order_id, "order placed");
        Ok(ack)
    }

    /// Cancel an active order.
    pub async fn cancel_order(
        &self,
        symbol: impl Into<String>,
        order_id: impl Into<String>,
    ) -> Result<OrderAck, ExchangeError> {
        let body = CancelOrderBody {
            category: crate::bybit::model::CATEGORY_LINEAR,
            symbol: symbol.into(),
            order_id: order_id.into(),
        };
        self.throttled(Priority::Normal, execute(&self.rest, CancelOrder { body }))
            .await
    }

    /// Fetch OHLCV candlesticks.
    pub async fn klines(
        &self,
        symbol: impl Into<String>,
        interval: impl Into<String>,
        limit: u32,
    ) -> Result<Vec<Kline>, ExchangeError> {
        self.throttled(Priority::Low, async {
            execute(&self.rest, GetKlines::new(symbol, interval, limit))
                .await
                .map(|result| result.list)
        })
        .await
    }

    /// Fetch the tradeable instrument catalogue.
    pub async fn instruments(&self) -> Result<Vec<Instrument>, ExchangeError> {
        self.throttled(Priority::Low, async {
            execute(&self.rest, GetInstruments::trading(500))
                .await
                .map(|result| result.list)
        })
        .await
    }
}

#[async_trait]
impl AccountExchange for AccountClient {
    async fn balance(&self) -> Result<AccountBalance, ExchangeError> {
        self.throttled(Priority::Normal, async {
            execute(&self.rest, GetWalletBalance::usdt())
                .await
                .map(|result| result.usdt())
        })
        .await
    }

    async fn positions(&self) -> Result<Vec<Position>, ExchangeError> {
        self.throttled(Priority::Normal, async {
            execute(&self.rest, GetPositions::all())
                .await
                .map(|result| {
                    result
                        .list
                        .into_iter()
                        .filter(Position::is_open)
                        .collect()
                })
        })
        .await
    }

    async fn close_all_positions(&self) -> Result<Vec<CloseOutcome>, ExchangeError> {
        let positions = self.positions().await?;
        let mut outcomes = Vec::with_capacity(positions.len());

        for position in positions {
            let (Some(side), Some(size)) = (position.side, position.size) else {
                continue;
            };

            let body =
                PlaceOrderBody::market(position.symbol.clone(), side.close_side(), size, true);
            let result = self
                .throttled(Priority::High, execute(&self.rest, PlaceOrder { body }))
                .await;

            match &result {
                Ok(ack) => info!(
                    symbol = %position.symbol,
                    %side,
                    %size,
                    order_id = %ack.order_id,
                    "position closed"
                ),
                Err(err) => error!(
                    symbol = %position.symbol,
                    %err,
                    "failed to close position, continuing batch"
                ),
            }

            outcomes.push(CloseOutcome {
                symbol: position.symbol,
                result,
            });
        }

        Ok(outcomes)
    }

    async fn closed_pnl_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ClosedPnlEntry>, ExchangeError> {
        let start_time_ms = since.map(|time| time.timestamp_millis());
        let mut entries = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let result = self
                .throttled(
                    Priority::Low,
                    execute(&self.rest, GetClosedPnl::since(start_time_ms, cursor.clone())),
                )
                .await?;

            entries.extend(result.list);

            match result.next_page_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }

            // The venue caps history depth; a runaway cursor loop would starve the tick.
            if entries.len() >= 1_000 {
                warn!(count = entries.len(), "closed pnl pagination truncated");
                break;
            }
        }

        // Oldest first so the ledger appends in close order
        entries.sort_by_key(|entry| entry.updated_time);
        Ok(entries)
    }
}
