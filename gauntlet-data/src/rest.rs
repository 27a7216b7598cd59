use crate::{cache::PriceCache, error::FeedError};
use chrono::Utc;
use gauntlet_integration::de::de_str;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Ticker-price endpoint backing the cache on miss or staleness.
const REST_BASE_URL: &str = "https://api.binance.com/api/v3/ticker/price";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Deserialize)]
struct TickerPrice {
    symbol: String,
    #[serde(deserialize_with = "de_str")]
    price: Decimal,
}

/// REST fallback for the price feed.
///
/// A single unauthenticated batch call returns the full ticker table, refreshing the
/// entire allow-list in one round trip.
#[derive(Debug, Clone)]
pub struct PriceRestClient {
    http: reqwest::Client,
}

impl Default for PriceRestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceRestClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Fetch the current price of one symbol.
    pub async fn fetch_price(&self, symbol: &str) -> Result<Decimal, FeedError> {
        let ticker = self
            .http
            .get(REST_BASE_URL)
            .query(&[("symbol", symbol)])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(gauntlet_integration::error::SocketError::from)?
            .error_for_status()
            .map_err(gauntlet_integration::error::SocketError::from)?
            .json::<TickerPrice>()
            .await
            .map_err(gauntlet_integration::error::SocketError::from)?;

        Ok(ticker.price)
    }

    /// Fetch the full ticker table in one round trip.
    async fn fetch_all(&self) -> Result<Vec<TickerPrice>, FeedError> {
        Ok(self
            .http
            .get(REST_BASE_URL)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(gauntlet_integration::error::SocketError::from)?
            .error_for_status()
            .map_err(gauntlet_integration::error::SocketError::from)?
            .json::<Vec<TickerPrice>>()
            .await
            .map_err(gauntlet_integration::error::SocketError::from)?)
    }

    /// Fill every allow-listed slot currently missing a fresh price.
    ///
    /// Returns the number of slots refreshed.
    pub async fn refresh_missing(&self, cache: &PriceCache) -> Result<usize, FeedError> {
        let missing = cache.missing();
        if missing.is_empty() {
            return Ok(0);
        }

        let tickers = self.fetch_all().await?;
        let now = Utc::now();
        let mut refreshed = 0;

        for ticker in tickers {
            if missing.iter().any(|symbol| *symbol == ticker.symbol) {
                cache.publish(&ticker.symbol, ticker.price, now);
                refreshed += 1;
            }
        }

        debug!(requested = missing.len(), refreshed, "rest price refresh");
        Ok(refreshed)
    }

    /// Resolve `symbol` from the cache, falling back to REST on miss or staleness and
    /// publishing the fetched price.
    pub async fn price_or_fetch(
        &self,
        cache: &PriceCache,
        symbol: &str,
    ) -> Result<Decimal, FeedError> {
        match cache.price(symbol) {
            Ok(point) => Ok(point.price),
            Err(FeedError::UnknownSymbol(symbol)) => Err(FeedError::UnknownSymbol(symbol)),
            Err(FeedError::Stale { .. }) => {
                let price = self.fetch_price(symbol).await?;
                cache.publish(symbol, price, Utc::now());
                Ok(price)
            }
            Err(other) => Err(other),
        }
    }
}
