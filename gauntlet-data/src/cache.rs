use crate::error::FeedError;
use chrono::{DateTime, Utc};
use fnv::FnvHashMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::{sync::Arc, time::Duration};

/// Latest traded price of one instrument and when it was observed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PricePoint {
    pub price: Decimal,
    pub time: DateTime<Utc>,
}

struct Inner {
    prices: RwLock<FnvHashMap<String, PricePoint>>,
    allow_list: Vec<String>,
    ttl: Duration,
}

/// Shared recent-price map keyed by instrument symbol, bounded-staleness reads.
///
/// Writers (the stream task, the REST fallback) publish without blocking readers for
/// longer than the map insert. Reads for symbols off the allow-list fail with
/// [`FeedError::UnknownSymbol`]; entries older than the TTL fail with
/// [`FeedError::Stale`] so callers fall back to REST.
#[derive(Clone)]
pub struct PriceCache {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for PriceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceCache")
            .field("allow_list", &self.inner.allow_list)
            .field("ttl", &self.inner.ttl)
            .finish()
    }
}

impl PriceCache {
    /// Construct a new [`Self`] for the provided allow-list and TTL.
    pub fn new(allow_list: Vec<String>, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                prices: RwLock::new(FnvHashMap::default()),
                allow_list,
                ttl,
            }),
        }
    }

    /// Symbols this cache serves.
    pub fn allow_list(&self) -> &[String] {
        &self.inner.allow_list
    }

    /// Whether `symbol` is on the allow-list.
    pub fn supports(&self, symbol: &str) -> bool {
        self.inner.allow_list.iter().any(|s| s == symbol)
    }

    /// Publish an observed price. Updates for symbols off the allow-list are dropped.
    pub fn publish(&self, symbol: &str, price: Decimal, time: DateTime<Utc>) {
        if !self.supports(symbol) {
            return;
        }
        self.inner
            .prices
            .write()
            .insert(symbol.to_owned(), PricePoint { price, time });
    }

    /// Latest price of `symbol`, enforcing the staleness bound at `now`.
    pub fn price_at(&self, symbol: &str, now: DateTime<Utc>) -> Result<PricePoint, FeedError> {
        if !self.supports(symbol) {
            return Err(FeedError::UnknownSymbol(symbol.to_owned()));
        }

        let point = self
            .inner
            .prices
            .read()
            .get(symbol)
            .copied()
            .ok_or_else(|| FeedError::Stale {
                symbol: symbol.to_owned(),
                age_ms: i64::MAX,
            })?;

        let age = now.signed_duration_since(point.time);
        if age.num_milliseconds() > self.inner.ttl.as_millis() as i64 {
            return Err(FeedError::Stale {
                symbol: symbol.to_owned(),
                age_ms: age.num_milliseconds(),
            });
        }

        Ok(point)
    }

    /// Latest price of `symbol`, enforcing the staleness bound now.
    pub fn price(&self, symbol: &str) -> Result<PricePoint, FeedError> {
        self.price_at(symbol, Utc::now())
    }

    /// Fresh prices for every allow-listed symbol that has one. Stale or missing
    /// entries are simply absent; callers decide whether to REST-refresh.
    pub fn prices_all(&self) -> FnvHashMap<String, Decimal> {
        let now = Utc::now();
        let ttl_ms = self.inner.ttl.as_millis() as i64;
        self.inner
            .prices
            .read()
            .iter()
            .filter(|(_, point)| now.signed_duration_since(point.time).num_milliseconds() <= ttl_ms)
            .map(|(symbol, point)| (symbol.clone(), point.price))
            .collect()
    }

    /// Allow-listed symbols currently missing a fresh price.
    pub fn missing(&self) -> Vec<String> {
        let fresh = self.prices_all();
        self.inner
            .allow_list
            .iter()
            .filter(|symbol| !fresh.contains_key(*symbol))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use rust_decimal_macros::dec;

    fn cache() -> PriceCache {
        PriceCache::new(
            vec!["BTCUSDT".into(), "ETHUSDT".into()],
            Duration::from_secs(10),
        )
    }

    #[test]
    fn test_publish_and_read() {
        let cache = cache();
        let now = Utc::now();
        cache.publish("BTCUSDT", dec!(16578.50), now);

        let point = cache.price_at("BTCUSDT", now).unwrap();
        assert_eq!(point.price, dec!(16578.50));
    }

    #[test]
    fn test_unknown_symbol() {
        let cache = cache();
        assert!(matches!(
            cache.price("DOGEUSDT"),
            Err(FeedError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn test_stale_after_ttl() {
        let cache = cache();
        let observed = Utc::now();
        cache.publish("BTCUSDT", dec!(16578.50), observed);

        let later = observed + TimeDelta::seconds(11);
        assert!(matches!(
            cache.price_at("BTCUSDT", later),
            Err(FeedError::Stale { .. })
        ));
    }

    #[test]
    fn test_off_allow_list_updates_dropped() {
        let cache = cache();
        cache.publish("DOGEUSDT", dec!(0.08), Utc::now());
        assert!(cache.prices_all().is_empty());
    }

    #[test]
    fn test_missing_reports_unfilled_symbols() {
        let cache = cache();
        cache.publish("BTCUSDT", dec!(16578.50), Utc::now());
        assert_eq!(cache.missing(), vec!["ETHUSDT".to_string()]);
    }
}
