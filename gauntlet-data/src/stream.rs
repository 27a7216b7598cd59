use crate::cache::PriceCache;
use gauntlet_integration::{
    backoff::Backoff,
    de::{de_str, de_u64_epoch_ms_as_datetime_utc},
    error::SocketError,
    protocol::websocket::FeedSocket,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

/// Combined-stream endpoint serving aggregate trades for many symbols over one socket.
const STREAM_BASE_URL: &str = "wss://stream.binance.com:9443/stream";

/// Envelope wrapping every combined-stream message.
#[derive(Debug, Clone, Deserialize)]
struct StreamEnvelope {
    #[serde(rename = "stream", default)]
    _stream: String,
    data: AggTrade,
}

/// ### Raw Payload Examples
/// See docs: <https://developers.binance.com/docs/binance-spot-api-docs/web-socket-streams#aggregate-trade-streams>
///```json
/// {
///     "e": "aggTrade",
///     "E": 1672515782136,
///     "s": "BTCUSDT",
///     "p": "16578.50",
///     "q": "0.001",
///     "T": 1672515782134
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
struct AggTrade {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "p", deserialize_with = "de_str")]
    price: Decimal,
    #[serde(rename = "T", deserialize_with = "de_u64_epoch_ms_as_datetime_utc")]
    time: chrono::DateTime<chrono::Utc>,
}

/// Long-lived aggregate-trade subscription publishing into a [`PriceCache`].
///
/// One socket carries every allow-listed symbol via slash-joined channels. Consumers
/// read the cache; the stream never blocks on them. Disconnects reconnect with
/// exponential backoff from a 3s base.
#[derive(Debug)]
pub struct PriceStream {
    cache: PriceCache,
}

impl PriceStream {
    pub fn new(cache: PriceCache) -> Self {
        Self { cache }
    }

    /// Combined-stream url with one `{symbol}@aggTrade` channel per allow-listed symbol.
    fn stream_url(&self) -> Result<Url, url::ParseError> {
        let channels = self
            .cache
            .allow_list()
            .iter()
            .map(|symbol| format!("{}@aggTrade", symbol.to_lowercase()))
            .collect::<Vec<_>>()
            .join("/");
        Url::parse(&format!("{STREAM_BASE_URL}?streams={channels}"))
    }

    /// Run until cancelled, reconnecting on any stream failure.
    pub async fn run(self) {
        let mut backoff = Backoff::stream_reconnect();

        loop {
            let url = match self.stream_url() {
                Ok(url) => url,
                Err(error) => {
                    // Only reachable with a malformed allow-list symbol; nothing to retry.
                    warn!(%error, "invalid stream url, price stream stopping");
                    return;
                }
            };

            match FeedSocket::connect(url.as_str()).await {
                Ok(socket) => {
                    info!(symbols = self.cache.allow_list().len(), "price stream connected");
                    backoff.reset();
                    self.consume(socket).await;
                }
                Err(error) => {
                    debug!(%error, "price stream connect failed");
                }
            }

            let delay = backoff.next_delay();
            warn!(
                reconnect_in_ms = delay.as_millis() as u64,
                attempt = backoff.attempt(),
                "price stream disconnected, reconnecting"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Publish updates until the socket errors or closes.
    ///
    /// An undecodable message is dropped (the venue occasionally interleaves service
    /// frames); transport errors end the session so the caller reconnects.
    async fn consume(&self, mut socket: FeedSocket) {
        while let Some(message) = socket.next_message::<StreamEnvelope>().await {
            match message {
                Ok(envelope) => {
                    self.cache.publish(
                        &envelope.data.symbol,
                        envelope.data.price,
                        envelope.data.time,
                    );
                }
                Err(SocketError::Deserialise { error, .. }) => {
                    debug!(%error, "price stream message dropped");
                }
                Err(error) => {
                    debug!(%error, "price stream session ended");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    #[test]
    fn test_stream_url_joins_channels_with_slash() {
        let cache = PriceCache::new(
            vec!["BTCUSDT".into(), "ETHUSDT".into()],
            Duration::from_secs(10),
        );
        let stream = PriceStream::new(cache);
        let url = stream.stream_url().unwrap();
        assert_eq!(
            url.as_str(),
            "wss://stream.binance.com:9443/stream?streams=btcusdt@aggTrade/ethusdt@aggTrade"
        );
    }

    #[test]
    fn test_envelope_deserialise_publishes_price() {
        let input = r#"
            {
                "stream": "btcusdt@aggTrade",
                "data": {
                    "e": "aggTrade",
                    "E": 1672515782136,
                    "s": "BTCUSDT",
                    "p": "16578.50",
                    "q": "0.001",
                    "T": 1672515782134
                }
            }
        "#;

        let envelope = serde_json::from_str::<StreamEnvelope>(input).unwrap();
        assert_eq!(envelope.data.symbol, "BTCUSDT");
        assert_eq!(envelope.data.price, dec!(16578.50));
    }
}
