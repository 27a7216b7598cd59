use gauntlet_integration::error::SocketError;
use thiserror::Error;

/// All errors generated by the price feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The symbol is not on the configured allow-list.
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    /// A cached price exists but exceeds the configured TTL.
    #[error("stale price for {symbol}: age {age_ms}ms exceeds ttl")]
    Stale { symbol: String, age_ms: i64 },

    #[error("socket error: {0}")]
    Socket(#[from] SocketError),
}
