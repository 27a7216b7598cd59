#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity)]

//! # Gauntlet-Data
//! Live price feed for the Gauntlet trading-evaluation platform.
//!
//! Supplies the latest traded price for a finite allow-list of instruments with
//! bounded staleness:
//! - A single long-lived WebSocket subscription to the aggregate-trade stream for all
//!   allow-listed symbols publishes each update into a shared [`PriceCache`](cache::PriceCache).
//! - On cache miss or staleness, a REST fetch fills the slot; a single batch call can
//!   refresh the entire allow-list in one round trip.
//! - The stream reconnects with exponential backoff (base 3s) and never blocks on
//!   consumers.

/// All [`Error`](std::error::Error)s generated in Gauntlet-Data.
pub mod error;

/// Shared recent-price cache with TTL staleness enforcement.
pub mod cache;

/// Aggregate-trade WebSocket stream feeding the cache.
pub mod stream;

/// REST fallback: single-symbol fetch and one-shot batch refresh.
pub mod rest;

pub use cache::{PriceCache, PricePoint};
pub use error::FeedError;
pub use rest::PriceRestClient;
pub use stream::PriceStream;
