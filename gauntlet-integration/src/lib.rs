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
#![allow(clippy::type_complexity, clippy::too_many_arguments)]

//! # Gauntlet-Integration
//! Low-level plumbing for the web integrations used by the Gauntlet
//! trading-evaluation platform.
//!
//! Provides the glue the higher-level crates build on:
//! - **SignedClient** executing typed [`ApiRequest`](protocol::http::ApiRequest)s,
//!   where the payload the venue's [`AuthScheme`](protocol::http::AuthScheme) signs
//!   is, by construction, the payload that goes on the wire.
//! - **FeedSocket**: a long-lived JSON message stream over one WebSocket, with
//!   control frames handled in place.
//! - **RateLimiter** bounding concurrent requests per remote host, with
//!   adaptive backoff after throttling responses.
//! - **Backoff** for reconnect/retry loops with jitter.

/// All [`Error`](std::error::Error)s generated in Gauntlet-Integration.
pub mod error;

/// Signed Http ([`SignedClient`](protocol::http::client::SignedClient)) and
/// WebSocket ([`FeedSocket`](protocol::websocket::FeedSocket)) protocol
/// implementations.
pub mod protocol;

/// Utilities to assist deserialisation of exchange wire formats.
pub mod de;

/// Token-bucket [`RateLimiter`](rate_limit::RateLimiter) with priority
/// queues and adaptive backoff.
pub mod rate_limit;

/// Exponential [`Backoff`](backoff::Backoff) schedule with jitter, used by
/// stream reconnects and transient-error retries.
pub mod backoff;
