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

//! # Gauntlet-Exchange
//! Exchange gateway for the Gauntlet trading-evaluation platform.
//!
//! Two clients speak the same v5 unified-API wire protocol with different credentials:
//! - [`AccountClient`](bybit::account::AccountClient): constructed from one challenge's
//!   decrypted sub-account credentials. Balance, positions, orders, close-all, klines.
//! - [`MasterClient`](bybit::master::MasterClient): single, process-wide, privileged.
//!   Sub-account and API-key creation, demo-balance provisioning, internal transfers.
//!
//! Request signing is HMAC-SHA256 over `timestamp + api_key + recv_window + payload`
//! with a 5000ms receive window; a non-zero response code surfaces as
//! [`ExchangeError::Api`](error::ExchangeError::Api).

/// All [`Error`](std::error::Error)s generated in Gauntlet-Exchange, split into
/// transient (retry) and permanent (log & surface) classes.
pub mod error;

/// Sub-account API credentials. Never logged in plaintext.
pub mod credentials;

/// Venue v5 unified-API implementation: signing, response parsing, wire models,
/// account & master clients.
pub mod bybit;

pub use bybit::{
    account::{AccountClient, AccountExchange},
    master::{MasterClient, MasterExchange, ProvisionedAccount},
    Environment,
};
pub use credentials::ApiCredentials;
pub use error::ExchangeError;
