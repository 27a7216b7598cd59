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

//! # Gauntlet-Ledger
//! Durable, transactional record of the Gauntlet trading-evaluation platform:
//! users, challenge plans, challenges, trades, violations, payouts, scaling steps
//! and the notification outbox.
//!
//! Backed by Postgres via `sqlx`. All monetary columns are fixed-scale decimals.
//! Mutating challenge operations go through [`LedgerStore`](store::LedgerStore)
//! methods that commit in a single transaction, taking a row lock
//! (`SELECT … FOR UPDATE`) on the challenge for the duration of the commit.

/// All [`Error`](std::error::Error)s generated in Gauntlet-Ledger.
pub mod error;

/// Entity types mirroring the relational schema.
pub mod model;

/// [`LedgerStore`](store::LedgerStore): pooled connections and typed queries.
pub mod store;

pub use error::LedgerError;
pub use store::LedgerStore;
