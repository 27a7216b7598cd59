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

//! # Gauntlet
//! Challenge engine of the Gauntlet proprietary-trading evaluation platform.
//!
//! A deterministic rule-enforcement and lifecycle state machine that governs trader
//! evaluation accounts against measurable risk limits, drives phase transitions
//! (evaluation → verification → funded), and funds real sub-accounts on a
//! cryptocurrency-futures exchange when traders pass:
//! - **risk**: pure fixed-point P&L, drawdown and position-sizing arithmetic.
//! - **rules**: the pure rule engine; violations, promotions and warnings over one
//!   challenge snapshot.
//! - **engine**: the periodic orchestrator reconciling every active challenge against
//!   live exchange state and committing transitions atomically.
//! - **paper**: the synthetic-fill engine demo accounts trade against the live feed.
//! - **notify**: commit-then-notify hand-off into the Redis queue and outbox.
//! - **security**: credential sealing, token pairs, signed-launch-data validation.

/// Environment-driven configuration.
pub mod config;

/// All [`Error`](std::error::Error)s generated in the engine layer.
pub mod error;

/// The periodic orchestrator: rule-check loop, transitions, scaling, daily reset.
pub mod engine;

/// Initialise Gauntlet logging (plain or JSON).
pub mod logging;

/// Notification hand-off: typed payloads, Redis FIFO queue, outbox, deduplication.
pub mod notify;

/// Synthetic-trade matching for paper (demo) accounts.
pub mod paper;

/// Pure price-and-risk arithmetic.
pub mod risk;

/// Pure rule engine over a challenge snapshot.
pub mod rules;

/// Credential sealing, JWT pair, signed-launch-data validation, referral codes,
/// sliding-window rate limits.
pub mod security;

/// Process-wide runtime wiring: config, pools, feed, orchestrator.
pub mod runtime;
