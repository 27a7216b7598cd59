/// Wallet balance models for `/v5/account/wallet-balance`.
pub mod balance;

/// Position models for `/v5/position/*`.
pub mod position;

/// Order models for `/v5/order/*`.
pub mod order;

/// Candlestick models for `/v5/market/kline`.
pub mod kline;

/// Instrument catalogue models for `/v5/market/instruments-info`.
pub mod instrument;

/// Sub-account and API-key models for `/v5/user/*` and demo top-ups.
pub mod subaccount;

/// Internal transfer models for `/v5/asset/transfer/*`.
pub mod transfer;

/// Product category communicated with every trading request. Gauntlet only trades
/// USDT-settled linear perpetuals.
pub const CATEGORY_LINEAR: &str = "linear";

/// Settlement coin for every Gauntlet account.
pub const SETTLE_COIN: &str = "USDT";
