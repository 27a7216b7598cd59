use crate::security::seal::SealKey;
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

/// Default instruments the platform quotes and trades.
const DEFAULT_SYMBOLS: [&str; 7] = [
    "BTCUSDT", "ETHUSDT", "SOLUSDT", "BNBUSDT", "XRPUSDT", "DOGEUSDT", "TONUSDT",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {detail}")]
    Invalid { name: &'static str, detail: String },
}

/// Process configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,

    pub jwt_secret: String,
    pub jwt_access_expire: Duration,
    pub jwt_refresh_expire: Duration,

    /// 32-byte key sealing sub-account credentials at rest.
    pub seal_key: SealKey,

    pub master_api_key: String,
    pub master_api_secret: String,
    pub master_min_balance: Decimal,

    pub engine_check_interval: Duration,
    pub engine_fan_out: usize,

    pub min_payout_amount: Decimal,
    pub referral_level1_pct: Decimal,
    pub referral_level2_pct: Decimal,
    pub referral_payout_days: u32,

    pub rate_limit_per_minute: u32,
    pub rate_limit_trading_per_minute: u32,

    /// Bot token validating signed launch payloads. Optional in environments that
    /// never serve the messaging front-end.
    pub launch_bot_token: Option<String>,

    pub price_symbols: Vec<String>,
    pub price_cache_ttl: Duration,
}

impl Config {
    /// Read configuration from the environment. Only `DATABASE_URL`, `REDIS_URL`,
    /// `JWT_SECRET`, `AES_ENCRYPTION_KEY` and the master credentials are required;
    /// everything else has the documented default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_access_expire: Duration::from_secs(
                parse_or("JWT_ACCESS_EXPIRE_MINUTES", 15u64)? * 60,
            ),
            jwt_refresh_expire: Duration::from_secs(
                parse_or("JWT_REFRESH_EXPIRE_DAYS", 30u64)? * 24 * 3600,
            ),
            seal_key: SealKey::parse(&required("AES_ENCRYPTION_KEY")?).map_err(|err| {
                ConfigError::Invalid {
                    name: "AES_ENCRYPTION_KEY",
                    detail: err.to_string(),
                }
            })?,
            master_api_key: required("EXCHANGE_MASTER_API_KEY")?,
            master_api_secret: required("EXCHANGE_MASTER_API_SECRET")?,
            master_min_balance: parse_or("EXCHANGE_MASTER_MIN_BALANCE", Decimal::new(10_000, 0))?,
            engine_check_interval: Duration::from_secs(parse_or(
                "ENGINE_CHECK_INTERVAL_SECONDS",
                30u64,
            )?),
            engine_fan_out: parse_or("ENGINE_FAN_OUT", 16usize)?,
            min_payout_amount: parse_or("MIN_PAYOUT_AMOUNT", Decimal::new(50, 0))?,
            referral_level1_pct: parse_or("REFERRAL_LEVEL1_PCT", Decimal::new(10, 0))?,
            referral_level2_pct: parse_or("REFERRAL_LEVEL2_PCT", Decimal::new(3, 0))?,
            referral_payout_days: parse_or("REFERRAL_PAYOUT_DAYS", 7u32)?,
            rate_limit_per_minute: parse_or("RATE_LIMIT_PER_MINUTE", 100u32)?,
            rate_limit_trading_per_minute: parse_or("RATE_LIMIT_TRADING_PER_MINUTE", 10u32)?,
            launch_bot_token: std::env::var("LAUNCH_BOT_TOKEN").ok(),
            price_symbols: symbols_from_env(),
            price_cache_ttl: Duration::from_secs(parse_or("PRICE_CACHE_TTL_SECONDS", 10u64)?),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse::<T>().map_err(|err| ConfigError::Invalid {
            name,
            detail: err.to_string(),
        }),
    }
}

fn symbols_from_env() -> Vec<String> {
    match std::env::var("PRICE_SYMBOLS") {
        Ok(raw) if !raw.trim().is_empty() => raw
            .split(',')
            .map(|symbol| symbol.trim().to_uppercase())
            .filter(|symbol| !symbol.is_empty())
            .collect(),
        _ => DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
    }
}
