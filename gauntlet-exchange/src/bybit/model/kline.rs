use crate::bybit::V5Response;
use gauntlet_integration::{de::de_str, protocol::http::ApiRequest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Fetch OHLCV candlesticks for one symbol.
#[derive(Debug, Clone)]
pub struct GetKlines {
    pub params: KlineParams,
}

impl GetKlines {
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>, limit: u32) -> Self {
        Self {
            params: KlineParams {
                category: super::CATEGORY_LINEAR,
                symbol: symbol.into(),
                interval: interval.into(),
                limit,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KlineParams {
    pub category: &'static str,
    pub symbol: String,
    /// Venue interval token: 1, 3, 5, 15, 30, 60, 120, 240, 360, 720, D, W, M.
    pub interval: String,
    pub limit: u32,
}

impl ApiRequest for GetKlines {
    type Response = V5Response<KlineResult>;
    type QueryParams = KlineParams;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/v5/market/kline")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.params)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KlineResult {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub list: Vec<Kline>,
}

/// One candle, encoded on the wire as
/// `[startTime, open, high, low, close, volume, turnover]` of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Kline(
    #[serde(deserialize_with = "de_str")] pub i64,
    #[serde(deserialize_with = "de_str")] pub Decimal,
    #[serde(deserialize_with = "de_str")] pub Decimal,
    #[serde(deserialize_with = "de_str")] pub Decimal,
    #[serde(deserialize_with = "de_str")] pub Decimal,
    #[serde(deserialize_with = "de_str")] pub Decimal,
    #[serde(deserialize_with = "de_str")] pub Decimal,
);

impl Kline {
    pub fn start_time_ms(&self) -> i64 {
        self.0
    }
    pub fn open(&self) -> Decimal {
        self.1
    }
    pub fn high(&self) -> Decimal {
        self.2
    }
    pub fn low(&self) -> Decimal {
        self.3
    }
    pub fn close(&self) -> Decimal {
        self.4
    }
    pub fn volume(&self) -> Decimal {
        self.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_kline_deserialise() {
        let input = r#"
            {
                "symbol": "BTCUSDT",
                "list": [
                    ["1672304400000", "16550.00", "16600.00", "16500.00", "16578.50", "12.5", "206981.25"]
                ]
            }
        "#;

        let result = serde_json::from_str::<KlineResult>(input).unwrap();
        let kline = &result.list[0];
        assert_eq!(kline.start_time_ms(), 1672304400000);
        assert_eq!(kline.open(), dec!(16550.00));
        assert_eq!(kline.close(), dec!(16578.50));
    }
}
