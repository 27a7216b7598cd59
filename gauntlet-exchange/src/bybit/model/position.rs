use super::order::Side;
use crate::bybit::V5Response;
use gauntlet_integration::{de::de_str_opt, protocol::http::ApiRequest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Fetch all open positions settled in USDT.
#[derive(Debug, Clone)]
pub struct GetPositions {
    pub params: PositionListParams,
}

impl GetPositions {
    pub fn all() -> Self {
        Self {
            params: PositionListParams {
                category: super::CATEGORY_LINEAR,
                settle_coin: super::SETTLE_COIN,
                symbol: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionListParams {
    pub category: &'static str,
    #[serde(rename = "settleCoin")]
    pub settle_coin: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl ApiRequest for GetPositions {
    type Response = V5Response<PositionListResult>;
    type QueryParams = PositionListParams;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/v5/position/list")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.params)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PositionListResult {
    #[serde(default)]
    pub list: Vec<Position>,
    #[serde(rename = "nextPageCursor", default)]
    pub next_page_cursor: Option<String>,
}

/// ### Raw Payload Examples
/// See docs: <https://bybit-exchange.github.io/docs/v5/position>
///```json
/// {
///     "symbol": "BTCUSDT",
///     "side": "Buy",
///     "size": "0.5",
///     "avgPrice": "16578.50",
///     "leverage": "10",
///     "unrealisedPnl": "12.40",
///     "markPrice": "16603.30"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// `None` when the venue reports a flat slot (side = "").
    #[serde(deserialize_with = "de_position_side", default)]
    pub side: Option<Side>,
    #[serde(deserialize_with = "de_str_opt", default)]
    pub size: Option<Decimal>,
    #[serde(rename = "avgPrice", deserialize_with = "de_str_opt", default)]
    pub entry_price: Option<Decimal>,
    #[serde(deserialize_with = "de_str_opt", default)]
    pub leverage: Option<Decimal>,
    #[serde(rename = "unrealisedPnl", deserialize_with = "de_str_opt", default)]
    pub unrealised_pnl: Option<Decimal>,
    #[serde(rename = "markPrice", deserialize_with = "de_str_opt", default)]
    pub mark_price: Option<Decimal>,
}

impl Position {
    /// Whether the venue reports actual exposure on this slot.
    pub fn is_open(&self) -> bool {
        self.side.is_some()
            && self
                .size
                .map(|size| size > Decimal::ZERO)
                .unwrap_or(false)
    }
}

fn de_position_side<'de, D>(deserializer: D) -> Result<Option<Side>, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let side: &str = serde::de::Deserialize::deserialize(deserializer)?;
    match side {
        "Buy" => Ok(Some(Side::Buy)),
        "Sell" => Ok(Some(Side::Sell)),
        "" | "None" => Ok(None),
        other => Err(serde::de::Error::unknown_variant(
            other,
            &["Buy", "Sell", ""],
        )),
    }
}

/// Fetch closed-position P&L records (cursor-based pagination).
#[derive(Debug, Clone)]
pub struct GetClosedPnl {
    pub params: ClosedPnlParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClosedPnlParams {
    pub category: &'static str,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(rename = "startTime", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl GetClosedPnl {
    pub fn since(start_time_ms: Option<i64>, cursor: Option<String>) -> Self {
        Self {
            params: ClosedPnlParams {
                category: super::CATEGORY_LINEAR,
                limit: 100,
                symbol: None,
                start_time: start_time_ms,
                cursor,
            },
        }
    }
}

impl ApiRequest for GetClosedPnl {
    type Response = V5Response<ClosedPnlResult>;
    type QueryParams = ClosedPnlParams;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/v5/position/closed-pnl")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.params)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClosedPnlResult {
    #[serde(default)]
    pub list: Vec<ClosedPnlEntry>,
    #[serde(rename = "nextPageCursor", default)]
    pub next_page_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClosedPnlEntry {
    pub symbol: String,
    pub side: Side,
    #[serde(rename = "orderId")]
    pub order_id: String,
    #[serde(deserialize_with = "de_str_opt", default)]
    pub qty: Option<Decimal>,
    #[serde(rename = "avgEntryPrice", deserialize_with = "de_str_opt", default)]
    pub avg_entry_price: Option<Decimal>,
    #[serde(rename = "avgExitPrice", deserialize_with = "de_str_opt", default)]
    pub avg_exit_price: Option<Decimal>,
    #[serde(rename = "closedPnl", deserialize_with = "de_str_opt", default)]
    pub closed_pnl: Option<Decimal>,
    #[serde(deserialize_with = "de_str_opt", default)]
    pub leverage: Option<Decimal>,
    #[serde(
        rename = "createdTime",
        deserialize_with = "gauntlet_integration::de::de_str_u64_epoch_ms_as_datetime_utc"
    )]
    pub created_time: chrono::DateTime<chrono::Utc>,
    #[serde(
        rename = "updatedTime",
        deserialize_with = "gauntlet_integration::de::de_str_u64_epoch_ms_as_datetime_utc"
    )]
    pub updated_time: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_position_deserialise() {
        struct TestCase {
            input: &'static str,
            expected_open: bool,
        }

        let tests = vec![
            // TC0: open Buy position
            TestCase {
                input: r#"
                    {
                        "symbol": "BTCUSDT",
                        "side": "Buy",
                        "size": "0.5",
                        "avgPrice": "16578.50",
                        "leverage": "10",
                        "unrealisedPnl": "12.40",
                        "markPrice": "16603.30"
                    }
                "#,
                expected_open: true,
            },
            // TC1: flat slot with empty side
            TestCase {
                input: r#"
                    {
                        "symbol": "ETHUSDT",
                        "side": "",
                        "size": "0",
                        "avgPrice": "",
                        "leverage": "",
                        "unrealisedPnl": "",
                        "markPrice": ""
                    }
                "#,
                expected_open: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let position = serde_json::from_str::<Position>(test.input).unwrap();
            assert_eq!(position.is_open(), test.expected_open, "TC{index} failed");
        }
    }

    #[test]
    fn test_closed_pnl_entry_deserialise() {
        let input = r#"
            {
                "symbol": "BTCUSDT",
                "side": "Sell",
                "orderId": "7d17d359-4e38-4d3a-9a24-d1e1a0a0b4d3",
                "qty": "0.01",
                "avgEntryPrice": "16500.00",
                "avgExitPrice": "16650.00",
                "closedPnl": "1.50",
                "leverage": "10",
                "createdTime": "1672304486865",
                "updatedTime": "1672308086865"
            }
        "#;

        let entry = serde_json::from_str::<ClosedPnlEntry>(input).unwrap();
        assert_eq!(entry.closed_pnl, Some(dec!(1.50)));
        assert_eq!(entry.side, Side::Sell);
    }
}
