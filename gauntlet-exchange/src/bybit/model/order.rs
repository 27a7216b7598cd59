use crate::bybit::V5Response;
use gauntlet_integration::{de::de_str_opt, protocol::http::ApiRequest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Order side in venue casing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side of a reduce-only order that closes a position held on this side.
    pub fn close_side(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "Buy"),
            Side::Sell => write!(f, "Sell"),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum OrderType {
    Market,
    Limit,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum TimeInForce {
    #[serde(rename = "GTC")]
    GoodTilCancelled,
    #[serde(rename = "IOC")]
    ImmediateOrCancel,
    #[serde(rename = "FOK")]
    FillOrKill,
    PostOnly,
}

/// Place an order on linear perpetuals.
///
/// Quantities and prices travel as strings on the wire; limit price, stop-loss and
/// take-profit are optional.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub body: PlaceOrderBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaceOrderBody {
    pub category: &'static str,
    pub symbol: String,
    pub side: Side,
    #[serde(rename = "orderType")]
    pub order_type: OrderType,
    pub qty: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(rename = "stopLoss", skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Decimal>,
    #[serde(rename = "takeProfit", skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<Decimal>,
    #[serde(rename = "reduceOnly")]
    pub reduce_only: bool,
    #[serde(rename = "timeInForce")]
    pub time_in_force: TimeInForce,
    /// 0 = one-way position mode.
    #[serde(rename = "positionIdx")]
    pub position_idx: u8,
}

impl PlaceOrderBody {
    pub fn market(symbol: impl Into<String>, side: Side, qty: Decimal, reduce_only: bool) -> Self {
        Self {
            category: super::CATEGORY_LINEAR,
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            qty,
            price: None,
            stop_loss: None,
            take_profit: None,
            reduce_only,
            time_in_force: TimeInForce::ImmediateOrCancel,
            position_idx: 0,
        }
    }
}

impl ApiRequest for PlaceOrder {
    type Response = V5Response<OrderAck>;
    type QueryParams = ();
    type Body = PlaceOrderBody;

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/v5/order/create")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::POST
    }

    fn body(&self) -> Option<&Self::Body> {
        Some(&self.body)
    }
}

/// Cancel one active order.
#[derive(Debug, Clone)]
pub struct CancelOrder {
    pub body: CancelOrderBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelOrderBody {
    pub category: &'static str,
    pub symbol: String,
    #[serde(rename = "orderId")]
    pub order_id: String,
}

impl ApiRequest for CancelOrder {
    type Response = V5Response<OrderAck>;
    type QueryParams = ();
    type Body = CancelOrderBody;

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/v5/order/cancel")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::POST
    }

    fn body(&self) -> Option<&Self::Body> {
        Some(&self.body)
    }
}

/// Acknowledgement returned by order mutation endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderAck {
    #[serde(rename = "orderId", default)]
    pub order_id: String,
    #[serde(rename = "orderLinkId", default)]
    pub order_link_id: String,
}

/// Fetch active orders for the account.
#[derive(Debug, Clone)]
pub struct GetOpenOrders {
    pub params: OpenOrdersParams,
}

impl GetOpenOrders {
    pub fn all() -> Self {
        Self {
            params: OpenOrdersParams {
                category: super::CATEGORY_LINEAR,
                settle_coin: super::SETTLE_COIN,
                symbol: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenOrdersParams {
    pub category: &'static str,
    #[serde(rename = "settleCoin")]
    pub settle_coin: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl ApiRequest for GetOpenOrders {
    type Response = V5Response<OpenOrdersResult>;
    type QueryParams = OpenOrdersParams;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/v5/order/realtime")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.params)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenOrdersResult {
    #[serde(default)]
    pub list: Vec<OpenOrder>,
    #[serde(rename = "nextPageCursor", default)]
    pub next_page_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenOrder {
    #[serde(rename = "orderId")]
    pub order_id: String,
    pub symbol: String,
    pub side: Side,
    #[serde(rename = "orderType")]
    pub order_type: OrderType,
    #[serde(deserialize_with = "de_str_opt", default)]
    pub qty: Option<Decimal>,
    #[serde(deserialize_with = "de_str_opt", default)]
    pub price: Option<Decimal>,
    #[serde(rename = "reduceOnly", default)]
    pub reduce_only: bool,
    #[serde(rename = "orderStatus", default)]
    pub order_status: String,
}

/// Set symbol leverage; applied once at account provisioning.
#[derive(Debug, Clone)]
pub struct SetLeverage {
    pub body: SetLeverageBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetLeverageBody {
    pub category: &'static str,
    pub symbol: String,
    #[serde(rename = "buyLeverage")]
    pub buy_leverage: String,
    #[serde(rename = "sellLeverage")]
    pub sell_leverage: String,
}

impl SetLeverage {
    pub fn symmetric(symbol: impl Into<String>, leverage: u32) -> Self {
        let leverage = leverage.to_string();
        Self {
            body: SetLeverageBody {
                category: super::CATEGORY_LINEAR,
                symbol: symbol.into(),
                buy_leverage: leverage.clone(),
                sell_leverage: leverage,
            },
        }
    }
}

impl ApiRequest for SetLeverage {
    type Response = V5Response<Empty>;
    type QueryParams = ();
    type Body = SetLeverageBody;

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/v5/position/set-leverage")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::POST
    }

    fn body(&self) -> Option<&Self::Body> {
        Some(&self.body)
    }
}

/// Result payload for endpoints whose `result` carries nothing of interest.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Empty {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_place_order_body_minified_wire_shape() {
        let body = PlaceOrderBody::market("BTCUSDT", Side::Buy, dec!(0.5), true);
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains(r#""category":"linear""#));
        assert!(json.contains(r#""side":"Buy""#));
        assert!(json.contains(r#""orderType":"Market""#));
        assert!(json.contains(r#""qty":"0.5""#));
        assert!(json.contains(r#""reduceOnly":true"#));
        // Optional prices are omitted, not null
        assert!(!json.contains("price"));
        assert!(!json.contains("stopLoss"));
    }

    #[test]
    fn test_close_side() {
        assert_eq!(Side::Buy.close_side(), Side::Sell);
        assert_eq!(Side::Sell.close_side(), Side::Buy);
    }
}
