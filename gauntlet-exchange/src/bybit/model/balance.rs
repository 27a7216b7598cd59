use crate::bybit::V5Response;
use gauntlet_integration::{de::de_str_opt, protocol::http::ApiRequest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Fetch the unified wallet balance for the authenticated account.
#[derive(Debug, Clone)]
pub struct GetWalletBalance {
    pub params: WalletBalanceParams,
}

impl GetWalletBalance {
    pub fn usdt() -> Self {
        Self {
            params: WalletBalanceParams {
                account_type: "UNIFIED",
                coin: super::SETTLE_COIN,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletBalanceParams {
    #[serde(rename = "accountType")]
    pub account_type: &'static str,
    pub coin: &'static str,
}

impl ApiRequest for GetWalletBalance {
    type Response = V5Response<WalletBalanceResult>;
    type QueryParams = WalletBalanceParams;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/v5/account/wallet-balance")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.params)
    }
}

/// ### Raw Payload Examples
/// See docs: <https://bybit-exchange.github.io/docs/v5/account/wallet-balance>
///```json
/// {
///     "list": [{
///         "accountType": "UNIFIED",
///         "coin": [{
///             "coin": "USDT",
///             "walletBalance": "9499.00",
///             "unrealisedPnl": "0",
///             "equity": "9499.00",
///             "availableToWithdraw": "9499.00"
///         }]
///     }]
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletBalanceResult {
    #[serde(default)]
    pub list: Vec<WalletAccount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletAccount {
    #[serde(rename = "accountType")]
    pub account_type: String,
    #[serde(rename = "coin", default)]
    pub coins: Vec<CoinBalance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinBalance {
    pub coin: String,
    #[serde(rename = "walletBalance", deserialize_with = "de_str_opt", default)]
    pub wallet_balance: Option<Decimal>,
    #[serde(rename = "unrealisedPnl", deserialize_with = "de_str_opt", default)]
    pub unrealised_pnl: Option<Decimal>,
    #[serde(rename = "equity", deserialize_with = "de_str_opt", default)]
    pub equity: Option<Decimal>,
    #[serde(rename = "availableToWithdraw", deserialize_with = "de_str_opt", default)]
    pub available_to_withdraw: Option<Decimal>,
}

/// USDT-denominated balance snapshot the rule-check loop consumes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AccountBalance {
    pub wallet: Decimal,
    pub unrealized_pnl: Decimal,
    pub equity: Decimal,
    pub available: Decimal,
}

impl AccountBalance {
    pub const ZERO: Self = Self {
        wallet: Decimal::ZERO,
        unrealized_pnl: Decimal::ZERO,
        equity: Decimal::ZERO,
        available: Decimal::ZERO,
    };
}

impl WalletBalanceResult {
    /// Extract the USDT leg of the unified account, defaulting to zero when the venue
    /// returns an empty list (freshly provisioned sub-account).
    pub fn usdt(&self) -> AccountBalance {
        self.list
            .first()
            .and_then(|account| {
                account
                    .coins
                    .iter()
                    .find(|coin| coin.coin == super::SETTLE_COIN)
            })
            .map(|coin| AccountBalance {
                wallet: coin.wallet_balance.unwrap_or(Decimal::ZERO),
                unrealized_pnl: coin.unrealised_pnl.unwrap_or(Decimal::ZERO),
                equity: coin.equity.unwrap_or(Decimal::ZERO),
                available: coin.available_to_withdraw.unwrap_or(Decimal::ZERO),
            })
            .unwrap_or(AccountBalance::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_wallet_balance_usdt() {
        let input = r#"
            {
                "list": [{
                    "accountType": "UNIFIED",
                    "coin": [{
                        "coin": "USDT",
                        "walletBalance": "9499.00",
                        "unrealisedPnl": "0",
                        "equity": "9499.00",
                        "availableToWithdraw": ""
                    }]
                }]
            }
        "#;

        let result = serde_json::from_str::<WalletBalanceResult>(input).unwrap();
        let balance = result.usdt();
        assert_eq!(balance.wallet, dec!(9499.00));
        assert_eq!(balance.unrealized_pnl, dec!(0));
        assert_eq!(balance.equity, dec!(9499.00));
        assert_eq!(balance.available, dec!(0));
    }

    #[test]
    fn test_wallet_balance_empty_list_is_zero() {
        let result = serde_json::from_str::<WalletBalanceResult>(r#"{"list": []}"#).unwrap();
        assert_eq!(result.usdt(), AccountBalance::ZERO);
    }
}
