use crate::bybit::V5Response;
use gauntlet_integration::protocol::http::ApiRequest;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Create a real sub-member under the master account.
#[derive(Debug, Clone)]
pub struct CreateSubMember {
    pub body: CreateSubMemberBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSubMemberBody {
    pub username: String,
    /// 1 = normal sub-member.
    #[serde(rename = "memberType")]
    pub member_type: u8,
    pub note: String,
}

impl CreateSubMember {
    pub fn new(username: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            body: CreateSubMemberBody {
                username: username.into(),
                member_type: 1,
                note: note.into(),
            },
        }
    }
}

impl ApiRequest for CreateSubMember {
    type Response = V5Response<CreateSubMemberResult>;
    type QueryParams = ();
    type Body = CreateSubMemberBody;

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/v5/user/create-sub-member")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::POST
    }

    fn body(&self) -> Option<&Self::Body> {
        Some(&self.body)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSubMemberResult {
    #[serde(deserialize_with = "de_string_or_u64", default)]
    pub uid: String,
    #[serde(default)]
    pub username: String,
}

/// Create an API key for a sub-member.
///
/// Withdrawal capability is never granted: permissions are fixed to contract trading
/// plus internal transfers only.
#[derive(Debug, Clone)]
pub struct CreateSubApiKey {
    pub body: CreateSubApiKeyBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSubApiKeyBody {
    pub subuid: i64,
    pub note: String,
    #[serde(rename = "readOnly")]
    pub read_only: u8,
    pub permissions: ApiKeyPermissions,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyPermissions {
    #[serde(rename = "ContractTrade")]
    pub contract_trade: Vec<&'static str>,
    #[serde(rename = "Wallet")]
    pub wallet: Vec<&'static str>,
}

impl ApiKeyPermissions {
    /// Order + position management and internal transfers. Nothing else.
    pub fn trading() -> Self {
        Self {
            contract_trade: vec!["Order", "Position"],
            wallet: vec!["AccountTransfer"],
        }
    }
}

impl CreateSubApiKey {
    pub fn new(sub_uid: i64, note: impl Into<String>, read_only: bool) -> Self {
        Self {
            body: CreateSubApiKeyBody {
                subuid: sub_uid,
                note: note.into(),
                read_only: u8::from(read_only),
                permissions: ApiKeyPermissions::trading(),
            },
        }
    }
}

impl ApiRequest for CreateSubApiKey {
    type Response = V5Response<SubApiKeyResult>;
    type QueryParams = ();
    type Body = CreateSubApiKeyBody;

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/v5/user/create-sub-api")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::POST
    }

    fn body(&self) -> Option<&Self::Body> {
        Some(&self.body)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubApiKeyResult {
    #[serde(rename = "apiKey", default)]
    pub api_key: String,
    #[serde(default)]
    pub secret: String,
}

/// Credit a demo-trading wallet. Served from the demo base url.
#[derive(Debug, Clone)]
pub struct DemoTopUp {
    pub body: DemoTopUpBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct DemoTopUpBody {
    /// 0 = set wallet balance to the provided amount.
    #[serde(rename = "adjustType")]
    pub adjust_type: u8,
    #[serde(rename = "utaDemoApplyMoney")]
    pub apply_money: Vec<DemoApplyMoney>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DemoApplyMoney {
    pub coin: &'static str,
    #[serde(rename = "amountStr")]
    pub amount_str: String,
}

impl DemoTopUp {
    pub fn usdt(amount: rust_decimal::Decimal) -> Self {
        Self {
            body: DemoTopUpBody {
                adjust_type: 0,
                apply_money: vec![DemoApplyMoney {
                    coin: super::SETTLE_COIN,
                    amount_str: amount.normalize().to_string(),
                }],
            },
        }
    }
}

impl ApiRequest for DemoTopUp {
    type Response = V5Response<super::order::Empty>;
    type QueryParams = ();
    type Body = DemoTopUpBody;

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/v5/account/demo-apply-money")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::POST
    }

    fn body(&self) -> Option<&Self::Body> {
        Some(&self.body)
    }
}

/// Sub-member uids arrive as either a JSON string or number depending on endpoint
/// version; normalise to `String`.
fn de_string_or_u64<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrU64 {
        String(String),
        U64(u64),
    }

    Ok(match StringOrU64::deserialize(deserializer)? {
        StringOrU64::String(uid) => uid,
        StringOrU64::U64(uid) => uid.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sub_member_uid_string_or_number() {
        let from_string =
            serde_json::from_str::<CreateSubMemberResult>(r#"{"uid": "53888000"}"#).unwrap();
        assert_eq!(from_string.uid, "53888000");

        let from_number =
            serde_json::from_str::<CreateSubMemberResult>(r#"{"uid": 53888000}"#).unwrap();
        assert_eq!(from_number.uid, "53888000");
    }

    #[test]
    fn test_api_key_permissions_never_grant_withdrawal() {
        let permissions = ApiKeyPermissions::trading();
        let json = serde_json::to_string(&permissions).unwrap();
        assert!(!json.contains("Withdraw"));
        assert!(json.contains("AccountTransfer"));
    }
}
