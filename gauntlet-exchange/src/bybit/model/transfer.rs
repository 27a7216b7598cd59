use crate::bybit::V5Response;
use gauntlet_integration::protocol::http::ApiRequest;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use uuid::Uuid;

/// Move funds from the master unified wallet into a sub-member's unified wallet.
///
/// `transfer_id` doubles as an idempotency token: replaying the same id is a no-op at
/// the venue, so a retried promotion cannot double-fund an account.
#[derive(Debug, Clone)]
pub struct UniversalTransfer {
    pub body: UniversalTransferBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct UniversalTransferBody {
    #[serde(rename = "transferId")]
    pub transfer_id: Uuid,
    pub coin: &'static str,
    pub amount: String,
    #[serde(rename = "fromAccountType")]
    pub from_account_type: &'static str,
    #[serde(rename = "toAccountType")]
    pub to_account_type: &'static str,
    #[serde(rename = "toMemberId")]
    pub to_member_id: i64,
}

impl UniversalTransfer {
    pub fn usdt(transfer_id: Uuid, amount: Decimal, to_member_id: i64) -> Self {
        Self {
            body: UniversalTransferBody {
                transfer_id,
                coin: super::SETTLE_COIN,
                amount: amount.normalize().to_string(),
                from_account_type: "UNIFIED",
                to_account_type: "UNIFIED",
                to_member_id,
            },
        }
    }
}

impl ApiRequest for UniversalTransfer {
    type Response = V5Response<UniversalTransferResult>;
    type QueryParams = ();
    type Body = UniversalTransferBody;

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/v5/asset/transfer/universal-transfer")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::POST
    }

    fn body(&self) -> Option<&Self::Body> {
        Some(&self.body)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UniversalTransferResult {
    #[serde(rename = "transferId", default)]
    pub transfer_id: String,
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_transfer_body_wire_shape() {
        let id = Uuid::nil();
        let transfer = UniversalTransfer::usdt(id, dec!(27500.00), 53888000);
        let json = serde_json::to_string(&transfer.body).unwrap();
        assert!(json.contains(r#""transferId":"00000000-0000-0000-0000-000000000000""#));
        assert!(json.contains(r#""amount":"27500""#));
        assert!(json.contains(r#""toMemberId":53888000"#));
    }
}
