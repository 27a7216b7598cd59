use crate::bybit::V5Response;
use gauntlet_integration::protocol::http::ApiRequest;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Fetch the tradeable linear-perpetual instrument catalogue.
#[derive(Debug, Clone)]
pub struct GetInstruments {
    pub params: InstrumentsParams,
}

impl GetInstruments {
    pub fn trading(limit: u32) -> Self {
        Self {
            params: InstrumentsParams {
                category: super::CATEGORY_LINEAR,
                status: "Trading",
                limit,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InstrumentsParams {
    pub category: &'static str,
    pub status: &'static str,
    pub limit: u32,
}

impl ApiRequest for GetInstruments {
    type Response = V5Response<InstrumentsResult>;
    type QueryParams = InstrumentsParams;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/v5/market/instruments-info")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.params)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstrumentsResult {
    #[serde(default)]
    pub list: Vec<Instrument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "baseCoin", default)]
    pub base_coin: String,
    #[serde(rename = "quoteCoin", default)]
    pub quote_coin: String,
}
