use crate::{credentials::ApiCredentials, error::ExchangeError};
use gauntlet_integration::{
    error::SocketError,
    protocol::http::{
        client::SignedClient,
        signer::{hmac_sha256_digest, Encoder, HexEncoder},
        ApiParser, ApiRequest, AuthScheme,
    },
};
use reqwest::header::HeaderMap;
use serde::{de::DeserializeOwned, Deserialize};

/// Per-account client: balance, positions, orders, close-all, klines.
pub mod account;

/// Privileged master client: sub-accounts, API keys, demo top-ups, transfers.
pub mod master;

/// Wire models for the v5 unified API.
pub mod model;

/// Receive window communicated with every signed request.
pub const RECV_WINDOW: &str = "5000";

const HEADER_API_KEY: &str = "X-BAPI-API-KEY";
const HEADER_TIMESTAMP: &str = "X-BAPI-TIMESTAMP";
const HEADER_SIGN: &str = "X-BAPI-SIGN";
const HEADER_RECV_WINDOW: &str = "X-BAPI-RECV-WINDOW";

/// [`SignedClient`] configured for the venue: v5 signing plus return-code parsing.
pub(crate) type V5Client = SignedClient<'static, RequestSigner, ResponseParser>;

/// Venue environment the client signs requests against.
///
/// Demo trading uses a dedicated base url with the same wire protocol.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Demo,
    Live,
}

impl Environment {
    pub fn rest_url(&self) -> &'static str {
        match self {
            Environment::Demo => "https://api-demo.bybit.com",
            Environment::Live => "https://api.bybit.com",
        }
    }

    /// Public aggregate-trade stream url for linear perpetuals.
    pub fn websocket_url(&self) -> &'static str {
        "wss://stream.bybit.com/v5/public/linear"
    }
}

/// v5 [`AuthScheme`].
///
/// Signature input is `timestamp + api_key + recv_window + payload`, where payload is
/// the raw query string for GET and the raw minified JSON body for POST. The
/// hex-encoded HMAC-SHA256 digest travels in the `X-BAPI-SIGN` header.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credentials: ApiCredentials,
}

impl RequestSigner {
    pub fn new(credentials: ApiCredentials) -> Self {
        Self { credentials }
    }
}

impl AuthScheme for RequestSigner {
    fn auth_headers(&self, payload: &str) -> Result<HeaderMap, SocketError> {
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        let sign_input = format!("{timestamp}{}{RECV_WINDOW}{payload}", self.credentials.key);
        let signature = HexEncoder.encode(hmac_sha256_digest(
            self.credentials.secret.as_bytes(),
            sign_input.as_bytes(),
        ));

        let api_key = self
            .credentials
            .key
            .parse()
            .map_err(|_| SocketError::AuthHeader {
                name: HEADER_API_KEY,
            })?;

        let mut headers = HeaderMap::with_capacity(4);
        headers.insert(HEADER_API_KEY, api_key);
        headers.insert(
            HEADER_TIMESTAMP,
            timestamp
                .parse()
                .expect("millisecond timestamps are valid header values"),
        );
        headers.insert(
            HEADER_SIGN,
            signature
                .parse()
                .expect("hex digests are valid header values"),
        );
        headers.insert(
            HEADER_RECV_WINDOW,
            RECV_WINDOW
                .parse()
                .expect("receive window is a valid header value"),
        );

        Ok(headers)
    }
}

/// Generic wrapper every v5 endpoint responds with.
#[derive(Debug, Clone, Deserialize)]
pub struct V5Response<T> {
    #[serde(rename = "retCode")]
    pub ret_code: i64,
    #[serde(rename = "retMsg")]
    pub ret_msg: String,
    #[serde(rename = "result")]
    pub result: Option<T>,
}

impl<T> V5Response<T> {
    /// Extract the inner result, mapping a non-zero `retCode` to
    /// [`ExchangeError::Api`].
    pub fn into_result(self) -> Result<T, ExchangeError>
    where
        T: Default,
    {
        if self.ret_code != 0 {
            return Err(ExchangeError::Api {
                code: self.ret_code,
                message: self.ret_msg,
            });
        }
        Ok(self.result.unwrap_or_default())
    }
}

/// Error payload shape the venue responds with when the typed result cannot be parsed.
#[derive(Debug, Clone, Deserialize)]
pub struct V5ErrorPayload {
    #[serde(rename = "retCode")]
    pub ret_code: i64,
    #[serde(rename = "retMsg")]
    pub ret_msg: String,
}

/// [`ApiParser`] mapping venue error payloads and non-2xx statuses to [`ExchangeError`].
#[derive(Debug, Copy, Clone)]
pub struct ResponseParser;

impl ApiParser for ResponseParser {
    type ApiError = V5ErrorPayload;
    type OutputError = ExchangeError;

    fn parse_api_error(
        &self,
        status: reqwest::StatusCode,
        error: Self::ApiError,
    ) -> Self::OutputError {
        if !status.is_success() {
            return ExchangeError::Socket(SocketError::HttpResponse(status, error.ret_msg));
        }
        ExchangeError::Api {
            code: error.ret_code,
            message: error.ret_msg,
        }
    }
}

/// Execute an [`ApiRequest`] against the venue and unwrap the [`V5Response`] envelope.
pub(crate) async fn execute<Request, T>(
    client: &V5Client,
    request: Request,
) -> Result<T, ExchangeError>
where
    Request: ApiRequest<Response = V5Response<T>>,
    T: DeserializeOwned + Default,
{
    client.execute(request).await?.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v5_response_into_result() {
        let ok = V5Response::<Vec<String>> {
            ret_code: 0,
            ret_msg: "OK".into(),
            result: Some(vec!["a".into()]),
        };
        assert_eq!(ok.into_result().unwrap(), vec!["a".to_string()]);

        let err = V5Response::<Vec<String>> {
            ret_code: 10001,
            ret_msg: "params error".into(),
            result: None,
        };
        match err.into_result() {
            Err(ExchangeError::Api { code, .. }) => assert_eq!(code, 10001),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
