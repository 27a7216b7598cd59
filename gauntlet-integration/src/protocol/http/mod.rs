use crate::error::SocketError;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::error;

/// [`SignedClient`](client::SignedClient): executes [`ApiRequest`]s with the payload
/// that is signed being, by construction, the payload that is sent.
pub mod client;

/// HMAC-SHA256 signing primitives and signature [`Encoder`](signer::Encoder)s used by
/// [`AuthScheme`] implementations.
pub mod signer;

/// Default per-request timeout. Generous enough for the venue's slowest endpoints
/// (sub-account provisioning) without eating a whole orchestrator tick.
const DEFAULT_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One venue API call: typed path, query, body and expected response.
///
/// Implementations live beside their wire models; the signable payload is derived
/// from `query_params` (GET) or `body` (everything else) by the
/// [`SignedClient`](client::SignedClient), never hand-assembled at call sites.
pub trait ApiRequest {
    /// Expected response type if this request was successful.
    type Response: DeserializeOwned;

    /// Serialisable query parameters type - use unit struct () if not required.
    type QueryParams: Serialize;

    /// Serialisable body type - use unit struct () if not required.
    type Body: Serialize;

    /// Additional url path to the resource.
    fn path(&self) -> std::borrow::Cow<'static, str>;

    /// Http [`reqwest::Method`] of this request.
    fn method() -> reqwest::Method;

    /// Optional query parameters for this request.
    fn query_params(&self) -> Option<&Self::QueryParams> {
        None
    }

    /// Optional body for this request.
    fn body(&self) -> Option<&Self::Body> {
        None
    }

    /// Http request timeout [`Duration`].
    fn timeout() -> Duration {
        DEFAULT_HTTP_REQUEST_TIMEOUT
    }
}

/// Venue-specific authentication over the signable payload of one call.
///
/// The payload handed in is the raw query string for GET requests and the minified
/// JSON body otherwise, matching how the venue reconstructs the signature input on
/// its side. Implementations stamp whatever headers the venue requires (key,
/// timestamp, signature, receive window).
pub trait AuthScheme {
    fn auth_headers(&self, payload: &str) -> Result<reqwest::header::HeaderMap, SocketError>;
}

/// Interprets one raw venue response: the typed success value, the venue's
/// structured error shape, or a transport-level deserialisation failure.
pub trait ApiParser {
    /// Venue error payload shape (eg/ a return-code envelope).
    type ApiError: DeserializeOwned;
    /// Error type surfaced to callers.
    type OutputError: From<SocketError>;

    /// Decode `payload` as the expected `Response`, falling back to the venue error
    /// shape when that fails.
    fn parse<Response>(
        &self,
        status: StatusCode,
        payload: &[u8],
    ) -> Result<Response, Self::OutputError>
    where
        Response: DeserializeOwned,
    {
        if let Ok(response) = serde_json::from_slice::<Response>(payload) {
            return Ok(response);
        }

        match serde_json::from_slice::<Self::ApiError>(payload) {
            Ok(api_error) => Err(self.parse_api_error(status, api_error)),
            Err(parse_error) => {
                error!(
                    status_code = %status,
                    %parse_error,
                    response_body = %String::from_utf8_lossy(payload),
                    "venue response matched neither the success nor the error shape"
                );
                Err(Self::OutputError::from(SocketError::deserialise(
                    parse_error,
                    payload,
                )))
            }
        }
    }

    /// Map the venue's structured error payload into [`Self::OutputError`].
    fn parse_api_error(&self, status: StatusCode, error: Self::ApiError) -> Self::OutputError;
}
