use crate::{
    error::SocketError,
    protocol::http::{ApiParser, ApiRequest, AuthScheme},
};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use std::borrow::Cow;
use tracing::debug;

/// Signed REST client for one venue environment.
///
/// The request pipeline serialises the body exactly once: those bytes are what the
/// [`AuthScheme`] signs and what goes on the wire, so the signature can never drift
/// from the payload. GET requests sign the raw query string reqwest encoded into the
/// url. Latency and status are logged per request; response interpretation is
/// delegated to the [`ApiParser`].
#[derive(Debug, Clone)]
pub struct SignedClient<'a, Auth, Parser> {
    http: reqwest::Client,
    base_url: Cow<'a, str>,
    auth: Auth,
    parser: Parser,
}

impl<'a, Auth, Parser> SignedClient<'a, Auth, Parser> {
    /// Construct a new [`Self`] for the provided base url.
    pub fn new<Url: Into<Cow<'a, str>>>(base_url: Url, auth: Auth, parser: Parser) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            auth,
            parser,
        }
    }
}

impl<Auth, Parser> SignedClient<'_, Auth, Parser>
where
    Auth: AuthScheme,
    Parser: ApiParser,
{
    /// Build a fully signed [`reqwest::Request`] without executing it.
    ///
    /// Split out from [`execute`](Self::execute) so signing can be exercised without
    /// a network.
    pub fn prepare<Request>(&self, request: Request) -> Result<reqwest::Request, SocketError>
    where
        Request: ApiRequest,
    {
        let url = format!("{}{}", self.base_url, request.path());
        let mut builder = self
            .http
            .request(Request::method(), url)
            .timeout(Request::timeout());

        if let Some(query_params) = request.query_params() {
            builder = builder.query(query_params);
        }

        // Serialise the body once; the same bytes are signed and sent
        let body = request
            .body()
            .map(|body| serde_json::to_vec(body).map_err(SocketError::Serialise))
            .transpose()?;

        let mut prepared = builder.build().map_err(SocketError::from)?;

        let signable = if Request::method() == reqwest::Method::GET {
            prepared.url().query().unwrap_or("").to_owned()
        } else {
            body.as_deref()
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                .unwrap_or_default()
        };

        prepared
            .headers_mut()
            .extend(self.auth.auth_headers(&signable)?);

        if let Some(bytes) = body {
            prepared
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            *prepared.body_mut() = Some(bytes.into());
        }

        Ok(prepared)
    }

    /// Execute the provided [`ApiRequest`].
    pub async fn execute<Request>(
        &self,
        request: Request,
    ) -> Result<Request::Response, Parser::OutputError>
    where
        Request: ApiRequest,
    {
        let prepared = self.prepare(request)?;
        let path = prepared.url().path().to_owned();

        let started = std::time::Instant::now();
        let response = self
            .http
            .execute(prepared)
            .await
            .map_err(SocketError::from)?;
        let status = response.status();

        debug!(
            http_method = %Request::method(),
            base_url = %self.base_url,
            %path,
            status_code = %status,
            duration_ms = started.elapsed().as_millis() as u64,
            "venue request executed"
        );

        let payload = response.bytes().await.map_err(SocketError::from)?;
        self.parser.parse::<Request::Response>(status, &payload)
    }
}
