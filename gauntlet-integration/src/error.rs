use thiserror::Error;

/// Communicative type alias for a tungstenite WebSocket error.
pub type WsError = tokio_tungstenite::tungstenite::Error;

/// Transport errors shared by the signed-REST and streaming integrations.
///
/// Callers branch on three broad classes: request construction (`Serialise`,
/// `AuthHeader`), transport (`Http`, `HttpTimeout`, `WebSocket`, `StreamEnded`), and
/// payload interpretation (`Deserialise`, `HttpResponse`).
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("serialising request payload: {0}")]
    Serialise(#[source] serde_json::Error),

    #[error("deserialising payload `{payload}`: {error}")]
    Deserialise {
        #[source]
        error: serde_json::Error,
        payload: String,
    },

    /// The configured credential or signature cannot be carried in the named header.
    #[error("auth header {name} rejected the configured value")]
    AuthHeader { name: &'static str },

    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("HTTP request timed out")]
    HttpTimeout(#[source] reqwest::Error),

    /// Non-2xx response whose body did not carry the venue's structured error shape.
    #[error("HTTP response (status={0}) error: {1}")]
    HttpResponse(reqwest::StatusCode, String),

    /// The remote closed the stream; callers reconnect with backoff.
    #[error("stream closed by remote: {0}")]
    StreamEnded(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

impl SocketError {
    /// Wrap an undecodable payload, keeping a lossy rendering for the log trail.
    pub fn deserialise(error: serde_json::Error, payload: &[u8]) -> Self {
        SocketError::Deserialise {
            error,
            payload: String::from_utf8_lossy(payload).into_owned(),
        }
    }
}

impl From<reqwest::Error> for SocketError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            SocketError::HttpTimeout(error)
        } else {
            SocketError::Http(error)
        }
    }
}
