use gauntlet_integration::error::SocketError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Venue v5 API return code signalling a throttled request.
const RET_CODE_RATE_LIMITED: i64 = 10006;

/// Venue v5 API return code signalling an invalid signature.
const RET_CODE_BAD_SIGNATURE: i64 = 10004;

/// All errors generated by the exchange gateway.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("socket error: {0}")]
    Socket(#[from] SocketError),

    /// Non-zero `retCode` in an otherwise well-formed API response.
    #[error("exchange API error {code}: {message}")]
    Api { code: i64, message: String },

    /// Master wallet balance below the configured operational minimum.
    #[error("master balance {balance} USDT below minimum {minimum} USDT")]
    MasterBalanceLow { balance: Decimal, minimum: Decimal },

    /// A provisioning sequence failed part-way; the completed stages are surfaced so the
    /// caller can retry or mark the account for manual review.
    #[error("provisioning failed at stage `{stage}`: {source}")]
    Provision {
        stage: &'static str,
        #[source]
        source: Box<ExchangeError>,
    },
}

impl ExchangeError {
    /// Whether this error class is worth retrying with backoff within the same tick.
    ///
    /// Timeouts, 5xx and throttling responses are transient; bad requests, unknown
    /// symbols and signature failures are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            ExchangeError::Socket(SocketError::HttpTimeout(_)) => true,
            ExchangeError::Socket(SocketError::Http(_)) => true,
            ExchangeError::Socket(SocketError::HttpResponse(status, _)) => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            ExchangeError::Api { code, .. } => *code == RET_CODE_RATE_LIMITED,
            _ => false,
        }
    }

    /// Whether this error indicates the request was throttled by the venue.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            ExchangeError::Api { code, .. } => *code == RET_CODE_RATE_LIMITED,
            ExchangeError::Socket(SocketError::HttpResponse(status, _)) => {
                *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    /// Signing failures are deployment bugs, surfaced to the operator channel rather
    /// than retried.
    pub fn is_signature_error(&self) -> bool {
        matches!(self, ExchangeError::Api { code, .. } if *code == RET_CODE_BAD_SIGNATURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        struct TestCase {
            input: ExchangeError,
            expected_transient: bool,
        }

        let tests = vec![
            // TC0: throttled retCode is transient
            TestCase {
                input: ExchangeError::Api {
                    code: 10006,
                    message: "Too many visits".into(),
                },
                expected_transient: true,
            },
            // TC1: bad request retCode is permanent
            TestCase {
                input: ExchangeError::Api {
                    code: 10001,
                    message: "params error".into(),
                },
                expected_transient: false,
            },
            // TC2: http 503 is transient
            TestCase {
                input: ExchangeError::Socket(SocketError::HttpResponse(
                    reqwest::StatusCode::SERVICE_UNAVAILABLE,
                    "unavailable".into(),
                )),
                expected_transient: true,
            },
            // TC3: http 400 is permanent
            TestCase {
                input: ExchangeError::Socket(SocketError::HttpResponse(
                    reqwest::StatusCode::BAD_REQUEST,
                    "bad".into(),
                )),
                expected_transient: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(
                test.input.is_transient(),
                test.expected_transient,
                "TC{index} failed"
            );
        }
    }

    #[test]
    fn test_signature_error() {
        let error = ExchangeError::Api {
            code: 10004,
            message: "error sign!".into(),
        };
        assert!(error.is_signature_error());
        assert!(!error.is_transient());
    }
}
