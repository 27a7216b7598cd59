use thiserror::Error;

/// AES-256-GCM sealing of sub-account credentials at rest.
pub mod seal;

/// JWT access/refresh pair issuing and verification.
pub mod token;

/// Signed launch-payload validation for the messaging front-end.
pub mod launch;

/// Sliding-window request counters in Redis.
pub mod rate;

/// Referral-code generation.
pub mod referral;

/// All errors generated by the security primitives.
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("sealing key must be 32 raw bytes or 64 hex chars")]
    InvalidKey,

    /// Decryption or authentication failed. Covers tampered envelopes and legacy
    /// unauthenticated ciphertexts, which are rejected outright.
    #[error("failed to unseal ciphertext")]
    Unseal,

    #[error("malformed sealed envelope: {0}")]
    Envelope(String),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("token is not a {expected} token")]
    WrongTokenType { expected: &'static str },

    #[error("launch data invalid: {0}")]
    LaunchData(String),
}
