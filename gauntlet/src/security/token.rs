use super::SecurityError;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims carried by both halves of the pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Claims {
    /// Internal user id.
    pub sub: String,
    /// External (messaging-platform) id.
    pub tg: i64,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub exp: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and verifies HS256 token pairs.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issue an access/refresh pair for the user at `now`.
    pub fn issue_pair(
        &self,
        user_id: i64,
        external_id: i64,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, SecurityError> {
        Ok(TokenPair {
            access_token: self.issue(user_id, external_id, TokenType::Access, now)?,
            refresh_token: self.issue(user_id, external_id, TokenType::Refresh, now)?,
        })
    }

    fn issue(
        &self,
        user_id: i64,
        external_id: i64,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> Result<String, SecurityError> {
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id.to_string(),
            tg: external_id,
            token_type,
            exp: (now + ttl).timestamp(),
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Verify signature, expiry and token type.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, SecurityError> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)?.claims;

        if claims.token_type != expected {
            return Err(SecurityError::WrongTokenType {
                expected: match expected {
                    TokenType::Access => "access",
                    TokenType::Refresh => "refresh",
                },
            });
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            "test-secret",
            Duration::from_secs(15 * 60),
            Duration::from_secs(30 * 24 * 3600),
        )
    }

    #[test]
    fn test_issue_verify_round_trip() {
        let issuer = issuer();
        let pair = issuer.issue_pair(42, 777, Utc::now()).unwrap();

        let access = issuer.verify(&pair.access_token, TokenType::Access).unwrap();
        assert_eq!(access.sub, "42");
        assert_eq!(access.tg, 777);
        assert_eq!(access.token_type, TokenType::Access);

        let refresh = issuer
            .verify(&pair.refresh_token, TokenType::Refresh)
            .unwrap();
        assert_eq!(refresh.token_type, TokenType::Refresh);
    }

    #[test]
    fn test_type_confusion_rejected() {
        let issuer = issuer();
        let pair = issuer.issue_pair(42, 777, Utc::now()).unwrap();

        assert!(matches!(
            issuer.verify(&pair.refresh_token, TokenType::Access),
            Err(SecurityError::WrongTokenType { expected: "access" })
        ));
    }

    #[test]
    fn test_expired_rejected() {
        let issuer = issuer();
        // Issued far enough in the past that the access token has expired
        let issued_at = Utc::now() - TimeDelta::hours(2);
        let pair = issuer.issue_pair(42, 777, issued_at).unwrap();

        assert!(issuer.verify(&pair.access_token, TokenType::Access).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let pair = issuer().issue_pair(42, 777, Utc::now()).unwrap();
        let other = TokenIssuer::new(
            "other-secret",
            Duration::from_secs(900),
            Duration::from_secs(900),
        );
        assert!(other.verify(&pair.access_token, TokenType::Access).is_err());
    }
}
