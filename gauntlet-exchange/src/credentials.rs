use serde::{Deserialize, Serialize};

/// API key pair for one exchange sub-account.
///
/// Constructed from decrypted material inside the client constructor only; the `Debug`
/// implementation redacts both fields so credentials cannot leak via logs.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiCredentials {
    pub key: String,
    pub secret: String,
}

impl ApiCredentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("key", &redact(&self.key))
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Keep the first four characters for operator correlation, mask the rest.
fn redact(value: &str) -> String {
    let visible = value.chars().take(4).collect::<String>();
    format!("{visible}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let credentials = ApiCredentials::new("AKIDEXAMPLE", "super-secret-value");
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("super-secret-value"));
        assert!(!rendered.contains("AKIDEXAMPLE"));
        assert!(rendered.contains("AKID"));
    }
}
