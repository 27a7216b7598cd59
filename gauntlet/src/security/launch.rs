use super::SecurityError;
use gauntlet_integration::protocol::http::signer::{hmac_sha256_digest, hmac_sha256_verify};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

/// Launch payloads older than this many seconds are rejected.
const MAX_AGE_SECONDS: i64 = 3600;

/// Key under which the platform derives the validation secret from the bot token.
const KEY_SEED: &[u8] = b"WebAppData";

/// Identity carried inside the `user` field of a launch payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LaunchUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

/// A validated launch payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchData {
    pub user: LaunchUser,
    pub auth_date: DateTime<Utc>,
    pub start_param: Option<String>,
}

/// Validate a signed launch payload from the messaging front-end.
///
/// The payload is a query string whose `hash` field is
/// HMAC-SHA256(data-check-string) under `HMAC-SHA256("WebAppData", bot_token)`, where
/// the data-check-string is every other field as `key=value`, sorted, joined with
/// newlines. Rejects tampered fields, missing hashes, and payloads older than 1 hour.
pub fn validate_launch_data(
    init_data: &str,
    bot_token: &str,
    now: DateTime<Utc>,
) -> Result<LaunchData, SecurityError> {
    let mut fields: Vec<(String, String)> = url::form_urlencoded::parse(init_data.as_bytes())
        .into_owned()
        .collect();

    let hash_index = fields
        .iter()
        .position(|(key, _)| key == "hash")
        .ok_or_else(|| SecurityError::LaunchData("missing hash".into()))?;
    let (_, received_hash) = fields.remove(hash_index);
    let received_hash =
        hex::decode(&received_hash).map_err(|_| SecurityError::LaunchData("malformed hash".into()))?;

    let auth_date = fields
        .iter()
        .find(|(key, _)| key == "auth_date")
        .and_then(|(_, value)| value.parse::<i64>().ok())
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .ok_or_else(|| SecurityError::LaunchData("missing or malformed auth_date".into()))?;

    if now.signed_duration_since(auth_date).num_seconds() > MAX_AGE_SECONDS {
        return Err(SecurityError::LaunchData("payload expired".into()));
    }

    fields.sort();
    let data_check_string = fields
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n");

    let secret = hmac_sha256_digest(KEY_SEED, bot_token.as_bytes());
    if !hmac_sha256_verify(&secret, data_check_string.as_bytes(), &received_hash) {
        return Err(SecurityError::LaunchData("hash mismatch".into()));
    }

    let user_raw = fields
        .iter()
        .find(|(key, _)| key == "user")
        .map(|(_, value)| value.as_str())
        .ok_or_else(|| SecurityError::LaunchData("missing user".into()))?;
    let user: LaunchUser = serde_json::from_str(user_raw)
        .map_err(|err| SecurityError::LaunchData(format!("malformed user: {err}")))?;

    let start_param = fields
        .iter()
        .find(|(key, _)| key == "start_param")
        .map(|(_, value)| value.clone());

    Ok(LaunchData {
        user,
        auth_date,
        start_param,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_integration::protocol::http::signer::{hmac_sha256_digest, Encoder, HexEncoder};

    const BOT_TOKEN: &str = "12345:TEST_TOKEN";

    /// Build a correctly signed payload the way the front-end platform would.
    fn signed_payload(auth_date: DateTime<Utc>) -> String {
        let user = r#"{"id":777,"username":"trader","first_name":"Ada"}"#;
        let mut fields = vec![
            ("auth_date".to_string(), auth_date.timestamp().to_string()),
            ("query_id".to_string(), "AAF9tZ8bAAAAAH21nxs".to_string()),
            ("user".to_string(), user.to_string()),
        ];
        fields.sort();
        let data_check_string = fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n");

        let secret = hmac_sha256_digest(KEY_SEED, BOT_TOKEN.as_bytes());
        let hash = HexEncoder.encode(hmac_sha256_digest(&secret, data_check_string.as_bytes()));

        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &fields {
            serializer.append_pair(key, value);
        }
        serializer.append_pair("hash", &hash);
        serializer.finish()
    }

    #[test]
    fn test_well_formed_payload_accepted() {
        let now = Utc::now();
        let payload = signed_payload(now);

        let launch = validate_launch_data(&payload, BOT_TOKEN, now).unwrap();
        assert_eq!(launch.user.id, 777);
        assert_eq!(launch.user.username.as_deref(), Some("trader"));
    }

    #[test]
    fn test_tampered_field_rejected() {
        let now = Utc::now();
        let payload = signed_payload(now).replace("%22id%22%3A777", "%22id%22%3A778");

        assert!(matches!(
            validate_launch_data(&payload, BOT_TOKEN, now),
            Err(SecurityError::LaunchData(_))
        ));
    }

    #[test]
    fn test_expired_payload_rejected() {
        let auth_date = Utc::now() - TimeDelta::hours(2);
        let payload = signed_payload(auth_date);

        assert!(matches!(
            validate_launch_data(&payload, BOT_TOKEN, Utc::now()),
            Err(SecurityError::LaunchData(_))
        ));
    }

    #[test]
    fn test_missing_hash_rejected() {
        assert!(matches!(
            validate_launch_data("auth_date=1", BOT_TOKEN, Utc::now()),
            Err(SecurityError::LaunchData(_))
        ));
    }

    #[test]
    fn test_wrong_bot_token_rejected() {
        let now = Utc::now();
        let payload = signed_payload(now);

        assert!(matches!(
            validate_launch_data(&payload, "999:OTHER_TOKEN", now),
            Err(SecurityError::LaunchData(_))
        ));
    }
}
