/// Determine the `DateTime<Utc>` from the provided `Duration` since the epoch.
pub fn datetime_utc_from_epoch_duration(
    duration: std::time::Duration,
) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::<chrono::Utc>::from(std::time::UNIX_EPOCH + duration)
}

/// Deserialize a `String` as the desired type.
pub fn de_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::de::Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let data: &str = serde::de::Deserialize::deserialize(deserializer)?;
    data.parse::<T>().map_err(serde::de::Error::custom)
}

/// Deserialize a `String` as the desired type, mapping an empty `String` to `None`.
///
/// Exchange payloads frequently encode "no value" as `""` rather than omitting the field.
pub fn de_str_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::de::Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let data: &str = serde::de::Deserialize::deserialize(deserializer)?;
    if data.is_empty() {
        return Ok(None);
    }
    data.parse::<T>().map(Some).map_err(serde::de::Error::custom)
}

/// Deserialize a `u64` milliseconds value as `DateTime<Utc>`.
pub fn de_u64_epoch_ms_as_datetime_utc<'de, D>(
    deserializer: D,
) -> Result<chrono::DateTime<chrono::Utc>, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    serde::de::Deserialize::deserialize(deserializer).map(|epoch_ms| {
        datetime_utc_from_epoch_duration(std::time::Duration::from_millis(epoch_ms))
    })
}

/// Deserialize a &str "u64" milliseconds value as `DateTime<Utc>`.
pub fn de_str_u64_epoch_ms_as_datetime_utc<'de, D>(
    deserializer: D,
) -> Result<chrono::DateTime<chrono::Utc>, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    de_str(deserializer).map(|epoch_ms| {
        datetime_utc_from_epoch_duration(std::time::Duration::from_millis(epoch_ms))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        #[serde(deserialize_with = "de_str")]
        price: f64,
        #[serde(deserialize_with = "de_str_opt")]
        stop: Option<f64>,
    }

    #[test]
    fn test_de_str_and_opt() {
        let row = serde_json::from_str::<Row>(r#"{"price": "42.5", "stop": ""}"#).unwrap();
        assert_eq!(
            row,
            Row {
                price: 42.5,
                stop: None
            }
        );

        let row = serde_json::from_str::<Row>(r#"{"price": "1", "stop": "0.5"}"#).unwrap();
        assert_eq!(row.stop, Some(0.5));
    }

    #[test]
    fn test_de_epoch_ms() {
        #[derive(Debug, Deserialize)]
        struct Time {
            #[serde(deserialize_with = "de_u64_epoch_ms_as_datetime_utc")]
            time: chrono::DateTime<chrono::Utc>,
        }

        let time = serde_json::from_str::<Time>(r#"{"time": 1672304486865}"#).unwrap();
        assert_eq!(
            time.time,
            datetime_utc_from_epoch_duration(std::time::Duration::from_millis(1672304486865))
        );
    }
}
