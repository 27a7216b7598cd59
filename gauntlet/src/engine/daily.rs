use chrono::{DateTime, TimeDelta, Utc};

/// Truncate a timestamp to the start of its UTC calendar day.
pub fn day_floor(time: DateTime<Utc>) -> DateTime<Utc> {
    time.date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight exists for every date")
        .and_utc()
}

/// Whether the UTC day boundary has been crossed since the last reset.
///
/// A challenge that has never reset (fresh restore from an old snapshot) resets
/// immediately.
pub fn needs_reset(daily_reset_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match daily_reset_at {
        None => true,
        Some(last) => day_floor(now) > day_floor(last),
    }
}

/// UTC window `[start, end)` of the day that just ended, whose activity decides
/// whether a trading day accrues.
pub fn ended_day_window(
    daily_reset_at: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day_floor(daily_reset_at);
    (start, start + TimeDelta::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_needs_reset() {
        let evening = Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 0).unwrap();
        let next_morning = Utc.with_ymd_and_hms(2024, 3, 2, 0, 1, 0).unwrap();
        let same_day_later = Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 30).unwrap();

        assert!(needs_reset(Some(evening), next_morning));
        assert!(!needs_reset(Some(evening), same_day_later));
        assert!(needs_reset(None, evening));
    }

    #[test]
    fn test_ended_day_window_covers_whole_day() {
        let reset_at = Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap();
        let (start, end) = ended_day_window(reset_at);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap());
    }
}
