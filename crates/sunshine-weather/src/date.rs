//! Day normalization shared by the forecast store and the sync producer.

use chrono::{DateTime, NaiveDate, Utc};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// UTC midnight of the day containing `instant`, in epoch milliseconds.
///
/// Forecast rows are keyed by this value, so lookups for "today" must use it too.
pub fn normalize_date(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis().div_euclid(MILLIS_PER_DAY) * MILLIS_PER_DAY
}

/// Normalized key for a calendar date
pub fn date_key(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc().timestamp_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_normalize_truncates_to_midnight() {
        let noon = Utc.with_ymd_and_hms(2024, 3, 10, 12, 34, 56).unwrap();
        let midnight = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        assert_eq!(normalize_date(noon), midnight.timestamp_millis());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let t = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        let day = normalize_date(t);
        let again = DateTime::from_timestamp_millis(day).unwrap();
        assert_eq!(normalize_date(again), day);
    }

    #[test]
    fn test_normalize_before_epoch() {
        let t = Utc.with_ymd_and_hms(1969, 12, 31, 18, 0, 0).unwrap();
        assert_eq!(normalize_date(t), -MILLIS_PER_DAY);
    }

    #[test]
    fn test_date_key_matches_normalize() {
        let t = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
        assert_eq!(date_key(t.date_naive()), normalize_date(t));
    }
}
