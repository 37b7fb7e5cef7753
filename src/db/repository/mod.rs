//! Repository layer — entity-scoped database operations.

mod assessment;
mod audit;
mod session;
mod user;

use chrono::NaiveDateTime;

use super::DatabaseError;

pub use assessment::*;
pub use audit::*;
pub use session::*;
pub use user::*;

/// Storage format for every timestamp column. Lexically ordered, so it
/// compares correctly against SQLite's own `datetime('now')`.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(field: &str, value: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| {
        DatabaseError::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    })
}


#[cfg(test)]
mod tests {
    use chrono::Timelike;

    use super::*;

    #[test]
    fn timestamp_round_trip_drops_subseconds() {
        let ts = chrono::NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_milli_opt(9, 26, 53, 589)
            .unwrap();
        let stored = format_timestamp(&ts);
        assert_eq!(stored, "2026-03-14 09:26:53");
        let parsed = parse_timestamp("date", &stored).unwrap();
        assert_eq!(parsed, ts.with_nanosecond(0).unwrap());
    }

    #[test]
    fn malformed_timestamp_is_invalid_value() {
        let err = parse_timestamp("date", "yesterday").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidValue { .. }));
    }
}
