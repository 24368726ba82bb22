//! Timestamp encoding for ledger columns.
//!
//! Timestamps cross the driver boundary as text: values are bound as strings
//! and `CAST(? AS TIMESTAMP)` in SQL, and read back with `CAST(col AS VARCHAR)`.

use crate::error::{LedgerError, LedgerResult};
use chrono::NaiveDateTime;

const WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

// `%.f` also accepts values without a fractional part
const READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Render a timestamp for binding to a `CAST(? AS TIMESTAMP)` parameter.
pub(crate) fn format_ts(ts: NaiveDateTime) -> String {
    ts.format(WRITE_FORMAT).to_string()
}

/// Parse a timestamp read back through `CAST(col AS VARCHAR)`.
pub(crate) fn parse_ts(value: &str) -> LedgerResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, READ_FORMAT)
        .map_err(|e| LedgerError::InvalidTimestamp(format!("'{value}': {e}")))
}

/// Parse an optional timestamp column.
pub(crate) fn parse_opt_ts(value: Option<String>) -> LedgerResult<Option<NaiveDateTime>> {
    value.as_deref().map(parse_ts).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_format_and_parse() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 20)
            .unwrap()
            .and_hms_micro_opt(13, 5, 9, 250_000)
            .unwrap();
        let text = format_ts(ts);
        assert_eq!(text, "2024-03-20 13:05:09.250000");
        assert_eq!(parse_ts(&text).unwrap(), ts);
    }

    #[test]
    fn test_parse_without_fraction() {
        let ts = parse_ts("2024-03-20 00:00:00").unwrap();
        assert_eq!(ts.to_string(), "2024-03-20 00:00:00");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            parse_ts("yesterday"),
            Err(LedgerError::InvalidTimestamp(_))
        ));
        assert_eq!(parse_opt_ts(None).unwrap(), None);
    }
}
