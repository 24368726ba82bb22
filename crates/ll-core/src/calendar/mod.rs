//! Local-calendar arithmetic.
//!
//! The lake is partitioned by a local-calendar month, while the source system
//! and the ledger speak Gregorian. [`LocalCalendar`] converts in both
//! directions; [`CalendarWindow`] turns "today" into the bounded extraction
//! window of a daily run.

mod jalali;
mod window;

pub use window::CalendarWindow;

use crate::error::{CoreError, CoreResult};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar used for partition month identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocalCalendar {
    /// Solar Hijri (Shamsi) calendar (default)
    #[default]
    Jalali,
    /// Gregorian calendar, months identical to the source system's
    Gregorian,
}

impl fmt::Display for LocalCalendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalCalendar::Jalali => write!(f, "jalali"),
            LocalCalendar::Gregorian => write!(f, "gregorian"),
        }
    }
}

/// A date in a [`LocalCalendar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl LocalDate {
    /// Year-month label (`YYYY-MM`) used as the lake partition key.
    pub fn month_id(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// The first day of this date's month.
    pub fn first_of_month(&self) -> LocalDate {
        LocalDate { day: 1, ..*self }
    }
}

impl fmt::Display for LocalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl LocalCalendar {
    /// Convert a Gregorian date into this calendar.
    pub fn to_local(self, date: NaiveDate) -> CoreResult<LocalDate> {
        match self {
            LocalCalendar::Jalali => jalali::from_gregorian(date)
                .map(|(year, month, day)| LocalDate { year, month, day })
                .ok_or_else(|| CoreError::CalendarOutOfRange {
                    date: date.to_string(),
                    calendar: self.to_string(),
                }),
            LocalCalendar::Gregorian => Ok(LocalDate {
                year: date.year(),
                month: date.month(),
                day: date.day(),
            }),
        }
    }

    /// Convert a date in this calendar back to Gregorian.
    pub fn to_gregorian(self, local: LocalDate) -> CoreResult<NaiveDate> {
        let converted = match self {
            LocalCalendar::Jalali => jalali::to_gregorian(local.year, local.month, local.day),
            LocalCalendar::Gregorian => NaiveDate::from_ymd_opt(local.year, local.month, local.day),
        };
        converted.ok_or_else(|| CoreError::InvalidLocalDate {
            calendar: self.to_string(),
            year: local.year,
            month: local.month,
            day: local.day,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_jalali_to_local_and_back() {
        let local = LocalCalendar::Jalali.to_local(date("2024-03-19")).unwrap();
        assert_eq!(local.to_string(), "1402-12-29");
        assert_eq!(local.month_id(), "1402-12");
        assert_eq!(
            LocalCalendar::Jalali.to_gregorian(local.first_of_month()).unwrap(),
            date("2024-02-20")
        );
    }

    #[test]
    fn test_gregorian_is_identity() {
        let local = LocalCalendar::Gregorian.to_local(date("2024-03-19")).unwrap();
        assert_eq!(local.month_id(), "2024-03");
        assert_eq!(
            LocalCalendar::Gregorian.to_gregorian(local).unwrap(),
            date("2024-03-19")
        );
    }

    #[test]
    fn test_invalid_local_date() {
        let err = LocalCalendar::Jalali
            .to_gregorian(LocalDate {
                year: 1402,
                month: 12,
                day: 30,
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidLocalDate { .. }));
        assert!(err.to_string().contains("1402-12-30"));
    }

    #[test]
    fn test_jalali_out_of_range() {
        let err = LocalCalendar::Jalali.to_local(date("3900-01-01")).unwrap_err();
        assert!(matches!(err, CoreError::CalendarOutOfRange { .. }));
    }

    #[test]
    fn test_calendar_serde() {
        let cal: LocalCalendar = serde_yaml::from_str("gregorian").unwrap();
        assert_eq!(cal, LocalCalendar::Gregorian);
        assert_eq!(LocalCalendar::default(), LocalCalendar::Jalali);
    }
}
