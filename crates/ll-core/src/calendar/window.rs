//! Extraction window resolution.

use super::LocalCalendar;
use crate::error::{CoreError, CoreResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// The bounded date range one daily run extracts, plus its lake partition.
///
/// Both bounds are Gregorian and inclusive. The window never includes
/// `today`, so in-progress source data is never ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarWindow {
    /// The run date the window was resolved from
    pub today: NaiveDate,
    /// First Gregorian day of the local month containing `window_end`
    pub window_start: NaiveDate,
    /// The day before `today`
    pub window_end: NaiveDate,
    /// Local-calendar `YYYY-MM` of `window_end`
    pub month_id: String,
    /// Calendar the month was computed in
    pub calendar: LocalCalendar,
}

impl CalendarWindow {
    /// Resolve the window for a run on `today`.
    pub fn resolve(calendar: LocalCalendar, today: NaiveDate) -> CoreResult<Self> {
        let window_end = today
            .pred_opt()
            .ok_or_else(|| CoreError::CalendarOutOfRange {
                date: today.to_string(),
                calendar: calendar.to_string(),
            })?;

        let local_end = calendar.to_local(window_end)?;
        let window_start = calendar.to_gregorian(local_end.first_of_month())?;

        Ok(Self {
            today,
            window_start,
            window_end,
            month_id: local_end.month_id(),
            calendar,
        })
    }

    /// Timestamp up to which the source is considered loaded: the start of `today`.
    pub fn source_cutoff_time(&self) -> NaiveDateTime {
        self.today.and_time(NaiveTime::MIN)
    }

    /// Number of days covered, inclusive of both bounds.
    pub fn day_count(&self) -> i64 {
        self.window_end
            .signed_duration_since(self.window_start)
            .num_days()
            + 1
    }

    /// Whether the window covers only `window_end` (it is the 1st of the local month).
    pub fn is_single_day(&self) -> bool {
        self.window_start == self.window_end
    }
}

#[cfg(test)]
#[path = "window_test.rs"]
mod tests;
