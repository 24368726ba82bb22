//! Solar Hijri (Jalali / Shamsi) calendar conversion.
//!
//! Leap years follow the 33-year-cycle break table used by the Iranian
//! calendar authority, valid for Jalali years -61 through 3177. All integer
//! division here truncates toward zero, which is what the break-table
//! arithmetic expects for negative intermediates.

use chrono::{Datelike, Days, NaiveDate};

/// Years at which the leap cycle restarts.
const BREAKS: [i32; 20] = [
    -61, 9, 38, 199, 426, 686, 756, 818, 1111, 1181, 1210, 1635, 2060, 2097, 2192, 2262, 2324,
    2394, 2456, 3178,
];

/// First supported Jalali year.
pub(crate) const MIN_YEAR: i32 = BREAKS[0];

/// Last supported Jalali year (inclusive).
pub(crate) const MAX_YEAR: i32 = BREAKS[BREAKS.len() - 1] - 1;

/// Leap-cycle facts for one Jalali year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct YearInfo {
    /// Years since the last leap year (0 means this year is leap).
    years_since_leap: i32,
    /// Gregorian year in which this Jalali year begins.
    gregorian_year: i32,
    /// Day of Gregorian March on which Farvardin 1 falls.
    march_day: u32,
}

fn year_info(jy: i32) -> Option<YearInfo> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&jy) {
        return None;
    }

    let gy = jy + 621;
    let mut leap_j = -14;
    let mut jp = BREAKS[0];
    let mut jump = 0;
    for &jm in &BREAKS[1..] {
        jump = jm - jp;
        if jy < jm {
            break;
        }
        leap_j += jump / 33 * 8 + jump % 33 / 4;
        jp = jm;
    }

    let mut n = jy - jp;
    leap_j += n / 33 * 8 + (n % 33 + 3) / 4;
    if jump % 33 == 4 && jump - n == 4 {
        leap_j += 1;
    }

    let leap_g = gy / 4 - (gy / 100 + 1) * 3 / 4 - 150;
    let march_day = 20 + leap_j - leap_g;

    if jump - n < 6 {
        n = n - jump + (jump + 4) / 33 * 33;
    }
    let mut years_since_leap = ((n + 1) % 33 - 1) % 4;
    if years_since_leap == -1 {
        years_since_leap = 4;
    }

    Some(YearInfo {
        years_since_leap,
        gregorian_year: gy,
        march_day: march_day as u32,
    })
}

/// Gregorian date of Farvardin 1 for the given Jalali year.
fn new_year(info: YearInfo) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(info.gregorian_year, 3, info.march_day)
}

/// Whether the Jalali year has a 30-day Esfand.
pub(crate) fn is_leap_year(jy: i32) -> bool {
    year_info(jy).is_some_and(|info| info.years_since_leap == 0)
}

/// Number of days in a Jalali month.
pub(crate) fn month_length(jy: i32, jm: u32) -> u32 {
    match jm {
        1..=6 => 31,
        7..=11 => 30,
        _ if is_leap_year(jy) => 30,
        _ => 29,
    }
}

/// Convert a Gregorian date to a Jalali `(year, month, day)`.
///
/// Returns `None` outside the supported range.
pub(crate) fn from_gregorian(date: NaiveDate) -> Option<(i32, u32, u32)> {
    let mut jy = date.year() - 621;
    let info = year_info(jy)?;
    let mut k = date.signed_duration_since(new_year(info)?).num_days();

    if k >= 0 {
        if k <= 185 {
            return Some((jy, 1 + (k / 31) as u32, (k % 31) as u32 + 1));
        }
        k -= 186;
    } else {
        jy -= 1;
        if jy < MIN_YEAR {
            return None;
        }
        k += 179;
        if info.years_since_leap == 1 {
            k += 1;
        }
    }
    Some((jy, 7 + (k / 30) as u32, (k % 30) as u32 + 1))
}

/// Convert a Jalali date to Gregorian.
///
/// Returns `None` for out-of-range years or non-existent month/day values.
pub(crate) fn to_gregorian(jy: i32, jm: u32, jd: u32) -> Option<NaiveDate> {
    if !(1..=12).contains(&jm) || jd == 0 || jd > month_length(jy, jm) {
        return None;
    }
    let info = year_info(jy)?;
    let month_offset = if jm <= 7 {
        (jm - 1) * 31
    } else {
        186 + (jm - 7) * 30
    };
    let offset = month_offset + jd - 1;
    new_year(info)?.checked_add_days(Days::new(u64::from(offset)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_nowruz_dates() {
        assert_eq!(from_gregorian(date("2020-03-20")), Some((1399, 1, 1)));
        assert_eq!(from_gregorian(date("2023-03-21")), Some((1402, 1, 1)));
        assert_eq!(from_gregorian(date("2024-03-20")), Some((1403, 1, 1)));
        assert_eq!(from_gregorian(date("2025-03-21")), Some((1404, 1, 1)));
    }

    #[test]
    fn test_end_of_esfand() {
        // 1402 is a common year, 1403 and 1399 are leap years
        assert_eq!(from_gregorian(date("2024-03-19")), Some((1402, 12, 29)));
        assert_eq!(from_gregorian(date("2025-03-20")), Some((1403, 12, 30)));
        assert_eq!(from_gregorian(date("2021-03-20")), Some((1399, 12, 30)));
    }

    #[test]
    fn test_second_half_of_year() {
        assert_eq!(from_gregorian(date("2024-09-21")), Some((1403, 6, 31)));
        assert_eq!(from_gregorian(date("2024-09-22")), Some((1403, 7, 1)));
        assert_eq!(from_gregorian(date("2024-12-21")), Some((1403, 10, 1)));
        assert_eq!(from_gregorian(date("2000-01-01")), Some((1378, 10, 11)));
    }

    #[test]
    fn test_month_length() {
        assert_eq!(month_length(1403, 1), 31);
        assert_eq!(month_length(1403, 7), 30);
        assert_eq!(month_length(1402, 12), 29);
        assert_eq!(month_length(1403, 12), 30);
    }

    #[test]
    fn test_to_gregorian() {
        assert_eq!(to_gregorian(1402, 12, 1), Some(date("2024-02-20")));
        assert_eq!(to_gregorian(1403, 1, 1), Some(date("2024-03-20")));
        assert_eq!(to_gregorian(1403, 7, 1), Some(date("2024-09-22")));
    }

    #[test]
    fn test_to_gregorian_rejects_missing_days() {
        assert_eq!(to_gregorian(1402, 12, 30), None);
        assert_eq!(to_gregorian(1403, 7, 31), None);
        assert_eq!(to_gregorian(1403, 13, 1), None);
        assert_eq!(to_gregorian(1403, 1, 0), None);
    }

    #[test]
    fn test_leap_years() {
        assert!(is_leap_year(1399));
        assert!(is_leap_year(1403));
        assert!(!is_leap_year(1402));
        assert!(!is_leap_year(1404));
    }

    #[test]
    fn test_roundtrip_every_day_of_a_century() {
        let mut d = date("1950-01-01");
        let end = date("2060-01-01");
        while d < end {
            let (jy, jm, jd) = from_gregorian(d).unwrap();
            assert_eq!(to_gregorian(jy, jm, jd), Some(d), "roundtrip failed for {d}");
            d = d.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_out_of_range_year() {
        assert_eq!(year_info(MAX_YEAR + 1), None);
        assert_eq!(to_gregorian(MIN_YEAR - 1, 1, 1), None);
    }
}
