use super::*;
use chrono::Datelike;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn test_resolve_mid_month() {
    let window = CalendarWindow::resolve(LocalCalendar::Jalali, date("2024-03-20")).unwrap();
    assert_eq!(window.window_end, date("2024-03-19"));
    assert_eq!(window.window_start, date("2024-02-20"));
    assert_eq!(window.month_id, "1402-12");
    assert_eq!(window.day_count(), 29);
    assert!(!window.is_single_day());
}

#[test]
fn test_resolve_first_day_of_local_month_is_single_day() {
    let window = CalendarWindow::resolve(LocalCalendar::Jalali, date("2024-03-21")).unwrap();
    assert_eq!(window.window_end, date("2024-03-20"));
    assert_eq!(window.window_start, date("2024-03-20"));
    assert_eq!(window.month_id, "1403-01");
    assert!(window.is_single_day());
    assert_eq!(window.day_count(), 1);
}

#[test]
fn test_resolve_gregorian() {
    let window = CalendarWindow::resolve(LocalCalendar::Gregorian, date("2024-03-01")).unwrap();
    assert_eq!(window.window_end, date("2024-02-29"));
    assert_eq!(window.window_start, date("2024-02-01"));
    assert_eq!(window.month_id, "2024-02");
}

#[test]
fn test_source_cutoff_time_is_start_of_today() {
    let window = CalendarWindow::resolve(LocalCalendar::Jalali, date("2024-03-20")).unwrap();
    assert_eq!(
        window.source_cutoff_time().to_string(),
        "2024-03-20 00:00:00"
    );
}

#[test]
fn test_resolve_out_of_range_is_error() {
    assert!(CalendarWindow::resolve(LocalCalendar::Jalali, NaiveDate::MIN).is_err());
    assert!(CalendarWindow::resolve(LocalCalendar::Jalali, date("3900-06-01")).is_err());
}

#[test]
fn test_window_invariants_hold_for_every_day_of_two_years() {
    for calendar in [LocalCalendar::Jalali, LocalCalendar::Gregorian] {
        let mut today = date("2023-01-01");
        let end = date("2025-01-01");
        while today < end {
            let window = CalendarWindow::resolve(calendar, today).unwrap();
            assert_eq!(window.window_end, today.pred_opt().unwrap());
            assert!(window.window_start <= window.window_end);

            let local_start = calendar.to_local(window.window_start).unwrap();
            let local_end = calendar.to_local(window.window_end).unwrap();
            assert_eq!(local_start.day, 1, "{calendar} window for {today}");
            assert_eq!(local_start.month_id(), local_end.month_id());
            assert_eq!(window.month_id, local_end.month_id());
            assert!(window.day_count() <= 31);

            today = today.succ_opt().unwrap();
        }
    }
}

#[test]
fn test_gregorian_window_starts_on_first_of_month() {
    let window = CalendarWindow::resolve(LocalCalendar::Gregorian, date("2024-07-15")).unwrap();
    assert_eq!(window.window_start.day(), 1);
    assert_eq!(window.window_start.month(), 7);
}
