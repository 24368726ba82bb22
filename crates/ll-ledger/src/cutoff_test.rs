use super::*;
use crate::LedgerDb;
use chrono::NaiveDate;

fn day(d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[test]
fn test_get_missing() {
    let db = LedgerDb::open_memory().unwrap();
    assert!(db.cutoff().get("payments").unwrap().is_none());
}

#[test]
fn test_first_advance_inserts() {
    let db = LedgerDb::open_memory().unwrap();
    let record = db.cutoff().advance("payments", day(20), Some(100)).unwrap();
    assert_eq!(record.cutoff_time, day(20));
    assert_eq!(record.cutoff_id, Some(100));
    assert_eq!(db.cutoff().get("payments").unwrap(), Some(record));
}

#[test]
fn test_advance_moves_forward() {
    let db = LedgerDb::open_memory().unwrap();
    let cutoff = db.cutoff();
    cutoff.advance("payments", day(20), Some(100)).unwrap();
    let record = cutoff.advance("payments", day(21), Some(150)).unwrap();
    assert_eq!(record.cutoff_time, day(21));
    assert_eq!(record.cutoff_id, Some(150));
}

#[test]
fn test_out_of_order_advance_never_regresses() {
    let db = LedgerDb::open_memory().unwrap();
    let cutoff = db.cutoff();
    cutoff.advance("payments", day(21), Some(150)).unwrap();

    // A late finalize from an older run arrives after a newer one
    let record = cutoff.advance("payments", day(20), Some(100)).unwrap();
    assert_eq!(record.cutoff_time, day(21));
    assert_eq!(record.cutoff_id, Some(150));

    // Mixed: newer time, older id
    let record = cutoff.advance("payments", day(22), Some(120)).unwrap();
    assert_eq!(record.cutoff_time, day(22));
    assert_eq!(record.cutoff_id, Some(150));

    assert_eq!(cutoff.get("payments").unwrap(), Some(record));
}

#[test]
fn test_monotonic_across_permutations() {
    let updates = [(18, 10), (20, 30), (19, 20), (22, 25), (21, 40)];
    let db = LedgerDb::open_memory().unwrap();
    let cutoff = db.cutoff();

    let mut best_time = day(1);
    let mut best_id = i64::MIN;
    for (d, id) in updates {
        let before = cutoff.get("payments").unwrap();
        let after = cutoff.advance("payments", day(d), Some(id)).unwrap();
        if let Some(before) = before {
            assert!(after.cutoff_time >= before.cutoff_time);
            assert!(after.cutoff_id >= before.cutoff_id);
        }
        best_time = best_time.max(day(d));
        best_id = best_id.max(id);
    }

    let last = cutoff.get("payments").unwrap().unwrap();
    assert_eq!(last.cutoff_time, best_time);
    assert_eq!(last.cutoff_id, Some(best_id));
}

#[test]
fn test_none_id_keeps_previous() {
    let db = LedgerDb::open_memory().unwrap();
    let cutoff = db.cutoff();
    cutoff.advance("payments", day(20), Some(100)).unwrap();
    let record = cutoff.advance("payments", day(21), None).unwrap();
    assert_eq!(record.cutoff_time, day(21));
    assert_eq!(record.cutoff_id, Some(100));
}

#[test]
fn test_first_advance_without_id() {
    let db = LedgerDb::open_memory().unwrap();
    let record = db.cutoff().advance("payments", day(20), None).unwrap();
    assert_eq!(record.cutoff_id, None);

    let record = db.cutoff().advance("payments", day(21), Some(5)).unwrap();
    assert_eq!(record.cutoff_id, Some(5));
}

#[test]
fn test_datasets_are_independent() {
    let db = LedgerDb::open_memory().unwrap();
    let cutoff = db.cutoff();
    cutoff.advance("payments", day(20), Some(100)).unwrap();
    cutoff.advance("orders", day(10), Some(7)).unwrap();

    assert_eq!(
        cutoff.get("payments").unwrap().unwrap().cutoff_id,
        Some(100)
    );
    assert_eq!(cutoff.get("orders").unwrap().unwrap().cutoff_time, day(10));
}
