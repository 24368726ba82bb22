//! Integration tests for the ledger's load lifecycle.
//!
//! These tests drive the public ll-ledger API through complete, interrupted,
//! and recovered loads against a file-backed ledger.

use chrono::{NaiveDate, NaiveDateTime};
use ll_ledger::{LedgerDb, LedgerError, LineageStatus, LoadCompletion};

// ── Helpers ────────────────────────────────────────────────────────────

fn at(month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// Simulate one successful daily run for `day` of March.
fn daily_load(db: &LedgerDb, table: &str, day: u32, rows: i64, max_id: Option<i64>) -> i64 {
    let key = db.lineage().open_at(table, at(3, day, 1)).unwrap();
    assert_eq!(db.lineage().current_open_key(table).unwrap(), key);
    db.complete_load(&LoadCompletion {
        table_name: table,
        lineage_key: key,
        completed_at: at(3, day, 2),
        source_cutoff_time: at(3, day, 0),
        row_count: rows,
        max_id,
    })
    .unwrap();
    key
}

// ── Lifecycle ──────────────────────────────────────────────────────────

#[test]
fn consecutive_daily_loads_advance_the_watermark() {
    let dir = tempfile::tempdir().unwrap();
    let db = LedgerDb::open(&dir.path().join("ledger.duckdb")).unwrap();

    daily_load(&db, "payments", 18, 10, Some(10));
    daily_load(&db, "payments", 19, 5, Some(15));
    let last = daily_load(&db, "payments", 20, 0, None);

    let status = db.dataset_status("payments").unwrap();
    let cutoff = status.cutoff.unwrap();
    assert_eq!(cutoff.cutoff_time, at(3, 20, 0));
    assert_eq!(cutoff.cutoff_id, Some(15));
    assert_eq!(status.last_success.unwrap().lineage_key, last);
    assert!(status.open.is_empty());
}

#[test]
fn interrupted_load_blocks_next_run_until_marked_failed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.duckdb");

    daily_load(&LedgerDb::open(&path).unwrap(), "payments", 18, 10, Some(10));

    // Crash after the lake write: the record stays open and the cutoff stays put
    let crashed = {
        let db = LedgerDb::open(&path).unwrap();
        db.lineage().open_at("payments", at(3, 19, 1)).unwrap()
    };

    let db = LedgerDb::open(&path).unwrap();
    let status = db.dataset_status("payments").unwrap();
    assert_eq!(status.cutoff.as_ref().unwrap().cutoff_time, at(3, 18, 0));
    assert_eq!(status.open.len(), 1);
    assert_eq!(status.open[0].lineage_key, crashed);
    assert_eq!(status.open[0].status(), LineageStatus::Open);
    let stale = db
        .lineage()
        .stale_open("payments", at(3, 21, 1), chrono::Duration::hours(36))
        .unwrap();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].lineage_key, crashed);

    // Next run opens its own record and cannot identify it unambiguously
    let next = db.lineage().open_at("payments", at(3, 20, 1)).unwrap();
    match db.lineage().current_open_key("payments").unwrap_err() {
        LedgerError::AmbiguousLineage { open_keys, .. } => {
            assert_eq!(open_keys, vec![crashed, next]);
        }
        other => panic!("expected AmbiguousLineage, got {other:?}"),
    }
    db.lineage().mark_failed(next, at(3, 20, 1)).unwrap();

    // Operator resolves the crashed record
    db.lineage().mark_failed(crashed, at(3, 20, 9)).unwrap();
    assert!(!db.dataset_status("payments").unwrap().has_open());

    let key = daily_load(&db, "payments", 21, 7, Some(17));
    let record = db.lineage().get(key).unwrap().unwrap();
    assert_eq!(record.status(), LineageStatus::Succeeded);
    assert_eq!(
        db.cutoff().get("payments").unwrap().unwrap().cutoff_id,
        Some(17)
    );
}

#[test]
fn late_finalize_does_not_rewind_watermark() {
    let db = LedgerDb::open_memory().unwrap();
    let slow = db.lineage().open_at("payments", at(3, 19, 1)).unwrap();
    let fast = db.lineage().open_at("orders", at(3, 20, 1)).unwrap();
    db.complete_load(&LoadCompletion {
        table_name: "orders",
        lineage_key: fast,
        completed_at: at(3, 20, 2),
        source_cutoff_time: at(3, 20, 0),
        row_count: 1,
        max_id: Some(1),
    })
    .unwrap();

    db.cutoff()
        .advance("payments", at(3, 20, 0), Some(50))
        .unwrap();
    let cutoff = db
        .complete_load(&LoadCompletion {
            table_name: "payments",
            lineage_key: slow,
            completed_at: at(3, 20, 3),
            source_cutoff_time: at(3, 19, 0),
            row_count: 3,
            max_id: Some(30),
        })
        .unwrap();

    assert_eq!(cutoff.cutoff_time, at(3, 20, 0));
    assert_eq!(cutoff.cutoff_id, Some(50));
}

#[test]
fn status_serializes_for_operators() {
    let db = LedgerDb::open_memory().unwrap();
    daily_load(&db, "payments", 18, 10, Some(10));
    db.lineage().open_at("payments", at(3, 19, 1)).unwrap();

    let json = serde_json::to_value(db.dataset_status("payments").unwrap()).unwrap();
    assert_eq!(json["table_name"], "payments");
    assert_eq!(json["cutoff"]["cutoff_id"], 10);
    assert_eq!(json["open"].as_array().unwrap().len(), 1);
    assert_eq!(json["last_success"]["row_no"], 10);
}
