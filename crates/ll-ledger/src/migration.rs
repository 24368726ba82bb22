//! Ledger schema migrations.
//!
//! Applied versions are recorded in `ll_ledger.schema_version`. Each pending
//! migration runs in its own transaction together with its version row, so a
//! failed migration leaves the ledger at the previous version.

use crate::ddl::{Migration, MIGRATIONS};
use crate::error::{LedgerError, LedgerResult};
use duckdb::Connection;

const VERSION_TABLE_DDL: &str = "CREATE SCHEMA IF NOT EXISTS ll_ledger;
CREATE TABLE IF NOT EXISTS ll_ledger.schema_version (
    version    INTEGER NOT NULL,
    applied_at TIMESTAMP NOT NULL DEFAULT current_timestamp
);";

/// Highest migration version this build knows about.
pub fn latest_version() -> i32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Bring the ledger schema up to [`latest_version`].
///
/// Returns the versions applied by this call. Refuses a ledger written by a
/// newer build.
pub fn run_migrations(conn: &Connection) -> LedgerResult<Vec<i32>> {
    conn.execute_batch(VERSION_TABLE_DDL)
        .map_err(|e| LedgerError::MigrationError(format!("create schema_version: {e}")))?;

    let installed = installed_version(conn)?;
    if installed > latest_version() {
        return Err(LedgerError::MigrationError(format!(
            "ledger schema is at v{installed:03}, newer than this build (v{:03})",
            latest_version()
        )));
    }

    let mut applied = Vec::new();
    for migration in MIGRATIONS.iter().filter(|m| m.version > installed) {
        apply(conn, migration)?;
        applied.push(migration.version);
    }
    if !applied.is_empty() {
        log::info!("Ledger schema migrated to v{:03}", latest_version());
    }
    Ok(applied)
}

fn installed_version(conn: &Connection) -> LedgerResult<i32> {
    conn.query_row(
        "SELECT CAST(COALESCE(MAX(version), 0) AS INTEGER) FROM ll_ledger.schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| LedgerError::MigrationError(format!("read schema version: {e}")))
}

fn apply(conn: &Connection, migration: &Migration) -> LedgerResult<()> {
    let version = migration.version;
    log::debug!("Applying ledger migration v{version:03}");

    let fail = |step: &str, e: duckdb::Error| {
        let _ = conn.execute_batch("ROLLBACK");
        LedgerError::MigrationError(format!("v{version:03} {step}: {e}"))
    };

    conn.execute_batch("BEGIN TRANSACTION")
        .map_err(|e| LedgerError::MigrationError(format!("v{version:03} begin: {e}")))?;
    conn.execute_batch(migration.sql)
        .map_err(|e| fail("failed", e))?;
    conn.execute(
        "INSERT INTO ll_ledger.schema_version (version) VALUES (?)",
        duckdb::params![version],
    )
    .map_err(|e| fail("record version", e))?;
    conn.execute_batch("COMMIT")
        .map_err(|e| fail("commit", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_database_applies_everything_once() {
        let conn = Connection::open_in_memory().unwrap();
        let applied = run_migrations(&conn).unwrap();
        assert_eq!(applied, MIGRATIONS.iter().map(|m| m.version).collect::<Vec<_>>());
        assert!(run_migrations(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO ll_ledger.schema_version (version) VALUES (?)",
            duckdb::params![latest_version() + 1],
        )
        .unwrap();

        let err = run_migrations(&conn).unwrap_err();
        assert!(matches!(err, LedgerError::MigrationError(_)));
        assert!(err.to_string().contains("newer than this build"));
    }

    #[test]
    fn test_versions_are_ascending() {
        assert!(MIGRATIONS.windows(2).all(|w| w[0].version < w[1].version));
        assert!(latest_version() >= 1);
    }
}
