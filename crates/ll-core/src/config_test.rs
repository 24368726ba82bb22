use super::*;
use tempfile::tempdir;

#[test]
fn test_parse_minimal_config() {
    let yaml = r#"
dataset: sampledataset
source:
  table: payments
lake:
  root: lake/sampledataset
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.dataset, "sampledataset");
    assert_eq!(config.calendar, LocalCalendar::Jalali);
    assert_eq!(config.source.path, None);
    assert_eq!(config.source.columns.id, "id");
    assert_eq!(config.source.columns.create_date, "create_date");
    assert_eq!(config.ledger.path, "ledger.duckdb");
    assert_eq!(config.lineage.stale_after_hours, 36);
    assert_eq!(config.lineage.stale_after(), chrono::Duration::hours(36));
    assert!(config.session.threads.is_none());
    config.validate().unwrap();
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
dataset: sampledataset
calendar: gregorian
source:
  path: ./source.duckdb
  table: sales.payments
  columns:
    id: Id
    create_date: PaymentDate
    amount: Amount
    status: Status
lake:
  root: /data/lake/sampledataset
ledger:
  path: ./ledger.duckdb
lineage:
  stale_after_hours: 48
session:
  threads: 8
  memory_limit: 16GB
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.calendar, LocalCalendar::Gregorian);
    assert_eq!(config.source.columns.create_date, "PaymentDate");
    assert_eq!(config.lineage.stale_after_hours, 48);
    assert_eq!(config.session.threads, Some(8));
    assert_eq!(config.session.memory_limit.as_deref(), Some("16GB"));
    config.validate().unwrap();
}

#[test]
fn test_unknown_field_rejected() {
    let yaml = r#"
dataset: sampledataset
source:
  table: payments
lake:
  root: lake
spark_master: "spark://localhost:7077"
"#;
    assert!(serde_yaml::from_str::<Config>(yaml).is_err());
}

#[test]
fn test_empty_dataset_rejected() {
    let yaml = r#"
dataset: ""
source:
  table: payments
lake:
  root: lake
"#;
    assert!(serde_yaml::from_str::<Config>(yaml).is_err());
}

#[test]
fn test_validate_rejects_bad_memory_limit() {
    let yaml = r#"
dataset: sampledataset
source:
  table: payments
lake:
  root: lake
session:
  memory_limit: "1GB'; DROP TABLE x; --"
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    let err = config.validate().unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_validate_rejects_zero_stale_threshold() {
    let yaml = r#"
dataset: sampledataset
source:
  table: payments
lake:
  root: lake
lineage:
  stale_after_hours: 0
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_blank_column() {
    let yaml = r#"
dataset: sampledataset
source:
  table: payments
  columns:
    id: " "
lake:
  root: lake
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("source.columns.id"));
}

#[test]
fn test_load_from_dir() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("ledgerline.yml"),
        "dataset: payments\nsource:\n  table: payments\nlake:\n  root: lake\n",
    )
    .unwrap();

    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.dataset, "payments");
}

#[test]
fn test_load_from_dir_yaml_extension() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("ledgerline.yaml"),
        "dataset: payments\nsource:\n  table: payments\nlake:\n  root: lake\n",
    )
    .unwrap();

    assert!(Config::load_from_dir(dir.path()).is_ok());
}

#[test]
fn test_load_missing_config() {
    let dir = tempdir().unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_path_resolution() {
    let yaml = r#"
dataset: sampledataset
source:
  path: source.duckdb
  table: payments
lake:
  root: lake/sampledataset
ledger:
  path: ":memory:"
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    let root = Path::new("/srv/ledgerline");
    assert_eq!(config.ledger_path(root), ":memory:");
    assert_eq!(
        config.source_path(root).as_deref(),
        Some("/srv/ledgerline/source.duckdb")
    );
    assert_eq!(
        config.lake_root(root),
        PathBuf::from("/srv/ledgerline/lake/sampledataset")
    );
}
