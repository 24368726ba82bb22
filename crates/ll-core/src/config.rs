//! Configuration types and parsing for ledgerline.yml

use crate::calendar::LocalCalendar;
use crate::dataset_name::DatasetName;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration from ledgerline.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Dataset name recorded in the cutoff and lineage tables
    pub dataset: DatasetName,

    /// Calendar used to derive lake partition months
    #[serde(default)]
    pub calendar: LocalCalendar,

    /// Where rows are extracted from
    pub source: SourceConfig,

    /// Where rows are appended to
    pub lake: LakeConfig,

    /// Ledger database holding the cutoff and lineage tables
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Lineage bookkeeping settings
    #[serde(default)]
    pub lineage: LineageConfig,

    /// Compute session tuning
    #[serde(default)]
    pub session: SessionConfig,
}

/// Source table configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// DuckDB database file attached read-only as catalog `source`.
    ///
    /// When omitted, `table` is resolved inside the session database itself.
    #[serde(default)]
    pub path: Option<String>,

    /// Source table, optionally schema-qualified
    pub table: String,

    /// Column names in the source table
    #[serde(default)]
    pub columns: SourceColumns,
}

/// Mapping from the extracted fields to source column names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceColumns {
    #[serde(default = "default_id_column")]
    pub id: String,

    /// Timestamp column the window is applied to
    #[serde(default = "default_create_date_column")]
    pub create_date: String,

    #[serde(default = "default_amount_column")]
    pub amount: String,

    #[serde(default = "default_status_column")]
    pub status: String,
}

impl Default for SourceColumns {
    fn default() -> Self {
        Self {
            id: default_id_column(),
            create_date: default_create_date_column(),
            amount: default_amount_column(),
            status: default_status_column(),
        }
    }
}

/// Lake sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LakeConfig {
    /// Dataset root; partitions are written to `{root}/MonthID={month_id}`
    pub root: String,
}

/// Ledger database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Ledger database path (DuckDB file or :memory:)
    #[serde(default = "default_ledger_path")]
    pub path: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
        }
    }
}

/// Lineage bookkeeping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineageConfig {
    /// Age after which an open lineage record is reported as stale
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: u32,
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self {
            stale_after_hours: default_stale_after_hours(),
        }
    }
}

impl LineageConfig {
    /// Stale threshold as a duration.
    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.stale_after_hours))
    }
}

/// Compute session tuning, applied with `SET` when the session opens
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Worker threads for the session
    #[serde(default)]
    pub threads: Option<u32>,

    /// Memory limit, e.g. "16GB"
    #[serde(default)]
    pub memory_limit: Option<String>,
}

fn default_id_column() -> String {
    "id".to_string()
}

fn default_create_date_column() -> String {
    "create_date".to_string()
}

fn default_amount_column() -> String {
    "amount".to_string()
}

fn default_status_column() -> String {
    "status".to_string()
}

const DEFAULT_LEDGER_PATH: &str = "ledger.duckdb";

const IN_MEMORY_PATH: &str = ":memory:";

fn default_ledger_path() -> String {
    DEFAULT_LEDGER_PATH.to_string()
}

fn default_stale_after_hours() -> u32 {
    36
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        log::debug!(
            "Loaded config for dataset '{}' from {}",
            config.dataset,
            path.display()
        );
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for ledgerline.yml or ledgerline.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("ledgerline.yml");
        let yaml_path = dir.join("ledgerline.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.source.table.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "source.table cannot be empty".to_string(),
            });
        }

        let columns = &self.source.columns;
        for (key, value) in [
            ("id", &columns.id),
            ("create_date", &columns.create_date),
            ("amount", &columns.amount),
            ("status", &columns.status),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: format!("source.columns.{key} cannot be empty"),
                });
            }
        }

        if self.lake.root.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "lake.root cannot be empty".to_string(),
            });
        }

        if self.ledger.path.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "ledger.path cannot be empty".to_string(),
            });
        }

        if self.lineage.stale_after_hours == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "lineage.stale_after_hours must be greater than zero".to_string(),
            });
        }

        if let Some(threads) = self.session.threads {
            if threads == 0 {
                return Err(CoreError::ConfigInvalid {
                    message: "session.threads must be greater than zero".to_string(),
                });
            }
        }

        // memory_limit is spliced into a SET statement, so keep it to a size literal
        if let Some(limit) = &self.session.memory_limit {
            let well_formed = !limit.is_empty()
                && limit
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == ' ');
            if !well_formed {
                return Err(CoreError::ConfigInvalid {
                    message: format!("session.memory_limit '{limit}' is not a size like '16GB'"),
                });
            }
        }

        Ok(())
    }

    /// Ledger database path resolved against the project root.
    pub fn ledger_path(&self, root: &Path) -> String {
        resolve_db_path(root, &self.ledger.path)
    }

    /// Source database path resolved against the project root, if configured.
    pub fn source_path(&self, root: &Path) -> Option<String> {
        self.source
            .path
            .as_deref()
            .map(|path| resolve_db_path(root, path))
    }

    /// Lake dataset root resolved against the project root.
    pub fn lake_root(&self, root: &Path) -> PathBuf {
        root.join(&self.lake.root)
    }
}

/// Resolve a DuckDB path relative to `root`, leaving `:memory:` untouched.
fn resolve_db_path(root: &Path, path: &str) -> String {
    if path == IN_MEMORY_PATH {
        path.to_string()
    } else {
        root.join(path).display().to_string()
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
