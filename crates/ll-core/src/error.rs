//! Error types for ll-core

use thiserror::Error;

/// Core error type for Ledgerline
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Invalid configuration value
    #[error("[C002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C003: IO error with file path context
    #[error("[C003] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C004: YAML parse error
    #[error("[C004] Config parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// C010: Date cannot be represented in the local calendar
    #[error("[C010] Date {date} is outside the supported range of the {calendar} calendar")]
    CalendarOutOfRange { date: String, calendar: String },

    /// C011: Local-calendar date does not exist
    #[error("[C011] Invalid {calendar} date {year:04}-{month:02}-{day:02}")]
    InvalidLocalDate {
        calendar: String,
        year: i32,
        month: u32,
        day: u32,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
