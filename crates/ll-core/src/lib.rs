//! ll-core - Core library for Ledgerline
//!
//! This crate provides the shared types used by every Ledgerline component:
//! project configuration, strongly-typed dataset names, SQL quoting helpers,
//! and the local-calendar arithmetic that resolves each run's extraction
//! window and lake partition.

pub mod calendar;
pub mod config;
pub mod dataset_name;
pub mod error;
pub mod sql_utils;

pub use calendar::{CalendarWindow, LocalCalendar, LocalDate};
pub use config::Config;
pub use dataset_name::DatasetName;
pub use error::{CoreError, CoreResult};
