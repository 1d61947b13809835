//! Dataset loading.
//!
//! This module turns a spreadsheet or CSV file into a typed, validated
//! [`Table`](crate::models::Table), and keeps loaded tables for the lifetime
//! of the process.

pub mod cache;
pub mod loader;

pub use cache::DatasetCache;
pub use loader::LoadOptions;

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a dataset. All of them are fatal for a run.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Dataset file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open workbook {}: {message}", path.display())]
    Workbook { path: PathBuf, message: String },

    #[error("Worksheet '{0}' not found")]
    SheetNotFound(String),

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unsupported file type '{0}' (expected csv, xlsx, xlsm, xlsb, xls or ods)")]
    UnsupportedFormat(String),

    #[error("Dataset has no data rows")]
    Empty,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Invalid value {value:?} in column '{column}' at row {row}: {reason}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },
}
