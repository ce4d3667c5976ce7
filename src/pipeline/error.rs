//! Error types for the survey pipeline.
//!
//! Every variant here is fatal: the run aborts and no workbook is written.
//! Row-level problems (non-numeric cells, zero denominators, unmatched
//! buckets) never surface as errors; they become nulls in the affected cell.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input file does not exist.
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The input file extension is not one the loader understands.
    #[error("Unsupported file format: '{extension}'. Supported formats: xlsx, xlsm, xls, ods, csv, parquet")]
    UnsupportedFormat {
        /// Lowercased extension of the input path
        extension: String,
    },

    /// The requested worksheet is not present in the workbook.
    #[error("Worksheet '{sheet}' not found in {}. Available sheets: {available:?}", .path.display())]
    SheetNotFound {
        /// Requested sheet name
        sheet: String,
        /// Workbook that was searched
        path: PathBuf,
        /// Sheets the workbook does contain
        available: Vec<String>,
    },

    /// A derivation or aggregation referenced a column the table lacks.
    #[error("Column '{column}' required by {context} not found in dataset")]
    MissingColumn {
        /// Name of the absent column
        column: String,
        /// The operation that needed it
        context: String,
    },

    /// A derived column would overwrite an existing one.
    #[error("Column '{column}' produced by {context} already exists in dataset")]
    DuplicateColumn {
        /// Name of the colliding column
        column: String,
        /// The operation that produced it
        context: String,
    },

    /// A sentinel replacement is itself a sentinel key.
    #[error("Invalid sentinel map: replacement {replacement} is also a sentinel key")]
    InvalidSentinelMap {
        /// The offending replacement value
        replacement: f64,
    },

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),

    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used across the pipeline modules.
pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub(crate) fn missing_column(column: &str, context: &str) -> Self {
        PipelineError::MissingColumn {
            column: column.to_string(),
            context: context.to_string(),
        }
    }
}
