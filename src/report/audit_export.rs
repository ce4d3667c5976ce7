//! Run audit export
//!
//! Records the data-quality exclusions a run made silently (recoded
//! sentinels, invalid durations, zero remittances, suppressed groups) so they
//! can be reviewed after the fact.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{DerivationAudit, RecodeAudit, SummaryTable};

/// Metadata about the run
#[derive(Serialize)]
pub struct RunMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    /// fsagg version
    pub fsagg_version: String,
    /// Input file path
    pub input_file: String,
    /// Worksheet read from the input
    pub sheet: String,
    /// Output workbook path
    pub output_file: String,
    /// Groups of this size or smaller were suppressed
    pub min_group_size: usize,
}

/// Per-sheet suppression counts
#[derive(Debug, Serialize)]
pub struct SheetAudit {
    pub sheet_name: String,
    pub grouping: Vec<String>,
    pub groups_total: usize,
    pub groups_kept: usize,
    pub groups_suppressed: usize,
    pub rows_in_suppressed_groups: usize,
}

impl From<&SummaryTable> for SheetAudit {
    fn from(table: &SummaryTable) -> Self {
        Self {
            sheet_name: table.sheet_name.clone(),
            grouping: table.key_columns.clone(),
            groups_total: table.groups_total(),
            groups_kept: table.rows.len(),
            groups_suppressed: table.suppressed_groups,
            rows_in_suppressed_groups: table.suppressed_rows,
        }
    }
}

/// Complete audit of one run
#[derive(Serialize)]
pub struct RunAudit<'a> {
    pub metadata: RunMetadata,
    pub rows: usize,
    pub columns: usize,
    pub recode: &'a RecodeAudit,
    pub derivation: &'a DerivationAudit,
    pub sheets: Vec<SheetAudit>,
}

/// Parameters for the run audit export
pub struct AuditParams<'a> {
    pub input_file: &'a Path,
    pub sheet: &'a str,
    pub output_file: &'a Path,
    pub min_group_size: usize,
    pub rows: usize,
    pub columns: usize,
}

impl<'a> RunAudit<'a> {
    pub fn new(
        params: &AuditParams<'_>,
        recode: &'a RecodeAudit,
        derivation: &'a DerivationAudit,
        tables: &[SummaryTable],
    ) -> Self {
        Self {
            metadata: RunMetadata {
                timestamp: Utc::now().to_rfc3339(),
                fsagg_version: env!("CARGO_PKG_VERSION").to_string(),
                input_file: params.input_file.display().to_string(),
                sheet: params.sheet.to_string(),
                output_file: params.output_file.display().to_string(),
                min_group_size: params.min_group_size,
            },
            rows: params.rows,
            columns: params.columns,
            recode,
            derivation,
            sheets: tables.iter().map(SheetAudit::from).collect(),
        }
    }
}

/// Export the run audit to a JSON file
pub fn export_run_audit(audit: &RunAudit<'_>, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(audit).context("Failed to serialize run audit to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write run audit to {}", output_path.display()))?;

    Ok(())
}
