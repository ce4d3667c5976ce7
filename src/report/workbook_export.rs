//! Summary workbook export
//!
//! One worksheet per [`SummaryTable`]. Each sheet has a two-row header: the
//! first row names the key columns, each statistic's source column and `n`;
//! the second row names the statistic. Group rows start on the third row.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::pipeline::SummaryTable;

/// Longest sheet name a workbook accepts.
const MAX_SHEET_NAME_LEN: usize = 31;
const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Make `name` acceptable as a worksheet name.
///
/// Forbidden characters become `_`, leading and trailing apostrophes are
/// stripped and the result is cut to 31 characters.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let trimmed: String = cleaned
        .trim_matches('\'')
        .chars()
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    if trimmed.is_empty() {
        "Sheet".to_string()
    } else {
        trimmed
    }
}

/// Sanitized, workbook-unique sheet names for `tables`, in order.
///
/// Sheet names compare case-insensitively, so a repeated name gets a
/// ` (2)`, ` (3)`, ... suffix.
pub fn unique_sheet_names(tables: &[SummaryTable]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    tables
        .iter()
        .map(|table| {
            let base = sanitize_sheet_name(&table.sheet_name);
            let mut candidate = base.clone();
            let mut counter = 2;
            while used.contains(&candidate.to_lowercase()) {
                let suffix = format!(" ({counter})");
                let keep = MAX_SHEET_NAME_LEN - suffix.chars().count();
                candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
                counter += 1;
            }
            if candidate != table.sheet_name {
                log::warn!(
                    "Sheet '{}' written as '{}' to satisfy workbook naming rules",
                    table.sheet_name,
                    candidate
                );
            }
            used.insert(candidate.to_lowercase());
            candidate
        })
        .collect()
}

fn write_table(sheet: &mut Worksheet, table: &SummaryTable, header: &Format) -> Result<()> {
    let key_width = table.key_columns.len() as u16;

    for (col, name) in table.key_columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, header)?;
    }
    for (offset, stat) in table.stats.iter().enumerate() {
        let col = key_width + offset as u16;
        sheet.write_string_with_format(0, col, &stat.column, header)?;
        sheet.write_string_with_format(1, col, stat.func.as_str(), header)?;
    }
    let n_col = key_width + table.stats.len() as u16;
    sheet.write_string_with_format(0, n_col, "n", header)?;

    for (offset, group) in table.rows.iter().enumerate() {
        let row = 2 + offset as u32;
        for (col, key) in group.key.iter().enumerate() {
            if let Some(key) = key {
                sheet.write_string(row, col as u16, key)?;
            }
        }
        for (offset, value) in group.values.iter().enumerate() {
            if let Some(value) = value {
                sheet.write_number(row, key_width + offset as u16, *value)?;
            }
        }
        sheet.write_number(row, n_col, group.n as f64)?;
    }

    sheet.set_freeze_panes(2, key_width)?;
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Save next to `output_path` and rename into place. The staging file is
/// removed when either step fails.
fn save_atomically(workbook: &mut Workbook, output_path: &Path) -> Result<()> {
    let staging = staging_path(output_path);
    if let Err(e) = workbook.save(&staging) {
        let _ = std::fs::remove_file(&staging);
        return Err(e).with_context(|| format!("Failed to write workbook: {}", staging.display()));
    }
    if let Err(e) = std::fs::rename(&staging, output_path) {
        let _ = std::fs::remove_file(&staging);
        return Err(e).with_context(|| {
            format!("Failed to move workbook into place: {}", output_path.display())
        });
    }
    Ok(())
}

/// Write every table to `output_path` as one workbook.
///
/// The workbook is saved next to the destination first and renamed into
/// place, so a failed run leaves no partial file at `output_path`.
pub fn export_summary_workbook(tables: &[SummaryTable], output_path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    for (table, name) in tables.iter().zip(unique_sheet_names(tables)) {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(&name)
            .with_context(|| format!("Invalid worksheet name '{}'", name))?;
        write_table(sheet, table, &header)
            .with_context(|| format!("Failed to write worksheet '{}'", name))?;
    }

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    save_atomically(&mut workbook, output_path)?;

    log::info!(
        "Wrote {} sheet(s) to {}",
        tables.len(),
        output_path.display()
    );
    Ok(())
}
