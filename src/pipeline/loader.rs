//! Dataset loader for spreadsheet, CSV and Parquet files
//!
//! Spreadsheets are read through calamine. Cells are collected per column
//! as [`CellValue`]s and each column is typed from what it holds: all
//! numbers become `Float64`, all dates `Date`, anything mixed `String`.

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDate;
use polars::prelude::*;

use super::error::{PipelineError, Result};
use super::temporal::{days_since_epoch, parse_date};
use crate::utils::create_spinner;

/// Excel serial number of 1970-01-01.
const EXCEL_UNIX_EPOCH: f64 = 25_569.0;

/// A single cell read from a worksheet.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    /// Days since 1970-01-01
    Date(i32),
    Text(String),
    Null,
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Number(if *b { 1.0 } else { 0.0 }),
            Data::String(s) => CellValue::Text(s.clone()),
            Data::DateTime(dt) => {
                CellValue::Date((dt.as_f64() - EXCEL_UNIX_EPOCH).floor() as i32)
            }
            Data::DateTimeIso(s) => match parse_date(s) {
                Some(date) => CellValue::Date(days_since_epoch(date)),
                None => CellValue::Text(s.clone()),
            },
            Data::DurationIso(s) => CellValue::Text(s.clone()),
            _ => CellValue::Null,
        }
    }
}

/// Column dtype chosen from the cells it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Date,
    Text,
}

/// Pick the dtype for a column of cells; an all-null column is numeric.
pub fn infer_column_kind(cells: &[CellValue]) -> ColumnKind {
    let mut numbers = false;
    let mut dates = false;
    for cell in cells {
        match cell {
            CellValue::Text(_) => return ColumnKind::Text,
            CellValue::Number(_) => numbers = true,
            CellValue::Date(_) => dates = true,
            CellValue::Null => {}
        }
    }
    match (numbers, dates) {
        (true, true) => ColumnKind::Text,
        (false, true) => ColumnKind::Date,
        _ => ColumnKind::Numeric,
    }
}

fn render_date(days: i32) -> String {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(i64::from(days))))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Build a typed Series from one column of cells.
pub fn build_series_from_cells(name: &str, cells: &[CellValue]) -> Result<Series> {
    let series = match infer_column_kind(cells) {
        ColumnKind::Numeric => {
            let ca: Float64Chunked = cells
                .iter()
                .map(|c| match c {
                    CellValue::Number(n) => Some(*n),
                    _ => None,
                })
                .collect();
            ca.with_name(name.into()).into_series()
        }
        ColumnKind::Date => {
            let ca: Int32Chunked = cells
                .iter()
                .map(|c| match c {
                    CellValue::Date(d) => Some(*d),
                    _ => None,
                })
                .collect();
            ca.with_name(name.into())
                .into_series()
                .cast(&DataType::Date)?
        }
        ColumnKind::Text => {
            let ca: StringChunked = cells
                .iter()
                .map(|c| match c {
                    CellValue::Number(n) => Some(n.to_string()),
                    CellValue::Date(d) => Some(render_date(*d)),
                    CellValue::Text(s) => Some(s.clone()),
                    CellValue::Null => None,
                })
                .collect();
            ca.with_name(name.into()).into_series()
        }
    };
    Ok(series)
}

/// Header names with blanks filled in and duplicates made unique.
pub fn normalize_headers(raw: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.iter()
        .enumerate()
        .map(|(idx, name)| {
            let base = if name.trim().is_empty() {
                format!("Unnamed: {idx}")
            } else {
                name.clone()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let unique = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            unique
        })
        .collect()
}

/// Read one worksheet into a DataFrame. The first row holds column names.
pub fn load_worksheet(path: &Path, sheet: &str) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path)?;

    let available = workbook.sheet_names().to_vec();
    if !available.iter().any(|name| name == sheet) {
        return Err(PipelineError::SheetNotFound {
            sheet: sheet.to_string(),
            path: path.to_path_buf(),
            available,
        });
    }

    let range = workbook.worksheet_range(sheet)?;
    let mut rows = range.rows();

    let Some(header_row) = rows.next() else {
        return Ok(DataFrame::empty());
    };
    let headers = normalize_headers(
        &header_row
            .iter()
            .map(|cell| match cell {
                Data::Empty => String::new(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>(),
    );

    let mut cells: Vec<Vec<CellValue>> = vec![Vec::with_capacity(range.height()); headers.len()];
    for row in rows {
        for (idx, column) in cells.iter_mut().enumerate() {
            column.push(row.get(idx).map(CellValue::from).unwrap_or(CellValue::Null));
        }
    }

    let columns = headers
        .iter()
        .zip(&cells)
        .map(|(name, values)| build_series_from_cells(name, values).map(Column::from))
        .collect::<Result<Vec<_>>>()?;

    Ok(DataFrame::new(columns)?)
}

/// Load a dataset from a file, choosing the reader from the extension.
///
/// `sheet` is only used for spreadsheet formats.
pub fn load_dataset(path: &Path, sheet: &str) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PipelineError::SourceNotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let df = match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_worksheet(path, sheet)?,
        "csv" => LazyCsvReader::new(path)
            .with_try_parse_dates(true)
            .finish()?
            .collect()?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())?.collect()?,
        _ => return Err(PipelineError::UnsupportedFormat { extension }),
    };

    Ok(df)
}

/// Load a dataset behind a spinner, returning `(df, rows, cols, memory_mb)`.
pub fn load_dataset_with_progress(
    path: &Path,
    sheet: &str,
) -> Result<(DataFrame, usize, usize, f64)> {
    let spinner = create_spinner(&format!("Reading {}...", path.display()));
    let result = load_dataset(path, sheet);
    spinner.finish_and_clear();

    let df = result?;
    let (rows, cols) = df.shape();
    let memory_mb = df.estimated_size() as f64 / (1024.0 * 1024.0);
    log::info!(
        "Loaded {} row(s) x {} column(s) from {}",
        rows,
        cols,
        path.display()
    );

    Ok((df, rows, cols, memory_mb))
}
