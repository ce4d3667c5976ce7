//! Sentinel recoding
//!
//! Survey exports encode non-responses as text ("Did not answer") or as
//! reserved numeric codes (0.88). [`recode`] replaces every such cell, in
//! every column, with null or with a normalized number.

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::Serialize;

use super::error::{PipelineError, Result};

/// What a sentinel is replaced with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Replacement {
    Missing,
    Number(f64),
}

/// Ordered sentinel-to-replacement mapping.
#[derive(Debug, Clone, Default)]
pub struct SentinelMap {
    text: Vec<(String, Replacement)>,
    numbers: Vec<(f64, Replacement)>,
}

impl SentinelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text_missing(mut self, key: &str) -> Self {
        self.text.push((key.to_string(), Replacement::Missing));
        self
    }

    pub fn text_number(mut self, key: &str, value: f64) -> Self {
        self.text.push((key.to_string(), Replacement::Number(value)));
        self
    }

    pub fn number_missing(mut self, key: f64) -> Self {
        self.numbers.push((key, Replacement::Missing));
        self
    }

    pub fn number_number(mut self, key: f64, value: f64) -> Self {
        self.numbers.push((key, Replacement::Number(value)));
        self
    }

    pub fn lookup_text(&self, value: &str) -> Option<Replacement> {
        self.text
            .iter()
            .find(|(key, _)| key == value)
            .map(|(_, replacement)| *replacement)
    }

    pub fn lookup_number(&self, value: f64) -> Option<Replacement> {
        self.numbers
            .iter()
            .find(|(key, _)| *key == value)
            .map(|(_, replacement)| *replacement)
    }

    /// Reject maps whose numeric replacements are themselves numeric keys.
    ///
    /// Such a map would recode a cell a second time on a second pass.
    pub fn validate(&self) -> Result<()> {
        let replacements = self
            .text
            .iter()
            .map(|(_, r)| r)
            .chain(self.numbers.iter().map(|(_, r)| r));

        for replacement in replacements {
            if let Replacement::Number(n) = *replacement {
                if self.lookup_number(n).is_some() {
                    return Err(PipelineError::InvalidSentinelMap { replacement: n });
                }
            }
        }
        Ok(())
    }
}

/// Number of cells replaced, per column.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecodeAudit {
    pub replaced_cells: BTreeMap<String, usize>,
}

impl RecodeAudit {
    pub fn total(&self) -> usize {
        self.replaced_cells.values().sum()
    }
}

/// Intermediate cell of a text column while it is being recoded.
enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Null,
}

/// Replace every sentinel cell in `df`.
///
/// Numeric columns are matched against numeric keys; text columns against
/// text keys and, for cells holding a number, numeric keys. A text column in
/// which something was replaced and whose remaining values are all numbers
/// becomes `Float64`. Columns without a replacement are returned untouched,
/// so applying `recode` twice gives the same table as applying it once.
pub fn recode(df: &DataFrame, sentinels: &SentinelMap) -> Result<(DataFrame, RecodeAudit)> {
    sentinels.validate()?;

    let mut audit = RecodeAudit::default();
    let mut columns: Vec<Column> = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        let name = column.name().to_string();
        let dtype = column.dtype().clone();

        let recoded = if dtype.is_primitive_numeric() {
            recode_numeric(column, sentinels)?
        } else if dtype == DataType::String {
            recode_text(column, sentinels)?
        } else {
            None
        };

        match recoded {
            Some((new_column, replaced)) => {
                log::debug!("Recoded {} cell(s) in column '{}'", replaced, name);
                audit.replaced_cells.insert(name, replaced);
                columns.push(new_column);
            }
            None => columns.push(column.clone()),
        }
    }

    log::info!(
        "Recoded {} sentinel cell(s) across {} column(s)",
        audit.total(),
        audit.replaced_cells.len()
    );

    Ok((DataFrame::new(columns)?, audit))
}

fn recode_numeric(column: &Column, sentinels: &SentinelMap) -> Result<Option<(Column, usize)>> {
    let float_col = column.cast(&DataType::Float64)?;
    let values = float_col.f64()?;

    let mut replaced = 0usize;
    let recoded: Float64Chunked = values
        .into_iter()
        .map(|opt| match opt.and_then(|v| sentinels.lookup_number(v)) {
            Some(Replacement::Missing) => {
                replaced += 1;
                None
            }
            Some(Replacement::Number(n)) => {
                replaced += 1;
                Some(n)
            }
            None => opt,
        })
        .collect();

    if replaced == 0 {
        return Ok(None);
    }

    let series = recoded.with_name(column.name().clone()).into_series();
    Ok(Some((series.into(), replaced)))
}

fn recode_text(column: &Column, sentinels: &SentinelMap) -> Result<Option<(Column, usize)>> {
    let values = column.str()?;

    let mut replaced = 0usize;
    let cells: Vec<Cell> = values
        .into_iter()
        .map(|opt| {
            let Some(text) = opt else {
                return Cell::Null;
            };
            let replacement = sentinels.lookup_text(text).or_else(|| {
                text.trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(|n| sentinels.lookup_number(n))
            });
            match replacement {
                Some(Replacement::Missing) => {
                    replaced += 1;
                    Cell::Null
                }
                Some(Replacement::Number(n)) => {
                    replaced += 1;
                    Cell::Number(n)
                }
                None => Cell::Text(text),
            }
        })
        .collect();

    if replaced == 0 {
        return Ok(None);
    }

    let all_numeric = cells.iter().all(|cell| match cell {
        Cell::Text(text) => text.trim().parse::<f64>().is_ok(),
        _ => true,
    });

    let series = if all_numeric {
        let ca: Float64Chunked = cells
            .iter()
            .map(|cell| match cell {
                Cell::Number(n) => Some(*n),
                Cell::Text(text) => text.trim().parse::<f64>().ok(),
                Cell::Null => None,
            })
            .collect();
        ca.with_name(column.name().clone()).into_series()
    } else {
        let ca: StringChunked = cells
            .iter()
            .map(|cell| match cell {
                Cell::Number(n) => Some(n.to_string()),
                Cell::Text(text) => Some(text.to_string()),
                Cell::Null => None,
            })
            .collect();
        ca.with_name(column.name().clone()).into_series()
    };

    Ok(Some((series.into(), replaced)))
}
