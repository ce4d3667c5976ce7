//! Livelihood transition flags

use polars::prelude::*;

use super::error::{PipelineError, Result};

/// Equality that is undefined, not false, when either side is missing.
pub fn missing_safe_eq(left: Option<&str>, right: Option<&str>) -> Option<bool> {
    Some(left? == right?)
}

/// Add `target` = 1 where `left` equals `right`, 0 where they differ, null
/// where either is missing.
///
/// Both columns are compared as text.
pub fn same_value_flag(df: &mut DataFrame, left: &str, right: &str, target: &str) -> Result<()> {
    let left_col = text_column(df, left)?;
    let right_col = text_column(df, right)?;

    let flag: Float64Chunked = left_col
        .str()?
        .into_iter()
        .zip(right_col.str()?)
        .map(|(l, r)| missing_safe_eq(l, r).map(|same| if same { 1.0 } else { 0.0 }))
        .collect();

    log::debug!(
        "Flagged '{}' for {} row(s) with both '{}' and '{}' present",
        target,
        flag.len() - flag.null_count(),
        left,
        right
    );

    df.with_column(flag.with_name(target.into()).into_series())?;
    Ok(())
}

fn text_column(df: &DataFrame, column: &str) -> Result<Column> {
    let col = df
        .column(column)
        .map_err(|_| PipelineError::missing_column(column, "livelihood transition flag"))?;
    Ok(col.cast(&DataType::String)?)
}
