//! One-hot (dummy) expansion of categorical columns
//!
//! A row with no recorded answer must not look like it "chose none of the
//! categories". Expansion therefore runs in two steps:
//!
//! 1. [`expand_with_missing_indicator`] builds one boolean column per observed
//!    category plus an indicator that is true where the source is missing.
//! 2. [`propagate_missing`] nulls every category column where the indicator is
//!    true and discards the indicator.

use std::collections::BTreeSet;

use polars::prelude::*;
use serde::Serialize;

use super::error::{PipelineError, Result};

/// Category columns of one expansion, before missing propagation.
#[derive(Debug, Clone, PartialEq)]
pub struct DummyExpansion {
    /// One `(category, values)` pair per observed category, sorted by category
    pub categories: Vec<(String, Vec<Option<bool>>)>,
    /// True where the source value is missing
    pub missing: Vec<bool>,
}

/// Step 1: expand `values` into per-category booleans plus a missing indicator.
pub fn expand_with_missing_indicator(values: &[Option<&str>]) -> DummyExpansion {
    let observed: BTreeSet<&str> = values.iter().flatten().copied().collect();

    let categories = observed
        .into_iter()
        .map(|category| {
            let column = values
                .iter()
                .map(|v| Some(*v == Some(category)))
                .collect();
            (category.to_string(), column)
        })
        .collect();

    DummyExpansion {
        categories,
        missing: values.iter().map(|v| v.is_none()).collect(),
    }
}

/// Step 2: null every category where the source was missing, then drop the
/// indicator.
pub fn propagate_missing(expansion: DummyExpansion) -> Vec<(String, Vec<Option<bool>>)> {
    let DummyExpansion {
        categories,
        missing,
    } = expansion;

    categories
        .into_iter()
        .map(|(category, values)| {
            let masked = values
                .into_iter()
                .zip(&missing)
                .map(|(value, &is_missing)| if is_missing { None } else { value })
                .collect();
            (category, masked)
        })
        .collect()
}

/// How a produced dummy name that was already taken got resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionResolution {
    /// OR-ed into the existing boolean column
    Merged,
    /// Written under a new name because the existing column is not boolean
    Renamed(String),
}

/// A produced dummy name that already existed in the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DummyCollision {
    pub column: String,
    /// Column being expanded when the collision happened
    pub source: String,
    pub resolution: CollisionResolution,
}

/// Result of one [`cat_to_dummies`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DummyColumns {
    /// Names of the columns appended to the table
    pub added: Vec<String>,
    pub collisions: Vec<DummyCollision>,
}

/// Three-valued OR: true wins over missing, missing wins over false.
fn kleene_or(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

fn free_name(df: &DataFrame, pending: &[String], name: &str) -> String {
    (1..)
        .map(|n| format!("{name}.{n}"))
        .find(|candidate| df.get_column_index(candidate).is_none() && !pending.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}

/// Append one boolean column per observed category of `column`.
///
/// Produced columns are named after the category, followed by `suffix` when
/// one is given. Two expansions sharing a suffix can produce the same name
/// (an "Other" employment status and an "Other" occupation). When the
/// existing column is boolean the new values are OR-ed into it; otherwise the
/// new column gets a `.1`, `.2`, ... suffix. Either way a warning is logged
/// and the collision is reported.
pub fn cat_to_dummies(
    df: &mut DataFrame,
    column: &str,
    suffix: Option<&str>,
) -> Result<DummyColumns> {
    let source = df
        .column(column)
        .map_err(|_| PipelineError::missing_column(column, "dummy expansion"))?;
    let text_col = source.cast(&DataType::String)?;
    let values: Vec<Option<&str>> = text_col.str()?.into_iter().collect();

    let expansion = expand_with_missing_indicator(&values);
    let missing_rows = expansion.missing.iter().filter(|&&m| m).count();
    let dummies = propagate_missing(expansion);

    let mut new_columns: Vec<Column> = Vec::with_capacity(dummies.len());
    let mut result = DummyColumns::default();
    for (category, values) in dummies {
        let name = match suffix {
            Some(suffix) => format!("{category}{suffix}"),
            None => category,
        };

        let existing_is_bool = df
            .column(&name)
            .ok()
            .map(|existing| existing.dtype() == &DataType::Boolean);
        match existing_is_bool {
            None => {
                new_columns.push(Column::new(name.as_str().into(), values));
                result.added.push(name);
            }
            Some(true) => {
                let merged: Vec<Option<bool>> = df
                    .column(&name)?
                    .bool()?
                    .into_iter()
                    .zip(values)
                    .map(|(a, b)| kleene_or(a, b))
                    .collect();
                df.with_column(Column::new(name.as_str().into(), merged))?;
                log::warn!(
                    "Dummy column '{}' from '{}' already exists; merged into it",
                    name,
                    column
                );
                result.collisions.push(DummyCollision {
                    column: name,
                    source: column.to_string(),
                    resolution: CollisionResolution::Merged,
                });
            }
            Some(false) => {
                let renamed = free_name(df, &result.added, &name);
                log::warn!(
                    "Dummy column '{}' from '{}' clashes with an existing column; written as '{}'",
                    name,
                    column,
                    renamed
                );
                new_columns.push(Column::new(renamed.as_str().into(), values));
                result.added.push(renamed.clone());
                result.collisions.push(DummyCollision {
                    column: name,
                    source: column.to_string(),
                    resolution: CollisionResolution::Renamed(renamed),
                });
            }
        }
    }

    log::debug!(
        "Expanded '{}' into {} dummy column(s); {} missing row(s) propagated",
        column,
        result.added.len() + result.collisions.len(),
        missing_rows
    );

    df.hstack_mut(&new_columns)?;
    Ok(result)
}
