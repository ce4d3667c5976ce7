//! Food Consumption Score (FCS) and Food Consumption Groups (FCG)
//!
//! The FCS is a weighted sum of how many days in the past week each of eight
//! food groups was eaten. With 0-7 day frequencies it ranges from 0 to 112.
//! The FCG buckets the score with two thresholds.

use std::fmt;

use polars::prelude::*;

use super::error::{PipelineError, Result};

/// Categorical grouping of the Food Consumption Score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodConsumptionGroup {
    Poor,
    Borderline,
    Acceptable,
}

impl FoodConsumptionGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoodConsumptionGroup::Poor => "Poor",
            FoodConsumptionGroup::Borderline => "Borderline",
            FoodConsumptionGroup::Acceptable => "Acceptable",
        }
    }
}

impl fmt::Display for FoodConsumptionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Upper bounds of the Poor and Borderline groups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FcgThresholds {
    pub poor_max: f64,
    pub borderline_max: f64,
}

/// Classify a score: `<= poor_max` is Poor, `<= borderline_max` Borderline,
/// anything higher Acceptable. Missing or non-finite scores have no group.
pub fn classify_fcs(score: Option<f64>, thresholds: FcgThresholds) -> Option<FoodConsumptionGroup> {
    let score = score.filter(|s| s.is_finite())?;
    Some(if score <= thresholds.poor_max {
        FoodConsumptionGroup::Poor
    } else if score <= thresholds.borderline_max {
        FoodConsumptionGroup::Borderline
    } else {
        FoodConsumptionGroup::Acceptable
    })
}

/// Weighted sum of one row's frequencies; any missing input gives `None`.
pub fn weighted_score(values: &[Option<f64>], weights: &[f64]) -> Option<f64> {
    values
        .iter()
        .zip(weights)
        .try_fold(0.0, |acc, (value, weight)| {
            value.filter(|v| v.is_finite()).map(|v| acc + v * weight)
        })
}

/// Add `target` holding the weighted score of `components`.
///
/// Non-numeric cells count as missing, and a missing component makes the
/// whole row's score missing.
pub fn food_consumption_score(
    df: &mut DataFrame,
    components: &[(&str, f64)],
    target: &str,
) -> Result<usize> {
    let mut columns: Vec<Vec<Option<f64>>> = Vec::with_capacity(components.len());
    for (name, _) in components {
        let column = df
            .column(name)
            .map_err(|_| PipelineError::missing_column(name, "food consumption score"))?;
        let float_col = column.cast(&DataType::Float64)?;
        columns.push(float_col.f64()?.into_iter().collect());
    }
    let weights: Vec<f64> = components.iter().map(|(_, w)| *w).collect();

    let mut row = vec![None; components.len()];
    let scores: Float64Chunked = (0..df.height())
        .map(|i| {
            for (slot, column) in row.iter_mut().zip(&columns) {
                *slot = column[i];
            }
            weighted_score(&row, &weights)
        })
        .collect();

    let missing = scores.null_count();
    log::info!(
        "Computed '{}' for {} row(s); {} row(s) missing a food group",
        target,
        scores.len() - missing,
        missing
    );

    df.with_column(scores.with_name(target.into()).into_series())?;
    Ok(missing)
}

/// Add `target` holding the food consumption group of `score`.
pub fn food_consumption_groups(
    df: &mut DataFrame,
    score: &str,
    target: &str,
    thresholds: FcgThresholds,
) -> Result<()> {
    let column = df
        .column(score)
        .map_err(|_| PipelineError::missing_column(score, "food consumption groups"))?;
    let float_col = column.cast(&DataType::Float64)?;

    let groups: StringChunked = float_col
        .f64()?
        .into_iter()
        .map(|s| classify_fcs(s, thresholds).map(|g| g.as_str()))
        .collect();

    df.with_column(groups.with_name(target.into()).into_series())?;
    Ok(())
}

/// Rename raw food-frequency columns to their logical food-group names.
pub fn rename_food_columns(df: &mut DataFrame, renames: &[(&str, &str)]) -> Result<()> {
    for (raw, logical) in renames {
        if raw == logical {
            continue;
        }
        if df.get_column_index(raw).is_none() {
            return Err(PipelineError::missing_column(raw, "food group renaming"));
        }
        if df.get_column_index(logical).is_some() {
            return Err(PipelineError::DuplicateColumn {
                column: logical.to_string(),
                context: "food group renaming".to_string(),
            });
        }
        df.rename(raw, (*logical).into())?;
    }
    Ok(())
}
