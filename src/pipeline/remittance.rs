//! Remittance behaviour flags
//!
//! Built from the "how much have you sent home since leaving" answer:
//! whether the question was answered, whether any money was sent, the amount
//! among senders only, and that amount spread over the months in location.

use polars::prelude::*;
use serde::Serialize;

use super::error::{PipelineError, Result};

/// Output column names of [`remittance_flags`].
#[derive(Debug, Clone, Copy)]
pub struct RemittanceColumns<'a> {
    pub answered: &'a str,
    pub money_sent: &'a str,
    pub amount_positive: &'a str,
    pub amount_per_month: &'a str,
}

/// Rows excluded from the amount-based fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemittanceAudit {
    /// Respondents who answered zero; kept as non-senders, excluded from the
    /// amount among senders
    pub zero_amounts: usize,
    /// Negative amounts or amounts at or above the plausibility bound
    pub implausible_amounts: usize,
}

/// Per-row remittance values derived from one raw amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemittanceRow {
    pub answered: f64,
    pub money_sent: Option<f64>,
    pub amount_positive: Option<f64>,
}

/// Classify one raw amount against the exclusive upper bound `max_amount`.
pub fn classify_remittance(amount: Option<f64>, max_amount: f64) -> RemittanceRow {
    let answered = if amount.is_some() { 1.0 } else { 0.0 };
    let plausible = amount.filter(|a| *a > 0.0 && *a < max_amount);

    let money_sent = match amount {
        Some(a) if a == 0.0 => Some(0.0),
        _ if plausible.is_some() => Some(1.0),
        _ => None,
    };

    RemittanceRow {
        answered,
        money_sent,
        amount_positive: plausible,
    }
}

/// `numerator / denominator`, or `None` when either side is missing, the
/// denominator is zero, or the result is not finite.
pub fn safe_ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let denominator = denominator.filter(|d| *d != 0.0)?;
    Some(numerator? / denominator).filter(|r| r.is_finite())
}

/// Add the answered / sent / positive-amount / per-month columns.
///
/// `amount` is the raw amount column, `months` the months-in-location column
/// used as the per-month denominator.
pub fn remittance_flags(
    df: &mut DataFrame,
    amount: &str,
    months: &str,
    max_amount: f64,
    targets: RemittanceColumns<'_>,
) -> Result<RemittanceAudit> {
    let amounts = float_values(df, amount, "remittance flags")?;
    let months_values = float_values(df, months, "remittance per month")?;

    let mut audit = RemittanceAudit::default();
    let rows: Vec<RemittanceRow> = amounts
        .iter()
        .map(|&a| {
            match a {
                Some(v) if v == 0.0 => audit.zero_amounts += 1,
                Some(v) if !(v > 0.0 && v < max_amount) => audit.implausible_amounts += 1,
                _ => {}
            }
            classify_remittance(a, max_amount)
        })
        .collect();

    let answered: Float64Chunked = rows.iter().map(|r| Some(r.answered)).collect();
    let money_sent: Float64Chunked = rows.iter().map(|r| r.money_sent).collect();
    let positive: Float64Chunked = rows.iter().map(|r| r.amount_positive).collect();
    let per_month: Float64Chunked = rows
        .iter()
        .zip(&months_values)
        .map(|(r, m)| safe_ratio(r.amount_positive, *m))
        .collect();

    log::info!(
        "Remittances: {} zero amount(s) excluded from the sender median, {} implausible amount(s) set to missing",
        audit.zero_amounts,
        audit.implausible_amounts
    );

    df.hstack_mut(&[
        answered.with_name(targets.answered.into()).into_series().into(),
        money_sent.with_name(targets.money_sent.into()).into_series().into(),
        positive.with_name(targets.amount_positive.into()).into_series().into(),
        per_month.with_name(targets.amount_per_month.into()).into_series().into(),
    ])?;

    Ok(audit)
}

fn float_values(df: &DataFrame, column: &str, context: &str) -> Result<Vec<Option<f64>>> {
    let col = df
        .column(column)
        .map_err(|_| PipelineError::missing_column(column, context))?;
    let float_col = col.cast(&DataType::Float64)?;
    Ok(float_col.f64()?.into_iter().collect())
}
