//! Derivation engine - runs every derived-variable step in order

use polars::prelude::*;
use serde::Serialize;

use super::bucket::bucketize;
use super::dummies::{cat_to_dummies, DummyCollision, DummyColumns};
use super::error::{PipelineError, Result};
use super::fcs::{food_consumption_groups, food_consumption_score, rename_food_columns, FcgThresholds};
use super::livelihood::same_value_flag;
use super::remittance::{remittance_flags, RemittanceAudit, RemittanceColumns};
use super::schema::{
    derived, SurveySchema, AGE_BUCKETS, DAYS_PER_MONTH, DURATION_BUCKETS, FCS_BORDERLINE_MAX,
    FCS_POOR_MAX, FOOD_GROUPS, REMITTANCE_MAX,
};
use super::temporal::{coerce_date, elapsed_days, months_from_days};

/// Data-quality exclusions made while deriving, kept for auditability.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DerivationAudit {
    /// Date cells that could not be parsed, per column
    pub unparseable_dates: Vec<(String, usize)>,
    /// Rows whose arrival date is on or after the assessment date
    pub non_positive_durations: usize,
    /// Rows with at least one missing food group
    pub missing_fcs: usize,
    pub remittances: RemittanceAudit,
    /// Dummy names that were already taken when produced
    pub dummy_collisions: Vec<DummyCollision>,
    /// Every column added by the engine, in creation order
    pub derived_columns: Vec<String>,
}

impl DerivationAudit {
    fn record_dummies(&mut self, dummies: DummyColumns) {
        self.derived_columns.extend(dummies.added);
        self.dummy_collisions.extend(dummies.collisions);
    }
}

/// Add a column holding the same text in every row.
pub fn add_constant_column(df: &mut DataFrame, name: &str, value: &str) -> Result<()> {
    if df.get_column_index(name).is_some() {
        return Err(PipelineError::DuplicateColumn {
            column: name.to_string(),
            context: "constant column".to_string(),
        });
    }
    let column = Column::new(name.into(), vec![value; df.height()]);
    df.with_column(column)?;
    Ok(())
}

/// Run every derivation on an already recoded table.
pub fn derive_all(df: &mut DataFrame, schema: &SurveySchema) -> Result<DerivationAudit> {
    let mut audit = DerivationAudit::default();

    // Time in location
    for column in [&schema.arrival_date, &schema.assessment_date] {
        let failed = coerce_date(df, column)?;
        audit.unparseable_dates.push((column.clone(), failed));
    }
    audit.non_positive_durations = elapsed_days(
        df,
        &schema.arrival_date,
        &schema.assessment_date,
        derived::TIME_IN_LOCATION,
    )?;
    months_from_days(
        df,
        derived::TIME_IN_LOCATION,
        derived::MONTHS_IN_LOCATION,
        DAYS_PER_MONTH,
    )?;
    bucketize(
        df,
        derived::TIME_IN_LOCATION,
        derived::TIME_IN_LOCATION_CAT,
        &DURATION_BUCKETS,
    )?;
    audit.derived_columns.extend(
        [
            derived::TIME_IN_LOCATION,
            derived::MONTHS_IN_LOCATION,
            derived::TIME_IN_LOCATION_CAT,
        ]
        .map(String::from),
    );

    // Age
    bucketize(df, &schema.age, derived::AGE_CAT, &AGE_BUCKETS)?;
    audit.derived_columns.push(derived::AGE_CAT.to_string());

    // Food consumption
    rename_food_columns(df, &schema.food_columns())?;
    audit.missing_fcs = food_consumption_score(df, &FOOD_GROUPS, derived::FCS)?;
    food_consumption_groups(
        df,
        derived::FCS,
        derived::FCG,
        FcgThresholds {
            poor_max: FCS_POOR_MAX,
            borderline_max: FCS_BORDERLINE_MAX,
        },
    )?;
    audit
        .derived_columns
        .extend([derived::FCS, derived::FCG].map(String::from));
    audit.record_dummies(cat_to_dummies(df, derived::FCG, None)?);

    // Remittances
    audit.remittances = remittance_flags(
        df,
        &schema.remit_amount_sent,
        derived::MONTHS_IN_LOCATION,
        REMITTANCE_MAX,
        RemittanceColumns {
            answered: derived::REMIT_ANSWERED,
            money_sent: derived::MONEY_SENT,
            amount_positive: derived::REMIT_AMOUNT_POS,
            amount_per_month: derived::REMIT_AMOUNT_POS_PER_MONTH,
        },
    )?;
    audit.derived_columns.extend(
        [
            derived::REMIT_ANSWERED,
            derived::MONEY_SENT,
            derived::REMIT_AMOUNT_POS,
            derived::REMIT_AMOUNT_POS_PER_MONTH,
        ]
        .map(String::from),
    );

    // Coping
    audit.record_dummies(cat_to_dummies(df, &schema.compromise_food_why, None)?);

    // Livelihood
    for (column, suffix) in [
        (&schema.employment_origin, derived::ORIGIN_SUFFIX),
        (&schema.occupation_origin, derived::ORIGIN_SUFFIX),
        (&schema.employment_host, derived::HOST_SUFFIX),
        (&schema.occupation_host, derived::HOST_SUFFIX),
    ] {
        audit.record_dummies(cat_to_dummies(df, column, Some(suffix))?);
    }
    same_value_flag(
        df,
        &schema.occupation_origin,
        &schema.occupation_host,
        derived::SAME_JOB,
    )?;
    audit.derived_columns.push(derived::SAME_JOB.to_string());

    add_constant_column(df, derived::NO_GROUP, derived::NO_GROUP_LABEL)?;
    audit.derived_columns.push(derived::NO_GROUP.to_string());

    log::info!(
        "Derived {} column(s); table is now {} x {}",
        audit.derived_columns.len(),
        df.height(),
        df.width()
    );

    Ok(audit)
}
