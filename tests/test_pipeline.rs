//! Integration tests for the full recode, derive and aggregate pipeline

use fsagg::pipeline::schema::derived;
use fsagg::pipeline::*;
use fsagg::report::{export_run_audit, export_summary_workbook, AuditParams, RunAudit};
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn run(rows: usize) -> (polars::prelude::DataFrame, RecodeAudit, DerivationAudit, Vec<SummaryTable>) {
    let schema = SurveySchema::default();
    let raw = create_survey_dataframe(rows);

    let (mut df, recode_audit) = recode(&raw, &default_sentinels()).unwrap();
    let derivation_audit = derive_all(&mut df, &schema).unwrap();
    let tables = summarize_all(
        &df,
        &schema.groupings(),
        &schema.aggregation_spec(),
        MIN_GROUP_SIZE,
    )
    .unwrap();

    (df, recode_audit, derivation_audit, tables)
}

#[test]
fn test_full_pipeline_produces_every_sheet() {
    let (_, _, _, tables) = run(240);

    let names: Vec<&str> = tables.iter().map(|t| t.sheet_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "no_group",
            "p1_geodivision",
            "p2_mantika",
            "2.0_region_of_origin",
            "2.1_nationality",
            "3_sex",
            "age_cat",
            "5_marital_status",
            "6_edu_level",
        ]
    );

    let all = &tables[0];
    assert_eq!(all.rows.len(), 1);
    assert_eq!(all.rows[0].key, vec![Some("All data".to_string())]);
    assert_eq!(all.rows[0].n, 240);
}

#[test]
fn test_full_pipeline_derived_values() {
    let (df, recode_audit, audit, tables) = run(240);

    assert_has_columns(
        &df,
        &[
            derived::TIME_IN_LOCATION,
            derived::TIME_IN_LOCATION_CAT,
            derived::AGE_CAT,
            "cereals",
            "Poor",
            "Borderline",
            "Acceptable",
            "To save money",
            "Craft_coo",
            "Craft_lib",
            "Employed_coo",
            derived::SAME_JOB,
        ],
    );
    assert_eq!(audit.non_positive_durations, 1);
    assert_eq!(audit.remittances.zero_amounts, 60);
    assert_eq!(audit.remittances.implausible_amounts, 0);
    // Yes, No and "Did not answer" are all sentinels
    assert_eq!(
        recode_audit.replaced_cells.get("i_2_compromise_food_consumpt"),
        Some(&240)
    );

    // FCS cycles 0 / 32 / 112
    let all = &tables[0];
    let key = [Some(derived::NO_GROUP_LABEL)];
    assert_eq!(all.value(&key, derived::FCS, AggFunc::Count), Some(240.0));
    assert_eq!(all.value(&key, derived::FCS, AggFunc::Mean), Some(48.0));
    assert_eq!(all.value(&key, "Poor", AggFunc::Mean), Some(1.0 / 3.0));
    // Remittances cycle 0 / 500 / missing / 1200
    assert_eq!(all.value(&key, derived::REMIT_ANSWERED, AggFunc::Mean), Some(0.75));
    assert_eq!(all.value(&key, derived::MONEY_SENT, AggFunc::Mean), Some(2.0 / 3.0));
    assert_eq!(all.value(&key, derived::REMIT_AMOUNT_POS, AggFunc::Count), Some(120.0));
    assert_eq!(all.value(&key, derived::REMIT_AMOUNT_POS, AggFunc::Median), Some(850.0));
    assert_eq!(
        all.value(&key, "i_2_compromise_food_consumpt", AggFunc::Count),
        Some(192.0)
    );
}

#[test]
fn test_small_groups_suppressed_in_composite_sheet() {
    // 60 rows over 3 x 2 geodivision/mantika cells gives 10 per cell
    let (_, _, _, tables) = run(60);

    let mantika = tables.iter().find(|t| t.sheet_name == "p2_mantika").unwrap();
    assert!(mantika.rows.is_empty());
    assert_eq!(mantika.suppressed_groups, 6);
    assert_eq!(mantika.suppressed_rows, 60);

    let sex = tables.iter().find(|t| t.sheet_name == "3_sex").unwrap();
    let kept: Vec<Option<String>> = sex.rows.iter().map(|r| r.key[0].clone()).collect();
    assert_eq!(kept, vec![Some("Male".to_string())]);
}

#[test]
fn test_pipeline_exports_workbook_and_audit() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("summary.xlsx");
    let audit_path = temp_dir.path().join("audit.json");
    let (df, recode_audit, derivation_audit, tables) = run(120);

    export_summary_workbook(&tables, &output).unwrap();
    let audit = RunAudit::new(
        &AuditParams {
            input_file: temp_dir.path(),
            sheet: SURVEY_SHEET,
            output_file: &output,
            min_group_size: MIN_GROUP_SIZE,
            rows: df.height(),
            columns: df.width(),
        },
        &recode_audit,
        &derivation_audit,
        &tables,
    );
    export_run_audit(&audit, &audit_path).unwrap();

    assert!(output.exists());
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&audit_path).unwrap()).unwrap();
    assert_eq!(json["metadata"]["sheet"], SURVEY_SHEET);
    assert_eq!(json["sheets"].as_array().unwrap().len(), 9);
    assert_eq!(json["derivation"]["non_positive_durations"], 1);
    assert_eq!(json["sheets"][0]["groups_kept"], 1);
}

#[test]
fn test_missing_schema_column_aborts_derivation() {
    let schema = SurveySchema {
        age: "age_years".to_string(),
        ..SurveySchema::default()
    };
    let (mut df, _) = recode(&create_survey_dataframe(40), &default_sentinels()).unwrap();

    let result = derive_all(&mut df, &schema);

    assert!(matches!(
        result,
        Err(PipelineError::MissingColumn { ref column, .. }) if column == "age_years"
    ));
}

#[test]
fn test_category_shared_by_status_and_occupation_is_merged() {
    let schema = SurveySchema::default();
    let mut raw = create_survey_dataframe(60);
    let mut status = text_values(&raw, "7_employ_status_before");
    status[5] = Some("Other".to_string());
    raw.with_column(polars::prelude::Column::new(
        "7_employ_status_before".into(),
        status,
    ))
    .unwrap();

    let (mut df, _) = recode(&raw, &default_sentinels()).unwrap();
    let audit = derive_all(&mut df, &schema).unwrap();

    assert_eq!(audit.dummy_collisions.len(), 1);
    assert_eq!(audit.dummy_collisions[0].column, "Other_coo");
    assert_eq!(audit.dummy_collisions[0].source, "7.1.1_occupation_coo");
    assert_eq!(
        audit.dummy_collisions[0].resolution,
        CollisionResolution::Merged
    );
    assert_eq!(
        audit.derived_columns.iter().filter(|c| *c == "Other_coo").count(),
        1
    );

    // Row 3 answered "Other" for occupation, row 5 for employment status
    let other: Vec<Option<bool>> = df
        .column("Other_coo")
        .unwrap()
        .bool()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(&other[..6], &[Some(false), Some(false), Some(false), Some(true), Some(false), Some(true)]);
}
