//! Tests for the Food Consumption Score and groups

use fsagg::pipeline::fcs::{
    food_consumption_groups, food_consumption_score, rename_food_columns, weighted_score,
};
use fsagg::pipeline::schema::{FCS_BORDERLINE_MAX, FCS_POOR_MAX, FOOD_GROUPS};
use fsagg::pipeline::{classify_fcs, FcgThresholds, FoodConsumptionGroup, PipelineError};
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

const THRESHOLDS: FcgThresholds = FcgThresholds {
    poor_max: FCS_POOR_MAX,
    borderline_max: FCS_BORDERLINE_MAX,
};

fn food_frame(rows: &[[Option<f64>; 8]]) -> DataFrame {
    let columns: Vec<Column> = FOOD_GROUPS
        .iter()
        .enumerate()
        .map(|(idx, (name, _))| {
            let values: Vec<Option<f64>> = rows.iter().map(|row| row[idx]).collect();
            Column::new((*name).into(), values)
        })
        .collect();
    DataFrame::new(columns).unwrap()
}

#[test]
fn test_reference_row_scores_poor() {
    // 3*2 + 2*3 + 4*1 + 1*1 + 0*4 + 1*4 + 2*0.5 + 3*0.5
    let mut df = food_frame(&[[
        Some(3.0),
        Some(2.0),
        Some(4.0),
        Some(1.0),
        Some(0.0),
        Some(1.0),
        Some(2.0),
        Some(3.0),
    ]]);

    let missing = food_consumption_score(&mut df, &FOOD_GROUPS, "FCS").unwrap();
    food_consumption_groups(&mut df, "FCS", "FCG", THRESHOLDS).unwrap();

    assert_eq!(missing, 0);
    assert_eq!(float_values(&df, "FCS"), vec![Some(23.5)]);
    assert_eq!(text_values(&df, "FCG"), vec![Some("Poor".to_string())]);
}

#[test]
fn test_missing_food_group_makes_score_missing() {
    let mut df = food_frame(&[
        [Some(7.0), None, Some(3.0), Some(0.0), Some(1.0), Some(0.0), Some(5.0), Some(0.0)],
        [Some(7.0); 8],
    ]);

    let missing = food_consumption_score(&mut df, &FOOD_GROUPS, "FCS").unwrap();
    food_consumption_groups(&mut df, "FCS", "FCG", THRESHOLDS).unwrap();

    assert_eq!(missing, 1);
    assert_eq!(float_values(&df, "FCS"), vec![None, Some(112.0)]);
    assert_eq!(
        text_values(&df, "FCG"),
        vec![None, Some("Acceptable".to_string())]
    );
}

#[test]
fn test_group_boundaries() {
    let cases = [
        (28.0, FoodConsumptionGroup::Poor),
        (28.01, FoodConsumptionGroup::Borderline),
        (42.0, FoodConsumptionGroup::Borderline),
        (42.01, FoodConsumptionGroup::Acceptable),
        (0.0, FoodConsumptionGroup::Poor),
    ];
    for (score, expected) in cases {
        assert_eq!(
            classify_fcs(Some(score), THRESHOLDS),
            Some(expected),
            "FCS {} should be {}",
            score,
            expected
        );
    }
    assert_eq!(classify_fcs(None, THRESHOLDS), None);
    assert_eq!(classify_fcs(Some(f64::NAN), THRESHOLDS), None);
}

#[test]
fn test_weighted_score_requires_every_component() {
    assert_eq!(weighted_score(&[Some(1.0), Some(2.0)], &[2.0, 0.5]), Some(3.0));
    assert_eq!(weighted_score(&[Some(1.0), None], &[2.0, 0.5]), None);
}

#[test]
fn test_rename_food_columns() {
    let mut df = df! {
        "i_1.1_food_consum_cereals" => [7.0f64],
        "other" => [1.0f64],
    }
    .unwrap();

    rename_food_columns(&mut df, &[("i_1.1_food_consum_cereals", "cereals")]).unwrap();

    assert_has_columns(&df, &["cereals", "other"]);
}

#[test]
fn test_rename_food_columns_missing_raw_column() {
    let mut df = df! { "other" => [1.0f64] }.unwrap();

    let result = rename_food_columns(&mut df, &[("i_1.1_food_consum_cereals", "cereals")]);

    assert!(matches!(result, Err(PipelineError::MissingColumn { .. })));
}
