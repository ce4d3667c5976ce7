//! Shared test utilities and fixture generators

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use std::path::PathBuf;
use tempfile::TempDir;

pub const SURVEY_SHEET: &str = "DataSet_FMS2_FS";

pub const EMPLOYMENT: [&str; 3] = [
    "Unemployed and looking for job",
    "Employed",
    "Self-Employed",
];

pub const OCCUPATIONS: [&str; 7] = [
    "Construction, Water Supply, Electricity, Gas",
    "Agriculture, Pastoralism, Fishing, Food Industry",
    "Craft",
    "Other",
    "Retail, Sales",
    "Plant and machine operators, and assemblers, mechanicals",
    "Domestic work",
];

pub const COMPROMISE_REASONS: [&str; 4] = [
    "To save money",
    "To send money back home",
    "For accommodation",
    "For health reasons",
];

pub const FOOD_COLUMNS: [&str; 8] = [
    "i_1.1_food_consum_cereals",
    "i_1.2_food_consum_legumes",
    "i_1.3_food_consum_vegetables",
    "i_1.4_food_consum_fruits",
    "i_1.5_food_consum_meat",
    "i_1.6_food_consum_milk",
    "i_1.7_food_consum_oil",
    "i_1.8_food_consum_sugar",
];

pub const COPING_COLUMNS: [&str; 9] = [
    "i_3.1_coping_exchange",
    "i_3.2_coping_scavenge",
    "i_3.3_coping_borrow",
    "i_3.4_coping_illegal",
    "i_3.5_coping_begging",
    "i_3.6_coping_child_labor",
    "i_3.7_coping_sold",
    "i_3.8_coping_spent_savings",
    "i_3.9_coping_work_food",
];

fn text_column(name: &str, rows: usize, f: impl Fn(usize) -> Option<&'static str>) -> Column {
    let values: Vec<Option<&str>> = (0..rows).map(f).collect();
    Column::new(name.into(), values)
}

fn number_column(name: &str, rows: usize, f: impl Fn(usize) -> Option<f64>) -> Column {
    let values: Vec<Option<f64>> = (0..rows).map(f).collect();
    Column::new(name.into(), values)
}

/// Create a raw survey table with every column the default schema reads.
///
/// Rows cycle through fixed category lists, so every category the default
/// aggregation names is present once `rows` reaches a few dozen. Dates are
/// text, as in a CSV export.
///
/// - Row 0 arrived after the assessment date (non-positive duration)
/// - Food frequencies cycle 0 / 2 / 7 days, i.e. FCS 0 / 32 / 112
/// - Remittance amounts cycle 0 / 500 / missing / 1200
/// - Every fifth row has "Did not answer" for the compromise question
pub fn create_survey_dataframe(rows: usize) -> DataFrame {
    let assessment = NaiveDate::from_ymd_opt(2019, 3, 1).unwrap();
    let arrivals: Vec<String> = (0..rows)
        .map(|i| {
            let arrival = if i == 0 {
                assessment + Duration::days(31)
            } else {
                assessment - Duration::days(((i * 37) % 1200 + 1) as i64)
            };
            arrival.format("%Y-%m-%d").to_string()
        })
        .collect();

    let mut columns = vec![
        Column::new("date".into(), vec!["2019-03-01"; rows]),
        Column::new("10_arrival_date_libya".into(), arrivals),
        number_column("4_age", rows, |i| Some(18.0 + (i % 40) as f64)),
    ];

    for name in FOOD_COLUMNS {
        columns.push(number_column(name, rows, |i| {
            Some([0.0, 2.0, 7.0][i % 3])
        }));
    }

    columns.extend([
        number_column("27_remit_amount_sent", rows, |i| {
            [Some(0.0), Some(500.0), None, Some(1200.0)][i % 4]
        }),
        number_column("28.1_remit_reason_family", rows, |i| Some((i % 2) as f64)),
        number_column("28.2_remit_reason_debt", rows, |i| Some(((i + 1) % 2) as f64)),
        number_column("29.0.1_remit_means_bank", rows, |i| Some((i % 3 == 0) as u8 as f64)),
        text_column("29.0.6_remit_means_text", rows, |_| Some("hawala")),
        text_column("i_2_compromise_food_consumpt", rows, |i| {
            if i % 5 == 0 {
                Some("Did not answer")
            } else if i % 2 == 0 {
                Some("Yes")
            } else {
                Some("No")
            }
        }),
        text_column("i_2.1_compromise_food_why", rows, |i| {
            (i % 5 != 0).then(|| COMPROMISE_REASONS[i % 4])
        }),
    ]);

    for (offset, name) in COPING_COLUMNS.iter().enumerate() {
        columns.push(text_column(name, rows, move |i| {
            Some(if (i + offset) % 3 == 0 { "Yes" } else { "No" })
        }));
    }

    columns.extend([
        text_column("7_employ_status_before", rows, |i| Some(EMPLOYMENT[i % 3])),
        text_column("7.1.1_occupation_coo", rows, |i| Some(OCCUPATIONS[i % 7])),
        text_column("8_employment_status_libya", rows, |i| {
            Some(EMPLOYMENT[(i + 1) % 3])
        }),
        text_column("8.1.1_occupation_libya", rows, |i| {
            (i % 11 != 0).then(|| OCCUPATIONS[(i / 2) % 7])
        }),
        text_column("7.2_droughts_floods", rows, |i| {
            Some(if i % 4 == 0 { "Yes" } else { "No" })
        }),
        text_column("p1_geodivision", rows, |i| Some(["West", "East", "South"][i % 3])),
        text_column("p2_mantika", rows, |i| Some(["Tripoli", "Misrata"][i % 2])),
        text_column("2.0_region_of_origin", rows, |i| {
            Some(["Sub-Saharan Africa", "North Africa"][i % 2])
        }),
        text_column("2.1_nationality", rows, |i| {
            Some(["Niger", "Egypt", "Chad", "Sudan"][i % 4])
        }),
        text_column("3_sex", rows, |i| Some(["Male", "Male", "Female"][i % 3])),
        text_column("5_marital_status", rows, |i| Some(["Single", "Married"][i % 2])),
        text_column("6_edu_level", rows, |i| {
            Some(["None", "Primary", "Secondary"][i % 3])
        }),
    ]);

    DataFrame::new(columns).unwrap()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary xlsx workbook with a small survey sheet and a second
/// unrelated sheet.
///
/// Columns of the survey sheet:
/// - `3_sex`: text
/// - `4_age`: numbers, one blank cell
/// - `date`: date-formatted cells
/// - `i_2_compromise_food_consumpt`: "Yes" / "No" / "Did not answer" text
/// - `27_remit_amount_sent`: numbers mixed with one text answer
pub fn create_temp_xlsx(sheet_name: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("survey.xlsx");

    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    let cover = workbook.add_worksheet();
    cover.set_name("Cover").unwrap();
    cover.write_string(0, 0, "Survey export").unwrap();

    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name).unwrap();
    for (col, header) in [
        "3_sex",
        "4_age",
        "date",
        "i_2_compromise_food_consumpt",
        "27_remit_amount_sent",
    ]
    .iter()
    .enumerate()
    {
        sheet.write_string(0, col as u16, *header).unwrap();
    }

    let sexes = ["Male", "Female", "Male"];
    let ages = [Some(24.0), None, Some(41.0)];
    let days = [1, 5, 12];
    let compromise = ["Yes", "No", "Did not answer"];
    for row in 0..3usize {
        let r = row as u32 + 1;
        sheet.write_string(r, 0, sexes[row]).unwrap();
        if let Some(age) = ages[row] {
            sheet.write_number(r, 1, age).unwrap();
        }
        let date = ExcelDateTime::from_ymd(2019, 3, days[row]).unwrap();
        sheet
            .write_datetime_with_format(r, 2, &date, &date_format)
            .unwrap();
        sheet.write_string(r, 3, compromise[row]).unwrap();
    }
    sheet.write_number(1, 4, 250.0).unwrap();
    sheet.write_string(2, 4, "Did not answer").unwrap();
    sheet.write_number(3, 4, 0.0).unwrap();

    workbook.save(&path).unwrap();
    (temp_dir, path)
}

/// Assert that DataFrame has expected columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Expected column '{}' not found. Available: {:?}",
            col,
            actual_cols
        );
    }
}

/// Float values of a column, cast non-strictly
pub fn float_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

/// Text values of a column
pub fn text_values(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::String)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}
