//! Survey instrument schema and analysis constants
//!
//! Raw column names follow the instrument's question numbering
//! (`4_age`, `27_remit_amount_sent`, ...). They are collected in
//! [`SurveySchema`] so a renamed export only needs one edit here or in the
//! `[schema]` table of a config file.

use serde::{Deserialize, Serialize};

use super::aggregate::{AggFunc, AggregationSpec, GroupingSpec};
use super::bucket::BucketRange;
use super::recode::SentinelMap;

/// Groups with this many rows or fewer are suppressed from every sheet.
pub const MIN_GROUP_SIZE: usize = 30;

/// Highest FCS still classified as "Poor".
pub const FCS_POOR_MAX: f64 = 28.0;

/// Highest FCS still classified as "Borderline".
pub const FCS_BORDERLINE_MAX: f64 = 42.0;

/// Average month length used to turn elapsed days into months.
pub const DAYS_PER_MONTH: f64 = 30.44;

/// Remittance amounts at or above this are treated as entry errors.
pub const REMITTANCE_MAX: f64 = 100_000.0;

/// Elapsed-days buckets for the time-in-location category.
pub const DURATION_BUCKETS: [BucketRange<'static>; 4] = [
    BucketRange::exclusive("less than 6m", 0.0, Some(183.0)),
    BucketRange::new("between 6m and 1y", 183.0, Some(365.0)),
    BucketRange::new("between 1y and 2y", 365.0, Some(730.0)),
    BucketRange::new("more than 2y", 730.0, Some(10_000.0)),
];

/// Age brackets in years.
pub const AGE_BUCKETS: [BucketRange<'static>; 4] = [
    BucketRange::exclusive("<20 years", 0.0, Some(20.0)),
    BucketRange::new("20-30 years", 20.0, Some(30.0)),
    BucketRange::new("30-40 years", 30.0, Some(40.0)),
    BucketRange::new(">40 years", 40.0, Some(100.0)),
];

/// Names of the columns the derivation engine creates.
pub mod derived {
    pub const TIME_IN_LOCATION: &str = "time_in_libya";
    pub const MONTHS_IN_LOCATION: &str = "months_in_libya";
    pub const TIME_IN_LOCATION_CAT: &str = "time_libya_cat";
    pub const AGE_CAT: &str = "age_cat";
    pub const FCS: &str = "FCS";
    pub const FCG: &str = "FCG";
    pub const REMIT_ANSWERED: &str = "remit_answered";
    pub const MONEY_SENT: &str = "money_sent_dum";
    pub const REMIT_AMOUNT_POS: &str = "remit_amount_pos";
    pub const REMIT_AMOUNT_POS_PER_MONTH: &str = "remit_amount_pos_permonth";
    pub const SAME_JOB: &str = "same_job_libya_coo";
    pub const NO_GROUP: &str = "no_group";
    pub const NO_GROUP_LABEL: &str = "All data";
    pub const ORIGIN_SUFFIX: &str = "_coo";
    pub const HOST_SUFFIX: &str = "_lib";
}

/// The eight food groups of the Food Consumption Score and their weights.
///
/// Raw frequency columns are renamed to these logical names before scoring.
pub const FOOD_GROUPS: [(&str, f64); 8] = [
    ("cereals", 2.0),
    ("legumes", 3.0),
    ("veggies", 1.0),
    ("fruits", 1.0),
    ("meat", 4.0),
    ("dairy", 4.0),
    ("fats", 0.5),
    ("sugar", 0.5),
];

/// Mapping from logical survey fields to raw column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveySchema {
    pub assessment_date: String,
    pub arrival_date: String,
    pub age: String,

    pub food_cereals: String,
    pub food_legumes: String,
    pub food_vegetables: String,
    pub food_fruits: String,
    pub food_meat: String,
    pub food_dairy: String,
    pub food_fats: String,
    pub food_sugar: String,

    pub remit_amount_sent: String,
    /// Column-name prefix of the "reasons for sending money" block
    pub remit_reason_prefix: String,
    /// Column-name prefix of the "means of sending money" block
    pub remit_means_prefix: String,
    /// Free-text column inside the means block, excluded from aggregation
    pub remit_means_text: String,

    pub compromise_food: String,
    pub compromise_food_why: String,
    pub coping_strategies: Vec<String>,

    pub employment_origin: String,
    pub occupation_origin: String,
    pub employment_host: String,
    pub occupation_host: String,
    pub droughts_floods: String,

    pub geodivision: String,
    pub mantika: String,
    pub region_of_origin: String,
    pub nationality: String,
    pub sex: String,
    pub marital_status: String,
    pub education: String,
}

impl Default for SurveySchema {
    fn default() -> Self {
        Self {
            assessment_date: "date".into(),
            arrival_date: "10_arrival_date_libya".into(),
            age: "4_age".into(),
            food_cereals: "i_1.1_food_consum_cereals".into(),
            food_legumes: "i_1.2_food_consum_legumes".into(),
            food_vegetables: "i_1.3_food_consum_vegetables".into(),
            food_fruits: "i_1.4_food_consum_fruits".into(),
            food_meat: "i_1.5_food_consum_meat".into(),
            food_dairy: "i_1.6_food_consum_milk".into(),
            food_fats: "i_1.7_food_consum_oil".into(),
            food_sugar: "i_1.8_food_consum_sugar".into(),
            remit_amount_sent: "27_remit_amount_sent".into(),
            remit_reason_prefix: "28".into(),
            remit_means_prefix: "29".into(),
            remit_means_text: "29.0.6_remit_means_text".into(),
            compromise_food: "i_2_compromise_food_consumpt".into(),
            compromise_food_why: "i_2.1_compromise_food_why".into(),
            coping_strategies: [
                "i_3.1_coping_exchange",
                "i_3.2_coping_scavenge",
                "i_3.3_coping_borrow",
                "i_3.4_coping_illegal",
                "i_3.5_coping_begging",
                "i_3.6_coping_child_labor",
                "i_3.7_coping_sold",
                "i_3.8_coping_spent_savings",
                "i_3.9_coping_work_food",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            employment_origin: "7_employ_status_before".into(),
            occupation_origin: "7.1.1_occupation_coo".into(),
            employment_host: "8_employment_status_libya".into(),
            occupation_host: "8.1.1_occupation_libya".into(),
            droughts_floods: "7.2_droughts_floods".into(),
            geodivision: "p1_geodivision".into(),
            mantika: "p2_mantika".into(),
            region_of_origin: "2.0_region_of_origin".into(),
            nationality: "2.1_nationality".into(),
            sex: "3_sex".into(),
            marital_status: "5_marital_status".into(),
            education: "6_edu_level".into(),
        }
    }
}

/// Reasons for compromising food consumption kept in the coping summary.
const COPING_REASONS: [&str; 4] = [
    "To save money",
    "To send money back home",
    "For accommodation",
    "For health reasons",
];

/// Employment and occupation categories kept in the livelihood summary.
const LIVELIHOOD_CATEGORIES: [&str; 10] = [
    "Unemployed and looking for job",
    "Employed",
    "Self-Employed",
    "Construction, Water Supply, Electricity, Gas",
    "Agriculture, Pastoralism, Fishing, Food Industry",
    "Craft",
    "Other",
    "Retail, Sales",
    "Plant and machine operators, and assemblers, mechanicals",
    "Domestic work",
];

impl SurveySchema {
    /// Raw food-frequency columns paired with their logical food-group name.
    pub fn food_columns(&self) -> [(&str, &str); 8] {
        [
            (self.food_cereals.as_str(), FOOD_GROUPS[0].0),
            (self.food_legumes.as_str(), FOOD_GROUPS[1].0),
            (self.food_vegetables.as_str(), FOOD_GROUPS[2].0),
            (self.food_fruits.as_str(), FOOD_GROUPS[3].0),
            (self.food_meat.as_str(), FOOD_GROUPS[4].0),
            (self.food_dairy.as_str(), FOOD_GROUPS[5].0),
            (self.food_fats.as_str(), FOOD_GROUPS[6].0),
            (self.food_sugar.as_str(), FOOD_GROUPS[7].0),
        ]
    }

    /// The sheets of the output workbook, in order.
    pub fn groupings(&self) -> Vec<GroupingSpec> {
        vec![
            GroupingSpec::single(derived::NO_GROUP),
            GroupingSpec::single(&self.geodivision),
            GroupingSpec::composite([&self.geodivision, &self.mantika]),
            GroupingSpec::single(&self.region_of_origin),
            GroupingSpec::composite([&self.region_of_origin, &self.nationality]),
            GroupingSpec::single(&self.sex),
            GroupingSpec::single(derived::AGE_CAT),
            GroupingSpec::single(&self.marital_status),
            GroupingSpec::single(&self.education),
        ]
    }

    /// Statistics computed for every group of every sheet.
    pub fn aggregation_spec(&self) -> AggregationSpec {
        use AggFunc::{Count, Mean, Median};

        let mut spec = AggregationSpec::new()
            .column(derived::MONTHS_IN_LOCATION, &[Count, Mean, Median])
            .column(derived::REMIT_ANSWERED, &[Mean])
            .column(derived::MONEY_SENT, &[Mean])
            .column(derived::REMIT_AMOUNT_POS, &[Count, Median])
            .column(derived::REMIT_AMOUNT_POS_PER_MONTH, &[Median])
            .prefix(&self.remit_reason_prefix, &[], &[Mean])
            .prefix(
                &self.remit_means_prefix,
                &[self.remit_means_text.as_str()],
                &[Mean],
            )
            .column(derived::FCS, &[Count, Mean])
            .column("Poor", &[Mean])
            .column("Borderline", &[Mean])
            .column("Acceptable", &[Mean]);

        for (food, _) in FOOD_GROUPS {
            spec = spec.column(food, &[Mean]);
        }

        spec = spec.column(&self.compromise_food, &[Count, Mean]);
        for reason in COPING_REASONS {
            spec = spec.column(reason, &[Count, Mean]);
        }
        for strategy in &self.coping_strategies {
            spec = spec.column(strategy, &[Count, Mean]);
        }

        for category in LIVELIHOOD_CATEGORIES {
            spec = spec.column(&format!("{category}{}", derived::ORIGIN_SUFFIX), &[Count, Mean]);
        }
        spec = spec
            .column(&self.droughts_floods, &[Count, Mean])
            .column(derived::SAME_JOB, &[Count, Mean]);
        for category in LIVELIHOOD_CATEGORIES {
            spec = spec.column(&format!("{category}{}", derived::HOST_SUFFIX), &[Count, Mean]);
        }

        spec
    }
}

/// The sentinel map applied to every column before derivation.
pub fn default_sentinels() -> SentinelMap {
    SentinelMap::new()
        .text_missing("Did not answer")
        .text_missing("Don\u{2019}t want to answer")
        // Not applicable
        .number_missing(0.55)
        // Did not answer
        .number_missing(0.88)
        // No selection made
        .number_missing(0.22)
        // Coping questions
        .text_number("No", 0.0)
        .text_number("Yes", 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_groupings_sheet_names() {
        let schema = SurveySchema::default();
        let groupings = schema.groupings();
        let names: Vec<&str> = groupings.iter().map(|g| g.sheet_name()).collect();

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
    }

    #[test]
    fn test_default_sentinels_are_valid() {
        assert!(default_sentinels().validate().is_ok());
    }

    #[test]
    fn test_schema_partial_toml_falls_back_to_defaults() {
        let schema: SurveySchema = toml::from_str("age = \"age_years\"").unwrap();
        assert_eq!(schema.age, "age_years");
        assert_eq!(schema.arrival_date, "10_arrival_date_libya");
    }
}
