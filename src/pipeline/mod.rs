//! Pipeline module - load, recode, derive and aggregate survey data

pub mod aggregate;
pub mod bucket;
pub mod derive;
pub mod dummies;
pub mod error;
pub mod fcs;
pub mod livelihood;
pub mod loader;
pub mod recode;
pub mod remittance;
pub mod schema;
pub mod temporal;

pub use aggregate::{
    summarize, summarize_all, AggFunc, AggregationSpec, ColumnSelector, GroupRow, GroupingSpec,
    StatColumn, SummaryTable,
};
pub use bucket::{assign_bucket, bucketize, BucketRange};
pub use derive::{derive_all, DerivationAudit};
pub use dummies::{cat_to_dummies, CollisionResolution, DummyCollision, DummyColumns};
pub use error::{PipelineError, Result};
pub use fcs::{classify_fcs, FcgThresholds, FoodConsumptionGroup};
pub use livelihood::{missing_safe_eq, same_value_flag};
pub use loader::{load_dataset, load_dataset_with_progress};
pub use recode::{recode, RecodeAudit, Replacement, SentinelMap};
pub use remittance::{safe_ratio, RemittanceAudit};
pub use schema::{default_sentinels, SurveySchema, MIN_GROUP_SIZE};
pub use temporal::{coerce_date, elapsed_days};
