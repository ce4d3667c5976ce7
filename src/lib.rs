//! fsagg: Survey Aggregation Library
//!
//! A library for turning a raw displacement-survey export into grouped
//! food-security, remittance and livelihood summaries.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
