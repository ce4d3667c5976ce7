//! Report module - workbook, audit and console summaries of a run

pub mod audit_export;
pub mod summary;
pub mod workbook_export;

pub use audit_export::*;
pub use summary::*;
pub use workbook_export::*;
