//! CLI module - argument parsing and configuration files

mod args;
mod config;

pub use args::{Cli, DEFAULT_INPUT, DEFAULT_OUTPUT, DEFAULT_SHEET};
pub use config::{PipelineConfig, RunSettings};
