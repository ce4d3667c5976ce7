//! Command-line argument definitions using clap

use clap::{ArgAction, Parser};
use std::path::PathBuf;

pub const DEFAULT_INPUT: &str = "Data/Raw/DTM_FMS_F2_FS_dataset_20190312_fin_dateformat.xlsx";
pub const DEFAULT_SHEET: &str = "DataSet_FMS2_FS";
pub const DEFAULT_OUTPUT: &str = "Data/Aggregated/coping_livelihood_remittances_fcs_analysis.xlsx";

/// fsagg - Aggregate a displacement survey into food-security, remittance and
/// livelihood summaries
#[derive(Parser, Debug)]
#[command(name = "fsagg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input survey file (xlsx, xls, ods, CSV or Parquet).
    /// Defaults to the raw survey export under Data/Raw.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Worksheet to read from a spreadsheet input (ignored for CSV/Parquet)
    #[arg(short, long)]
    pub sheet: Option<String>,

    /// Output workbook path (.xlsx), one sheet per grouping.
    /// Defaults to the aggregated workbook under Data/Aggregated.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// TOML configuration file with [input], [output] and [schema] tables.
    /// Flags given on the command line take precedence over the file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write a JSON audit of exclusions and suppressed groups to this path
    #[arg(long)]
    pub audit: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Log level implied by the number of `-v` flags.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    }
}
