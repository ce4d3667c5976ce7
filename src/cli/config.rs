//! TOML configuration file and its merge with command-line flags

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use super::args::{Cli, DEFAULT_INPUT, DEFAULT_OUTPUT, DEFAULT_SHEET};
use crate::pipeline::SurveySchema;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputSection {
    pub path: Option<PathBuf>,
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    pub path: Option<PathBuf>,
}

/// Contents of a `--config` file. Every table and key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub input: InputSection,
    pub output: OutputSection,
    pub schema: SurveySchema,
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Settings of one run after merging flags, config file and defaults.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub input: PathBuf,
    pub sheet: String,
    pub output: PathBuf,
    pub audit: Option<PathBuf>,
    pub schema: SurveySchema,
}

impl RunSettings {
    /// Flags win over the config file, which wins over built-in defaults.
    pub fn resolve(cli: &Cli, config: PipelineConfig) -> Self {
        Self {
            input: cli
                .input
                .clone()
                .or(config.input.path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT)),
            sheet: cli
                .sheet
                .clone()
                .or(config.input.sheet)
                .unwrap_or_else(|| DEFAULT_SHEET.to_string()),
            output: cli
                .output
                .clone()
                .or(config.output.path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            audit: cli.audit.clone(),
            schema: config.schema,
        }
    }

    /// Resolve settings for `cli`, reading its config file if one was given.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };
        Ok(Self::resolve(cli, config))
    }
}
