//! # CLI Configuration
//!
//! Optional `mgw.yaml` file, located via `--config` or the `MGW_CONFIG`
//! environment variable. Every key is optional; flags given on the command
//! line take precedence over the file.
//!
//! ```yaml
//! gateway_version: "3.11"
//! sink: runtime
//! schema_dir: ./schemas
//! log_format: json
//! max_reported_violations: 4
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Deserializer, Serialize};

use mgw_core::{ProxyVersion, StorageSink};
use mgw_schema::{SchemaRepository, SchemaResolver, ValidatorOptions};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "MGW_CONFIG";

/// Gateway release used when neither the file nor the flags name one.
pub const DEFAULT_GATEWAY_VERSION: ProxyVersion = ProxyVersion::V3_13;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Contents of `mgw.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Gateway release, e.g. `"3.11"`. Unquoted YAML numbers are accepted.
    #[serde(deserialize_with = "version_text")]
    pub gateway_version: Option<String>,
    /// Storage sink whose strictness applies.
    pub sink: Option<StorageSink>,
    /// Directory of `apisix-<version>.json` schema documents, used instead
    /// of the packaged ones.
    pub schema_dir: Option<PathBuf>,
    /// Log output format.
    pub log_format: Option<LogFormat>,
    /// Cap on reported structural violations per document.
    pub max_reported_violations: Option<usize>,
}

/// `3.11` in YAML is a float; keep what the user wrote either way.
fn version_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

impl CliConfig {
    /// Loads the file at `path`, or returns an empty configuration when no
    /// path is given.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid configuration.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("invalid configuration {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parses configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Fails on malformed YAML or unknown keys.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // An empty file is an empty configuration.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Merges command-line overrides over the file values.
    ///
    /// # Errors
    ///
    /// Fails if the file names an unsupported gateway version.
    pub fn settings(&self, overrides: Overrides) -> Result<Settings> {
        let gateway_version = match overrides.gateway_version {
            Some(version) => version,
            None => match &self.gateway_version {
                Some(text) => text
                    .parse()
                    .with_context(|| format!("invalid gateway_version {text:?} in configuration"))?,
                None => DEFAULT_GATEWAY_VERSION,
            },
        };
        let mut options = ValidatorOptions::default();
        if let Some(max) = overrides
            .max_reported_violations
            .or(self.max_reported_violations)
        {
            options = options.with_max_reported_violations(max);
        }
        Ok(Settings {
            gateway_version,
            sink: overrides.sink.or(self.sink).unwrap_or_default(),
            schema_dir: overrides.schema_dir.or_else(|| self.schema_dir.clone()),
            options,
        })
    }
}

/// Values given on the command line. `None` defers to the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub gateway_version: Option<ProxyVersion>,
    pub sink: Option<StorageSink>,
    pub schema_dir: Option<PathBuf>,
    pub max_reported_violations: Option<usize>,
}

/// Selector flags shared by `validate` and `schema`.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Gateway release, e.g. 3.11.
    #[arg(long, value_name = "VERSION")]
    pub gateway_version: Option<ProxyVersion>,

    /// Storage sink: runtime (strict) or draft (permissive).
    #[arg(long, value_name = "SINK")]
    pub sink: Option<StorageSink>,
}

impl TargetArgs {
    /// Layers these flags over `base`.
    pub fn apply(&self, base: Overrides) -> Overrides {
        Overrides {
            gateway_version: self.gateway_version.or(base.gateway_version),
            sink: self.sink.or(base.sink),
            ..base
        }
    }
}

/// Effective settings for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub gateway_version: ProxyVersion,
    pub sink: StorageSink,
    pub schema_dir: Option<PathBuf>,
    pub options: ValidatorOptions,
}

impl Settings {
    /// Builds the schema resolver: over `schema_dir` when set, otherwise
    /// over the packaged documents.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be loaded or a schema fails to compile.
    pub fn resolver(&self) -> Result<SchemaResolver> {
        match &self.schema_dir {
            Some(dir) => {
                let repository = SchemaRepository::load_dir(dir)
                    .with_context(|| format!("failed to load schemas from {}", dir.display()))?;
                tracing::info!(
                    dir = %dir.display(),
                    versions = repository.len(),
                    "loaded schema repository"
                );
                Ok(SchemaResolver::new(Arc::new(repository))?)
            }
            None => SchemaResolver::global().context("failed to load packaged schemas"),
        }
    }
}
