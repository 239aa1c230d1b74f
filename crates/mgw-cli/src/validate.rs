//! # Validate Subcommand
//!
//! Validates resource documents from disk against one gateway release and
//! storage sink. `.yaml`/`.yml` files are converted to JSON first; any
//! other extension is read as JSON.
//!
//! Each file yields one line:
//!
//! ```text
//! PASS routes/r1.json (route1)
//! FAIL routes/r2.json (route2): schema violation at /uri: 5 is not of type "string"
//! ERROR routes/r3.json: failed to read file
//! ```
//!
//! Exit code: 0 if every document passes, 1 if any is rejected, 2 if a
//! file could not be read or the validator could not be configured.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::Value;

use mgw_core::ResourceKind;
use mgw_schema::{resource_identification, ErrorCategory, ResourceValidator, ValidationError};

use crate::config::{CliConfig, Overrides, TargetArgs};

/// Arguments for the `mgw validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Resource kind of every file (route, service, upstream, ...).
    #[arg(long, value_name = "KIND", conflicts_with = "path")]
    pub resource: Option<ResourceKind>,

    /// Schema path of every file, e.g. main.route.
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,

    /// Cap on structural violations printed per document.
    #[arg(long, value_name = "N")]
    pub max_violations: Option<usize>,

    /// Documents to validate.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

/// Result of validating one file.
#[derive(Debug)]
pub enum FileOutcome {
    Pass { label: String },
    Fail { label: String, error: ValidationError },
    Error { reason: String },
}

impl FileOutcome {
    /// Exit code contribution of this outcome.
    pub fn code(&self) -> u8 {
        match self {
            Self::Pass { .. } => 0,
            Self::Fail { .. } => 1,
            Self::Error { .. } => 2,
        }
    }
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 on success, 1 on validation failure, 2 on operational error.
pub fn run_validate(args: &ValidateArgs, config: &CliConfig, base: Overrides) -> Result<u8> {
    let overrides = Overrides {
        max_reported_violations: args.max_violations.or(base.max_reported_violations),
        ..args.target.apply(base)
    };
    let settings = config.settings(overrides)?;
    let (kind, path) = target_schema(args)?;
    let resolver = settings.resolver()?;
    let validator = ResourceValidator::new(
        &resolver,
        settings.gateway_version,
        kind,
        &path,
        settings.options,
        settings.sink,
    )
    .with_context(|| {
        format!(
            "cannot validate {kind} for gateway {} ({})",
            settings.gateway_version, settings.sink
        )
    })?;

    tracing::info!(
        version = %settings.gateway_version,
        %kind,
        sink = %settings.sink,
        files = args.files.len(),
        "validating documents"
    );

    let mut passed = 0usize;
    let mut code = 0u8;
    for file in &args.files {
        let outcome = validate_file(&validator, file);
        print_outcome(file, &outcome);
        if matches!(outcome, FileOutcome::Pass { .. }) {
            passed += 1;
        }
        code = code.max(outcome.code());
    }

    if args.files.len() > 1 {
        println!("{kind}: {passed}/{} passed", args.files.len());
    }
    Ok(code)
}

/// Determines the resource kind and schema path from `--resource` or
/// `--path`.
fn target_schema(args: &ValidateArgs) -> Result<(ResourceKind, String)> {
    match (&args.resource, &args.path) {
        (Some(kind), _) => Ok((*kind, kind.schema_path())),
        (None, Some(path)) => {
            let kind = ResourceKind::from_path(path)?;
            Ok((kind, path.clone()))
        }
        (None, None) => bail!("either --resource or --path is required"),
    }
}

/// Validates one file.
pub fn validate_file(validator: &ResourceValidator, file: &Path) -> FileOutcome {
    let bytes = match std::fs::read(file) {
        Ok(bytes) => bytes,
        Err(e) => {
            return FileOutcome::Error {
                reason: format!("failed to read file: {e}"),
            }
        }
    };

    let doc = match parse_document(file, &bytes) {
        Ok(doc) => doc,
        Err(error) => {
            return FileOutcome::Fail {
                label: String::new(),
                error,
            }
        }
    };
    let label = resource_identification(&doc);

    match validator.validate_value(&doc) {
        Ok(()) => FileOutcome::Pass { label },
        Err(error) => match error.category() {
            ErrorCategory::Schema | ErrorCategory::Semantic => {
                tracing::debug!(file = %file.display(), label = %label, error = %error, "rejected document");
                FileOutcome::Fail { label, error }
            }
            ErrorCategory::Configuration | ErrorCategory::Internal => {
                if error.is_internal() {
                    tracing::error!(file = %file.display(), error = %error, "internal validation error");
                }
                FileOutcome::Error {
                    reason: error.to_string(),
                }
            }
        },
    }
}

/// Parses a file's contents as JSON, or as YAML for `.yaml`/`.yml`.
pub fn parse_document(file: &Path, bytes: &[u8]) -> Result<Value, ValidationError> {
    let is_yaml = matches!(
        file.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    if is_yaml {
        serde_yaml::from_slice(bytes)
            .map_err(|e| ValidationError::MalformedDocument(format!("invalid YAML: {e}")))
    } else {
        serde_json::from_slice(bytes).map_err(|e| ValidationError::MalformedDocument(e.to_string()))
    }
}

fn print_outcome(file: &Path, outcome: &FileOutcome) {
    match outcome {
        FileOutcome::Pass { label } => {
            println!("PASS {}{}", file.display(), label_suffix(label));
        }
        FileOutcome::Fail { label, error } => {
            println!("FAIL {}{}: {error}", file.display(), label_suffix(label));
            if let ValidationError::SchemaViolation { details, .. } = error {
                for detail in details.iter().skip(1) {
                    println!("    {detail}");
                }
            }
        }
        FileOutcome::Error { reason } => {
            println!("ERROR {}: {reason}", file.display());
        }
    }
}

fn label_suffix(label: &str) -> String {
    if label.is_empty() {
        String::new()
    } else {
        format!(" ({label})")
    }
}
