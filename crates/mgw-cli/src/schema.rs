//! # Schema and Versions Subcommands
//!
//! `mgw schema` prints the schema a resource kind is validated against,
//! after the storage sink's strictness is applied. `mgw versions` lists
//! the gateway releases the schema repository covers.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use mgw_core::ResourceKind;

use crate::config::{CliConfig, Overrides, Settings, TargetArgs};

/// Arguments for the `mgw schema` subcommand.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Resource kind (route, service, upstream, ...).
    #[arg(long, value_name = "KIND")]
    pub resource: ResourceKind,

    /// Print on one line instead of indented.
    #[arg(long)]
    pub compact: bool,
}

/// Execute the schema subcommand.
pub fn run_schema(args: &SchemaArgs, config: &CliConfig, base: Overrides) -> Result<u8> {
    let settings = config.settings(args.target.apply(base))?;
    let output = render_schema(args, &settings)?;
    println!("{output}");
    Ok(0)
}

fn render_schema(args: &SchemaArgs, settings: &Settings) -> Result<String> {
    let resolver = settings.resolver()?;
    let kind = args.resource;
    let schema = resolver
        .resolve(
            settings.gateway_version,
            kind,
            &kind.schema_path(),
            settings.sink,
        )
        .with_context(|| {
            format!(
                "no schema for {kind} in gateway {}",
                settings.gateway_version
            )
        })?;

    if args.compact {
        return Ok(schema.text().to_string());
    }
    let value: Value = serde_json::from_str(schema.text())?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Execute the versions subcommand.
pub fn run_versions(config: &CliConfig, base: Overrides) -> Result<u8> {
    for version in available_versions(config, base)? {
        println!("{version}");
    }
    Ok(0)
}

fn available_versions(config: &CliConfig, base: Overrides) -> Result<Vec<String>> {
    let settings = config.settings(base)?;
    let resolver = settings.resolver()?;
    Ok(resolver
        .repository()
        .versions()
        .map(|v| v.to_string())
        .collect())
}
