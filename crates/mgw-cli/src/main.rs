//! # mgw CLI entry point
//!
//! Parses command-line arguments, loads the configuration file, sets up
//! logging, and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mgw_cli::config::{CliConfig, LogFormat, Overrides, CONFIG_ENV};
use mgw_cli::schema::{run_schema, run_versions, SchemaArgs};
use mgw_cli::validate::{run_validate, ValidateArgs};

/// Gateway resource validation.
///
/// Checks route, service, upstream, consumer, and other gateway resource
/// documents against the schema of a gateway release before they are
/// stored.
#[derive(Parser, Debug)]
#[command(name = "mgw", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Directory of apisix-<version>.json schema documents to use instead
    /// of the packaged ones.
    #[arg(long, global = true)]
    schema_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate resource documents.
    Validate(ValidateArgs),

    /// Print the resolved schema of a resource kind.
    Schema(SchemaArgs),

    /// List supported gateway versions.
    Versions,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = CliConfig::load(cli.config.as_deref());
    let log_format = cli
        .log_format
        .or_else(|| config.as_ref().ok().and_then(|c| c.log_format))
        .unwrap_or_default();
    init_tracing(cli.verbose, log_format);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(2);
        }
    };

    tracing::debug!("mgw CLI v{} starting", env!("CARGO_PKG_VERSION"));

    let base = Overrides {
        schema_dir: cli.schema_dir,
        ..Overrides::default()
    };
    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args, &config, base),
        Commands::Schema(args) => run_schema(&args, &config, base),
        Commands::Versions => run_versions(&config, base),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}

/// Initialize tracing based on verbosity level. `RUST_LOG` wins when set.
fn init_tracing(verbose: u8, format: LogFormat) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mgw_core::{ProxyVersion, ResourceKind, StorageSink};

    #[test]
    fn cli_parse_validate_resource() {
        let cli = Cli::try_parse_from([
            "mgw",
            "validate",
            "--gateway-version",
            "3.11",
            "--sink",
            "draft",
            "--resource",
            "route",
            "a.json",
            "b.yaml",
        ])
        .unwrap();
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.target.gateway_version, Some(ProxyVersion::V3_11));
                assert_eq!(args.target.sink, Some(StorageSink::DraftStore));
                assert_eq!(args.resource, Some(ResourceKind::Route));
                assert_eq!(args.files.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cli_parse_validate_path() {
        let cli =
            Cli::try_parse_from(["mgw", "validate", "--path", "main.ssl", "cert.json"]).unwrap();
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.path.as_deref(), Some("main.ssl"));
                assert!(args.resource.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cli_parse_resource_conflicts_with_path() {
        assert!(Cli::try_parse_from([
            "mgw",
            "validate",
            "--resource",
            "route",
            "--path",
            "main.route",
            "a.json",
        ])
        .is_err());
    }

    #[test]
    fn cli_parse_validate_requires_files() {
        assert!(Cli::try_parse_from(["mgw", "validate", "--resource", "route"]).is_err());
    }

    #[test]
    fn cli_parse_rejects_unknown_version() {
        assert!(Cli::try_parse_from([
            "mgw",
            "validate",
            "--gateway-version",
            "3.11.0",
            "--resource",
            "route",
            "a.json",
        ])
        .is_err());
    }

    #[test]
    fn cli_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "mgw",
            "versions",
            "-vv",
            "--log-format",
            "json",
            "--config",
            "mgw.yaml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert_eq!(cli.config, Some(PathBuf::from("mgw.yaml")));
        assert!(matches!(cli.command, Commands::Versions));
    }

    #[test]
    fn cli_parse_schema() {
        let cli = Cli::try_parse_from([
            "mgw",
            "schema",
            "--resource",
            "stream_route",
            "--compact",
        ])
        .unwrap();
        match cli.command {
            Commands::Schema(args) => {
                assert_eq!(args.resource, ResourceKind::StreamRoute);
                assert!(args.compact);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
