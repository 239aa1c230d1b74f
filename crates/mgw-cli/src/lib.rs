//! # mgw-cli: Gateway Resource Validation CLI
//!
//! Provides the `mgw` command-line interface over `mgw-schema`.
//!
//! ## Subcommands
//!
//! - `mgw validate` validates JSON or YAML documents from disk.
//! - `mgw schema` prints the resolved schema of a resource kind.
//! - `mgw versions` lists the gateway releases the schemas cover.
//!
//! ```bash
//! mgw validate --gateway-version 3.11 --resource route routes/*.json
//! mgw validate --sink draft --path main.upstream upstream.yaml
//! mgw schema --gateway-version 3.2 --resource consumer
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; validation logic stays in `mgw-schema`.
//! - Results go to stdout, logs to stderr.

pub mod config;
pub mod schema;
pub mod validate;
