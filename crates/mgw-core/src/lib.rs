#![deny(missing_docs)]

//! # mgw-core: Foundational Types for the Micro-Gateway Control Plane
//!
//! This crate defines the vocabulary every other crate in the workspace
//! speaks. It has no internal crate dependencies, only `serde`,
//! `serde_json`, and `thiserror` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Closed enums for every selector.** [`ProxyVersion`], [`ResourceKind`]
//!    and [`StorageSink`] are exhaustive enums. Unsupported values are
//!    rejected at parse time, never defaulted.
//!
//! 2. **One path per resource kind.** Every [`ResourceKind`] maps to exactly
//!    one dotted schema path (`main.<kind>`), so a (version, kind) pair can
//!    never resolve to two schema locations.
//!
//! 3. **Consumed documents stay loose.** [`UpstreamDefinition`] deserializes
//!    only the fields the semantic rules read and ignores everything else;
//!    shape enforcement belongs to the structural schema.
//!
//! 4. **[`MgwError`] for parse failures.** Structured errors with
//!    `thiserror`. No `Box<dyn Error>`, no `.unwrap()` outside tests.

pub mod error;
pub mod resource;
pub mod sink;
pub mod upstream;
pub mod version;

// Re-export primary types at crate root for ergonomic imports.
pub use error::MgwError;
pub use resource::ResourceKind;
pub use sink::StorageSink;
pub use upstream::{Node, Nodes, UpstreamDefinition};
pub use version::ProxyVersion;
