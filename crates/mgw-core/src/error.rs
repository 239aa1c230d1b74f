//! # Error Hierarchy
//!
//! Parse errors for the core selector enums. Validation errors live in
//! `mgw-schema`; this crate only reports values it cannot recognize.

use thiserror::Error;

/// Top-level error type for the core selector types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MgwError {
    /// The gateway engine version is not one of the supported releases.
    #[error("unsupported gateway version: {0:?}")]
    UnsupportedVersion(String),

    /// The resource kind name is not recognized.
    #[error("unknown resource kind: {0:?}")]
    UnknownResourceKind(String),

    /// The storage sink name is not recognized.
    #[error("unknown storage sink: {0:?}")]
    UnknownStorageSink(String),
}
