//! # Storage Sinks
//!
//! A validated document is destined either for the authoritative runtime
//! store that the live gateway synchronizes from, or for the control
//! plane's own draft store. The runtime store is strict about unknown
//! properties; the draft store tolerates storage-layer bookkeeping fields.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::MgwError;

/// Destination of a validated document.
///
/// Defaults to the strict sink: validation gates promotion toward the
/// running gateway.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StorageSink {
    /// Authoritative store synchronized to the running gateway (strict).
    #[default]
    #[serde(alias = "runtime", alias = "etcd")]
    RuntimeStore,
    /// Internal draft/database store (lenient).
    #[serde(alias = "draft", alias = "database")]
    DraftStore,
}

impl StorageSink {
    /// Returns both sinks, strict first.
    pub fn all() -> &'static [StorageSink] {
        &[Self::RuntimeStore, Self::DraftStore]
    }

    /// Returns the canonical snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RuntimeStore => "runtime_store",
            Self::DraftStore => "draft_store",
        }
    }

    /// Whether properties absent from the schema are rejected.
    pub fn rejects_unknown_properties(&self) -> bool {
        matches!(self, Self::RuntimeStore)
    }
}

impl std::fmt::Display for StorageSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageSink {
    type Err = MgwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "runtime_store" | "runtime" | "etcd" => Ok(Self::RuntimeStore),
            "draft_store" | "draft" | "database" => Ok(Self::DraftStore),
            other => Err(MgwError::UnknownStorageSink(other.to_string())),
        }
    }
}
