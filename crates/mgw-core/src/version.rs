//! # Gateway Engine Versions
//!
//! Defines the `ProxyVersion` enum: the gateway engine release lines the
//! control plane can manage. Each release has its own schema document;
//! resource shape differs between them.
//!
//! Parsing is exact. `"3.11"` is supported, `"3.11.0"` and `"v3.11"` are
//! not. An unsupported value is an error, never a fallback to some
//! default release.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::MgwError;

/// Supported gateway engine release lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProxyVersion {
    /// Release line 3.2.
    #[serde(rename = "3.2")]
    V3_2,
    /// Release line 3.3.
    #[serde(rename = "3.3")]
    V3_3,
    /// Release line 3.11.
    #[serde(rename = "3.11")]
    V3_11,
    /// Release line 3.13.
    #[serde(rename = "3.13")]
    V3_13,
}

impl ProxyVersion {
    /// Returns every supported release, oldest first.
    pub fn all() -> &'static [ProxyVersion] {
        &[Self::V3_2, Self::V3_3, Self::V3_11, Self::V3_13]
    }

    /// Returns the release string, e.g. `"3.11"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V3_2 => "3.2",
            Self::V3_3 => "3.3",
            Self::V3_11 => "3.11",
            Self::V3_13 => "3.13",
        }
    }
}

impl std::fmt::Display for ProxyVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProxyVersion {
    type Err = MgwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "3.2" => Ok(Self::V3_2),
            "3.3" => Ok(Self::V3_3),
            "3.11" => Ok(Self::V3_11),
            "3.13" => Ok(Self::V3_13),
            other => Err(MgwError::UnsupportedVersion(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_as_str_roundtrip() {
        for version in ProxyVersion::all() {
            let parsed: ProxyVersion = version.as_str().parse().unwrap();
            assert_eq!(*version, parsed);
        }
    }

    #[test]
    fn test_unsupported_versions_rejected() {
        for bad in ["invalid_version", "", "3.11.0", "v3.11", "2.15", "3"] {
            let err = bad.parse::<ProxyVersion>().unwrap_err();
            assert_eq!(err, MgwError::UnsupportedVersion(bad.to_string()));
        }
    }

    #[test]
    fn test_serde_format_matches_as_str() {
        for version in ProxyVersion::all() {
            let json = serde_json::to_string(version).unwrap();
            assert_eq!(json, format!("\"{}\"", version.as_str()));
            let back: ProxyVersion = serde_json::from_str(&json).unwrap();
            assert_eq!(back, *version);
        }
    }

    #[test]
    fn test_ordering_follows_release_order() {
        assert!(ProxyVersion::V3_2 < ProxyVersion::V3_3);
        assert!(ProxyVersion::V3_3 < ProxyVersion::V3_11);
        assert!(ProxyVersion::V3_11 < ProxyVersion::V3_13);
    }

    proptest! {
        /// Parsing accepts exactly the four release strings.
        #[test]
        fn parse_is_exact(s in "[0-9v.]{0,6}") {
            let known = ProxyVersion::all().iter().any(|v| v.as_str() == s);
            prop_assert_eq!(s.parse::<ProxyVersion>().is_ok(), known);
        }
    }
}
