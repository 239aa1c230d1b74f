//! # Resource Kinds
//!
//! Defines the `ResourceKind` enum with the ten categories of gateway
//! configuration object. Every `match` on `ResourceKind` is exhaustive:
//! adding a kind forces the schema resolver and the semantic rule table to
//! handle it at compile time.
//!
//! Each kind lives at a fixed dotted path inside its version's schema
//! document: `main.<name>`.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::MgwError;

/// Prefix shared by every resource schema path.
pub const RESOURCE_PATH_PREFIX: &str = "main";

/// Categories of gateway configuration object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// HTTP route: request matching plus plugins and upstream binding.
    Route,
    /// Service: reusable plugin and upstream bundle shared by routes.
    Service,
    /// Upstream: backend node set and load-balancing policy.
    Upstream,
    /// TLS certificate and key bound to SNIs.
    Ssl,
    /// Consumer: an authenticated API caller.
    Consumer,
    /// Consumer group: plugins shared by a set of consumers.
    ConsumerGroup,
    /// Plugin config: a reusable plugin set bound by routes.
    PluginConfig,
    /// Global rule: plugins applied to every request.
    GlobalRule,
    /// Plugin metadata: process-wide configuration of one plugin.
    PluginMetadata,
    /// Stream route: L4 (TCP/UDP) proxy route.
    StreamRoute,
}

impl ResourceKind {
    /// Returns all resource kinds in canonical order.
    pub fn all() -> &'static [ResourceKind] {
        &[
            Self::Route,
            Self::Service,
            Self::Upstream,
            Self::Ssl,
            Self::Consumer,
            Self::ConsumerGroup,
            Self::PluginConfig,
            Self::GlobalRule,
            Self::PluginMetadata,
            Self::StreamRoute,
        ]
    }

    /// Returns the snake_case name, matching the serde format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Route => "route",
            Self::Service => "service",
            Self::Upstream => "upstream",
            Self::Ssl => "ssl",
            Self::Consumer => "consumer",
            Self::ConsumerGroup => "consumer_group",
            Self::PluginConfig => "plugin_config",
            Self::GlobalRule => "global_rule",
            Self::PluginMetadata => "plugin_metadata",
            Self::StreamRoute => "stream_route",
        }
    }

    /// Returns the dotted schema path of this kind, e.g. `main.route`.
    pub fn schema_path(&self) -> String {
        format!("{RESOURCE_PATH_PREFIX}.{}", self.as_str())
    }

    /// Derives the resource kind from the trailing segment of a dotted path.
    ///
    /// `"main.consumer_group"` yields [`ResourceKind::ConsumerGroup`]. Only
    /// the last segment is inspected; whether the full path exists in a
    /// schema document is the resolver's concern.
    pub fn from_path(path: &str) -> Result<Self, MgwError> {
        let last = path.rsplit('.').next().unwrap_or(path);
        last.parse()
            .map_err(|_| MgwError::UnknownResourceKind(path.to_string()))
    }

    /// Whether documents of this kind carry an upstream definition, either
    /// inline under `upstream` or as the document itself.
    pub fn carries_upstream(&self) -> bool {
        matches!(
            self,
            Self::Route | Self::Service | Self::Upstream | Self::StreamRoute
        )
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = MgwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "route" => Ok(Self::Route),
            "service" => Ok(Self::Service),
            "upstream" => Ok(Self::Upstream),
            "ssl" => Ok(Self::Ssl),
            "consumer" => Ok(Self::Consumer),
            "consumer_group" => Ok(Self::ConsumerGroup),
            "plugin_config" => Ok(Self::PluginConfig),
            "global_rule" => Ok(Self::GlobalRule),
            "plugin_metadata" => Ok(Self::PluginMetadata),
            "stream_route" => Ok(Self::StreamRoute),
            other => Err(MgwError::UnknownResourceKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_kinds_unique() {
        let mut seen = std::collections::HashSet::new();
        for kind in ResourceKind::all() {
            assert!(seen.insert(kind.as_str()), "Duplicate kind: {kind}");
        }
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn test_as_str_roundtrip() {
        for kind in ResourceKind::all() {
            let parsed: ResourceKind = kind.as_str().parse().unwrap();
            assert_eq!(*kind, parsed);
        }
    }

    #[test]
    fn test_schema_path() {
        assert_eq!(ResourceKind::Route.schema_path(), "main.route");
        assert_eq!(ResourceKind::StreamRoute.schema_path(), "main.stream_route");
        assert_eq!(
            ResourceKind::PluginMetadata.schema_path(),
            "main.plugin_metadata"
        );
    }

    #[test]
    fn test_from_path_uses_trailing_segment() {
        for kind in ResourceKind::all() {
            assert_eq!(ResourceKind::from_path(&kind.schema_path()).unwrap(), *kind);
        }
        assert_eq!(ResourceKind::from_path("ssl").unwrap(), ResourceKind::Ssl);
    }

    #[test]
    fn test_from_path_unknown() {
        let err = ResourceKind::from_path("invalid.path").unwrap_err();
        assert_eq!(err, MgwError::UnknownResourceKind("invalid.path".into()));
        assert!(ResourceKind::from_path("").is_err());
        assert!(ResourceKind::from_path("main.Route").is_err());
    }

    #[test]
    fn test_serde_format_matches_as_str() {
        for kind in ResourceKind::all() {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_carries_upstream() {
        let carrying: Vec<_> = ResourceKind::all()
            .iter()
            .filter(|k| k.carries_upstream())
            .collect();
        assert_eq!(
            carrying,
            [
                &ResourceKind::Route,
                &ResourceKind::Service,
                &ResourceKind::Upstream,
                &ResourceKind::StreamRoute
            ]
        );
    }
}
