//! # Upstream Definitions
//!
//! The upstream shape read by the semantic rule set: node list,
//! host-forwarding policy, and consistent-hash fields. The control plane
//! does not own upstreams. It only inspects documents that callers submit,
//! so every field is optional and unknown fields are ignored.
//!
//! Nodes come in two wire forms, both accepted by the gateway:
//!
//! ```json
//! {"nodes": [{"host": "10.0.0.1", "port": 80, "weight": 1}]}
//! {"nodes": {"10.0.0.1:80": 1}}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Balancer type that selects nodes by consistent hashing.
pub const CHASH_BALANCER: &str = "chash";

/// Default `hash_on` source when a hash balancer omits it.
pub const DEFAULT_HASH_ON: &str = "vars";

/// An upstream definition, inline or standalone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamDefinition {
    /// Backend nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Nodes>,
    /// Load-balancing algorithm (`roundrobin`, `chash`, `ewma`, `least_conn`).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub balancer: Option<String>,
    /// Request attribute source for consistent hashing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_on: Option<String>,
    /// Consistent-hash key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Host header forwarding policy (`pass`, `node`, `rewrite`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_host: Option<String>,
    /// Host header used when `pass_host` is `rewrite`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_host: Option<String>,
    /// Service discovery name, for upstreams without static nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
}

/// Node set in either of its wire forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Nodes {
    /// `[{"host": ..., "port": ..., "weight": ...}]`
    List(Vec<Node>),
    /// `{"host:port": weight}`
    Map(BTreeMap<String, serde_json::Value>),
}

impl Nodes {
    /// Number of nodes, whichever form they take.
    pub fn len(&self) -> usize {
        match self {
            Self::List(nodes) => nodes.len(),
            Self::Map(nodes) => nodes.len(),
        }
    }

    /// Whether the node set is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single backend node.
///
/// Numeric fields keep the JSON number as written, since schema `integer`
/// admits integral floats such as `80.0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Host name or IP address.
    pub host: String,
    /// Port; the gateway picks the scheme default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<Number>,
    /// Relative weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Number>,
    /// Failover priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Number>,
}

impl UpstreamDefinition {
    /// Number of static nodes, or `None` when the document carries no node
    /// list at all.
    pub fn node_count(&self) -> Option<usize> {
        self.nodes.as_ref().map(Nodes::len)
    }

    /// Whether the upstream balances by consistent hashing.
    pub fn is_hash_balanced(&self) -> bool {
        self.balancer.as_deref() == Some(CHASH_BALANCER)
    }

    /// The `hash_on` source, falling back to the gateway default.
    pub fn effective_hash_on(&self) -> &str {
        self.hash_on.as_deref().unwrap_or(DEFAULT_HASH_ON)
    }

    /// The hash key, treating an absent key as empty.
    pub fn key_str(&self) -> &str {
        self.key.as_deref().unwrap_or("")
    }

    /// Whether nodes come from service discovery rather than a static list.
    pub fn uses_discovery(&self) -> bool {
        self.nodes.is_none() && self.service_name.as_deref().is_some_and(|s| !s.is_empty())
    }
}
