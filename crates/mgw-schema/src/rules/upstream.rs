//! Upstream rules: consistent-hash keys and host-forwarding topology.

use mgw_core::UpstreamDefinition;
use serde_json::Value;

use crate::error::{RuleError, SemanticViolation};
use crate::resolve::{HASH_HEADER_SCHEMA_PATH, HASH_VARS_SCHEMA_PATH};
use crate::rules::RuleContext;

/// Hash source that needs no key.
pub const HASH_ON_CONSUMER: &str = "consumer";

/// Checks the hash key against the subject schema for its `hash_on` source.
///
/// `consumer` needs no key. `vars` keys must name a gateway variable;
/// `header` and `cookie` keys must be a plain header or cookie name.
pub fn check_hash_key(ctx: &RuleContext<'_>, upstream: &UpstreamDefinition) -> Result<(), RuleError> {
    let hash_on = upstream.effective_hash_on();
    let subject_path = match hash_on {
        HASH_ON_CONSUMER => return Ok(()),
        "vars" => HASH_VARS_SCHEMA_PATH,
        "header" | "cookie" => HASH_HEADER_SCHEMA_PATH,
        other => return Err(SemanticViolation::InvalidHashOn(other.to_string()).into()),
    };

    let key = upstream.key_str();
    if key.is_empty() {
        return Err(SemanticViolation::MissingKey {
            hash_on: hash_on.to_string(),
        }
        .into());
    }

    let schema = ctx.resolver.resolve_fragment(ctx.version, subject_path)?;
    if let Some(violation) = schema
        .violations(&Value::String(key.to_string()), 1)
        .into_iter()
        .next()
    {
        return Err(SemanticViolation::InvalidHashKey {
            hash_on: hash_on.to_string(),
            key: key.to_string(),
            reason: violation.message,
        }
        .into());
    }
    Ok(())
}

/// Checks `pass_host` against the node set and, for hash balancers, the key.
///
/// The key is checked against its subject schema only when `hash_on` is
/// defaulted. An explicit `hash_on` is left to the hash key rule, which
/// runs first in every rule table.
pub fn check_upstream(ctx: &RuleContext<'_>, upstream: &UpstreamDefinition) -> Result<(), RuleError> {
    match upstream.pass_host.as_deref() {
        None | Some("pass") => {}
        Some("node") => {
            if !upstream.uses_discovery() {
                let count = upstream.node_count().unwrap_or(0);
                if count != 1 {
                    return Err(SemanticViolation::InvalidNodeCount { count }.into());
                }
            }
        }
        Some("rewrite") => {
            if upstream.upstream_host.as_deref().unwrap_or("").is_empty() {
                return Err(SemanticViolation::MissingUpstreamHost.into());
            }
        }
        Some(other) => return Err(SemanticViolation::InvalidPassHost(other.to_string()).into()),
    }

    if upstream.is_hash_balanced() {
        let hash_on = upstream.effective_hash_on();
        if hash_on != HASH_ON_CONSUMER && upstream.key_str().is_empty() {
            return Err(SemanticViolation::MissingKey {
                hash_on: hash_on.to_string(),
            }
            .into());
        }
        if upstream.hash_on.is_none() {
            check_hash_key(ctx, upstream)?;
        }
    }

    Ok(())
}
