//! # Semantic Rules
//!
//! Checks that run after a document has passed its structural schema and
//! that JSON Schema cannot express: filter expression grammar, hash-key
//! subjects, and node topology. Which rules apply is fixed per resource
//! kind:
//!
//! | Kind | Rules, in order |
//! |------|-----------------|
//! | Route | vars, hash key (`upstream`), topology (`upstream`), `remote_addrs`, `remote_addr` |
//! | Service | hash key (`upstream`), topology (`upstream`) |
//! | Upstream | hash key (document), topology (document) |
//! | StreamRoute | hash key (`upstream`), topology (`upstream`), `remote_addr` |
//! | all others | none |
//!
//! The first failing rule wins. Rules never depend on the storage sink.

pub mod remote_addr;
pub mod upstream;
pub mod vars;

use mgw_core::{ProxyVersion, ResourceKind, UpstreamDefinition};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{SchemaViolationDetail, SemanticViolation, ValidationError};
use crate::resolve::SchemaResolver;

pub use remote_addr::check_remote_addr;
pub use upstream::{check_hash_key, check_upstream};
pub use vars::{check_vars, validate_var_item};

/// What the rules need besides the document: the resolver that serves the
/// hash-key subject schemas and the version to resolve them for.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Resolver shared with the structural validator.
    pub resolver: &'a SchemaResolver,
    /// Version the document is validated against.
    pub version: ProxyVersion,
}

/// Where a rule finds the upstream it inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamSource {
    /// An inline upstream under the named top-level field.
    Field(&'static str),
    /// The document is the upstream.
    Document,
}

impl UpstreamSource {
    fn field(&self) -> &'static str {
        match *self {
            Self::Field(name) => name,
            Self::Document => "",
        }
    }

    fn read(&self, doc: &Value) -> Result<Option<UpstreamDefinition>, ValidationError> {
        let value = match self {
            Self::Field(name) => match doc.get(*name) {
                None | Some(Value::Null) => return Ok(None),
                Some(v) => v,
            },
            Self::Document => doc,
        };
        UpstreamDefinition::deserialize(value).map(Some).map_err(|e| {
            ValidationError::from_details(vec![SchemaViolationDetail {
                instance_path: match self {
                    Self::Field(name) => format!("/{name}"),
                    Self::Document => String::new(),
                },
                schema_path: String::new(),
                message: e.to_string(),
            }])
        })
    }
}

/// One semantic rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticRule {
    /// Filter expression grammar of `vars`.
    Vars,
    /// Hash key subject, when `hash_on` is set.
    HashKey(UpstreamSource),
    /// `pass_host` topology and the hash-balancer key.
    UpstreamTopology(UpstreamSource),
    /// Non-empty entries in the named address field.
    RemoteAddr(&'static str),
}

const ROUTE_RULES: &[SemanticRule] = &[
    SemanticRule::Vars,
    SemanticRule::HashKey(UpstreamSource::Field("upstream")),
    SemanticRule::UpstreamTopology(UpstreamSource::Field("upstream")),
    SemanticRule::RemoteAddr("remote_addrs"),
    SemanticRule::RemoteAddr("remote_addr"),
];

const SERVICE_RULES: &[SemanticRule] = &[
    SemanticRule::HashKey(UpstreamSource::Field("upstream")),
    SemanticRule::UpstreamTopology(UpstreamSource::Field("upstream")),
];

const UPSTREAM_RULES: &[SemanticRule] = &[
    SemanticRule::HashKey(UpstreamSource::Document),
    SemanticRule::UpstreamTopology(UpstreamSource::Document),
];

const STREAM_ROUTE_RULES: &[SemanticRule] = &[
    SemanticRule::HashKey(UpstreamSource::Field("upstream")),
    SemanticRule::UpstreamTopology(UpstreamSource::Field("upstream")),
    SemanticRule::RemoteAddr("remote_addr"),
];

impl SemanticRule {
    /// Document field the rule inspects; empty for the document itself.
    pub fn field(&self) -> &'static str {
        match *self {
            Self::Vars => "vars",
            Self::HashKey(source) | Self::UpstreamTopology(source) => source.field(),
            Self::RemoteAddr(field) => field,
        }
    }

    /// Applies the rule to `doc`.
    pub fn check(&self, ctx: &RuleContext<'_>, doc: &Value) -> Result<(), ValidationError> {
        let field = self.field();
        match self {
            Self::Vars => match doc.get("vars") {
                None | Some(Value::Null) => Ok(()),
                Some(Value::Array(vars)) => {
                    check_vars(vars).map_err(|v| ValidationError::from_rule(field, v.into()))
                }
                Some(_) => Err(ValidationError::from_rule(
                    field,
                    SemanticViolation::VarsGrammar {
                        index: 0,
                        reason: "vars must be an array".to_string(),
                    }
                    .into(),
                )),
            },
            Self::HashKey(source) => match source.read(doc)? {
                Some(up) if up.hash_on.is_some() => {
                    check_hash_key(ctx, &up).map_err(|e| ValidationError::from_rule(field, e))
                }
                _ => Ok(()),
            },
            Self::UpstreamTopology(source) => match source.read(doc)? {
                Some(up) => {
                    check_upstream(ctx, &up).map_err(|e| ValidationError::from_rule(field, e))
                }
                None => Ok(()),
            },
            Self::RemoteAddr(name) => match doc.get(*name) {
                None | Some(Value::Null) => Ok(()),
                Some(value) => check_remote_addr(&remote_addr::addresses(value))
                    .map_err(|v| ValidationError::from_rule(field, v.into())),
            },
        }
    }
}

/// The ordered rule set for one resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemanticRules {
    kind: ResourceKind,
    rules: &'static [SemanticRule],
}

impl SemanticRules {
    /// Rules for `kind`.
    pub fn for_kind(kind: ResourceKind) -> Self {
        let rules = match kind {
            ResourceKind::Route => ROUTE_RULES,
            ResourceKind::Service => SERVICE_RULES,
            ResourceKind::Upstream => UPSTREAM_RULES,
            ResourceKind::StreamRoute => STREAM_ROUTE_RULES,
            ResourceKind::Ssl
            | ResourceKind::Consumer
            | ResourceKind::ConsumerGroup
            | ResourceKind::PluginConfig
            | ResourceKind::GlobalRule
            | ResourceKind::PluginMetadata => &[],
        };
        Self { kind, rules }
    }

    /// The kind these rules belong to.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The rules, in evaluation order.
    pub fn rules(&self) -> &'static [SemanticRule] {
        self.rules
    }

    /// Whether the kind has no semantic rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Applies every rule in order, stopping at the first failure.
    pub fn check(&self, ctx: &RuleContext<'_>, doc: &Value) -> Result<(), ValidationError> {
        self.rules.iter().try_for_each(|rule| rule.check(ctx, doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use serde_json::json;

    fn check(kind: ResourceKind, doc: Value) -> Result<(), ValidationError> {
        let resolver = SchemaResolver::global().unwrap();
        let ctx = RuleContext {
            resolver: &resolver,
            version: ProxyVersion::V3_11,
        };
        SemanticRules::for_kind(kind).check(&ctx, &doc)
    }

    #[test]
    fn test_rule_table() {
        assert_eq!(SemanticRules::for_kind(ResourceKind::Route).rules().len(), 5);
        assert_eq!(SemanticRules::for_kind(ResourceKind::Service).rules().len(), 2);
        assert_eq!(SemanticRules::for_kind(ResourceKind::Upstream).rules().len(), 2);
        assert_eq!(SemanticRules::for_kind(ResourceKind::StreamRoute).rules().len(), 3);
        for kind in [
            ResourceKind::Ssl,
            ResourceKind::Consumer,
            ResourceKind::ConsumerGroup,
            ResourceKind::PluginConfig,
            ResourceKind::GlobalRule,
            ResourceKind::PluginMetadata,
        ] {
            assert!(SemanticRules::for_kind(kind).is_empty(), "{kind}");
        }
    }

    #[test]
    fn test_rules_only_touch_upstream_carrying_kinds() {
        for kind in ResourceKind::all() {
            let rules = SemanticRules::for_kind(*kind);
            let touches_upstream = rules.rules().iter().any(|r| {
                matches!(
                    r,
                    SemanticRule::HashKey(_) | SemanticRule::UpstreamTopology(_)
                )
            });
            assert_eq!(touches_upstream, kind.carries_upstream(), "{kind}");
        }
    }

    #[test]
    fn test_route_vars_violation_is_attributed() {
        let err = check(
            ResourceKind::Route,
            json!({"uri": "/a", "vars": [["arg_id", "invalid_op", "1"]]}),
        )
        .unwrap_err();
        match err {
            ValidationError::Semantic { field, violation } => {
                assert_eq!(field, "vars");
                assert!(matches!(violation, SemanticViolation::VarsGrammar { index: 0, .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_route_rule_order() {
        // Both vars and upstream are bad; vars is checked first.
        let err = check(
            ResourceKind::Route,
            json!({
                "uri": "/a",
                "vars": [["arg_id"]],
                "upstream": {"pass_host": "rewrite", "nodes": {"127.0.0.1:80": 1}}
            }),
        )
        .unwrap_err();
        assert!(matches!(
            err.semantic_violation(),
            Some(SemanticViolation::VarsGrammar { .. })
        ));
    }

    #[test]
    fn test_route_upstream_topology() {
        let err = check(
            ResourceKind::Route,
            json!({"uri": "/a", "upstream": {"pass_host": "rewrite", "nodes": {"127.0.0.1:80": 1}}}),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::Semantic {
                field: "upstream".into(),
                violation: SemanticViolation::MissingUpstreamHost,
            }
        );
    }

    #[test]
    fn test_route_remote_addrs() {
        let err = check(
            ResourceKind::Route,
            json!({"uri": "/a", "remote_addrs": ["127.0.0.1", ""]}),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::Semantic {
                field: "remote_addrs".into(),
                violation: SemanticViolation::InvalidRemoteAddr { index: 1 },
            }
        );
        assert!(check(ResourceKind::Route, json!({"uri": "/a", "remote_addr": "10.0.0.1"})).is_ok());
    }

    #[test]
    fn test_stream_route_remote_addr_forms() {
        assert!(check(ResourceKind::StreamRoute, json!({"remote_addr": "127.0.0.1"})).is_ok());
        assert!(check(
            ResourceKind::StreamRoute,
            json!({"remote_addr": ["127.0.0.1", "10.0.0.0/8"]})
        )
        .is_ok());
        let err = check(ResourceKind::StreamRoute, json!({"remote_addr": ""})).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Semantic);
    }

    #[test]
    fn test_upstream_document_rules_use_root_field() {
        let err = check(
            ResourceKind::Upstream,
            json!({"type": "chash", "nodes": {"127.0.0.1:80": 1}}),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::Semantic {
                field: String::new(),
                violation: SemanticViolation::MissingKey {
                    hash_on: "vars".into()
                },
            }
        );
    }

    #[test]
    fn test_hash_key_rule_requires_hash_on() {
        // Without hash_on and without chash, no hash rule fires.
        assert!(check(
            ResourceKind::Service,
            json!({"upstream": {"type": "roundrobin", "nodes": {"127.0.0.1:80": 1}}})
        )
        .is_ok());
        let err = check(
            ResourceKind::Service,
            json!({"upstream": {"hash_on": "bogus", "nodes": {"127.0.0.1:80": 1}}}),
        )
        .unwrap_err();
        assert_eq!(
            err.semantic_violation(),
            Some(&SemanticViolation::InvalidHashOn("bogus".into()))
        );
    }

    #[test]
    fn test_kinds_without_rules_accept_anything() {
        assert!(check(ResourceKind::Ssl, json!({"vars": "nonsense", "upstream": 1})).is_ok());
    }

    #[test]
    fn test_non_array_vars() {
        let err = check(ResourceKind::Route, json!({"uri": "/a", "vars": "x"})).unwrap_err();
        assert!(matches!(
            err.semantic_violation(),
            Some(SemanticViolation::VarsGrammar { .. })
        ));
    }

    #[test]
    fn test_integral_float_node_numbers() {
        assert!(check(
            ResourceKind::Upstream,
            json!({"type": "roundrobin", "nodes": [{"host": "127.0.0.1", "port": 80, "weight": 1.0}]})
        )
        .is_ok());
        assert!(check(
            ResourceKind::Route,
            json!({
                "uri": "/a",
                "upstream": {
                    "pass_host": "node",
                    "nodes": [{"host": "127.0.0.1", "port": 80.0, "weight": 1}]
                }
            })
        )
        .is_ok());
    }

    #[test]
    fn test_unreadable_upstream_is_schema_violation() {
        let resolver = SchemaResolver::global().unwrap();
        let ctx = RuleContext {
            resolver: &resolver,
            version: ProxyVersion::V3_11,
        };
        let rule = SemanticRule::UpstreamTopology(UpstreamSource::Field("upstream"));
        match rule.check(&ctx, &json!({"upstream": {"nodes": "x"}})).unwrap_err() {
            ValidationError::SchemaViolation { instance_path, .. } => {
                assert_eq!(instance_path, "/upstream");
            }
            other => panic!("unexpected {other:?}"),
        }

        let rule = SemanticRule::HashKey(UpstreamSource::Document);
        let err = rule.check(&ctx, &json!({"hash_on": 1})).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Schema);
    }
}
