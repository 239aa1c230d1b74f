//! # Validation Error Taxonomy
//!
//! Every failure this crate reports falls into one of four categories:
//!
//! | Category | Cause | Forwarded to error reporting |
//! |----------|-------|------------------------------|
//! | Configuration | unsupported version, unknown path or kind | no |
//! | Schema | structural mismatch or unparsable document | no |
//! | Semantic | a rule the schema cannot express | no |
//! | Internal | a packaged schema failed to compile | yes |
//!
//! Nothing here is transient. A caller that retries gets the same answer.

use std::fmt;

use mgw_core::{MgwError, ProxyVersion};
use thiserror::Error;

/// Resolution cannot proceed: the caller asked for something the schema
/// repository does not have.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// No schema document exists for the requested version.
    #[error("unsupported gateway version: {0:?}")]
    UnsupportedVersion(String),

    /// A segment of the dotted schema path is missing from the document.
    #[error("schema path {path:?} not found for gateway version {version}")]
    SchemaPathNotFound {
        /// Version whose document was searched.
        version: ProxyVersion,
        /// The dotted path that failed to resolve.
        path: String,
    },

    /// A storage sink name matched no known sink.
    #[error("unknown storage sink: {0:?}")]
    UnknownStorageSink(String),

    /// The path resolves, but its trailing segment names no resource kind.
    #[error("no resource kind for schema path {0:?}")]
    UnknownResourceKind(String),

    /// A resolved schema fragment could not be compiled.
    #[error("failed to compile schema {path:?} for gateway version {version}: {reason}")]
    SchemaCompile {
        /// Version of the document the fragment came from.
        version: ProxyVersion,
        /// The dotted path of the fragment.
        path: String,
        /// Compiler diagnostic.
        reason: String,
    },

    /// A schema document could not be read or parsed.
    #[error("failed to load schema document {path}: {reason}")]
    RepositoryLoad {
        /// File path or packaged document name.
        path: String,
        /// Human-readable reason.
        reason: String,
    },
}

impl From<MgwError> for ConfigurationError {
    fn from(err: MgwError) -> Self {
        match err {
            MgwError::UnsupportedVersion(v) => Self::UnsupportedVersion(v),
            MgwError::UnknownResourceKind(k) => Self::UnknownResourceKind(k),
            MgwError::UnknownStorageSink(s) => Self::UnknownStorageSink(s),
        }
    }
}

/// A rule the structural schema cannot express was broken.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticViolation {
    /// A filter expression in `vars` is malformed.
    #[error("invalid vars expression at index {index}: {reason}")]
    VarsGrammar {
        /// Position of the offending expression.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// `hash_on` names no supported hash source.
    #[error("invalid hash_on type: {0:?}")]
    InvalidHashOn(String),

    /// A consistent-hash source needs a key and none was given.
    #[error("hash_on {hash_on:?} requires a non-empty key")]
    MissingKey {
        /// The hash source that needs the key.
        hash_on: String,
    },

    /// The hash key is not a legal subject for its hash source.
    #[error("invalid key {key:?} for hash_on {hash_on:?}: {reason}")]
    InvalidHashKey {
        /// The hash source.
        hash_on: String,
        /// The rejected key.
        key: String,
        /// Why the key schema rejected it.
        reason: String,
    },

    /// `pass_host: node` needs exactly one node.
    #[error("pass_host \"node\" requires exactly one node, found {count}")]
    InvalidNodeCount {
        /// Number of nodes found.
        count: usize,
    },

    /// `pass_host` is not one of `pass`, `node`, `rewrite`.
    #[error("invalid pass_host: {0:?}")]
    InvalidPassHost(String),

    /// `pass_host: rewrite` needs an `upstream_host`.
    #[error("pass_host \"rewrite\" requires a non-empty upstream_host")]
    MissingUpstreamHost,

    /// A remote address entry is empty.
    #[error("remote address at index {index} is empty")]
    InvalidRemoteAddr {
        /// Position of the empty entry.
        index: usize,
    },
}

/// Failure of one semantic rule, before it is attributed to a document field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// The document broke the rule.
    #[error(transparent)]
    Violation(#[from] SemanticViolation),

    /// The rule needed a schema it could not resolve.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// One structural violation reported by the schema evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolationDetail {
    /// JSON Pointer into the document. Empty for the document root.
    pub instance_path: String,
    /// JSON Pointer into the schema naming the failing constraint.
    pub schema_path: String,
    /// Evaluator message.
    pub message: String,
}

impl fmt::Display for SchemaViolationDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (schema {})",
            root_or(&self.instance_path),
            self.message,
            self.schema_path
        )
    }
}

fn root_or(path: &str) -> &str {
    if path.is_empty() {
        "(root)"
    } else {
        path
    }
}

/// Coarse classification of a [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Caller misconfiguration: wrong version, path, or kind.
    Configuration,
    /// The document does not match its schema or is not JSON.
    Schema,
    /// The document breaks a semantic rule.
    Semantic,
    /// A defect in the packaged schemas themselves.
    Internal,
}

/// Error returned by validator construction and validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Resolution failed.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The raw document is not parsable JSON.
    #[error("invalid JSON document: {0}")]
    MalformedDocument(String),

    /// The document does not match its schema. The top-level fields
    /// describe the first violation; `details` carries up to the
    /// configured number of violations, first one included.
    #[error("schema violation at {}: {message}", root_or(.instance_path))]
    SchemaViolation {
        /// JSON Pointer of the first violation.
        instance_path: String,
        /// Failing constraint of the first violation.
        schema_path: String,
        /// Message of the first violation.
        message: String,
        /// Reported violations, in evaluator order.
        details: Vec<SchemaViolationDetail>,
    },

    /// The document is well-shaped but breaks a semantic rule.
    #[error("{}: {violation}", root_or(.field))]
    Semantic {
        /// Document field the rule inspected; empty for the document itself.
        field: String,
        /// The broken rule.
        violation: SemanticViolation,
    },
}

impl ValidationError {
    /// Builds a schema violation from evaluator details. `details` must not
    /// be empty.
    pub(crate) fn from_details(details: Vec<SchemaViolationDetail>) -> Self {
        let first = details.first().cloned().unwrap_or_else(|| SchemaViolationDetail {
            instance_path: String::new(),
            schema_path: String::new(),
            message: "document rejected".to_string(),
        });
        Self::SchemaViolation {
            instance_path: first.instance_path,
            schema_path: first.schema_path,
            message: first.message,
            details,
        }
    }

    /// Attributes a rule failure to the document field it inspected.
    pub(crate) fn from_rule(field: &str, err: RuleError) -> Self {
        match err {
            RuleError::Violation(violation) => Self::Semantic {
                field: field.to_string(),
                violation,
            },
            RuleError::Configuration(e) => Self::Configuration(e),
        }
    }

    /// Classifies the error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(ConfigurationError::SchemaCompile { .. }) => {
                ErrorCategory::Internal
            }
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::MalformedDocument(_) | Self::SchemaViolation { .. } => ErrorCategory::Schema,
            Self::Semantic { .. } => ErrorCategory::Semantic,
        }
    }

    /// Whether an error-reporting sink should receive this error. Ordinary
    /// rejections of caller documents never qualify.
    pub fn is_internal(&self) -> bool {
        self.category() == ErrorCategory::Internal
    }

    /// The semantic violation, if this is one.
    pub fn semantic_violation(&self) -> Option<&SemanticViolation> {
        match self {
            Self::Semantic { violation, .. } => Some(violation),
            _ => None,
        }
    }
}
