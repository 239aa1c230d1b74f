//! # Resource Validation
//!
//! [`ResourceValidator`] binds one compiled resource schema to the semantic
//! rules of its kind. Validation runs in two phases:
//!
//! 1. **Structural.** The raw bytes are parsed as JSON and checked against
//!    the schema resolved for (version, kind, path, sink). Any violation
//!    ends validation here.
//! 2. **Semantic.** The kind's [`SemanticRules`] run in order; the first
//!    failure is returned.
//!
//! A validator is immutable after construction and holds only shared
//! handles, so one instance can serve any number of threads.

use std::sync::Arc;

use mgw_core::{ProxyVersion, ResourceKind, StorageSink};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::resolve::{ResolvedSchema, SchemaResolver};
use crate::rules::{RuleContext, SemanticRules};

/// Default cap on reported structural violations.
pub const DEFAULT_MAX_REPORTED_VIOLATIONS: usize = 8;

/// Tuning knobs for a [`ResourceValidator`]. None of them change whether a
/// document passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorOptions {
    /// Structural violations to collect into the `details` of a
    /// [`ValidationError::SchemaViolation`]. Values below 1 are treated
    /// as 1.
    pub max_reported_violations: usize,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            max_reported_violations: DEFAULT_MAX_REPORTED_VIOLATIONS,
        }
    }
}

impl ValidatorOptions {
    /// Sets the violation cap.
    pub fn with_max_reported_violations(mut self, max: usize) -> Self {
        self.max_reported_violations = max;
        self
    }

    fn violation_limit(&self) -> usize {
        self.max_reported_violations.max(1)
    }
}

/// Validates documents of one resource kind for one gateway version and
/// storage sink.
#[derive(Debug, Clone)]
pub struct ResourceValidator {
    kind: ResourceKind,
    schema: Arc<ResolvedSchema>,
    rules: SemanticRules,
    options: ValidatorOptions,
    resolver: SchemaResolver,
}

impl ResourceValidator {
    /// Builds a validator for `kind` whose schema lives at `path` in the
    /// document for `version`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Configuration`] if the schema cannot be
    /// resolved.
    pub fn new(
        resolver: &SchemaResolver,
        version: ProxyVersion,
        kind: ResourceKind,
        path: &str,
        options: ValidatorOptions,
        sink: StorageSink,
    ) -> Result<Self, ValidationError> {
        let schema = resolver.resolve(version, kind, path, sink)?;
        tracing::debug!(%version, %kind, path, %sink, "built resource validator");
        Ok(Self {
            kind,
            schema,
            rules: SemanticRules::for_kind(kind),
            options,
            resolver: resolver.clone(),
        })
    }

    /// Like [`new`](Self::new), over the packaged schema repository.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new), plus any error from building the packaged
    /// resolver.
    pub fn packaged(
        version: ProxyVersion,
        kind: ResourceKind,
        path: &str,
        options: ValidatorOptions,
        sink: StorageSink,
    ) -> Result<Self, ValidationError> {
        let resolver = SchemaResolver::global()?;
        Self::new(&resolver, version, kind, path, options, sink)
    }

    /// Gateway version the validator checks against.
    pub fn version(&self) -> ProxyVersion {
        self.schema.version()
    }

    /// Resource kind the validator checks.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Storage sink whose strictness applies.
    pub fn sink(&self) -> StorageSink {
        self.schema.sink().unwrap_or_default()
    }

    /// The compiled schema.
    pub fn schema(&self) -> &ResolvedSchema {
        &self.schema
    }

    /// The options in effect.
    pub fn options(&self) -> ValidatorOptions {
        self.options
    }

    /// Validates a raw JSON document.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::MalformedDocument`] if `raw` is not JSON.
    /// - [`ValidationError::SchemaViolation`] on structural mismatch.
    /// - [`ValidationError::Semantic`] if a semantic rule fails.
    /// - [`ValidationError::Configuration`] if a rule cannot resolve a schema
    ///   it needs.
    pub fn validate(&self, raw: impl AsRef<[u8]>) -> Result<(), ValidationError> {
        let doc: Value = serde_json::from_slice(raw.as_ref())
            .map_err(|e| ValidationError::MalformedDocument(e.to_string()))?;
        self.validate_value(&doc)
    }

    /// Validates an already-parsed document.
    ///
    /// # Errors
    ///
    /// As [`validate`](Self::validate), except for malformed input.
    pub fn validate_value(&self, doc: &Value) -> Result<(), ValidationError> {
        self.check_structure(doc)?;
        let ctx = RuleContext {
            resolver: &self.resolver,
            version: self.version(),
        };
        self.rules.check(&ctx, doc).inspect_err(|e| {
            tracing::debug!(kind = %self.kind, error = %e, "semantic check failed");
        })
    }

    /// Runs only the structural phase.
    ///
    /// # Errors
    ///
    /// [`ValidationError::SchemaViolation`] on structural mismatch.
    pub fn check_structure(&self, doc: &Value) -> Result<(), ValidationError> {
        if self.schema.is_valid(doc) {
            return Ok(());
        }
        let details = self
            .schema
            .violations(doc, self.options.violation_limit());
        let err = ValidationError::from_details(details);
        tracing::debug!(kind = %self.kind, error = %err, "structural check failed");
        Err(err)
    }
}
