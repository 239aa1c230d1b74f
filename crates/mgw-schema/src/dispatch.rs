//! # Path-Driven Dispatch
//!
//! [`SchemaValidator`] is the entry point for callers that hold a schema
//! path (`main.route`) rather than a [`ResourceKind`]. The kind is derived
//! from the path's trailing segment, and validation always targets the
//! strict runtime store.

use mgw_core::{ProxyVersion, ResourceKind, StorageSink};
use serde_json::Value;

use crate::error::{ConfigurationError, ValidationError};
use crate::resolve::SchemaResolver;
use crate::validate::{ResourceValidator, ValidatorOptions};

/// A [`ResourceValidator`] for the runtime store, selected by schema path.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    inner: ResourceValidator,
}

impl SchemaValidator {
    /// Builds a validator for the resource at `path` over the packaged
    /// schema repository.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::UnsupportedVersion`] for an unknown version.
    /// - [`ConfigurationError::SchemaPathNotFound`] if `path` does not exist
    ///   in the version's document.
    /// - [`ConfigurationError::UnknownResourceKind`] if it exists but does
    ///   not name a resource kind.
    pub fn new(version: ProxyVersion, path: &str) -> Result<Self, ValidationError> {
        let resolver = SchemaResolver::global()?;
        Self::with_resolver(&resolver, version, path)
    }

    /// Like [`new`](Self::new), taking the version as a string.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new).
    pub fn from_version_str(version: &str, path: &str) -> Result<Self, ValidationError> {
        let version: ProxyVersion = version.parse().map_err(ConfigurationError::from)?;
        Self::new(version, path)
    }

    /// Like [`new`](Self::new), over an explicit resolver.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new).
    pub fn with_resolver(
        resolver: &SchemaResolver,
        version: ProxyVersion,
        path: &str,
    ) -> Result<Self, ValidationError> {
        resolver.fragment(version, path)?;
        let kind = ResourceKind::from_path(path).map_err(ConfigurationError::from)?;
        let inner = ResourceValidator::new(
            resolver,
            version,
            kind,
            path,
            ValidatorOptions::default(),
            StorageSink::RuntimeStore,
        )?;
        Ok(Self { inner })
    }

    /// The derived resource kind.
    pub fn kind(&self) -> ResourceKind {
        self.inner.kind()
    }

    /// The underlying resource validator.
    pub fn resource_validator(&self) -> &ResourceValidator {
        &self.inner
    }

    /// Validates a raw JSON document. Same contract as
    /// [`ResourceValidator::validate`].
    ///
    /// # Errors
    ///
    /// As [`ResourceValidator::validate`].
    pub fn validate(&self, raw: impl AsRef<[u8]>) -> Result<(), ValidationError> {
        self.inner.validate(raw)
    }

    /// Validates an already-parsed document.
    ///
    /// # Errors
    ///
    /// As [`ResourceValidator::validate_value`].
    pub fn validate_value(&self, doc: &Value) -> Result<(), ValidationError> {
        self.inner.validate_value(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_dispatches_for_every_version() {
        for version in ProxyVersion::all() {
            for kind in ResourceKind::all() {
                let v = SchemaValidator::new(*version, &kind.schema_path()).unwrap();
                assert_eq!(v.kind(), *kind);
                assert_eq!(v.resource_validator().sink(), StorageSink::RuntimeStore);
            }
        }
    }

    #[test]
    fn test_invalid_version() {
        let err = SchemaValidator::from_version_str("invalid_version", "main.route").unwrap_err();
        assert_eq!(
            err,
            ValidationError::Configuration(ConfigurationError::UnsupportedVersion(
                "invalid_version".into()
            ))
        );
    }

    #[test]
    fn test_invalid_path() {
        let err = SchemaValidator::new(ProxyVersion::V3_11, "invalid.path").unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Configuration(ConfigurationError::SchemaPathNotFound { .. })
        ));
    }

    #[test]
    fn test_path_that_is_not_a_resource() {
        let err = SchemaValidator::new(ProxyVersion::V3_11, "main.upstream_hash_vars_schema")
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::Configuration(ConfigurationError::UnknownResourceKind(
                "main.upstream_hash_vars_schema".into()
            ))
        );
    }

    #[test]
    fn test_dispatch_is_strict() {
        let v = SchemaValidator::new(ProxyVersion::V3_13, "main.consumer").unwrap();
        assert!(v.validate(r#"{"username": "jack"}"#).is_ok());
        assert!(v.validate(r#"{"username": "jack", "test_field": 1}"#).is_err());
    }
}
