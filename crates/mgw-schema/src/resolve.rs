//! # Schema Resolution
//!
//! Turns a (version, resource kind, dotted path, storage sink) selector
//! into a compiled schema. Resolution walks the version's document along
//! the dotted path (`main.route` is `document["main"]["route"]`), applies
//! the sink's transform, and compiles the fragment as JSON Schema draft 7.
//!
//! ## Sink transform
//!
//! For [`StorageSink::RuntimeStore`] the fragment's top level gets
//! `additionalProperties: false`, provided it declares `properties` and
//! does not already set `additionalProperties`. Only the top level changes.
//! Nested objects, including an embedded upstream pulled in by `$ref`,
//! keep whatever their definition says. [`StorageSink::DraftStore`] leaves
//! the fragment untouched.
//!
//! ## Precompilation
//!
//! Every (version, kind, sink) combination at its default path, plus the
//! hash-key subject schemas, is compiled when the resolver is built. The
//! table is immutable afterwards, so lookups need no locking. Selectors
//! outside the table (non-default paths) are compiled on demand and not
//! cached.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use mgw_core::{ProxyVersion, ResourceKind, StorageSink};
use serde_json::Value;

use crate::error::{ConfigurationError, SchemaViolationDetail};
use crate::repository::SchemaRepository;

/// Dotted path of the schema for `hash_on: vars` keys.
pub const HASH_VARS_SCHEMA_PATH: &str = "main.upstream_hash_vars_schema";

/// Dotted path of the schema for `hash_on: header` and `hash_on: cookie` keys.
pub const HASH_HEADER_SCHEMA_PATH: &str = "main.upstream_hash_header_schema";

const FRAGMENT_PATHS: &[&str] = &[HASH_VARS_SCHEMA_PATH, HASH_HEADER_SCHEMA_PATH];

static GLOBAL: LazyLock<Result<SchemaResolver, ConfigurationError>> = LazyLock::new(|| {
    let resolver = SchemaRepository::packaged().and_then(SchemaResolver::new);
    if let Err(e) = &resolver {
        tracing::error!(error = %e, "packaged schema repository is unusable");
    }
    resolver
});

/// A compiled schema fragment together with the selector that produced it.
pub struct ResolvedSchema {
    version: ProxyVersion,
    path: String,
    sink: Option<StorageSink>,
    text: String,
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for ResolvedSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSchema")
            .field("version", &self.version)
            .field("path", &self.path)
            .field("sink", &self.sink)
            .finish()
    }
}

impl ResolvedSchema {
    /// Version of the document the fragment came from.
    pub fn version(&self) -> ProxyVersion {
        self.version
    }

    /// Dotted path of the fragment.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Sink whose transform was applied, or `None` for raw fragments.
    pub fn sink(&self) -> Option<StorageSink> {
        self.sink
    }

    /// The fragment as compiled, serialized as compact JSON.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether `instance` satisfies the schema.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Up to `limit` violations, in evaluator order. Empty when the instance
    /// is valid.
    pub fn violations(&self, instance: &Value, limit: usize) -> Vec<SchemaViolationDetail> {
        self.validator
            .iter_errors(instance)
            .take(limit)
            .map(|err| SchemaViolationDetail {
                instance_path: err.instance_path.to_string(),
                schema_path: err.schema_path.to_string(),
                message: err.to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ResourceKey {
    version: ProxyVersion,
    kind: ResourceKind,
    sink: StorageSink,
}

#[derive(Debug)]
struct ResolverInner {
    repository: Arc<SchemaRepository>,
    resources: HashMap<ResourceKey, Arc<ResolvedSchema>>,
    fragments: HashMap<(ProxyVersion, &'static str), Arc<ResolvedSchema>>,
}

/// Resolves and compiles schema fragments from a [`SchemaRepository`].
///
/// Cloning is cheap; clones share the repository and the precompiled table.
#[derive(Debug, Clone)]
pub struct SchemaResolver {
    inner: Arc<ResolverInner>,
}

impl SchemaResolver {
    /// Builds a resolver over `repository`, precompiling every resource kind
    /// at its default path for both sinks and every hash-key subject schema.
    /// Kinds a document does not define are skipped; resolving them later
    /// reports [`ConfigurationError::SchemaPathNotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::SchemaCompile`] if a fragment the
    /// document does define fails to compile.
    pub fn new(repository: Arc<SchemaRepository>) -> Result<Self, ConfigurationError> {
        let mut resources = HashMap::new();
        let mut fragments = HashMap::new();

        for version in repository.versions() {
            for kind in ResourceKind::all() {
                let path = kind.schema_path();
                for sink in StorageSink::all() {
                    match compile(&repository, version, &path, Some(*sink)) {
                        Ok(schema) => {
                            let key = ResourceKey {
                                version,
                                kind: *kind,
                                sink: *sink,
                            };
                            resources.insert(key, Arc::new(schema));
                        }
                        Err(ConfigurationError::SchemaPathNotFound { .. }) => {
                            tracing::debug!(%version, %path, "resource kind not defined");
                            break;
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
            for path in FRAGMENT_PATHS {
                match compile(&repository, version, path, None) {
                    Ok(schema) => {
                        fragments.insert((version, *path), Arc::new(schema));
                    }
                    Err(ConfigurationError::SchemaPathNotFound { .. }) => {
                        tracing::debug!(%version, %path, "fragment not defined");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        tracing::debug!(
            versions = repository.len(),
            resources = resources.len(),
            fragments = fragments.len(),
            "precompiled resource schemas"
        );

        Ok(Self {
            inner: Arc::new(ResolverInner {
                repository,
                resources,
                fragments,
            }),
        })
    }

    /// The process-wide resolver over the packaged repository, built on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns the error that building it produced. Every later call
    /// returns the same error.
    pub fn global() -> Result<Self, ConfigurationError> {
        GLOBAL.as_ref().cloned().map_err(Clone::clone)
    }

    /// The repository this resolver reads from.
    pub fn repository(&self) -> &SchemaRepository {
        &self.inner.repository
    }

    /// Resolves the schema for a resource of `kind` located at `path` in the
    /// document for `version`, with the transform for `sink` applied.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::UnsupportedVersion`] if the repository has no
    ///   document for `version`.
    /// - [`ConfigurationError::SchemaPathNotFound`] if a path segment is
    ///   missing.
    /// - [`ConfigurationError::SchemaCompile`] if the fragment does not
    ///   compile.
    pub fn resolve(
        &self,
        version: ProxyVersion,
        kind: ResourceKind,
        path: &str,
        sink: StorageSink,
    ) -> Result<Arc<ResolvedSchema>, ConfigurationError> {
        if path == kind.schema_path() {
            let key = ResourceKey {
                version,
                kind,
                sink,
            };
            if let Some(schema) = self.inner.resources.get(&key) {
                return Ok(Arc::clone(schema));
            }
        }
        compile(&self.inner.repository, version, path, Some(sink)).map(Arc::new)
    }

    /// Like [`resolve`](Self::resolve), taking the version as a string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnsupportedVersion`] if `version` is not
    /// a supported release string, otherwise as [`resolve`](Self::resolve).
    pub fn resolve_str(
        &self,
        version: &str,
        kind: ResourceKind,
        path: &str,
        sink: StorageSink,
    ) -> Result<Arc<ResolvedSchema>, ConfigurationError> {
        let version: ProxyVersion = version.parse()?;
        self.resolve(version, kind, path, sink)
    }

    /// Resolves a fragment that is not a resource schema, such as the
    /// hash-key subject schemas. No sink transform is applied.
    ///
    /// # Errors
    ///
    /// As [`resolve`](Self::resolve).
    pub fn resolve_fragment(
        &self,
        version: ProxyVersion,
        path: &str,
    ) -> Result<Arc<ResolvedSchema>, ConfigurationError> {
        if let Some(schema) = FRAGMENT_PATHS
            .iter()
            .find(|p| **p == path)
            .and_then(|p| self.inner.fragments.get(&(version, *p)))
        {
            return Ok(Arc::clone(schema));
        }
        compile(&self.inner.repository, version, path, None).map(Arc::new)
    }

    /// Returns the raw fragment at `path`, without transform or compilation.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::UnsupportedVersion`] or
    /// [`ConfigurationError::SchemaPathNotFound`].
    pub fn fragment(&self, version: ProxyVersion, path: &str) -> Result<&Value, ConfigurationError> {
        lookup(&self.inner.repository, version, path)
    }
}

fn lookup<'a>(
    repository: &'a SchemaRepository,
    version: ProxyVersion,
    path: &str,
) -> Result<&'a Value, ConfigurationError> {
    let document = repository.document(version)?;
    let not_found = || ConfigurationError::SchemaPathNotFound {
        version,
        path: path.to_string(),
    };
    let fragment = path
        .split('.')
        .try_fold(document, |node, segment| {
            if segment.is_empty() {
                None
            } else {
                node.get(segment)
            }
        })
        .ok_or_else(not_found)?;
    // Only objects and booleans are schemas.
    if fragment.is_object() || fragment.is_boolean() {
        Ok(fragment)
    } else {
        Err(not_found())
    }
}

/// Closes the top level of `schema` to undeclared properties when the sink
/// requires it.
fn apply_sink_transform(schema: &mut Value, sink: StorageSink) {
    if !sink.rejects_unknown_properties() {
        return;
    }
    if let Some(object) = schema.as_object_mut() {
        if object.contains_key("properties") && !object.contains_key("additionalProperties") {
            object.insert("additionalProperties".to_string(), Value::Bool(false));
        }
    }
}

fn compile(
    repository: &SchemaRepository,
    version: ProxyVersion,
    path: &str,
    sink: Option<StorageSink>,
) -> Result<ResolvedSchema, ConfigurationError> {
    let mut schema = lookup(repository, version, path)?.clone();
    if let Some(sink) = sink {
        apply_sink_transform(&mut schema, sink);
    }

    let validator = jsonschema::options()
        .with_draft(jsonschema::Draft::Draft7)
        .with_retriever(repository.retriever())
        .build(&schema)
        .map_err(|e| ConfigurationError::SchemaCompile {
            version,
            path: path.to_string(),
            reason: e.to_string(),
        })?;

    Ok(ResolvedSchema {
        version,
        path: path.to_string(),
        sink,
        text: schema.to_string(),
        validator,
    })
}
