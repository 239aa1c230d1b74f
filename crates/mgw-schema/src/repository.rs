//! # Schema Repository
//!
//! Holds one JSON Schema document per supported gateway release. Each
//! document has the shape
//!
//! ```json
//! {
//!   "$schema": "http://json-schema.org/draft-07/schema#",
//!   "$id": "https://schemas.mgw.dev/apisix/3.11/schema.json",
//!   "definitions": { ... },
//!   "main": { "route": { ... }, "upstream": { ... }, ... }
//! }
//! ```
//!
//! The packaged documents are embedded in the binary and parsed once on
//! first use. A repository can also be loaded from a directory of
//! `apisix-<version>.json` files, which is how operators pin a schema set
//! that differs from the packaged one.
//!
//! ## `$ref` resolution
//!
//! Fragments reference shared definitions through the absolute `$id` of
//! their document (`https://schemas.mgw.dev/apisix/3.11/schema.json#/definitions/host_def`).
//! The repository serves those URIs from memory through
//! [`LocalSchemaRetriever`]; nothing is fetched over the network.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, LazyLock};

use mgw_core::ProxyVersion;
use serde_json::Value;

use crate::error::ConfigurationError;

/// URI prefix of every packaged schema document.
pub const SCHEMA_URI_PREFIX: &str = "https://schemas.mgw.dev/apisix/";

/// File name prefix of schema documents on disk: `apisix-<version>.json`.
const FILE_PREFIX: &str = "apisix-";

const PACKAGED: &[(ProxyVersion, &str)] = &[
    (
        ProxyVersion::V3_2,
        include_str!("../schemas/apisix-3.2.json"),
    ),
    (
        ProxyVersion::V3_3,
        include_str!("../schemas/apisix-3.3.json"),
    ),
    (
        ProxyVersion::V3_11,
        include_str!("../schemas/apisix-3.11.json"),
    ),
    (
        ProxyVersion::V3_13,
        include_str!("../schemas/apisix-3.13.json"),
    ),
];

static PACKAGED_REPOSITORY: LazyLock<Result<Arc<SchemaRepository>, ConfigurationError>> =
    LazyLock::new(|| {
        let mut documents = Vec::with_capacity(PACKAGED.len());
        for (version, text) in PACKAGED {
            let document: Value =
                serde_json::from_str(text).map_err(|e| ConfigurationError::RepositoryLoad {
                    path: format!("<packaged {FILE_PREFIX}{version}.json>"),
                    reason: e.to_string(),
                })?;
            documents.push((*version, document));
        }
        Ok(Arc::new(SchemaRepository::from_documents(documents)))
    });

/// Returns the `$id` URI of the packaged document for `version`.
pub fn schema_uri(version: ProxyVersion) -> String {
    format!("{SCHEMA_URI_PREFIX}{version}/schema.json")
}

/// Immutable mapping from gateway release to its schema document.
#[derive(Debug)]
pub struct SchemaRepository {
    documents: BTreeMap<ProxyVersion, Value>,
    /// Every document again, keyed by `$id`, shared with retrievers.
    by_uri: Arc<HashMap<String, Value>>,
}

impl SchemaRepository {
    /// Builds a repository from already-parsed documents. A document without
    /// an `$id` is registered under [`schema_uri`] of its version.
    pub fn from_documents(documents: impl IntoIterator<Item = (ProxyVersion, Value)>) -> Self {
        let documents: BTreeMap<ProxyVersion, Value> = documents.into_iter().collect();
        let by_uri = documents
            .iter()
            .map(|(version, document)| {
                let uri = document
                    .get("$id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| schema_uri(*version));
                (uri, document.clone())
            })
            .collect();
        Self {
            documents,
            by_uri: Arc::new(by_uri),
        }
    }

    /// The repository of documents packaged with this crate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::RepositoryLoad`] if a packaged document
    /// is not valid JSON.
    pub fn packaged() -> Result<Arc<Self>, ConfigurationError> {
        PACKAGED_REPOSITORY.as_ref().cloned().map_err(Clone::clone)
    }

    /// Loads every `apisix-<version>.json` in `dir`. Other files are
    /// ignored, as are files naming a release this build does not know.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::RepositoryLoad`] if the directory
    /// cannot be listed or a schema file cannot be read or parsed.
    pub fn load_dir(dir: &Path) -> Result<Self, ConfigurationError> {
        let load_err = |path: &Path, reason: String| ConfigurationError::RepositoryLoad {
            path: path.display().to_string(),
            reason,
        };

        let entries = std::fs::read_dir(dir).map_err(|e| load_err(dir, e.to_string()))?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| load_err(dir, e.to_string()))?;
            paths.push(entry.path());
        }
        paths.sort();

        let mut documents = Vec::new();
        for path in paths {
            let Some(version) = Self::version_from_file_name(&path) else {
                continue;
            };
            let version = match version.parse::<ProxyVersion>() {
                Ok(v) => v,
                Err(_) => {
                    tracing::warn!(
                        path = %path.display(),
                        "skipping schema document for unknown gateway version"
                    );
                    continue;
                }
            };
            let content =
                std::fs::read_to_string(&path).map_err(|e| load_err(&path, e.to_string()))?;
            let document: Value =
                serde_json::from_str(&content).map_err(|e| load_err(&path, e.to_string()))?;
            tracing::debug!(path = %path.display(), %version, "loaded schema document");
            documents.push((version, document));
        }

        Ok(Self::from_documents(documents))
    }

    fn version_from_file_name(path: &Path) -> Option<&str> {
        path.file_name()
            .and_then(|f| f.to_str())
            .and_then(|name| name.strip_prefix(FILE_PREFIX))
            .and_then(|rest| rest.strip_suffix(".json"))
    }

    /// Returns the schema document for `version`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnsupportedVersion`] if the repository
    /// has no document for it.
    pub fn document(&self, version: ProxyVersion) -> Result<&Value, ConfigurationError> {
        self.documents
            .get(&version)
            .ok_or_else(|| ConfigurationError::UnsupportedVersion(version.to_string()))
    }

    /// Versions present in the repository, oldest first.
    pub fn versions(&self) -> impl Iterator<Item = ProxyVersion> + '_ {
        self.documents.keys().copied()
    }

    /// Whether the repository has a document for `version`.
    pub fn contains(&self, version: ProxyVersion) -> bool {
        self.documents.contains_key(&version)
    }

    /// Number of documents loaded.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the repository holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub(crate) fn retriever(&self) -> LocalSchemaRetriever {
        LocalSchemaRetriever {
            schemas: Arc::clone(&self.by_uri),
        }
    }
}

/// Resolves `$ref` URIs by looking up the repository's documents.
pub(crate) struct LocalSchemaRetriever {
    /// Map from full `$id` URI to parsed document.
    schemas: Arc<HashMap<String, Value>>,
}

impl jsonschema::Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &jsonschema::Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        self.schemas
            .get(uri_str)
            .cloned()
            .ok_or_else(|| format!("schema not found for URI: {uri_str}").into())
    }
}
