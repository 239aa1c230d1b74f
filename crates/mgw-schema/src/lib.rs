//! # mgw-schema: Resource Schema Validation
//!
//! Decides whether a gateway configuration document may be stored, for a
//! given gateway release and storage sink.
//!
//! ## Responsibilities
//!
//! - **Repository:** one JSON Schema document per supported release,
//!   packaged in the binary or loaded from a directory.
//! - **Resolution:** dotted path to compiled schema, with the storage
//!   sink's strictness applied.
//! - **Validation:** structural checks first, then the semantic rules of
//!   the resource kind.
//! - **Identification:** a short label (`id`, `name`, or `username`) for
//!   logs.
//!
//! ## Design
//!
//! All schemas for the packaged releases are compiled once, on first use,
//! into an immutable table. Validators borrow nothing and hold only shared
//! handles into that table.
//!
//! ```no_run
//! use mgw_core::ProxyVersion;
//! use mgw_schema::SchemaValidator;
//!
//! let validator = SchemaValidator::new(ProxyVersion::V3_11, "main.route")?;
//! validator.validate(r#"{"uri": "/hello", "upstream_id": "u1"}"#)?;
//! # Ok::<(), mgw_schema::ValidationError>(())
//! ```

pub mod dispatch;
pub mod error;
pub mod identify;
pub mod repository;
pub mod resolve;
pub mod rules;
pub mod validate;

// Re-export primary types.
pub use dispatch::SchemaValidator;
pub use error::{
    ConfigurationError, ErrorCategory, RuleError, SchemaViolationDetail, SemanticViolation,
    ValidationError,
};
pub use identify::{get_resource_identification, resource_identification};
pub use repository::SchemaRepository;
pub use resolve::{ResolvedSchema, SchemaResolver};
pub use rules::{SemanticRule, SemanticRules};
pub use validate::{ResourceValidator, ValidatorOptions};
