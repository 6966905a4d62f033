//! Error types for loading and validating forecast specifications.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while loading, validating, or writing a specification.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The specification file could not be read or written.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        /// File the operation targeted.
        path: PathBuf,
        /// Source [`std::io::Error`].
        source: std::io::Error,
    },
    /// The document does not match the specification schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// The document refers to something it does not declare.
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    /// The in-memory specification could not be rendered as YAML.
    #[error("failed to serialize forecast specification: {source}")]
    Emit {
        /// Source [`serde_yaml::Error`].
        source: serde_yaml::Error,
    },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for schema violations.
    #[must_use]
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema(_))
    }

    /// Returns `true` for referential-integrity violations.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }
}

/// A required field is missing, mistyped, duplicated, unknown or out of range.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The YAML could not be deserialized into the schema.
    #[error("malformed forecast specification: {source}")]
    Malformed {
        /// Source [`serde_yaml::Error`], carrying the document location.
        #[from]
        source: serde_yaml::Error,
    },
    /// A required field was never supplied.
    #[error("missing required field `{field}`")]
    Missing {
        /// Dotted path of the absent field.
        field: String,
    },
    /// A field that must carry text was blank.
    #[error("`{field}` cannot be empty")]
    Empty {
        /// Dotted path of the offending field.
        field: String,
    },
    /// A numeric field violated its bounds.
    #[error("`{field}` is out of range: {reason}")]
    OutOfRange {
        /// Dotted path of the offending field.
        field: String,
        /// Human-readable description of the violated bound.
        reason: String,
    },
}

impl SchemaError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::Missing {
            field: field.into(),
        }
    }

    pub(crate) fn empty(field: impl Into<String>) -> Self {
        Self::Empty {
            field: field.into(),
        }
    }

    pub(crate) fn out_of_range(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::OutOfRange {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Referential-integrity failures between sections of the document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    /// A field names a scenario the document never declares.
    #[error("`{field}` names unknown scenario `{name}`; declared scenarios: [{}]", .declared.join(", "))]
    UnknownScenario {
        /// Dotted path of the referring field.
        field: &'static str,
        /// The undeclared scenario name, as written.
        name: String,
        /// Scenario names the document does declare.
        declared: Vec<String>,
    },
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
