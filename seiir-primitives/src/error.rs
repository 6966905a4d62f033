//! Shared error definitions for forecast primitives.

use thiserror::Error;

/// Result alias used throughout the toolkit.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing primitive types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A scenario name, covariate name or selector failed validation.
    #[error("invalid {kind} `{id}`: {reason}")]
    InvalidIdentifier {
        /// Which kind of identifier was rejected.
        kind: &'static str,
        /// The offending identifier string.
        id: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A numeric identifier could not be parsed.
    #[error("invalid {kind} `{input}`")]
    InvalidNumericId {
        /// Which kind of identifier was rejected.
        kind: &'static str,
        /// The offending input.
        input: String,
    },
}
