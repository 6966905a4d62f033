//! Error types for beta scaling.

use std::path::PathBuf;

use seiir_paths::PathsError;
use seiir_primitives::{DrawId, LocationId};
use thiserror::Error;

/// Errors surfaced while computing beta scaling parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScalingError {
    /// The configured bounds leave no value to draw a history window from.
    #[error("cannot draw {bound} from empty range [{low}, {high})")]
    EmptyWindowRange {
        /// Which end of the window was being drawn.
        bound: &'static str,
        /// Inclusive lower bound.
        low: i64,
        /// Exclusive upper bound.
        high: i64,
    },
    /// A location has no regression history up to its transition date.
    #[error("location {location_id} has no beta history in draw {draw}")]
    EmptyHistory {
        /// Location with no history.
        location_id: LocationId,
        /// Draw being processed.
        draw: DrawId,
    },
    /// A fitted or predicted beta was not strictly positive.
    #[error("location {location_id} draw {draw}: beta observation {index} is not positive")]
    NonPositiveBeta {
        /// Offending location.
        location_id: LocationId,
        /// Draw being processed.
        draw: DrawId,
        /// Position of the observation in the history.
        index: usize,
    },
    /// A location has betas but no cumulative death count.
    #[error("no total deaths recorded for location {location_id}")]
    MissingDeaths {
        /// Location without a death count.
        location_id: LocationId,
    },
}

/// Result alias for scaling operations.
pub type ScalingResult<T> = Result<T, ScalingError>;

/// Errors surfaced while running beta scaling against files on disk.
#[derive(Debug, Error)]
pub enum RunError {
    /// The scenario is not declared by the specification.
    #[error("scenario `{name}` is not declared in the forecast specification")]
    UnknownScenario {
        /// The requested scenario.
        name: String,
    },
    /// A file could not be opened, read or written.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        /// File the operation targeted.
        path: PathBuf,
        /// Source [`std::io::Error`].
        source: std::io::Error,
    },
    /// A CSV file was malformed or a record could not be written.
    #[error("csv error in {}: {source}", .path.display())]
    Csv {
        /// File being read or written.
        path: PathBuf,
        /// Source [`csv::Error`].
        source: csv::Error,
    },
    /// A YAML metadata file was malformed.
    #[error("malformed metadata in {}: {source}", .path.display())]
    Metadata {
        /// File being read.
        path: PathBuf,
        /// Source [`serde_yaml::Error`].
        source: serde_yaml::Error,
    },
    /// A modelled location has no transition date in a draw.
    #[error("no transition date for location {location_id} in draw {draw}")]
    MissingTransition {
        /// Location without a date.
        location_id: LocationId,
        /// Draw being read.
        draw: DrawId,
    },
    /// Output layout could not be resolved.
    #[error(transparent)]
    Paths(#[from] PathsError),
    /// The scaling computation itself failed.
    #[error(transparent)]
    Scaling(#[from] ScalingError),
}

impl RunError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for file-driven scaling runs.
pub type RunResult<T> = Result<T, RunError>;
