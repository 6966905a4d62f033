//! Error types for on-disk layouts.

use std::fmt;
use std::path::PathBuf;

use seiir_config::ConfigError;
use seiir_primitives::{CovariateName, LocationId, ScenarioName, Selector};
use thiserror::Error;

/// Errors emitted while resolving or creating pipeline directories.
#[derive(Debug, Error)]
pub enum PathsError {
    /// Directory creation was requested on a layout opened read-only.
    #[error("tried to create {layout} directories under {} in read-only mode", .root.display())]
    ReadOnly {
        /// Kind of layout, e.g. `forecast`.
        layout: &'static str,
        /// Root directory of the layout.
        root: PathBuf,
    },
    /// Underlying filesystem failure.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        /// Path the operation targeted.
        path: PathBuf,
        /// Source [`std::io::Error`].
        source: std::io::Error,
    },
    /// A per-scenario lookup named a scenario the layout was not built with.
    #[error("no output directories for scenario `{name}`")]
    UnknownScenario {
        /// The requested scenario.
        name: String,
    },
    /// No location folder matched.
    #[error("there is no folder for location {location_id} under {}", .root.display())]
    MissingLocation {
        /// Requested location.
        location_id: LocationId,
        /// Root that was searched.
        root: PathBuf,
    },
    /// More than one location folder matched.
    #[error("there is more than one folder for location {location_id}: {matches:?}")]
    AmbiguousLocation {
        /// Requested location.
        location_id: LocationId,
        /// Every matching folder.
        matches: Vec<PathBuf>,
    },
    /// The specification has no output root and none was supplied.
    #[error("forecast specification has an empty `data.output_root`")]
    OutputRootUnset,
    /// The specification could not be written into the output tree.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Pre-flight checks found problems with the inputs a specification names.
    #[error("pre-flight checks failed:\n{}", ProblemList(.problems))]
    Preflight {
        /// Every problem found.
        problems: Vec<PreflightProblem>,
    },
}

impl PathsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A single mismatch between a specification and the filesystem.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PreflightProblem {
    /// A scenario selects a covariate variant that has no projection file.
    #[error("scenario `{scenario}`: covariate `{covariate}` has no `{selector}` projection at {}", .path.display())]
    MissingCovariateFile {
        /// Scenario making the selection.
        scenario: ScenarioName,
        /// Covariate being selected.
        covariate: CovariateName,
        /// Selected variant.
        selector: Selector,
        /// File that was expected.
        path: PathBuf,
    },
    /// A scenario declares a different covariate set than the first scenario.
    #[error("scenario `{scenario}` covariates differ from `{baseline}`: missing {missing:?}, extra {extra:?}")]
    InconsistentCovariates {
        /// Scenario whose covariates differ.
        scenario: ScenarioName,
        /// Scenario the set is compared against.
        baseline: ScenarioName,
        /// Covariates the baseline declares and this scenario does not.
        missing: Vec<CovariateName>,
        /// Covariates this scenario declares and the baseline does not.
        extra: Vec<CovariateName>,
    },
    /// A scenario's theta file does not exist.
    #[error("scenario `{scenario}`: theta file {} does not exist", .path.display())]
    MissingTheta {
        /// Scenario naming the file.
        scenario: ScenarioName,
        /// The missing file.
        path: PathBuf,
    },
}

struct ProblemList<'a>(&'a [PreflightProblem]);

impl fmt::Display for ProblemList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, problem) in self.0.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {problem}")?;
        }
        Ok(())
    }
}

/// Result alias for layout operations.
pub type PathsResult<T> = Result<T, PathsError>;
