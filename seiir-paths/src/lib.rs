//! Directory layouts of the SEIIR pipeline and checks against them.
//!
//! Each pipeline stage reads or writes a versioned directory tree. The types
//! here compute every path in those trees from a root, create the writable
//! ones, and check that the inputs a forecast specification names exist.

#![warn(missing_docs, clippy::pedantic)]

mod covariate;
mod error;
mod forecast;
mod infection;
mod layout;
pub mod preflight;
mod regression;

pub use covariate::CovariatePaths;
pub use error::{PathsError, PathsResult, PreflightProblem};
pub use forecast::{FORECAST_SPECIFICATION_FILE, ForecastPaths, ScenarioPaths};
pub use infection::InfectionPaths;
pub use layout::{OutputLayout, draw_file};
pub use preflight::{check_covariates, check_thetas, prepare_output, preflight};
pub use regression::RegressionPaths;
