//! Checks that tie a specification to the inputs it names on disk.

use std::collections::BTreeSet;

use seiir_config::ForecastSpecification;
use seiir_primitives::CovariateName;
use tracing::{debug, info, warn};

use crate::covariate::CovariatePaths;
use crate::error::{PathsError, PathsResult, PreflightProblem};
use crate::forecast::ForecastPaths;
use crate::layout::OutputLayout;

/// Verifies that every scenario declares the same covariates and that every
/// selected covariate variant has a projection file.
#[must_use]
pub fn check_covariates(
    spec: &ForecastSpecification,
    covariates: &CovariatePaths,
) -> Vec<PreflightProblem> {
    let mut problems = Vec::new();
    let mut scenarios = spec.scenarios().iter();
    let Some((baseline_name, baseline)) = scenarios.next() else {
        return problems;
    };
    let expected: BTreeSet<&CovariateName> = baseline.covariates().keys().collect();

    for (name, scenario) in scenarios {
        let declared: BTreeSet<&CovariateName> = scenario.covariates().keys().collect();
        if declared != expected {
            problems.push(PreflightProblem::InconsistentCovariates {
                scenario: name.clone(),
                baseline: baseline_name.clone(),
                missing: expected.difference(&declared).map(|c| (*c).clone()).collect(),
                extra: declared.difference(&expected).map(|c| (*c).clone()).collect(),
            });
        }
    }

    for (name, scenario) in spec.scenarios() {
        for (covariate, selector) in scenario.covariates() {
            let path = covariates.scenario_file(covariate, selector);
            if path.is_file() {
                debug!(scenario = %name, %covariate, %selector, "covariate projection found");
            } else {
                problems.push(PreflightProblem::MissingCovariateFile {
                    scenario: name.clone(),
                    covariate: covariate.clone(),
                    selector: selector.clone(),
                    path,
                });
            }
        }
    }

    problems
}

/// Verifies that every scenario's theta file exists.
#[must_use]
pub fn check_thetas(spec: &ForecastSpecification) -> Vec<PreflightProblem> {
    spec.scenarios()
        .iter()
        .filter(|(_, scenario)| !scenario.theta().is_file())
        .map(|(name, scenario)| PreflightProblem::MissingTheta {
            scenario: name.clone(),
            path: scenario.theta().to_path_buf(),
        })
        .collect()
}

/// Runs every pre-flight check against the covariate version the
/// specification names.
///
/// # Errors
///
/// Returns [`PathsError::Preflight`] listing every problem found.
pub fn preflight(spec: &ForecastSpecification) -> PathsResult<()> {
    let covariates = CovariatePaths::new(spec.data().covariate_version());
    let mut problems = check_covariates(spec, &covariates);
    problems.extend(check_thetas(spec));

    if problems.is_empty() {
        info!(scenarios = spec.scenarios().len(), "pre-flight checks passed");
        return Ok(());
    }

    for problem in &problems {
        warn!(%problem, "pre-flight problem");
    }
    Err(PathsError::Preflight { problems })
}

/// Creates the output tree for a forecast run and stores the specification
/// at its root.
///
/// # Errors
///
/// Returns [`PathsError::OutputRootUnset`] when the specification has no
/// output root, [`PathsError::Io`] when directories cannot be created, and
/// [`PathsError::Config`] when the specification cannot be written.
pub fn prepare_output(spec: &ForecastSpecification) -> PathsResult<ForecastPaths> {
    let paths = ForecastPaths::from_specification(spec, false)?;
    paths.make_dirs()?;
    spec.dump(paths.forecast_specification())?;
    info!(root = %paths.root().display(), "forecast output tree prepared");
    Ok(paths)
}
