//! Beta scaling driven by regression outputs on disk.
//!
//! Reads the modelled locations, draw count, transition dates and beta
//! regression of every draw from the regression stage, computes the scaling
//! parameters for one scenario and writes them to the scenario's
//! `beta_scaling/draw_{n}.csv` files.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use seiir_config::ForecastSpecification;
use seiir_paths::{ForecastPaths, RegressionPaths};
use seiir_primitives::{DrawId, LocationId};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{RunError, RunResult};
use crate::residual::BetaObservation;
use crate::run::{DrawInput, LocationHistory, ScalingParameters, compute_beta_scaling};

#[derive(Deserialize)]
struct RegressionSpecification {
    parameters: RegressionParameters,
}

#[derive(Deserialize)]
struct RegressionParameters {
    n_draws: u32,
}

#[derive(Deserialize)]
struct TransitionRecord {
    location_id: LocationId,
    end_date: NaiveDate,
}

#[derive(Deserialize)]
struct BetaRecord {
    location_id: LocationId,
    date: NaiveDate,
    beta: f64,
    beta_pred: f64,
}

#[derive(Deserialize)]
struct DeathsRecord {
    location_id: LocationId,
    deaths: f64,
}

/// Read access to the regression stage outputs a forecast consumes.
#[derive(Clone, Debug)]
pub struct RegressionInputs {
    paths: RegressionPaths,
}

impl RegressionInputs {
    /// Reads from the regression layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            paths: RegressionPaths::new(root, true),
        }
    }

    /// Reads from the regression version a specification names.
    #[must_use]
    pub fn from_specification(spec: &ForecastSpecification) -> Self {
        Self::new(spec.data().regression_version())
    }

    /// Modelled location ids, from `locations.yaml`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Io`] or [`RunError::Metadata`] when the file cannot
    /// be read or parsed.
    pub fn location_ids(&self) -> RunResult<Vec<LocationId>> {
        read_yaml(&self.paths.location_metadata())
    }

    /// Number of draws the regression produced.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Io`] or [`RunError::Metadata`] when the regression
    /// specification cannot be read or lacks `parameters.n_draws`.
    pub fn draw_count(&self) -> RunResult<u32> {
        let spec: RegressionSpecification = read_yaml(&self.paths.regression_specification())?;
        Ok(spec.parameters.n_draws)
    }

    /// Transition date of every location in one draw.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Csv`] when the dates file is missing or malformed.
    pub fn transition_dates(&self, draw: DrawId) -> RunResult<BTreeMap<LocationId, NaiveDate>> {
        let records: Vec<TransitionRecord> = read_csv(&self.paths.date_file(draw))?;
        Ok(records
            .into_iter()
            .map(|record| (record.location_id, record.end_date))
            .collect())
    }

    /// Beta histories of `locations` in one draw, each ordered by date and
    /// ending on the location's transition date.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::MissingTransition`] when a location has no
    /// transition date and [`RunError::Csv`] for unreadable files.
    pub fn draw_input(&self, draw: DrawId, locations: &[LocationId]) -> RunResult<DrawInput> {
        let dates = self.transition_dates(draw)?;
        if let Some(location_id) = locations.iter().find(|id| !dates.contains_key(*id)) {
            return Err(RunError::MissingTransition {
                location_id: *location_id,
                draw,
            });
        }

        let mut histories: BTreeMap<LocationId, Vec<(NaiveDate, BetaObservation)>> =
            locations.iter().map(|id| (*id, Vec::new())).collect();
        for record in read_csv::<BetaRecord>(&self.paths.beta_regression_file(draw))? {
            let (Some(history), Some(end)) = (
                histories.get_mut(&record.location_id),
                dates.get(&record.location_id),
            ) else {
                continue;
            };
            if record.date <= *end {
                history.push((record.date, BetaObservation::new(record.beta, record.beta_pred)));
            }
        }

        let locations = histories
            .into_iter()
            .map(|(location_id, mut days)| {
                days.sort_by_key(|(date, _)| *date);
                LocationHistory {
                    location_id,
                    history: days.into_iter().map(|(_, observation)| observation).collect(),
                }
            })
            .collect();
        Ok(DrawInput { draw, locations })
    }
}

/// Cumulative deaths per location from a `location_id,deaths` CSV, restricted
/// to `locations`.
///
/// # Errors
///
/// Returns [`RunError::Csv`] when the file is missing or malformed.
pub fn load_total_deaths(
    path: &Path,
    locations: &[LocationId],
) -> RunResult<BTreeMap<LocationId, f64>> {
    let modelled: BTreeSet<&LocationId> = locations.iter().collect();
    let records: Vec<DeathsRecord> = read_csv(path)?;
    Ok(records
        .into_iter()
        .filter(|record| modelled.contains(&record.location_id))
        .map(|record| (record.location_id, record.deaths))
        .collect())
}

/// Writes scaling rows as CSV, creating the parent directory.
///
/// # Errors
///
/// Returns [`RunError::Io`] when the directory or file cannot be written and
/// [`RunError::Csv`] when a row cannot be encoded.
pub fn write_beta_scales(path: &Path, rows: &[ScalingParameters]) -> RunResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| RunError::io(parent, source))?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(|source| RunError::csv(path, source))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|source| RunError::csv(path, source))?;
    }
    writer.flush().map_err(|source| RunError::io(path, source))?;
    debug!(path = %path.display(), rows = rows.len(), "beta scales written");
    Ok(())
}

/// Computes beta scaling for one scenario from the regression outputs the
/// specification names and writes one file per draw into the forecast output
/// tree. Returns the files written, in draw order.
///
/// # Errors
///
/// Returns [`RunError::UnknownScenario`] for undeclared scenarios,
/// [`RunError::Paths`] when the specification has no output root, and any
/// read, scaling or write failure.
pub fn run_beta_residual_mean(
    spec: &ForecastSpecification,
    scenario: &str,
    total_deaths: &Path,
) -> RunResult<Vec<PathBuf>> {
    let declared = spec
        .scenario(scenario)
        .ok_or_else(|| RunError::UnknownScenario {
            name: scenario.into(),
        })?;
    let output = ForecastPaths::from_specification(spec, false)?;
    let regression = RegressionInputs::from_specification(spec);

    let locations = regression.location_ids()?;
    let deaths = load_total_deaths(total_deaths, &locations)?;
    let draws = regression.draw_count()?;
    info!(
        scenario,
        draws,
        locations = locations.len(),
        "computing beta residual mean"
    );

    let inputs = DrawId::range(draws)
        .map(|draw| regression.draw_input(draw, &locations))
        .collect::<RunResult<Vec<_>>>()?;
    let rows = compute_beta_scaling(declared.beta_scaling(), &deaths, &inputs)?;

    let mut by_draw: BTreeMap<DrawId, Vec<ScalingParameters>> =
        DrawId::range(draws).map(|draw| (draw, Vec::new())).collect();
    for row in rows {
        by_draw.entry(row.draw).or_default().push(row);
    }

    let mut written = Vec::with_capacity(by_draw.len());
    for (draw, rows) in by_draw {
        let path = output.beta_scaling_path(draw, scenario)?;
        write_beta_scales(&path, &rows)?;
        written.push(path);
    }
    info!(scenario, files = written.len(), "beta scales saved");
    Ok(written)
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> RunResult<T> {
    let content = fs::read_to_string(path).map_err(|source| RunError::io(path, source))?;
    serde_yaml::from_str(&content).map_err(|source| RunError::Metadata {
        path: path.to_path_buf(),
        source,
    })
}

fn read_csv<T: DeserializeOwned>(path: &Path) -> RunResult<Vec<T>> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| RunError::csv(path, source))?;
    reader
        .deserialize()
        .map(|record| record.map_err(|source| RunError::csv(path, source)))
        .collect()
}
