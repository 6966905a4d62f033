//! Beta scaling across every draw of one scenario.

use std::collections::BTreeMap;

use seiir_config::BetaScaling;
use seiir_primitives::{DrawId, LocationId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ScalingError, ScalingResult};
use crate::residual::{BetaObservation, log_beta_residual_mean, residual_offset, transition};
use crate::window::HistoryWindow;

/// Regression history of one location, ordered by date and ending on the
/// transition date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationHistory {
    /// Location the history belongs to.
    pub location_id: LocationId,
    /// Daily observations up to and including the transition date.
    pub history: Vec<BetaObservation>,
}

/// Regression outputs of one draw.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawInput {
    /// Draw the histories come from.
    pub draw: DrawId,
    /// One history per modelled location.
    pub locations: Vec<LocationHistory>,
}

/// Scaling parameters for one location and draw. Serializes as one flat
/// record, so rows can be written straight to CSV.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalingParameters {
    /// Location the parameters apply to.
    pub location_id: LocationId,
    /// Draw the parameters apply to.
    pub draw: DrawId,
    /// Cumulative deaths in the location.
    pub total_deaths: f64,
    /// Smoothing window configured for the scenario.
    pub window_size: i64,
    /// Days before transition at which the residual average stops.
    pub history_days_start: usize,
    /// Days before transition at which the residual average begins.
    pub history_days_end: usize,
    /// Fitted beta on the transition date.
    pub fit_final: f64,
    /// Predicted beta on the transition date.
    pub pred_start: f64,
    /// Ratio making the prediction continuous with the fit.
    pub scale_init: f64,
    /// Mean log residual with the location offset removed.
    pub log_beta_residual_mean: Option<f64>,
    /// Offset removed from the mean log residual.
    pub log_beta_residual_mean_offset: f64,
    /// Multiplier applied to forecast betas.
    pub scale_final: Option<f64>,
}

/// Computes scaling parameters for every location of every draw.
///
/// Residual means are first averaged across draws per location. The offset a
/// location receives depends on that average and its total deaths, and is
/// then removed from each draw's mean.
///
/// # Errors
///
/// Returns [`ScalingError::EmptyWindowRange`] when the scaling bounds leave no
/// window to draw, [`ScalingError::EmptyHistory`] or
/// [`ScalingError::NonPositiveBeta`] for unusable regression output, and
/// [`ScalingError::MissingDeaths`] when a location has no death count.
pub fn compute_beta_scaling(
    scaling: &BetaScaling,
    total_deaths: &BTreeMap<LocationId, f64>,
    draws: &[DrawInput],
) -> ScalingResult<Vec<ScalingParameters>> {
    let mut rows = Vec::new();
    for input in draws {
        let window = HistoryWindow::draw(input.draw, scaling)?;
        debug!(
            draw = %input.draw,
            start = window.start(),
            end = window.end(),
            "history window drawn"
        );

        for location in &input.locations {
            let deaths = *total_deaths
                .get(&location.location_id)
                .ok_or(ScalingError::MissingDeaths {
                    location_id: location.location_id,
                })?;
            let transition = transition(location.location_id, input.draw, &location.history)?;
            let mean = log_beta_residual_mean(location.location_id, &location.history, &window)?;

            rows.push(ScalingParameters {
                location_id: location.location_id,
                draw: input.draw,
                total_deaths: deaths,
                window_size: scaling.window_size(),
                history_days_start: window.start(),
                history_days_end: window.end(),
                fit_final: transition.fit_final,
                pred_start: transition.pred_start,
                scale_init: transition.scale_init,
                log_beta_residual_mean: mean,
                log_beta_residual_mean_offset: 0.0,
                scale_final: None,
            });
        }
    }

    let offsets = location_offsets(scaling, &rows);
    for row in &mut rows {
        let offset = offsets.get(&row.location_id).copied().unwrap_or(0.0);
        row.log_beta_residual_mean_offset = offset;
        row.log_beta_residual_mean = row.log_beta_residual_mean.map(|mean| mean - offset);
        row.scale_final = row.log_beta_residual_mean.map(f64::exp);
    }

    info!(
        draws = draws.len(),
        locations = offsets.len(),
        "beta scaling computed"
    );
    Ok(rows)
}

/// Offset per location from the cross-draw average residual mean.
fn location_offsets(scaling: &BetaScaling, rows: &[ScalingParameters]) -> BTreeMap<LocationId, f64> {
    let mut sums: BTreeMap<LocationId, (f64, f64, u32)> = BTreeMap::new();
    for row in rows {
        if let Some(mean) = row.log_beta_residual_mean {
            let entry = sums.entry(row.location_id).or_insert((row.total_deaths, 0.0, 0));
            entry.1 += mean;
            entry.2 += 1;
        }
    }

    sums.into_iter()
        .map(|(location_id, (deaths, sum, count))| {
            let average = sum / f64::from(count);
            (location_id, residual_offset(deaths, average, scaling))
        })
        .collect()
}
