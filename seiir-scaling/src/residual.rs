//! Residual statistics of fitted against predicted betas.

use seiir_config::BetaScaling;
use seiir_primitives::{DrawId, LocationId};
use serde::{Deserialize, Serialize};

use crate::error::{ScalingError, ScalingResult};
use crate::window::HistoryWindow;

/// One day of regression output: the ODE-fitted beta and the beta predicted
/// by the covariate regression.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BetaObservation {
    /// Beta recovered from the ODE fit.
    pub beta: f64,
    /// Beta predicted from covariates.
    pub beta_pred: f64,
}

impl BetaObservation {
    /// Creates an observation.
    #[must_use]
    pub const fn new(beta: f64, beta_pred: f64) -> Self {
        Self { beta, beta_pred }
    }

    fn log_residual(self) -> Option<f64> {
        (self.beta > 0.0 && self.beta_pred > 0.0).then(|| (self.beta / self.beta_pred).ln())
    }
}

/// Beta values on the transition date, where the forecast takes over.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Transition {
    /// Last fitted beta.
    pub fit_final: f64,
    /// First predicted beta.
    pub pred_start: f64,
    /// Ratio needed to make the prediction continuous with the fit.
    pub scale_init: f64,
}

/// Extracts the transition values from a history ending on the transition date.
///
/// # Errors
///
/// Returns [`ScalingError::EmptyHistory`] when there are no observations.
pub fn transition(
    location_id: LocationId,
    draw: DrawId,
    history: &[BetaObservation],
) -> ScalingResult<Transition> {
    let last = history
        .last()
        .ok_or(ScalingError::EmptyHistory { location_id, draw })?;
    Ok(Transition {
        fit_final: last.beta,
        pred_start: last.beta_pred,
        scale_init: last.beta / last.beta_pred,
    })
}

/// Mean log ratio of fitted to predicted beta over the window. `None` when the
/// window covers no observations.
///
/// # Errors
///
/// Returns [`ScalingError::NonPositiveBeta`] when an observation inside the
/// window has a beta that is not strictly positive.
#[allow(clippy::cast_precision_loss)]
pub fn log_beta_residual_mean(
    location_id: LocationId,
    history: &[BetaObservation],
    window: &HistoryWindow,
) -> ScalingResult<Option<f64>> {
    let range = window.slice_range(history.len());
    if range.is_empty() {
        return Ok(None);
    }

    let mut sum = 0.0;
    for index in range.clone() {
        sum += history[index]
            .log_residual()
            .ok_or(ScalingError::NonPositiveBeta {
                location_id,
                draw: window.draw_id(),
                index,
            })?;
    }

    Ok(Some(sum / range.len() as f64))
}

/// Portion of the mean residual removed for a location.
///
/// Locations with few deaths have noisy residuals, so the full mean is removed
/// below `offset_deaths_lower`, none of it from `offset_deaths_upper` on, and a
/// linearly shrinking share in between.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn residual_offset(total_deaths: f64, mean_residual: f64, scaling: &BetaScaling) -> f64 {
    let lower = scaling.offset_deaths_lower() as f64;
    let upper = scaling.offset_deaths_upper() as f64;

    if total_deaths < lower {
        mean_residual
    } else if total_deaths < upper {
        (upper - total_deaths) / (upper - lower) * mean_residual
    } else {
        0.0
    }
}
