//! Beta scaling for SEIIR forecasts.
//!
//! Forecast betas come from a covariate regression, which rarely meets the
//! ODE-fitted beta exactly at the transition date. This crate computes the
//! per-draw, per-location parameters that align the two: the transition
//! ratio, and a residual correction averaged over a randomly drawn window of
//! recent history, damped for locations with high death counts.
//!
//! [`run_beta_residual_mean`] drives the computation from regression outputs
//! on disk and writes the per-draw results into the forecast output tree.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod files;
mod residual;
mod run;
mod window;

pub use error::{RunError, RunResult, ScalingError, ScalingResult};
pub use files::{RegressionInputs, load_total_deaths, run_beta_residual_mean, write_beta_scales};
pub use residual::{
    BetaObservation, Transition, log_beta_residual_mean, residual_offset, transition,
};
pub use run::{DrawInput, LocationHistory, ScalingParameters, compute_beta_scaling};
pub use window::{HistoryWindow, MIN_WINDOW_DAYS};
