//! Configuration management for SEIIR forecasts.
//!
//! A forecast run is described by a single YAML document, the forecast
//! specification. This crate parses it into typed structures and rejects it at
//! load time when it is malformed ([`SchemaError`]) or refers to scenarios it
//! does not declare ([`ReferenceError`]).

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod loader;
pub mod schema;
mod validate;

pub use error::{ConfigError, ConfigResult, ReferenceError, SchemaError};
pub use loader::load;
pub use schema::{
    AlgorithmParams, BetaScaling, DataVersions, ForecastSpecification,
    ForecastSpecificationBuilder, ParamValue, PostprocessingConfig, ResamplingConfig, Scenario,
    ScenarioBuilder, ScenarioSet,
};
