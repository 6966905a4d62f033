//! SEIIR forecast specification toolkit facade.
//!
//! Bundles the toolkit crates behind feature flags so downstream users can
//! enable only the components they need.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use seiir_primitives as primitives;

/// Forecast specification schema and loader (enabled by `config` feature).
#[cfg(feature = "config")]
pub use seiir_config as config;

/// On-disk layouts and pre-flight checks (enabled by `paths` feature).
#[cfg(feature = "paths")]
pub use seiir_paths as paths;

/// Beta residual scaling (enabled by `scaling` feature).
#[cfg(feature = "scaling")]
pub use seiir_scaling as scaling;

/// Logging setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use seiir_telemetry as telemetry;
