//! Core shared types for the SEIIR forecast toolkit.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod ids;
mod names;

/// Error type and result alias shared across the toolkit.
pub use error::{Error, Result};
/// Numeric identifiers for draws and modelled locations.
pub use ids::{DrawId, LocationId};
/// Validated names usable as single path components.
pub use names::{CovariateName, ScenarioName, Selector};
