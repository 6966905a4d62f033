//! Output layout of a forecast run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use seiir_config::ForecastSpecification;
use seiir_primitives::{DrawId, ScenarioName};

use crate::error::{PathsError, PathsResult};
use crate::layout::{OutputLayout, draw_file};

/// Name of the specification copy stored at the root of a forecast run.
pub const FORECAST_SPECIFICATION_FILE: &str = "forecast_specification.yaml";

/// Per-scenario directories under a forecast output root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioPaths {
    root: PathBuf,
    read_only: bool,
}

impl ScenarioPaths {
    /// Creates the layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, read_only: bool) -> Self {
        Self {
            root: root.into(),
            read_only,
        }
    }

    /// Scaling factors used to align past and forecast betas.
    #[must_use]
    pub fn beta_scaling_dir(&self) -> PathBuf {
        self.root.join("beta_scaling")
    }

    /// Beta scaling parameters for one draw.
    #[must_use]
    pub fn beta_scaling_path(&self, draw_id: DrawId) -> PathBuf {
        self.beta_scaling_dir().join(draw_file(draw_id))
    }

    /// SEIIR compartment draws.
    #[must_use]
    pub fn components_dir(&self) -> PathBuf {
        self.root.join("component_draws")
    }

    /// SEIIR components for one draw.
    #[must_use]
    pub fn components_path(&self, draw_id: DrawId) -> PathBuf {
        self.components_dir().join(draw_file(draw_id))
    }

    /// Cases, deaths, and effective R.
    #[must_use]
    pub fn outputs_dir(&self) -> PathBuf {
        self.root.join("outputs")
    }

    /// Forecast outputs for one draw.
    #[must_use]
    pub fn outputs_path(&self, draw_id: DrawId) -> PathBuf {
        self.outputs_dir().join(draw_file(draw_id))
    }
}

impl OutputLayout for ScenarioPaths {
    const KIND: &'static str = "scenario";

    fn root(&self) -> &Path {
        &self.root
    }

    fn read_only(&self) -> bool {
        self.read_only
    }

    fn directories(&self) -> Vec<PathBuf> {
        vec![
            self.beta_scaling_dir(),
            self.components_dir(),
            self.outputs_dir(),
        ]
    }
}

/// Layout of a whole forecast run: one [`ScenarioPaths`] per scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForecastPaths {
    root: PathBuf,
    read_only: bool,
    scenarios: BTreeMap<ScenarioName, ScenarioPaths>,
}

impl ForecastPaths {
    /// Creates the layout for the supplied scenarios.
    pub fn new<I>(root: impl Into<PathBuf>, read_only: bool, scenarios: I) -> Self
    where
        I: IntoIterator<Item = ScenarioName>,
    {
        let root = root.into();
        let scenarios = scenarios
            .into_iter()
            .map(|name| {
                let paths = ScenarioPaths::new(root.join(name.as_str()), read_only);
                (name, paths)
            })
            .collect();
        Self {
            root,
            read_only,
            scenarios,
        }
    }

    /// Creates the layout a specification describes.
    ///
    /// # Errors
    ///
    /// Returns [`PathsError::OutputRootUnset`] when the specification has no
    /// output root.
    pub fn from_specification(spec: &ForecastSpecification, read_only: bool) -> PathsResult<Self> {
        let root = spec.data().output_root().ok_or(PathsError::OutputRootUnset)?;
        Ok(Self::new(root, read_only, spec.scenario_names().cloned()))
    }

    /// Location of the specification copy for this run.
    #[must_use]
    pub fn forecast_specification(&self) -> PathBuf {
        self.root.join(FORECAST_SPECIFICATION_FILE)
    }

    /// Directories of one scenario.
    ///
    /// # Errors
    ///
    /// Returns [`PathsError::UnknownScenario`] for scenarios the layout was not
    /// built with.
    pub fn scenario(&self, scenario: &str) -> PathsResult<&ScenarioPaths> {
        self.scenarios
            .get(scenario)
            .ok_or_else(|| PathsError::UnknownScenario {
                name: scenario.into(),
            })
    }

    /// Beta scaling parameters for one scenario and draw.
    ///
    /// # Errors
    ///
    /// See [`ForecastPaths::scenario`].
    pub fn beta_scaling_path(&self, draw_id: DrawId, scenario: &str) -> PathsResult<PathBuf> {
        Ok(self.scenario(scenario)?.beta_scaling_path(draw_id))
    }

    /// SEIIR components for one scenario and draw.
    ///
    /// # Errors
    ///
    /// See [`ForecastPaths::scenario`].
    pub fn components_path(&self, draw_id: DrawId, scenario: &str) -> PathsResult<PathBuf> {
        Ok(self.scenario(scenario)?.components_path(draw_id))
    }

    /// Forecast outputs for one scenario and draw.
    ///
    /// # Errors
    ///
    /// See [`ForecastPaths::scenario`].
    pub fn outputs_path(&self, draw_id: DrawId, scenario: &str) -> PathsResult<PathBuf> {
        Ok(self.scenario(scenario)?.outputs_path(draw_id))
    }
}

impl OutputLayout for ForecastPaths {
    const KIND: &'static str = "forecast";

    fn root(&self) -> &Path {
        &self.root
    }

    fn read_only(&self) -> bool {
        self.read_only
    }

    fn directories(&self) -> Vec<PathBuf> {
        self.scenarios
            .values()
            .flat_map(ScenarioPaths::directories)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<ScenarioName> {
        values.iter().map(|v| ScenarioName::new(*v).unwrap()).collect()
    }

    #[test]
    fn scenario_files_follow_draw_template() {
        let paths = ScenarioPaths::new("/out/worse", true);
        assert_eq!(
            paths.beta_scaling_path(DrawId::new(3)),
            Path::new("/out/worse/beta_scaling/draw_3.csv")
        );
        assert_eq!(
            paths.components_path(DrawId::new(0)),
            Path::new("/out/worse/component_draws/draw_0.csv")
        );
        assert_eq!(
            paths.outputs_path(DrawId::new(12)),
            Path::new("/out/worse/outputs/draw_12.csv")
        );
    }

    #[test]
    fn forecast_paths_route_by_scenario() {
        let paths = ForecastPaths::new("/out", true, names(&["worse", "reference"]));
        assert_eq!(
            paths.outputs_path(DrawId::new(1), "reference").unwrap(),
            Path::new("/out/reference/outputs/draw_1.csv")
        );
        assert_eq!(
            paths.forecast_specification(),
            Path::new("/out/forecast_specification.yaml")
        );
        assert_eq!(paths.directories().len(), 6);
    }

    #[test]
    fn unknown_scenario_is_an_error() {
        let paths = ForecastPaths::new("/out", true, names(&["worse"]));
        let err = paths.components_path(DrawId::new(0), "best").unwrap_err();
        assert!(matches!(err, PathsError::UnknownScenario { ref name } if name == "best"));
    }

    #[test]
    fn read_only_layout_refuses_make_dirs() {
        let paths = ForecastPaths::new("/out", true, names(&["worse"]));
        let err = paths.make_dirs().unwrap_err();
        assert!(matches!(err, PathsError::ReadOnly { layout: "forecast", .. }));
    }
}
