//! Layout of the regression stage outputs a forecast consumes.

use std::path::{Path, PathBuf};

use seiir_primitives::DrawId;

use crate::layout::{OutputLayout, draw_file};

/// Directories written by the regression stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegressionPaths {
    root: PathBuf,
    read_only: bool,
}

impl RegressionPaths {
    /// Creates the layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, read_only: bool) -> Self {
        Self {
            root: root.into(),
            read_only,
        }
    }

    /// YAML list of modelled location ids.
    #[must_use]
    pub fn location_metadata(&self) -> PathBuf {
        self.root.join("locations.yaml")
    }

    /// Specification the regression ran with.
    #[must_use]
    pub fn regression_specification(&self) -> PathBuf {
        self.root.join("regression_specification.yaml")
    }

    /// Fitted ODE parameters.
    #[must_use]
    pub fn parameters_dir(&self) -> PathBuf {
        self.root.join("parameters")
    }

    /// ODE parameters for one draw.
    #[must_use]
    pub fn beta_param_file(&self, draw_id: DrawId) -> PathBuf {
        self.parameters_dir().join(draw_file(draw_id))
    }

    /// Transition dates per location.
    #[must_use]
    pub fn date_dir(&self) -> PathBuf {
        self.root.join("dates")
    }

    /// Transition dates for one draw.
    #[must_use]
    pub fn date_file(&self, draw_id: DrawId) -> PathBuf {
        self.date_dir().join(draw_file(draw_id))
    }

    /// Fitted and predicted betas.
    #[must_use]
    pub fn beta_regression_dir(&self) -> PathBuf {
        self.root.join("beta")
    }

    /// Fitted and predicted betas for one draw.
    #[must_use]
    pub fn beta_regression_file(&self, draw_id: DrawId) -> PathBuf {
        self.beta_regression_dir().join(draw_file(draw_id))
    }

    /// Regression coefficients.
    #[must_use]
    pub fn coefficient_dir(&self) -> PathBuf {
        self.root.join("coefficients")
    }

    /// Regression coefficients for one draw.
    #[must_use]
    pub fn coefficient_file(&self, draw_id: DrawId) -> PathBuf {
        self.coefficient_dir().join(draw_file(draw_id))
    }

    /// Regression input data.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Regression input data for one draw.
    #[must_use]
    pub fn data_file(&self, draw_id: DrawId) -> PathBuf {
        self.data_dir().join(draw_file(draw_id))
    }
}

impl OutputLayout for RegressionPaths {
    const KIND: &'static str = "regression";

    fn root(&self) -> &Path {
        &self.root
    }

    fn read_only(&self) -> bool {
        self.read_only
    }

    fn directories(&self) -> Vec<PathBuf> {
        vec![
            self.parameters_dir(),
            self.date_dir(),
            self.beta_regression_dir(),
            self.coefficient_dir(),
            self.data_dir(),
        ]
    }
}
