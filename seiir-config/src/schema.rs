//! Strongly typed forecast specification schema.
//!
//! A specification document looks like:
//!
//! ```yaml
//! data:
//!   regression_version: 2020_06_01.02
//!   covariate_version: 2020_05_30.01
//!   output_root: ''
//! scenarios:
//!   worse:
//!     algorithm: draw_level_mandate_reimposition
//!     algorithm_params:
//!       death_threshold: 8
//!       reimposition_duration: 6
//!       minimum_delay: 7
//!     solver: RK45
//!     system: normal
//!     beta_scaling:
//!       window_size: 42
//!       average_over_min: 7
//!       average_over_max: 42
//!       offset_deaths_lower: 150
//!       offset_deaths_upper: 300
//!     theta: /ihme/covid-19/seir-parameters/2020_06_01/thetas.csv
//!     covariates:
//!       pneumonia: reference
//!       mobility: worse
//! postprocessing:
//!   resampling:
//!     reference_scenario: worse
//!     lower_quantile: 0.025
//!     upper_quantile: 0.975
//! ```
//!
//! Every field except `algorithm_params` is required. Unknown keys are rejected.
//! Deserializing a [`ForecastSpecification`] or a [`Scenario`] validates it, so
//! every value of these types upholds the documented bounds.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use seiir_primitives::{CovariateName, ScenarioName, Selector};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult, SchemaError};
use crate::validate;

/// Named scenarios in declaration order.
pub type ScenarioSet = IndexMap<ScenarioName, Scenario>;

/// Algorithm tuning knobs keyed by parameter name.
pub type AlgorithmParams = IndexMap<String, ParamValue>;

/// Death count above which mandates are reimposed.
pub const DEATH_THRESHOLD: &str = "death_threshold";
/// Days a reimposed mandate stays in force.
pub const REIMPOSITION_DURATION: &str = "reimposition_duration";
/// Days before a mandate may be reimposed.
pub const MINIMUM_DELAY: &str = "minimum_delay";
/// Maximum number of reimpositions.
pub const REIMPOSITION_COUNT: &str = "reimposition_count";

/// Complete description of one forecast run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSpecification")]
pub struct ForecastSpecification {
    pub(crate) data: DataVersions,
    pub(crate) scenarios: ScenarioSet,
    pub(crate) postprocessing: PostprocessingConfig,
}

/// Document shape of a specification, before any bounds are checked.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawSpecification {
    data: DataVersions,
    #[serde(deserialize_with = "unique_map")]
    scenarios: IndexMap<ScenarioName, RawScenario>,
    postprocessing: PostprocessingConfig,
}

impl TryFrom<RawSpecification> for ForecastSpecification {
    type Error = ConfigError;

    fn try_from(raw: RawSpecification) -> ConfigResult<Self> {
        let spec = Self {
            data: raw.data,
            scenarios: raw
                .scenarios
                .into_iter()
                .map(|(name, scenario)| (name, scenario.into_unchecked()))
                .collect(),
            postprocessing: raw.postprocessing,
        };
        validate::specification(&spec)?;
        Ok(spec)
    }
}

impl ForecastSpecification {
    /// Starts building a specification around the supplied data versions.
    #[must_use]
    pub fn builder(data: DataVersions) -> ForecastSpecificationBuilder {
        ForecastSpecificationBuilder {
            data,
            scenarios: IndexMap::new(),
            resampling: None,
        }
    }

    /// Returns the upstream data versions.
    #[must_use]
    pub fn data(&self) -> &DataVersions {
        &self.data
    }

    /// Returns all declared scenarios in declaration order.
    #[must_use]
    pub fn scenarios(&self) -> &ScenarioSet {
        &self.scenarios
    }

    /// Looks up a scenario by name.
    #[must_use]
    pub fn scenario(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.get(name)
    }

    /// Returns the declared scenario names in declaration order.
    pub fn scenario_names(&self) -> impl Iterator<Item = &ScenarioName> {
        self.scenarios.keys()
    }

    /// Returns the postprocessing settings.
    #[must_use]
    pub fn postprocessing(&self) -> &PostprocessingConfig {
        &self.postprocessing
    }

    /// Returns the scenario resampling is anchored to.
    ///
    /// Always `Some`: loading, deserializing and building all reject unknown
    /// references.
    #[must_use]
    pub fn reference_scenario(&self) -> Option<&Scenario> {
        self.scenarios
            .get(self.postprocessing.resampling.reference_scenario.as_str())
    }

    /// Replaces the output root, e.g. when the document left it empty.
    pub fn set_output_root(&mut self, output_root: impl Into<PathBuf>) {
        self.data.output_root = output_root.into();
    }
}

/// Builder for [`ForecastSpecification`].
#[derive(Debug)]
pub struct ForecastSpecificationBuilder {
    data: DataVersions,
    scenarios: ScenarioSet,
    resampling: Option<ResamplingConfig>,
}

impl ForecastSpecificationBuilder {
    /// Adds a scenario, replacing any previous scenario of the same name.
    #[must_use]
    pub fn scenario(mut self, name: ScenarioName, scenario: Scenario) -> Self {
        self.scenarios.insert(name, scenario);
        self
    }

    /// Sets the resampling settings.
    #[must_use]
    pub fn resampling(mut self, resampling: ResamplingConfig) -> Self {
        self.resampling = Some(resampling);
        self
    }

    /// Consumes the builder and returns a validated specification.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::Schema`] when resampling settings are
    /// missing or a field is out of range, and [`crate::ConfigError::Reference`]
    /// when the resampling settings name an undeclared scenario.
    pub fn build(self) -> ConfigResult<ForecastSpecification> {
        let resampling = self
            .resampling
            .ok_or_else(|| SchemaError::missing("postprocessing.resampling"))?;
        let spec = ForecastSpecification {
            data: self.data,
            scenarios: self.scenarios,
            postprocessing: PostprocessingConfig { resampling },
        };
        validate::specification(&spec)?;
        Ok(spec)
    }
}

/// Versions of the upstream pipeline stages this forecast consumes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataVersions {
    pub(crate) regression_version: String,
    pub(crate) covariate_version: String,
    pub(crate) output_root: PathBuf,
}

impl DataVersions {
    /// Creates a data section. Pass an empty `output_root` to leave it unassigned.
    #[must_use]
    pub fn new(
        regression_version: impl Into<String>,
        covariate_version: impl Into<String>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            regression_version: regression_version.into(),
            covariate_version: covariate_version.into(),
            output_root: output_root.into(),
        }
    }

    /// Version tag (or directory) of the regression stage outputs.
    #[must_use]
    pub fn regression_version(&self) -> &str {
        &self.regression_version
    }

    /// Version tag (or directory) of the covariate projections.
    #[must_use]
    pub fn covariate_version(&self) -> &str {
        &self.covariate_version
    }

    /// Directory forecast outputs are written to, if one has been assigned.
    #[must_use]
    pub fn output_root(&self) -> Option<&Path> {
        if self.output_root.as_os_str().is_empty() {
            None
        } else {
            Some(&self.output_root)
        }
    }
}

/// A named bundle of simulation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScenario")]
pub struct Scenario {
    pub(crate) algorithm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) algorithm_params: Option<AlgorithmParams>,
    pub(crate) solver: String,
    pub(crate) system: String,
    pub(crate) beta_scaling: BetaScaling,
    pub(crate) theta: PathBuf,
    pub(crate) covariates: IndexMap<CovariateName, Selector>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawScenario {
    algorithm: String,
    #[serde(default, deserialize_with = "optional_unique_map")]
    algorithm_params: Option<AlgorithmParams>,
    solver: String,
    system: String,
    beta_scaling: BetaScaling,
    theta: PathBuf,
    #[serde(deserialize_with = "unique_map")]
    covariates: IndexMap<CovariateName, Selector>,
}

impl RawScenario {
    /// Bounds are checked by the caller, which knows the scenario's name.
    fn into_unchecked(self) -> Scenario {
        Scenario {
            algorithm: self.algorithm,
            algorithm_params: self.algorithm_params,
            solver: self.solver,
            system: self.system,
            beta_scaling: self.beta_scaling,
            theta: self.theta,
            covariates: self.covariates,
        }
    }
}

impl TryFrom<RawScenario> for Scenario {
    type Error = ConfigError;

    fn try_from(raw: RawScenario) -> ConfigResult<Self> {
        let scenario = raw.into_unchecked();
        validate::scenario("scenario", &scenario)?;
        Ok(scenario)
    }
}

impl Scenario {
    /// Starts building a scenario that runs the named algorithm.
    #[must_use]
    pub fn builder(algorithm: impl Into<String>) -> ScenarioBuilder {
        ScenarioBuilder {
            algorithm: algorithm.into(),
            algorithm_params: None,
            solver: None,
            system: None,
            beta_scaling: None,
            theta: None,
            covariates: IndexMap::new(),
        }
    }

    /// Identifier of the forecasting algorithm.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Algorithm parameters, when the document supplies any.
    #[must_use]
    pub fn algorithm_params(&self) -> Option<&AlgorithmParams> {
        self.algorithm_params.as_ref()
    }

    /// Looks up a single algorithm parameter as a float.
    #[must_use]
    pub fn algorithm_param(&self, name: &str) -> Option<f64> {
        self.algorithm_params
            .as_ref()
            .and_then(|params| params.get(name))
            .map(|value| value.as_f64())
    }

    /// Identifier of the ODE solver.
    #[must_use]
    pub fn solver(&self) -> &str {
        &self.solver
    }

    /// Identifier of the ODE system.
    #[must_use]
    pub fn system(&self) -> &str {
        &self.system
    }

    /// Beta-scaling window and offset parameters.
    #[must_use]
    pub fn beta_scaling(&self) -> &BetaScaling {
        &self.beta_scaling
    }

    /// Path of the theta parameter file.
    #[must_use]
    pub fn theta(&self) -> &Path {
        &self.theta
    }

    /// Covariate selectors in declaration order.
    #[must_use]
    pub fn covariates(&self) -> &IndexMap<CovariateName, Selector> {
        &self.covariates
    }
}

/// Builder for [`Scenario`].
#[derive(Debug)]
pub struct ScenarioBuilder {
    algorithm: String,
    algorithm_params: Option<AlgorithmParams>,
    solver: Option<String>,
    system: Option<String>,
    beta_scaling: Option<BetaScaling>,
    theta: Option<PathBuf>,
    covariates: IndexMap<CovariateName, Selector>,
}

impl ScenarioBuilder {
    /// Sets one algorithm parameter.
    #[must_use]
    pub fn algorithm_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.algorithm_params
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Sets the ODE solver.
    #[must_use]
    pub fn solver(mut self, solver: impl Into<String>) -> Self {
        self.solver = Some(solver.into());
        self
    }

    /// Sets the ODE system.
    #[must_use]
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Sets the beta-scaling parameters.
    #[must_use]
    pub fn beta_scaling(mut self, beta_scaling: BetaScaling) -> Self {
        self.beta_scaling = Some(beta_scaling);
        self
    }

    /// Sets the theta parameter file.
    #[must_use]
    pub fn theta(mut self, theta: impl Into<PathBuf>) -> Self {
        self.theta = Some(theta.into());
        self
    }

    /// Selects a variant for one covariate.
    #[must_use]
    pub fn covariate(mut self, covariate: CovariateName, selector: Selector) -> Self {
        self.covariates.insert(covariate, selector);
        self
    }

    /// Consumes the builder and returns a validated scenario.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::Schema`] when a required field is missing
    /// or any field is out of range.
    pub fn build(self) -> ConfigResult<Scenario> {
        let solver = self.solver.ok_or_else(|| SchemaError::missing("solver"))?;
        let system = self.system.ok_or_else(|| SchemaError::missing("system"))?;
        let beta_scaling = self
            .beta_scaling
            .ok_or_else(|| SchemaError::missing("beta_scaling"))?;
        let theta = self.theta.ok_or_else(|| SchemaError::missing("theta"))?;

        let scenario = Scenario {
            algorithm: self.algorithm,
            algorithm_params: self.algorithm_params,
            solver,
            system,
            beta_scaling,
            theta,
            covariates: self.covariates,
        };
        validate::scenario("scenario", &scenario)?;
        Ok(scenario)
    }
}

/// Numeric algorithm parameter, keeping integers distinct from floats.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Whole-number parameter such as a day count.
    Integer(i64),
    /// Fractional parameter.
    Float(f64),
}

impl ParamValue {
    /// Returns the value as a float.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Integer(value) => value as f64,
            Self::Float(value) => value,
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Smoothing window and death-count offsets for aligning forecast betas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BetaScaling {
    pub(crate) window_size: i64,
    pub(crate) average_over_min: i64,
    pub(crate) average_over_max: i64,
    pub(crate) offset_deaths_lower: i64,
    pub(crate) offset_deaths_upper: i64,
}

impl BetaScaling {
    /// Creates validated beta-scaling parameters.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::Schema`] when a value is negative or a
    /// lower bound exceeds its upper bound.
    pub fn new(
        window_size: i64,
        average_over_min: i64,
        average_over_max: i64,
        offset_deaths_lower: i64,
        offset_deaths_upper: i64,
    ) -> ConfigResult<Self> {
        let scaling = Self {
            window_size,
            average_over_min,
            average_over_max,
            offset_deaths_lower,
            offset_deaths_upper,
        };
        validate::beta_scaling("beta_scaling", &scaling)?;
        Ok(scaling)
    }

    /// Days of smoothing applied to the transition.
    #[must_use]
    pub const fn window_size(&self) -> i64 {
        self.window_size
    }

    /// Lower bound on the days excluded from the end of the residual history.
    #[must_use]
    pub const fn average_over_min(&self) -> i64 {
        self.average_over_min
    }

    /// Upper bound on the days of residual history averaged over.
    #[must_use]
    pub const fn average_over_max(&self) -> i64 {
        self.average_over_max
    }

    /// Deaths below which the full residual offset applies.
    #[must_use]
    pub const fn offset_deaths_lower(&self) -> i64 {
        self.offset_deaths_lower
    }

    /// Deaths at or above which no residual offset applies.
    #[must_use]
    pub const fn offset_deaths_upper(&self) -> i64 {
        self.offset_deaths_upper
    }
}

/// Settings for steps run after all scenarios finish.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostprocessingConfig {
    pub(crate) resampling: ResamplingConfig,
}

impl PostprocessingConfig {
    /// Resampling settings.
    #[must_use]
    pub fn resampling(&self) -> &ResamplingConfig {
        &self.resampling
    }
}

/// Quantile band drawn across draws, relative to a reference scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResamplingConfig {
    pub(crate) reference_scenario: String,
    pub(crate) lower_quantile: f64,
    pub(crate) upper_quantile: f64,
}

impl ResamplingConfig {
    /// Creates resampling settings. Bounds and the reference are checked when
    /// the owning specification is built.
    #[must_use]
    pub fn new(
        reference_scenario: impl Into<String>,
        lower_quantile: f64,
        upper_quantile: f64,
    ) -> Self {
        Self {
            reference_scenario: reference_scenario.into(),
            lower_quantile,
            upper_quantile,
        }
    }

    /// Name of the scenario the resampling is anchored to.
    #[must_use]
    pub fn reference_scenario(&self) -> &str {
        &self.reference_scenario
    }

    /// Lower quantile of the reported band.
    #[must_use]
    pub fn lower_quantile(&self) -> f64 {
        self.lower_quantile
    }

    /// Upper quantile of the reported band.
    #[must_use]
    pub fn upper_quantile(&self) -> f64 {
        self.upper_quantile
    }
}

/// Deserializes a mapping, rejecting repeated keys instead of keeping the last.
fn unique_map<'de, D, K, V>(deserializer: D) -> Result<IndexMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: Deserialize<'de> + Eq + Hash + fmt::Display,
    V: Deserialize<'de>,
{
    struct UniqueMapVisitor<K, V>(PhantomData<(K, V)>);

    impl<'de, K, V> Visitor<'de> for UniqueMapVisitor<K, V>
    where
        K: Deserialize<'de> + Eq + Hash + fmt::Display,
        V: Deserialize<'de>,
    {
        type Value = IndexMap<K, V>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a mapping with unique keys")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, value)) = access.next_entry::<K, V>()? {
                if map.contains_key(&key) {
                    return Err(de::Error::custom(format_args!("duplicate key `{key}`")));
                }
                map.insert(key, value);
            }
            Ok(map)
        }
    }

    deserializer.deserialize_map(UniqueMapVisitor(PhantomData))
}

fn optional_unique_map<'de, D, K, V>(deserializer: D) -> Result<Option<IndexMap<K, V>>, D::Error>
where
    D: Deserializer<'de>,
    K: Deserialize<'de> + Eq + Hash + fmt::Display,
    V: Deserialize<'de>,
{
    unique_map(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(value: &str) -> ScenarioName {
        ScenarioName::new(value).expect("name")
    }

    fn scaling() -> BetaScaling {
        BetaScaling::new(42, 7, 42, 150, 300).expect("scaling")
    }

    fn scenario() -> Scenario {
        Scenario::builder("normal")
            .solver("RK45")
            .system("normal")
            .beta_scaling(scaling())
            .theta("/data/thetas.csv")
            .covariate(
                CovariateName::new("mobility").unwrap(),
                Selector::new("reference").unwrap(),
            )
            .build()
            .expect("scenario")
    }

    #[test]
    fn builds_specification() {
        let spec = ForecastSpecification::builder(DataVersions::new("reg", "cov", ""))
            .scenario(name("reference"), scenario())
            .resampling(ResamplingConfig::new(name("reference"), 0.025, 0.975))
            .build()
            .expect("spec");

        assert_eq!(spec.scenarios().len(), 1);
        assert_eq!(spec.reference_scenario(), spec.scenario("reference"));
        assert_eq!(spec.data().output_root(), None);
    }

    #[test]
    fn builder_rejects_unknown_reference() {
        let err = ForecastSpecification::builder(DataVersions::new("reg", "cov", ""))
            .scenario(name("reference"), scenario())
            .resampling(ResamplingConfig::new(name("worse"), 0.025, 0.975))
            .build()
            .expect_err("unknown reference");
        assert!(err.is_reference());
    }

    #[test]
    fn builder_requires_resampling() {
        let err = ForecastSpecification::builder(DataVersions::new("reg", "cov", ""))
            .scenario(name("reference"), scenario())
            .build()
            .expect_err("missing resampling");
        assert!(err.is_schema());
    }

    #[test]
    fn scenario_requires_solver() {
        let err = Scenario::builder("normal")
            .system("normal")
            .beta_scaling(scaling())
            .theta("/data/thetas.csv")
            .build()
            .expect_err("missing solver");
        assert!(err.is_schema());
    }

    #[test]
    fn algorithm_params_keep_integer_form() {
        let scenario = Scenario::builder("draw_level_mandate_reimposition")
            .algorithm_param(DEATH_THRESHOLD, 8_i64)
            .algorithm_param("growth", 0.5)
            .solver("RK45")
            .system("normal")
            .beta_scaling(scaling())
            .theta("/data/thetas.csv")
            .build()
            .expect("scenario");

        let params = scenario.algorithm_params().expect("params");
        assert_eq!(params[DEATH_THRESHOLD], ParamValue::Integer(8));
        assert_eq!(scenario.algorithm_param("growth"), Some(0.5));
        assert_eq!(scenario.algorithm_param(MINIMUM_DELAY), None);
    }

    #[test]
    fn beta_scaling_rejects_inverted_window() {
        let err = BetaScaling::new(42, 50, 42, 150, 300).expect_err("min > max");
        assert!(err.is_schema());
    }

    #[test]
    fn output_root_is_reported_when_set() {
        let data = DataVersions::new("reg", "cov", "/out/forecast");
        assert_eq!(data.output_root(), Some(Path::new("/out/forecast")));
    }
}
