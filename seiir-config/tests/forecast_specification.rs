use std::path::PathBuf;

use proptest::prelude::*;
use seiir_config::schema::{DEATH_THRESHOLD, REIMPOSITION_COUNT};
use seiir_config::{
    BetaScaling, ConfigError, DataVersions, ForecastSpecification, ParamValue, ReferenceError,
    ResamplingConfig, Scenario, SchemaError,
};
use seiir_primitives::{CovariateName, ScenarioName, Selector};
use uuid::Uuid;

const FIXTURE: &str = include_str!("fixtures/forecast_specification.yaml");

fn temp_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("seiir-config-{}", Uuid::new_v4()));
    path.push(name);
    path
}

fn parse(yaml: &str) -> Result<ForecastSpecification, ConfigError> {
    ForecastSpecification::from_yaml(yaml)
}

#[test]
fn loads_fixture() {
    let spec = parse(FIXTURE).expect("fixture loads");

    let names: Vec<&str> = spec.scenario_names().map(|n| n.as_str()).collect();
    assert_eq!(names, ["worse", "reference", "reference_draw"]);

    assert_eq!(spec.data().regression_version(), "2020_06_04.01");
    assert_eq!(spec.data().covariate_version(), "2020_06_03.02");
    assert_eq!(spec.data().output_root(), None);

    let worse = spec.scenario("worse").expect("worse");
    assert_eq!(worse.algorithm(), "draw_level_mandate_reimposition");
    assert_eq!(worse.solver(), "RK45");
    assert_eq!(worse.system(), "normal");
    assert_eq!(worse.algorithm_param(DEATH_THRESHOLD), Some(8.0));
    assert_eq!(worse.algorithm_param(REIMPOSITION_COUNT), None);
    assert_eq!(worse.covariates()["mobility"].as_str(), "worse");
    assert_eq!(worse.covariates().len(), 9);

    let reference = spec.scenario("reference").expect("reference");
    assert_eq!(
        reference.algorithm_params().expect("params")[REIMPOSITION_COUNT],
        ParamValue::Integer(1)
    );

    let draw = spec.scenario("reference_draw").expect("reference_draw");
    assert!(draw.algorithm_params().is_none());

    let resampling = spec.postprocessing().resampling();
    assert_eq!(resampling.reference_scenario(), "worse");
    assert_eq!(spec.reference_scenario(), Some(worse));
}

#[test]
fn quantiles_are_ordered_within_unit_interval() {
    let spec = parse(FIXTURE).expect("fixture loads");
    let resampling = spec.postprocessing().resampling();
    assert!(0.0 <= resampling.lower_quantile());
    assert!(resampling.lower_quantile() < resampling.upper_quantile());
    assert!(resampling.upper_quantile() <= 1.0);
}

#[test]
fn beta_scaling_fields_are_bounded() {
    let spec = parse(FIXTURE).expect("fixture loads");
    for scenario in spec.scenarios().values() {
        let scaling = scenario.beta_scaling();
        assert!(scaling.window_size() >= 0);
        assert!(scaling.average_over_min() >= 0);
        assert!(scaling.average_over_min() <= scaling.average_over_max());
        assert!(scaling.offset_deaths_lower() <= scaling.offset_deaths_upper());
    }
}

#[test]
fn round_trips_through_yaml() {
    let spec = parse(FIXTURE).expect("fixture loads");
    let yaml = spec.to_yaml().expect("serialize");
    let reloaded = parse(&yaml).expect("reload");
    assert_eq!(spec, reloaded);
    assert_eq!(yaml, reloaded.to_yaml().expect("serialize again"));
}

#[test]
fn dump_then_load_from_disk() {
    let spec = parse(FIXTURE).expect("fixture loads");
    let path = temp_path("forecast_specification.yaml");

    spec.dump(&path).expect("dump");
    let reloaded = seiir_config::load(&path).expect("load");
    assert_eq!(spec, reloaded);

    if let Some(parent) = path.parent() {
        std::fs::remove_dir_all(parent).ok();
    }
}

#[test]
fn missing_file_is_io_error() {
    let err = seiir_config::load(temp_path("absent.yaml")).expect_err("no file");
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn missing_solver_is_schema_error() {
    let yaml = FIXTURE.replacen("    solver: 'RK45'\n", "", 1);
    let err = parse(&yaml).expect_err("solver is required");
    assert!(
        matches!(err, ConfigError::Schema(SchemaError::Malformed { .. })),
        "expected schema error, got {err:?}"
    );
    assert!(err.to_string().contains("solver"));
}

#[test]
fn missing_beta_scaling_field_is_schema_error() {
    let yaml = FIXTURE.replacen("      offset_deaths_upper: 300\n", "", 1);
    let err = parse(&yaml).expect_err("all five beta_scaling fields are required");
    assert!(err.is_schema());
}

#[test]
fn unknown_reference_scenario_is_reference_error() {
    let yaml = FIXTURE.replace("reference_scenario: 'worse'", "reference_scenario: 'missing_key'");
    let err = parse(&yaml).expect_err("unknown reference");
    match err {
        ConfigError::Reference(ReferenceError::UnknownScenario { name, declared, .. }) => {
            assert_eq!(name, "missing_key");
            assert_eq!(declared, ["worse", "reference", "reference_draw"]);
        }
        other => panic!("expected reference error, got {other:?}"),
    }
}

#[test]
fn reference_that_is_not_a_valid_name_is_reference_error() {
    let yaml = FIXTURE.replace("reference_scenario: 'worse'", "reference_scenario: 'missing key'");
    let err = parse(&yaml).expect_err("unknown reference");
    match err {
        ConfigError::Reference(ReferenceError::UnknownScenario { field, name, .. }) => {
            assert_eq!(field, "postprocessing.resampling.reference_scenario");
            assert_eq!(name, "missing key");
        }
        other => panic!("expected reference error, got {other:?}"),
    }

    let yaml = FIXTURE.replace("reference_scenario: 'worse'", "reference_scenario: ''");
    assert!(parse(&yaml).expect_err("empty reference").is_reference());
}

#[test]
fn inverted_quantiles_are_rejected() {
    let yaml = FIXTURE
        .replace("lower_quantile: 0.025", "lower_quantile: 0.975")
        .replace("upper_quantile: 0.975", "upper_quantile: 0.025");
    let err = parse(&yaml).expect_err("lower >= upper");
    assert!(matches!(
        err,
        ConfigError::Schema(SchemaError::OutOfRange { ref field, .. })
            if field == "postprocessing.resampling.lower_quantile"
    ));
}

#[test]
fn quantile_outside_unit_interval_is_rejected() {
    let yaml = FIXTURE.replace("upper_quantile: 0.975", "upper_quantile: 1.5");
    let err = parse(&yaml).expect_err("upper > 1");
    assert!(err.is_schema());
}

#[test]
fn nan_quantile_is_rejected() {
    let yaml = FIXTURE.replace("lower_quantile: 0.025", "lower_quantile: .nan");
    let err = parse(&yaml).expect_err("NaN quantile");
    assert!(matches!(
        err,
        ConfigError::Schema(SchemaError::OutOfRange { ref field, .. })
            if field == "postprocessing.resampling.lower_quantile"
    ));
}

#[test]
fn negative_beta_scaling_value_is_rejected() {
    let yaml = FIXTURE.replacen("window_size: 42", "window_size: -1", 1);
    let err = parse(&yaml).expect_err("negative window");
    assert!(matches!(
        err,
        ConfigError::Schema(SchemaError::OutOfRange { ref field, .. })
            if field == "scenarios.worse.beta_scaling.window_size"
    ));
}

#[test]
fn average_window_min_above_max_is_rejected() {
    let yaml = FIXTURE.replacen("average_over_min: 7", "average_over_min: 70", 1);
    let err = parse(&yaml).expect_err("min > max");
    assert!(err.is_schema());
}

#[test]
fn inverted_death_offsets_are_rejected() {
    let yaml = FIXTURE.replacen("offset_deaths_lower: 150", "offset_deaths_lower: 350", 1);
    let err = parse(&yaml).expect_err("lower > upper");
    assert!(matches!(
        err,
        ConfigError::Schema(SchemaError::OutOfRange { ref field, .. })
            if field == "scenarios.worse.beta_scaling.offset_deaths_lower"
    ));
}

#[test]
fn non_finite_algorithm_params_are_rejected() {
    for value in [".nan", ".inf"] {
        let yaml = FIXTURE.replacen("death_threshold: 8", &format!("death_threshold: {value}"), 1);
        let err = parse(&yaml).expect_err("non-finite param");
        assert!(
            matches!(
                err,
                ConfigError::Schema(SchemaError::OutOfRange { ref field, .. })
                    if field == "scenarios.worse.algorithm_params.death_threshold"
            ),
            "{value}: {err:?}"
        );
    }
}

#[test]
fn negative_algorithm_param_is_rejected() {
    let yaml = FIXTURE.replacen("death_threshold: 8", "death_threshold: -8", 1);
    let err = parse(&yaml).expect_err("negative param");
    assert!(err.is_schema());
}

#[test]
fn unknown_field_is_rejected() {
    let yaml = FIXTURE.replacen("    system: 'normal'\n", "    system: 'normal'\n    sytem: 'typo'\n", 1);
    let err = parse(&yaml).expect_err("unknown field");
    assert!(err.is_schema());
}

#[test]
fn duplicate_scenario_is_rejected() {
    let yaml = FIXTURE.replacen("  reference_draw:\n", "  reference:\n", 1);
    let err = parse(&yaml).expect_err("duplicate scenario name");
    assert!(err.is_schema());
}

#[test]
fn path_like_scenario_name_is_rejected() {
    let yaml = FIXTURE.replacen("  reference_draw:\n", "  '../escape':\n", 1);
    let err = parse(&yaml).expect_err("unsafe name");
    assert!(err.is_schema());
}

#[test]
fn empty_theta_is_rejected() {
    let yaml = FIXTURE.replacen(
        "theta: '/ihme/covid-19/seir-parameters/2020_06_04.01/thetas.csv'",
        "theta: ''",
        1,
    );
    let err = parse(&yaml).expect_err("empty theta");
    assert!(matches!(err, ConfigError::Schema(SchemaError::Empty { .. })));
}

#[test]
fn output_root_override_survives_round_trip() {
    let mut spec = parse(FIXTURE).expect("fixture loads");
    spec.set_output_root("/ihme/covid-19/seir-forecast/2020_06_05.01");
    let reloaded = parse(&spec.to_yaml().expect("serialize")).expect("reload");
    assert_eq!(
        reloaded.data().output_root(),
        Some(std::path::Path::new("/ihme/covid-19/seir-forecast/2020_06_05.01"))
    );
}

#[test]
fn plain_deserialization_also_validates() {
    let yaml = FIXTURE.replace("upper_quantile: 0.975", "upper_quantile: 1.5");
    assert!(serde_yaml::from_str::<ForecastSpecification>(&yaml).is_err());

    let yaml = FIXTURE.replace("reference_scenario: 'worse'", "reference_scenario: 'best'");
    assert!(serde_yaml::from_str::<ForecastSpecification>(&yaml).is_err());

    let scenario = r"
algorithm: normal
solver: RK45
system: normal
beta_scaling:
  window_size: -1
  average_over_min: 7
  average_over_max: 42
  offset_deaths_lower: 150
  offset_deaths_upper: 300
theta: /data/thetas.csv
covariates:
  mobility: reference
";
    assert!(serde_yaml::from_str::<Scenario>(scenario).is_err());
    let valid = scenario.replace("window_size: -1", "window_size: 42");
    let scenario: Scenario = serde_yaml::from_str(&valid).expect("valid scenario");
    assert_eq!(scenario.beta_scaling().window_size(), 42);
}

fn param_value() -> impl Strategy<Value = ParamValue> {
    prop_oneof![
        (0_i64..10_000).prop_map(ParamValue::Integer),
        (0_u32..100_000).prop_map(|n| ParamValue::Float(f64::from(n) / 4.0)),
    ]
}

fn scenario_strategy() -> impl Strategy<Value = Scenario> {
    (
        proptest::collection::vec(param_value(), 0..4),
        (0_i64..100, 1_i64..50, 0_i64..50, 0_i64..500, 0_i64..500),
    )
        .prop_map(|(params, (window, min, spread, lower, band))| {
            let mut builder = Scenario::builder("draw_level_mandate_reimposition");
            for (index, value) in params.into_iter().enumerate() {
                builder = builder.algorithm_param(format!("param_{index}"), value);
            }
            builder
                .solver("RK45")
                .system("normal")
                .beta_scaling(BetaScaling::new(window, min, min + spread, lower, lower + band).unwrap())
                .theta("/data/thetas.csv")
                .covariate(
                    CovariateName::new("mobility").unwrap(),
                    Selector::new("reference").unwrap(),
                )
                .build()
                .unwrap()
        })
}

fn specification_strategy() -> impl Strategy<Value = ForecastSpecification> {
    (
        proptest::collection::vec(scenario_strategy(), 1..4),
        any::<prop::sample::Index>(),
        0_u32..500,
        500_u32..=1000,
        proptest::option::of("[a-z]{1,8}"),
    )
        .prop_map(|(scenarios, reference, lower, upper, root)| {
            let count = scenarios.len();
            let output_root = root.map(|dir| format!("/data/forecast/{dir}")).unwrap_or_default();
            let mut builder = ForecastSpecification::builder(DataVersions::new(
                "2020_06_04.01",
                "2020_06_03.02",
                output_root,
            ));
            for (index, scenario) in scenarios.into_iter().enumerate() {
                builder = builder.scenario(ScenarioName::new(format!("scenario_{index}")).unwrap(), scenario);
            }
            builder
                .resampling(ResamplingConfig::new(
                    format!("scenario_{}", reference.index(count)),
                    f64::from(lower) / 1000.0,
                    f64::from(upper) / 1000.0,
                ))
                .build()
                .unwrap()
        })
}

proptest! {
    #[test]
    fn generated_specifications_round_trip(spec in specification_strategy()) {
        let yaml = spec.to_yaml().unwrap();
        let reloaded = ForecastSpecification::from_yaml(&yaml).unwrap();
        prop_assert_eq!(&reloaded, &spec);
        prop_assert_eq!(reloaded.to_yaml().unwrap(), yaml);
    }
}
