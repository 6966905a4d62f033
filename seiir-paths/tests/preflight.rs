use std::fs;
use std::path::{Path, PathBuf};

use seiir_config::{BetaScaling, DataVersions, ForecastSpecification, ResamplingConfig, Scenario};
use seiir_paths::{
    CovariatePaths, OutputLayout, PathsError, PreflightProblem, check_covariates, check_thetas,
    prepare_output, preflight,
};
use seiir_primitives::{CovariateName, DrawId, ScenarioName, Selector};
use uuid::Uuid;

struct Workspace {
    root: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let mut root = std::env::temp_dir();
        root.push(format!("seiir-preflight-{}", Uuid::new_v4()));
        fs::create_dir_all(&root).unwrap();
        Self { root }
    }

    fn covariates(&self) -> PathBuf {
        self.root.join("covariates")
    }

    fn theta(&self) -> PathBuf {
        self.root.join("thetas.csv")
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "location_id,value\n").unwrap();
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        fs::remove_dir_all(&self.root).ok();
    }
}

fn covariate(name: &str) -> CovariateName {
    CovariateName::new(name).unwrap()
}

fn selector(name: &str) -> Selector {
    Selector::new(name).unwrap()
}

fn scenario(theta: &Path, covariates: &[(&str, &str)]) -> Scenario {
    covariates
        .iter()
        .fold(
            Scenario::builder("normal")
                .solver("RK45")
                .system("normal")
                .beta_scaling(BetaScaling::new(42, 7, 42, 150, 300).unwrap())
                .theta(theta),
            |builder, (cov, sel)| builder.covariate(covariate(cov), selector(sel)),
        )
        .build()
        .unwrap()
}

fn specification(ws: &Workspace, worse: &[(&str, &str)]) -> ForecastSpecification {
    let reference = ScenarioName::new("reference").unwrap();
    ForecastSpecification::builder(DataVersions::new(
        "2020_06_04.01",
        ws.covariates().to_str().unwrap(),
        ws.root.join("forecast"),
    ))
    .scenario(
        reference.clone(),
        scenario(&ws.theta(), &[("mobility", "reference"), ("testing", "reference")]),
    )
    .scenario(ScenarioName::new("worse").unwrap(), scenario(&ws.theta(), worse))
    .resampling(ResamplingConfig::new(reference, 0.025, 0.975))
    .build()
    .unwrap()
}

fn populate_covariates(ws: &Workspace) {
    let paths = CovariatePaths::new(ws.covariates());
    for (cov, sel) in [("mobility", "reference"), ("mobility", "worse"), ("testing", "reference")] {
        Workspace::touch(&paths.scenario_file(&covariate(cov), &selector(sel)));
    }
}

#[test]
fn complete_inputs_pass() {
    let ws = Workspace::new();
    populate_covariates(&ws);
    Workspace::touch(&ws.theta());

    let spec = specification(&ws, &[("mobility", "worse"), ("testing", "reference")]);
    preflight(&spec).expect("inputs are complete");
}

#[test]
fn reports_missing_projection_and_theta() {
    let ws = Workspace::new();
    populate_covariates(&ws);

    let spec = specification(&ws, &[("mobility", "best"), ("testing", "reference")]);
    let covariates = CovariatePaths::new(ws.covariates());

    let problems = check_covariates(&spec, &covariates);
    assert_eq!(problems.len(), 1);
    assert!(matches!(
        &problems[0],
        PreflightProblem::MissingCovariateFile { selector, .. } if selector.as_str() == "best"
    ));

    assert_eq!(check_thetas(&spec).len(), 2);

    let err = preflight(&spec).expect_err("inputs are incomplete");
    match err {
        PathsError::Preflight { problems } => assert_eq!(problems.len(), 3),
        other => panic!("expected preflight failure, got {other:?}"),
    }
}

#[test]
fn reports_inconsistent_covariate_sets() {
    let ws = Workspace::new();
    populate_covariates(&ws);

    let spec = specification(&ws, &[("mobility", "worse")]);
    let problems = check_covariates(&spec, &CovariatePaths::new(ws.covariates()));

    assert_eq!(
        problems,
        [PreflightProblem::InconsistentCovariates {
            scenario: ScenarioName::new("worse").unwrap(),
            baseline: ScenarioName::new("reference").unwrap(),
            missing: vec![covariate("testing")],
            extra: vec![],
        }]
    );
}

#[test]
fn prepares_output_tree() {
    let ws = Workspace::new();
    let spec = specification(&ws, &[("mobility", "worse"), ("testing", "reference")]);

    let paths = prepare_output(&spec).expect("output tree");
    for dir in paths.directories() {
        assert!(dir.is_dir(), "{} should exist", dir.display());
    }

    let written = seiir_config::load(paths.forecast_specification()).expect("reload");
    assert_eq!(written, spec);

    let outputs = paths.outputs_path(DrawId::new(0), "worse").unwrap();
    assert_eq!(outputs, ws.root.join("forecast/worse/outputs/draw_0.csv"));
}

#[test]
fn prepare_requires_output_root() {
    let ws = Workspace::new();
    let mut spec = specification(&ws, &[("mobility", "worse"), ("testing", "reference")]);
    spec.set_output_root("");

    let err = prepare_output(&spec).expect_err("no output root");
    assert!(matches!(err, PathsError::OutputRootUnset));
}
