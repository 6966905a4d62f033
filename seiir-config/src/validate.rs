//! Range and referential checks applied after deserialization.

use crate::error::{ConfigResult, ReferenceError, SchemaError};
use crate::schema::{BetaScaling, ForecastSpecification, ResamplingConfig, Scenario};

/// Validates a whole specification: schema bounds first, then references.
pub(crate) fn specification(spec: &ForecastSpecification) -> ConfigResult<()> {
    non_empty("data.regression_version", &spec.data.regression_version)?;
    non_empty("data.covariate_version", &spec.data.covariate_version)?;

    for (name, declared) in &spec.scenarios {
        scenario(&format!("scenarios.{name}"), declared)?;
    }

    resampling(&spec.postprocessing.resampling)?;

    let reference = &spec.postprocessing.resampling.reference_scenario;
    if !spec.scenarios.contains_key(reference.as_str()) {
        return Err(ReferenceError::UnknownScenario {
            field: "postprocessing.resampling.reference_scenario",
            name: reference.clone(),
            declared: spec.scenarios.keys().map(ToString::to_string).collect(),
        }
        .into());
    }

    Ok(())
}

pub(crate) fn scenario(prefix: &str, scenario: &Scenario) -> ConfigResult<()> {
    non_empty(&format!("{prefix}.algorithm"), &scenario.algorithm)?;
    non_empty(&format!("{prefix}.solver"), &scenario.solver)?;
    non_empty(&format!("{prefix}.system"), &scenario.system)?;
    if scenario.theta.as_os_str().is_empty() {
        return Err(SchemaError::empty(format!("{prefix}.theta")).into());
    }

    if let Some(params) = &scenario.algorithm_params {
        for (param, value) in params {
            let value = value.as_f64();
            if !value.is_finite() || value < 0.0 {
                return Err(SchemaError::out_of_range(
                    format!("{prefix}.algorithm_params.{param}"),
                    format!("must be a finite number >= 0, got {value}"),
                )
                .into());
            }
        }
    }

    beta_scaling(&format!("{prefix}.beta_scaling"), &scenario.beta_scaling)
}

pub(crate) fn beta_scaling(prefix: &str, scaling: &BetaScaling) -> ConfigResult<()> {
    let fields = [
        ("window_size", scaling.window_size),
        ("average_over_min", scaling.average_over_min),
        ("average_over_max", scaling.average_over_max),
        ("offset_deaths_lower", scaling.offset_deaths_lower),
        ("offset_deaths_upper", scaling.offset_deaths_upper),
    ];
    for (field, value) in fields {
        if value < 0 {
            return Err(SchemaError::out_of_range(
                format!("{prefix}.{field}"),
                format!("must be >= 0, got {value}"),
            )
            .into());
        }
    }

    if scaling.average_over_min > scaling.average_over_max {
        return Err(SchemaError::out_of_range(
            format!("{prefix}.average_over_min"),
            format!(
                "must not exceed average_over_max ({} > {})",
                scaling.average_over_min, scaling.average_over_max
            ),
        )
        .into());
    }

    if scaling.offset_deaths_lower > scaling.offset_deaths_upper {
        return Err(SchemaError::out_of_range(
            format!("{prefix}.offset_deaths_lower"),
            format!(
                "must not exceed offset_deaths_upper ({} > {})",
                scaling.offset_deaths_lower, scaling.offset_deaths_upper
            ),
        )
        .into());
    }

    Ok(())
}

fn resampling(resampling: &ResamplingConfig) -> ConfigResult<()> {
    let lower = resampling.lower_quantile;
    let upper = resampling.upper_quantile;

    for (field, value) in [("lower_quantile", lower), ("upper_quantile", upper)] {
        if !(0.0..=1.0).contains(&value) {
            return Err(SchemaError::out_of_range(
                format!("postprocessing.resampling.{field}"),
                format!("must lie in [0, 1], got {value}"),
            )
            .into());
        }
    }

    if lower >= upper {
        return Err(SchemaError::out_of_range(
            "postprocessing.resampling.lower_quantile",
            format!("must be below upper_quantile ({lower} >= {upper})"),
        )
        .into());
    }

    Ok(())
}

fn non_empty(field: &str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(SchemaError::empty(field).into());
    }
    Ok(())
}
