//! Validate, inspect and stage SEIIR forecast specifications.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use seiir_forecast::config::ForecastSpecification;
use seiir_forecast::paths::{self, PathsError};
use seiir_forecast::primitives::DrawId;
use seiir_forecast::scaling::{HistoryWindow, run_beta_residual_mean};
use seiir_forecast::telemetry::{self, TelemetryConfig};
use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "seiir", version, about)]
struct Cli {
    /// Log filter used when RUST_LOG is unset, e.g. `debug` or `seiir_config=debug`.
    #[arg(long, global = true, default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a specification and report whether it is valid.
    Validate {
        /// Forecast specification YAML.
        spec: PathBuf,
    },
    /// Print the normalized specification.
    Dump {
        /// Forecast specification YAML.
        spec: PathBuf,
    },
    /// Check that covariate projections and theta files exist.
    Check {
        /// Forecast specification YAML.
        spec: PathBuf,
    },
    /// Create the output tree and store the specification in it.
    Prepare {
        /// Forecast specification YAML.
        spec: PathBuf,
        /// Output root to use when the specification leaves it empty.
        #[arg(long)]
        output_root: Option<PathBuf>,
    },
    /// Compute beta scaling for a scenario from the regression outputs and
    /// write one file per draw.
    Scale {
        /// Forecast specification YAML.
        spec: PathBuf,
        /// Scenario whose beta scaling to use.
        #[arg(long)]
        scenario: String,
        /// CSV of cumulative deaths with `location_id,deaths` columns.
        #[arg(long)]
        deaths: PathBuf,
        /// Output root to use when the specification leaves it empty.
        #[arg(long)]
        output_root: Option<PathBuf>,
    },
    /// Print the residual averaging window of each draw as JSON.
    Windows {
        /// Forecast specification YAML.
        spec: PathBuf,
        /// Scenario whose beta scaling to use.
        #[arg(long)]
        scenario: String,
        /// Number of draws.
        #[arg(long, default_value_t = 100)]
        draws: u32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init(&TelemetryConfig::default().with_directive(cli.log.as_str()));

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Validate { spec } => {
            let spec = load(&spec)?;
            let reference = spec.postprocessing().resampling().reference_scenario();
            info!(
                scenarios = spec.scenarios().len(),
                reference = %reference,
                "specification is valid"
            );
        }
        Command::Dump { spec } => {
            let yaml = load(&spec)?.to_yaml()?;
            std::io::stdout().write_all(yaml.as_bytes())?;
        }
        Command::Check { spec } => match paths::preflight(&load(&spec)?) {
            Ok(()) => {}
            Err(PathsError::Preflight { problems }) => {
                bail!("{} pre-flight problem(s) found", problems.len())
            }
            Err(other) => return Err(other.into()),
        },
        Command::Prepare { spec, output_root } => {
            let spec = with_output_root(load(&spec)?, output_root)?;
            let layout = paths::prepare_output(&spec)?;
            println!("{}", layout.forecast_specification().display());
        }
        Command::Scale {
            spec,
            scenario,
            deaths,
            output_root,
        } => {
            let spec = with_output_root(load(&spec)?, output_root)?;
            let written = run_beta_residual_mean(&spec, &scenario, &deaths)
                .with_context(|| format!("beta scaling failed for scenario `{scenario}`"))?;
            for path in written {
                println!("{}", path.display());
            }
        }
        Command::Windows {
            spec,
            scenario,
            draws,
        } => {
            let spec = load(&spec)?;
            let chosen = spec
                .scenario(&scenario)
                .with_context(|| format!("scenario `{scenario}` is not declared"))?;
            let windows = DrawId::range(draws)
                .map(|draw| HistoryWindow::draw(draw, chosen.beta_scaling()))
                .collect::<Result<Vec<_>, _>>()?;
            print_json(&windows)?;
        }
    }
    Ok(())
}

fn load(path: &Path) -> Result<ForecastSpecification> {
    ForecastSpecification::load(path)
        .with_context(|| format!("invalid forecast specification {}", path.display()))
}

fn with_output_root(
    mut spec: ForecastSpecification,
    output_root: Option<PathBuf>,
) -> Result<ForecastSpecification> {
    if let Some(root) = output_root {
        if spec.data().output_root().is_some() {
            bail!("specification already sets data.output_root; refusing to override it");
        }
        spec.set_output_root(root);
    }
    Ok(spec)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
