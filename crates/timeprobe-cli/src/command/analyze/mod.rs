//! WCET analysis command
//!
//! Reads measured execution times, fits a GEV distribution to their block
//! maxima and reports the exceedance probability of a boundary, pWCET
//! estimates and Q-Q diagnostics. Plot data can be exported as CSV.

mod report;

use std::{num::NonZeroUsize, path::PathBuf};

use anyhow::Context;
use clap::Args;
use timeprobe_evt::{
    analysis::{
        self, AnalysisConfig, DEFAULT_BLOCK_SIZE, DEFAULT_CURVE_STEP, DEFAULT_TARGET_PROBABILITIES,
    },
    diagnostics::{InfinitePpfPolicy, PlottingPosition},
    sample::ExecutionTimeSample,
};
use tracing::info;

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct AnalyzeArg {
    /// CSV file whose last non-empty row holds the comma-separated execution times
    pub input: PathBuf,

    /// Number of measurements per block in the block maxima method
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: NonZeroUsize,

    /// Execution time whose exceedance probability is reported
    #[arg(long)]
    pub boundary: Option<f64>,

    /// Plotting positions for the Q-Q diagnostics (rank, weibull, hazen, gringorten)
    #[arg(long, default_value = "weibull")]
    pub plotting_position: PlottingPosition,

    /// Replacement for infinite fitted quantiles: `clamp` or a number
    #[arg(long, default_value = "clamp", value_parser = parse_infinite_policy)]
    pub infinite_ppf: InfinitePpfPolicy,

    /// Spacing of the exported CDF / survival curve points
    #[arg(long, default_value_t = DEFAULT_CURVE_STEP)]
    pub curve_step: f64,

    /// Exceedance probabilities at which the pWCET is reported (comma-separated)
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_TARGET_PROBABILITIES)]
    pub target_probabilities: Vec<f64>,

    /// Report format (text or json)
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Report file path (stdout when omitted)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Save the CDF and survival curve as CSV (x,cdf,survival)
    #[arg(long)]
    pub curve_output: Option<PathBuf>,

    /// Save the Q-Q pairs as CSV (percentile,ppf,maximum)
    #[arg(long)]
    pub qq_output: Option<PathBuf>,
}

impl AnalyzeArg {
    fn config(&self) -> AnalysisConfig {
        AnalysisConfig {
            block_size: self.block_size,
            boundary: self.boundary,
            plotting_position: self.plotting_position,
            infinite_policy: self.infinite_ppf,
            // only JSON reports and CSV exports read the curve
            include_curve: self.format == OutputFormat::Json || self.curve_output.is_some(),
            curve_step: self.curve_step,
            target_probabilities: self.target_probabilities.clone(),
        }
    }
}

fn parse_infinite_policy(s: &str) -> Result<InfinitePpfPolicy, String> {
    if s.eq_ignore_ascii_case("clamp") {
        return Ok(InfinitePpfPolicy::ClampToFinite);
    }
    s.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(InfinitePpfPolicy::Constant)
        .ok_or_else(|| format!("expected `clamp` or a finite number, got `{s}`"))
}

pub(crate) fn run(arg: &AnalyzeArg) -> anyhow::Result<()> {
    let config = arg.config();
    config
        .validate()
        .context("Invalid analysis configuration")?;

    let values = util::read_execution_times(&arg.input)?;
    let sample = ExecutionTimeSample::new(values)
        .with_context(|| format!("Invalid execution times in {}", arg.input.display()))?;
    info!(
        input = %arg.input.display(),
        count = sample.len(),
        block_size = config.block_size.get(),
        "analyzing execution times"
    );

    let report = analysis::analyze(&sample, &config)
        .with_context(|| format!("Failed to analyze {}", arg.input.display()))?;

    match arg.format {
        OutputFormat::Text => {
            let mut output = Output::create(arg.output.as_deref())?;
            report::write_text(&mut output, &arg.input, &report)
                .with_context(|| format!("Failed to write report to {}", output.target()))?;
            output.finish()?;
        }
        OutputFormat::Json => {
            Output::create(arg.output.as_deref())?
                .write_json(&report::JsonReport::new(&arg.input, &report))?;
        }
    }

    if let (Some(path), Some(curve)) = (&arg.curve_output, &report.curve) {
        report::save_curve_csv(path, curve)?;
        eprintln!("CDF curve saved to: {}", path.display());
    }
    if let Some(path) = &arg.qq_output {
        report::save_qq_csv(path, &report.qq)?;
        eprintln!("Q-Q pairs saved to: {}", path.display());
    }

    Ok(())
}
