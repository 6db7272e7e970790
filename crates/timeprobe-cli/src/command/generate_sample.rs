use std::{io::Write as _, path::PathBuf};

use anyhow::{Context, anyhow, ensure};
use clap::Args;
use rand::{Rng, SeedableRng as _, distr::Uniform};
use rand_distr::Gumbel;
use rand_pcg::Pcg64Mcg;
use tracing::info;

use crate::util::Output;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub enum SampleDistribution {
    #[default]
    Uniform,
    Gumbel,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct GenerateSampleArg {
    /// Number of execution times to generate
    #[arg(long, default_value_t = 1000)]
    pub count: usize,

    /// Distribution of the generated times (uniform or gumbel)
    #[arg(long, default_value = "uniform")]
    pub distribution: SampleDistribution,

    /// Lower bound of the uniform distribution
    #[arg(long, default_value_t = 1.0)]
    pub low: f64,

    /// Upper bound (exclusive) of the uniform distribution
    #[arg(long, default_value_t = 100.0)]
    pub high: f64,

    /// Location of the Gumbel distribution
    #[arg(long, default_value_t = 2.0)]
    pub location: f64,

    /// Scale of the Gumbel distribution
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,

    /// Random seed (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output CSV file path (stdout when omitted)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub(crate) fn run(arg: &GenerateSampleArg) -> anyhow::Result<()> {
    let seed = arg.seed.unwrap_or_else(|| rand::rng().random());
    info!(seed, count = arg.count, distribution = ?arg.distribution, "generating sample");

    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    let values = generate(arg, &mut rng)?;

    let mut output = Output::create(arg.output.as_deref())?;
    let target = output.target().to_owned();
    let row = values
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    writeln!(output, "{row}").with_context(|| format!("Failed to write sample to {target}"))?;
    output.finish()?;

    eprintln!(
        "Generated {} execution times (seed {seed}) to {target}",
        values.len()
    );
    Ok(())
}

/// Draw `arg.count` non-negative execution times.
///
/// Gumbel draws below zero are clamped to zero.
fn generate<R>(arg: &GenerateSampleArg, rng: &mut R) -> anyhow::Result<Vec<f64>>
where
    R: Rng + ?Sized,
{
    let values = match arg.distribution {
        SampleDistribution::Uniform => {
            ensure!(
                arg.low >= 0.0,
                "uniform lower bound must be non-negative, got {}",
                arg.low
            );
            let dist = Uniform::new(arg.low, arg.high)
                .map_err(|e| anyhow!("invalid uniform range [{}, {}): {e}", arg.low, arg.high))?;
            rng.sample_iter(dist).take(arg.count).collect()
        }
        SampleDistribution::Gumbel => {
            let dist = Gumbel::new(arg.location, arg.scale).map_err(|e| {
                anyhow!(
                    "invalid Gumbel parameters (location {}, scale {}): {e}",
                    arg.location,
                    arg.scale
                )
            })?;
            rng.sample_iter(dist)
                .take(arg.count)
                .map(|v: f64| v.max(0.0))
                .collect()
        }
    };
    Ok(values)
}
