use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use self::{analyze::AnalyzeArg, generate_sample::GenerateSampleArg};

mod analyze;
mod generate_sample;

/// WCET analysis with extreme value theory
#[derive(Debug, Clone, Parser)]
#[command(name = "timeprobe", author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Print debug logs to stderr (overrides RUST_LOG)
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Fit a GEV distribution to measured execution times and report the pWCET
    Analyze(#[clap(flatten)] AnalyzeArg),
    /// Generate synthetic execution times for testing
    GenerateSample(#[clap(flatten)] GenerateSampleArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_tracing(args.debug);
    match args.mode {
        Mode::Analyze(arg) => analyze::run(&arg)?,
        Mode::GenerateSample(arg) => generate_sample::run(&arg)?,
    }
    Ok(())
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
