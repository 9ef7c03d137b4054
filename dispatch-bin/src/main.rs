use std::{
    io::{self, Write as _},
    process::ExitCode,
};

use anyhow::Context as _;
use clap::Parser;
use dispatch::{
    allocation::{FailAfter, FaultInjector, Heap, Policy},
    demo::{self, DemoConfig, Outcome},
};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Builds a student, then talks to it through a person-typed view.
#[derive(Debug, Parser)]
#[command(name = "dispatch", version)]
struct Args {
    #[arg(long, default_value_t = 19)]
    age: u32,

    #[arg(long, default_value = "Liam")]
    name: String,

    #[arg(long, default_value_t = 3.8)]
    gpa: f64,

    /// Let this many allocations succeed, then fail every later one
    #[arg(long, conflicts_with = "fail_rate")]
    fail_after: Option<usize>,

    /// Fail each allocation with this probability
    #[arg(long)]
    fail_rate: Option<f64>,

    /// Seed for --fail-rate
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Print the slot layout of every method table first
    #[arg(long)]
    show_layout: bool,

    /// Also print the gpa, read without going through the method table
    #[arg(long)]
    report_gpa: bool,

    /// Used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Args {
    fn allocation_policy(&self) -> Policy {
        if let Some(successes) = self.fail_after {
            Policy::FailAfter(FailAfter::new(successes))
        } else if let Some(rate) = self.fail_rate {
            Policy::FaultInjector(FaultInjector::new(rate, self.seed))
        } else {
            Policy::Heap(Heap)
        }
    }

    fn demo_config(&self) -> DemoConfig {
        DemoConfig {
            age: self.age,
            name: self.name.clone(),
            gpa: self.gpa,
            show_layout: self.show_layout,
            report_gpa: self.report_gpa,
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .compact()
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let outcome = demo::run(&args.allocation_policy(), &args.demo_config(), &mut out)
        .context("demonstration failed")?;
    out.flush()?;

    if let Outcome::ConstructionFailed(cause) = &outcome {
        error!(%cause, "could not construct the demonstration record");
    }

    Ok(ExitCode::from(outcome.exit_code()))
}
