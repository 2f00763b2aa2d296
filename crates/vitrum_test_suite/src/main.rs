//! `vitrum-visual-tests`: renders every glass scenario and compares it
//! against the reference PNGs under `<output>/references`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vitrum_test_suite::harness::{TestHarness, TestHarnessConfig};
use vitrum_test_suite::{tests, TestRunner};

#[derive(Parser)]
#[command(name = "vitrum-visual-tests")]
#[command(about = "Visual regression tests for liquid glass rendering")]
struct Args {
    /// Only run cases whose `suite::case` name contains this
    #[arg(short, long)]
    filter: Option<String>,

    /// Print the case names and exit
    #[arg(long)]
    list: bool,

    /// Directory for rendered images; references live in `<output>/references`
    #[arg(short, long, default_value = "test_output")]
    output: PathBuf,

    /// Largest mean channel error still counted as a match
    #[arg(long, default_value_t = 0.001)]
    threshold: f32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let suites = tests::all_suites();
    if args.list {
        for suite in &suites {
            for name in suite.qualified_names() {
                println!("{}", name);
            }
        }
        return Ok(());
    }

    let harness = TestHarness::with_config(TestHarnessConfig {
        reference_dir: args.output.join("references"),
        output_dir: args.output,
        threshold: args.threshold,
        ..Default::default()
    })?;
    let mut runner = TestRunner::new(harness);
    if let Some(pattern) = args.filter {
        runner = runner.with_filter(pattern);
    }

    let report = runner.run(suites);
    report.print();
    if !report.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}
