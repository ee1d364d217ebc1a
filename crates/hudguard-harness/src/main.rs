#![forbid(unsafe_code)]

//! Replays one resize storm and prints the JSONL report to stdout.
//!
//! Settings come from `HUDGUARD_HARNESS_*` variables; log verbosity from
//! `RUST_LOG` (default `warn`, written to stderr).

use std::process::ExitCode;

use hudguard_harness::HarnessOptions;
use hudguard_harness::scenario::run_scenario;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = HarnessOptions::from_env();
    match run_scenario(&options.scenario()) {
        Ok(report) => {
            println!("{}", report.to_jsonl());
            if report.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            tracing::error!(error = %err, "scenario aborted");
            ExitCode::FAILURE
        }
    }
}
