//! Cashier Bank CLI
//!
//! Runs a workload through the bank and prints the final balances as CSV.
//!
//! # Usage
//!
//! ```bash
//! cargo run                                    # scripted demo
//! cargo run -- --workers 8 --rate-period-secs 1
//! cargo run -- --scenario csv operations.csv > balances.csv
//! cargo run -- --scenario csv --accounts 1,2 --log-dir logs operations.csv
//! RUST_LOG=debug cargo run -- --quiet-events
//! ```
//!
//! Logs go to stderr, filtered by `RUST_LOG` (default `info`). Balances go to
//! stdout.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, log directory not writable, etc.)

use cashier_bank::cli::{self, CliArgs};
use cashier_bank::scenario::{create_scenario, run_scenario};
use cashier_bank::{FileObserver, LogObserver, Observer};
use std::process;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;

const EVENT_LOG_NAME: &str = "MyLogs";
const EVENT_LOG_TAG: &str = "MyLog";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .init();
}

fn observers(args: &CliArgs) -> Result<Vec<Arc<dyn Observer>>, String> {
    let mut observers: Vec<Arc<dyn Observer>> = Vec::new();
    if !args.quiet_events {
        observers.push(Arc::new(LogObserver::new(EVENT_LOG_TAG)));
    }
    if let Some(dir) = &args.log_dir {
        observers.push(Arc::new(FileObserver::new(dir, EVENT_LOG_NAME, "txt")?));
    }
    Ok(observers)
}

fn run(args: CliArgs) -> Result<(), String> {
    let config = args.to_bank_config();
    let observers = observers(&args)?;
    let scenario = create_scenario(args.scenario, args.input_file, args.accounts)?;

    let mut output = std::io::stdout();
    run_scenario(scenario.as_ref(), config, observers, &mut output)?;
    Ok(())
}

fn main() {
    init_tracing();

    let args = cli::parse_args();
    if let Err(e) = run(args) {
        error!("{}", e);
        process::exit(1);
    }
}
