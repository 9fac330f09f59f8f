use crate::core::BankConfig;
use crate::types::AccountId;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Run a concurrent multi-currency bank over a scripted or CSV workload
#[derive(Parser, Debug)]
#[command(name = "cashier-bank")]
#[command(
    about = "Run a concurrent multi-currency bank over a scripted or CSV workload",
    long_about = None
)]
pub struct CliArgs {
    /// Input CSV file with operations (csv scenario only)
    #[arg(
        value_name = "INPUT",
        required_if_eq("scenario", "csv"),
        help = "Path to the input CSV file"
    )]
    pub input_file: Option<PathBuf>,

    /// Workload to run
    #[arg(
        long = "scenario",
        value_name = "SCENARIO",
        default_value = "demo",
        help = "Workload: 'demo' for the scripted demo or 'csv' to read INPUT"
    )]
    pub scenario: ScenarioType,

    /// Number of cashier threads
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Number of cashier threads (default: 5)"
    )]
    pub workers: Option<usize>,

    /// Exchange rate entries; replaces the default table when given
    #[arg(
        long = "rate",
        value_name = "CUR=RATE",
        value_parser = parse_rate,
        help = "Exchange rate for a currency, repeatable (default: USD=1,RUB=130,EUR=1.29)"
    )]
    pub rates: Vec<(String, f64)>,

    /// Seconds between rate perturbations
    #[arg(
        long = "rate-period-secs",
        value_name = "SECS",
        help = "Seconds between exchange rate perturbations, 0 disables (default: 60)"
    )]
    pub rate_period_secs: Option<u64>,

    /// Jitter power for rate perturbation
    #[arg(
        long = "jitter-power",
        value_name = "POWER",
        help = "Rate jitter power, must exceed 0.5 (default: 5)"
    )]
    pub jitter_power: Option<f64>,

    /// Idle cashier poll timeout
    #[arg(
        long = "poll-timeout-micros",
        value_name = "MICROS",
        help = "How long an idle cashier waits for work before rechecking for stop, at most 1000000 (default: 1000)"
    )]
    pub poll_timeout_micros: Option<u64>,

    /// Drain timeout at shutdown
    #[arg(
        long = "drain-timeout-ms",
        value_name = "MILLIS",
        help = "How long to wait for the queue to drain at shutdown, 0 waits indefinitely (default: 0)"
    )]
    pub drain_timeout_ms: Option<u64>,

    /// Accounts to open for the csv scenario
    #[arg(
        long = "accounts",
        value_name = "IDS",
        value_delimiter = ',',
        help = "Comma-separated account IDs to open (default: every ID in INPUT)"
    )]
    pub accounts: Option<Vec<AccountId>>,

    /// Directory for the event log file
    #[arg(
        long = "log-dir",
        value_name = "DIR",
        help = "Write every bank event to a timestamped file in DIR"
    )]
    pub log_dir: Option<PathBuf>,

    /// Do not forward bank events to the log
    #[arg(long = "quiet-events", help = "Do not log individual bank events")]
    pub quiet_events: bool,
}

/// Available workloads
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScenarioType {
    Demo,
    Csv,
}

fn parse_rate(value: &str) -> Result<(String, f64), String> {
    let (currency, rate) = value
        .split_once('=')
        .ok_or_else(|| format!("expected CUR=RATE, got '{}'", value))?;

    let currency = currency.trim();
    if currency.is_empty() {
        return Err(format!("missing currency in '{}'", value));
    }

    let rate: f64 = rate
        .trim()
        .parse()
        .map_err(|_| format!("invalid rate '{}' for {}", rate.trim(), currency))?;
    if !(rate > 0.0 && rate.is_finite()) {
        return Err(format!("rate for {} must be positive, got {}", currency, rate));
    }

    Ok((currency.to_string(), rate))
}

impl CliArgs {
    /// Create a BankConfig from CLI arguments
    ///
    /// Unset options fall back to `BankConfig::default()`. Invalid values are
    /// replaced by their defaults with a warning.
    pub fn to_bank_config(&self) -> BankConfig {
        let default = BankConfig::default();

        BankConfig {
            worker_count: self.workers.unwrap_or(default.worker_count),
            initial_rates: if self.rates.is_empty() {
                default.initial_rates
            } else {
                self.rates.clone()
            },
            rate_update_period: self
                .rate_period_secs
                .map(Duration::from_secs)
                .unwrap_or(default.rate_update_period),
            rate_jitter_power: self.jitter_power.unwrap_or(default.rate_jitter_power),
            poll_timeout: self
                .poll_timeout_micros
                .map(Duration::from_micros)
                .unwrap_or(default.poll_timeout),
            drain_timeout: match self.drain_timeout_ms {
                None | Some(0) => None,
                Some(millis) => Some(Duration::from_millis(millis)),
            },
            auto_start: default.auto_start,
        }
        .validated()
    }
}
