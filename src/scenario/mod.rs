//! Workload scenarios driving a bank
//!
//! A scenario decides which accounts exist and which operations are submitted.
//! `run_scenario` owns everything around it: building the bank, attaching
//! observers, draining and stopping, and writing the final balances. This lets
//! different workload sources be selected at runtime.

use crate::cli::ScenarioType;
use crate::core::{Bank, BankConfig, Observer, StatsSnapshot};
use crate::io::write_balances_csv;
use crate::types::AccountId;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub mod csv;
pub mod demo;

pub use self::csv::CsvScenario;
pub use demo::DemoScenario;

/// Source of accounts and operations for one bank run
pub trait Scenario: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Register accounts and submit operations
    ///
    /// May wait on the bank between phases. Returning leaves the remaining
    /// queue to be drained by the caller. Errors are fatal to the run.
    fn run(&self, bank: &Bank) -> Result<(), String>;
}

/// Create a scenario from its type and CLI inputs
///
/// `input` is required for the CSV scenario and ignored by the demo.
pub fn create_scenario(
    scenario_type: ScenarioType,
    input: Option<PathBuf>,
    accounts: Option<Vec<AccountId>>,
) -> Result<Box<dyn Scenario>, String> {
    match scenario_type {
        ScenarioType::Demo => Ok(Box::new(DemoScenario::default())),
        ScenarioType::Csv => {
            let input = input.ok_or_else(|| "The csv scenario requires an INPUT file".to_string())?;
            Ok(Box::new(CsvScenario::new(input, accounts)))
        }
    }
}

/// Run a scenario to completion and write the final balances as CSV
///
/// Builds a bank from `config`, attaches `observers`, starts it if the config
/// did not, runs the scenario, then drains and stops the bank using the
/// configured drain timeout. Operations abandoned by a drain timeout are
/// logged and the balances at stop time are written anyway.
pub fn run_scenario(
    scenario: &dyn Scenario,
    config: BankConfig,
    observers: Vec<Arc<dyn Observer>>,
    output: &mut dyn Write,
) -> Result<StatsSnapshot, String> {
    let bank = Bank::new(config).map_err(|e| format!("Failed to create bank: {}", e))?;
    bank.add_observers(observers);
    bank.start()
        .map_err(|e| format!("Failed to start bank: {}", e))?;

    info!(scenario = scenario.name(), "running scenario");
    let outcome = scenario.run(&bank);

    if !bank.shutdown() {
        warn!(
            scenario = scenario.name(),
            abandoned = bank.queue_len(),
            "bank stopped before the queue was drained"
        );
    }
    outcome?;

    let stats = bank.stats();
    info!(
        completed = stats.completed,
        failed = stats.failed,
        "scenario finished"
    );

    write_balances_csv(&bank.accounts_snapshot(), output)?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observers::RecordingObserver;
    use crate::types::Operation;
    use rust_decimal::Decimal;
    use std::time::Duration;

    struct FixedScenario;

    impl Scenario for FixedScenario {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn run(&self, bank: &Bank) -> Result<(), String> {
            bank.open_account(Some(1));
            bank.submit_all([
                Operation::deposit(1, "USD", Decimal::from(10)),
                Operation::withdraw(1, "USD", Decimal::from(3)),
            ]);
            Ok(())
        }
    }

    struct FailingScenario;

    impl Scenario for FailingScenario {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn run(&self, _bank: &Bank) -> Result<(), String> {
            Err("source unavailable".to_string())
        }
    }

    fn config() -> BankConfig {
        BankConfig {
            worker_count: 1,
            initial_rates: vec![("USD".to_string(), 1.0)],
            rate_update_period: Duration::ZERO,
            drain_timeout: Some(Duration::from_secs(10)),
            ..BankConfig::default()
        }
    }

    #[test]
    fn test_run_scenario_writes_final_balances() {
        let recorder = Arc::new(RecordingObserver::new());
        let mut output = Vec::new();

        let observers: Vec<Arc<dyn Observer>> = vec![recorder.clone()];

        let stats = run_scenario(&FixedScenario, config(), observers, &mut output).unwrap();

        assert_eq!(stats, StatsSnapshot { completed: 2, failed: 0 });
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "account,currency,balance\n1,USD,7.0000\n"
        );
        assert!(recorder
            .messages()
            .contains(&"account 1 registered".to_string()));
    }

    #[test]
    fn test_run_scenario_propagates_scenario_errors() {
        let mut output = Vec::new();

        let result = run_scenario(&FailingScenario, config(), Vec::new(), &mut output);

        assert_eq!(result.unwrap_err(), "source unavailable");
        assert!(output.is_empty());
    }

    #[test]
    fn test_create_scenario_requires_input_for_csv() {
        let result = create_scenario(ScenarioType::Csv, None, None);
        assert!(result.is_err());

        let demo = create_scenario(ScenarioType::Demo, None, None).unwrap();
        assert_eq!(demo.name(), "demo");
    }
}
