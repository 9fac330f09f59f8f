//! End-to-end integration tests
//!
//! These tests drive the complete pipeline through `run_scenario`: CSV input,
//! account opening, cashier processing, drain and stop, CSV output.
//!
//! Fixture tests run with a single cashier so that operations are processed in
//! file order and the expected balances are deterministic. Fixtures are located
//! in tests/fixtures/ and cover:
//! - Happy path across every operation kind
//! - Insufficient funds for withdraw, transfer and exchange
//! - Invalid amounts and currencies
//! - Operations on accounts that were never opened
//! - Malformed rows
//! - Four decimal place precision

#[cfg(test)]
mod tests {
    use cashier_bank::observers::RecordingObserver;
    use cashier_bank::scenario::{run_scenario, CsvScenario, DemoScenario};
    use cashier_bank::{AccountId, BankConfig, Observer, StatsSnapshot};
    use rstest::rstest;
    use std::fs;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn fixture_config() -> BankConfig {
        BankConfig {
            worker_count: 1,
            initial_rates: vec![("USD".to_string(), 1.0), ("EUR".to_string(), 2.0)],
            rate_update_period: Duration::ZERO,
            drain_timeout: Some(Duration::from_secs(30)),
            ..BankConfig::default()
        }
    }

    /// Run a fixture by processing input.csv and comparing with expected.csv
    fn run_test_fixture(fixture_name: &str, accounts: Option<Vec<AccountId>>) {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let input_path = format!("{}/input.csv", fixture_dir);
        let expected_path = format!("{}/expected.csv", fixture_dir);

        assert!(
            Path::new(&input_path).exists(),
            "Input file not found: {}",
            input_path
        );

        let scenario = CsvScenario::new(PathBuf::from(&input_path), accounts);
        let mut output = Vec::new();

        run_scenario(&scenario, fixture_config(), Vec::new(), &mut output)
            .unwrap_or_else(|e| panic!("Failed to run fixture {}: {}", fixture_name, e));

        let actual_output = String::from_utf8(output).unwrap();
        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {}\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, actual_output, expected_output
        );
    }

    #[rstest]
    #[case("happy_path", None)]
    #[case("insufficient_funds", None)]
    #[case("invalid_operations", None)]
    #[case("missing_accounts", Some(vec![1]))]
    #[case("malformed_data", None)]
    #[case("precision", None)]
    fn test_fixtures(#[case] fixture: &str, #[case] accounts: Option<Vec<AccountId>>) {
        run_test_fixture(fixture, accounts);
    }

    #[test]
    fn test_csv_scenario_reports_failures_to_observers() {
        let mut input = NamedTempFile::new().unwrap();
        input
            .write_all(
                b"type,account,to_account,currency,to_currency,amount\n\
                  deposit,1,,USD,,10\n\
                  withdraw,1,,USD,,11\n",
            )
            .unwrap();
        input.flush().unwrap();

        let recorder = Arc::new(RecordingObserver::new());
        let observers: Vec<Arc<dyn Observer>> = vec![recorder.clone()];
        let scenario = CsvScenario::new(input.path().to_path_buf(), None);

        let stats = run_scenario(&scenario, fixture_config(), observers, &mut Vec::new()).unwrap();

        assert_eq!(stats, StatsSnapshot { completed: 1, failed: 1 });
        let messages = recorder.messages();
        assert!(messages.contains(&"deposited 10 USD to account 1".to_string()));
        assert!(messages
            .iter()
            .any(|message| message.starts_with("insufficient USD funds on account 1")));
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let scenario = CsvScenario::new(PathBuf::from("tests/fixtures/does_not_exist.csv"), None);
        let mut output = Vec::new();

        let result = run_scenario(&scenario, fixture_config(), Vec::new(), &mut output);

        assert!(result.unwrap_err().contains("Failed to open file"));
        assert!(output.is_empty());
    }

    #[test]
    fn test_demo_scenario_returns_to_opening_balances() {
        let config = BankConfig {
            rate_update_period: Duration::ZERO,
            drain_timeout: Some(Duration::from_secs(60)),
            ..BankConfig::default()
        };
        let mut output = Vec::new();

        let stats = run_scenario(&DemoScenario::default(), config, Vec::new(), &mut output).unwrap();

        assert_eq!(stats.completed, 2 + 10_000 + 50);
        assert_eq!(stats.failed, 0);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "account,currency,balance\n\
             1,EUR,0.0000\n1,RUB,0.0000\n1,USD,1000.0000\n\
             2,EUR,0.0000\n2,RUB,0.0000\n2,USD,1000.0000\n"
        );
    }
}
