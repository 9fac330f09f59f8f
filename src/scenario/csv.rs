//! Operations read from a CSV file
//!
//! Rows are parsed up front so the set of accounts to open is known before
//! the first operation is queued. Malformed rows are logged with their line
//! number and skipped; they never reach the bank.

use super::Scenario;
use crate::core::Bank;
use crate::io::OperationReader;
use crate::types::{AccountId, Operation};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct CsvScenario {
    input: PathBuf,
    accounts: Option<Vec<AccountId>>,
}

impl CsvScenario {
    /// `accounts` lists the IDs to open; `None` opens every ID the file references
    pub fn new(input: PathBuf, accounts: Option<Vec<AccountId>>) -> Self {
        Self { input, accounts }
    }

    fn read_operations(&self) -> Result<Vec<Operation>, String> {
        let reader = OperationReader::new(&self.input)?;

        let mut operations = Vec::new();
        let mut skipped = 0usize;
        for result in reader {
            match result {
                Ok(operation) => operations.push(operation),
                Err(e) => {
                    skipped += 1;
                    warn!("Skipping row: {}", e);
                }
            }
        }

        info!(
            input = %self.input.display(),
            parsed = operations.len(),
            skipped,
            "operations loaded"
        );
        Ok(operations)
    }
}

impl Scenario for CsvScenario {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn run(&self, bank: &Bank) -> Result<(), String> {
        let operations = self.read_operations()?;

        let ids: BTreeSet<AccountId> = match &self.accounts {
            Some(ids) => ids.iter().copied().collect(),
            None => operations.iter().flat_map(Operation::accounts).collect(),
        };
        for id in ids {
            let opened = bank.open_account(Some(id));
            if opened != id {
                warn!(requested = id, opened, "account id taken, opened under another id");
            }
        }

        bank.submit_all(operations);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BankConfig;
    use rust_decimal::Decimal;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn single_worker_bank() -> Bank {
        Bank::new(BankConfig {
            worker_count: 1,
            rate_update_period: Duration::ZERO,
            ..BankConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_opens_every_referenced_account() {
        let file = create_temp_csv(
            "type,account,to_account,currency,to_currency,amount\n\
             deposit,1,,USD,,100\n\
             transfer,1,4,USD,,40\n\
             deposit,bad,,USD,,1\n",
        );
        let bank = single_worker_bank();

        CsvScenario::new(file.path().to_path_buf(), None)
            .run(&bank)
            .unwrap();
        assert!(bank.drain_and_stop(Some(Duration::from_secs(10))));

        let mut ids = bank.accounts().ids();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(bank.balance(1, "USD"), Some(Decimal::from(60)));
        assert_eq!(bank.balance(4, "USD"), Some(Decimal::from(40)));
    }

    #[test]
    fn test_explicit_account_list_limits_opened_accounts() {
        let file = create_temp_csv(
            "type,account,to_account,currency,to_currency,amount\n\
             deposit,1,,USD,,100\n\
             deposit,2,,USD,,100\n",
        );
        let bank = single_worker_bank();

        CsvScenario::new(file.path().to_path_buf(), Some(vec![1]))
            .run(&bank)
            .unwrap();
        assert!(bank.drain_and_stop(Some(Duration::from_secs(10))));

        assert_eq!(bank.accounts().ids(), vec![1]);
        assert_eq!(bank.stats().failed, 1);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let bank = single_worker_bank();

        let result = CsvScenario::new(PathBuf::from("nonexistent.csv"), None).run(&bank);

        assert!(result.unwrap_err().contains("Failed to open file"));
    }
}
