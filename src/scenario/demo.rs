//! Scripted demonstration workload
//!
//! Two accounts, an opening deposit on each, a long run of interleaved one
//! dollar deposits and withdrawals on the first account, then pairs of
//! opposite-direction transfers between the two. Every step is balance
//! neutral, so both accounts end where they started.

use super::Scenario;
use crate::core::Bank;
use crate::types::Operation;
use rust_decimal::Decimal;
use tracing::{info, warn};

const DEMO_CURRENCY: &str = "USD";

/// Configurable version of the demo workload
#[derive(Debug, Clone)]
pub struct DemoScenario {
    /// Opening balance credited to each account
    pub opening_balance: Decimal,
    /// Number of deposit/withdraw pairs on the first account
    pub churn_pairs: usize,
    /// Number of transfer pairs between the two accounts
    pub transfer_pairs: usize,
    /// Amount moved by each transfer
    pub transfer_amount: Decimal,
}

impl Default for DemoScenario {
    fn default() -> Self {
        Self {
            opening_balance: Decimal::from(1000),
            churn_pairs: 5000,
            transfer_pairs: 25,
            transfer_amount: Decimal::from(10),
        }
    }
}

impl Scenario for DemoScenario {
    fn name(&self) -> &'static str {
        "demo"
    }

    fn run(&self, bank: &Bank) -> Result<(), String> {
        if bank.exchange_rate(DEMO_CURRENCY).is_none() {
            return Err(format!(
                "The demo scenario needs a {} exchange rate",
                DEMO_CURRENCY
            ));
        }

        let first = bank.open_account(Some(1));
        let second = bank.open_account(Some(2));

        // Opening balances are committed before any churn can race them
        for account in [first, second] {
            bank.execute(&Operation::deposit(
                account,
                DEMO_CURRENCY,
                self.opening_balance,
            ))
            .map_err(|e| format!("Failed to fund account {}: {}", account, e))?;
        }

        let one = Decimal::ONE;
        let submitted = bank.submit_all((0..self.churn_pairs).flat_map(|_| {
            [
                Operation::deposit(first, DEMO_CURRENCY, one),
                Operation::withdraw(first, DEMO_CURRENCY, one),
            ]
        }));
        info!(
            submitted,
            balance = ?bank.balance(first, DEMO_CURRENCY),
            "churn submitted"
        );

        if !bank.drain(bank.config().drain_timeout) {
            warn!(remaining = bank.queue_len(), "churn phase did not drain in time");
        }
        info!(balance = ?bank.balance(first, DEMO_CURRENCY), "churn drained");

        let amount = self.transfer_amount;
        bank.submit_all((0..self.transfer_pairs).flat_map(|_| {
            [
                Operation::transfer(first, second, DEMO_CURRENCY, amount),
                Operation::transfer(second, first, DEMO_CURRENCY, amount),
            ]
        }));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BankConfig;
    use std::time::Duration;

    fn bank(initial_rates: Vec<(String, f64)>) -> Bank {
        Bank::new(BankConfig {
            initial_rates,
            rate_update_period: Duration::ZERO,
            drain_timeout: Some(Duration::from_secs(30)),
            ..BankConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_small_demo_is_balance_neutral() {
        let bank = bank(BankConfig::default().initial_rates);
        let scenario = DemoScenario {
            churn_pairs: 200,
            transfer_pairs: 5,
            ..DemoScenario::default()
        };

        scenario.run(&bank).unwrap();
        assert!(bank.drain_and_stop(Some(Duration::from_secs(30))));

        assert_eq!(bank.balance(1, "USD"), Some(Decimal::from(1000)));
        assert_eq!(bank.balance(2, "USD"), Some(Decimal::from(1000)));
        assert_eq!(bank.stats().completed, 2 + 400 + 10);
        assert_eq!(bank.stats().failed, 0);
    }

    #[test]
    fn test_demo_requires_usd() {
        let bank = bank(vec![("EUR".to_string(), 1.0)]);

        let result = DemoScenario::default().run(&bank);

        assert!(result.unwrap_err().contains("USD"));
    }
}
