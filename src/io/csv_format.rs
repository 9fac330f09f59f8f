//! CSV format handling for operation input and balance output
//!
//! This module centralizes all CSV format concerns:
//! - `OperationCsvRecord` for deserialization
//! - Conversion from CSV records to `Operation`
//! - Balance output serialization
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::types::{Account, AccountId, Currency, Operation, OperationKind};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV record structure for deserialization
///
/// Matches the input columns: type, account, to_account, currency,
/// to_currency, amount. `to_account` is only read for transfers and
/// `to_currency` only for exchanges.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OperationCsvRecord {
    #[serde(rename = "type")]
    pub op_type: String,
    pub account: AccountId,
    pub to_account: Option<AccountId>,
    pub currency: Currency,
    pub to_currency: Option<Currency>,
    pub amount: Option<String>,
}

fn parse_kind(op_type: &str) -> Option<OperationKind> {
    match op_type.to_lowercase().as_str() {
        "deposit" => Some(OperationKind::Deposit),
        "withdraw" | "withdrawal" => Some(OperationKind::Withdraw),
        "exchange" => Some(OperationKind::Exchange),
        "transfer" => Some(OperationKind::Transfer),
        _ => None,
    }
}

/// Convert an OperationCsvRecord to an Operation
///
/// Checks only the shape of the row: a known type, a parseable amount and the
/// extra column the type needs. Business rules such as positive amounts and
/// known currencies are left to the processor so they are reported the same
/// way for every source.
pub fn convert_csv_record(csv_record: OperationCsvRecord) -> Result<Operation, String> {
    let kind = parse_kind(&csv_record.op_type).ok_or_else(|| {
        format!(
            "Invalid operation type: '{}' for account {}",
            csv_record.op_type, csv_record.account
        )
    })?;

    let amount = match csv_record.amount {
        Some(amount_str) if !amount_str.trim().is_empty() => Decimal::from_str(amount_str.trim())
            .map_err(|_| {
                format!(
                    "Invalid amount '{}' for account {}",
                    amount_str, csv_record.account
                )
            })?,
        _ => {
            return Err(format!(
                "{} for account {} requires an amount",
                kind, csv_record.account
            ))
        }
    };

    let operation = match kind {
        OperationKind::Deposit => Operation::deposit(csv_record.account, csv_record.currency, amount),
        OperationKind::Withdraw => {
            Operation::withdraw(csv_record.account, csv_record.currency, amount)
        }
        OperationKind::Exchange => {
            let to_currency = csv_record
                .to_currency
                .filter(|currency| !currency.is_empty())
                .ok_or_else(|| {
                    format!(
                        "exchange for account {} requires a to_currency",
                        csv_record.account
                    )
                })?;
            Operation::exchange(csv_record.account, csv_record.currency, to_currency, amount)
        }
        OperationKind::Transfer => {
            let to_account = csv_record.to_account.ok_or_else(|| {
                format!(
                    "transfer from account {} requires a to_account",
                    csv_record.account
                )
            })?;
            Operation::transfer(csv_record.account, to_account, csv_record.currency, amount)
        }
    };

    Ok(operation)
}

/// Write balances to CSV format
///
/// Writes one row per (account, currency) with columns: account, currency,
/// balance. Rows are sorted by account ID then currency for deterministic
/// output; balances are printed with four decimal places.
pub fn write_balances_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account", "currency", "balance"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut rows: Vec<(AccountId, &str, Decimal)> = accounts
        .iter()
        .flat_map(|account| {
            account
                .balances
                .iter()
                .map(move |(currency, balance)| (account.id, currency.as_str(), *balance))
        })
        .collect();
    rows.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    for (account, currency, balance) in rows {
        writer
            .write_record(&[
                account.to_string(),
                currency.to_string(),
                format!("{:.4}", balance),
            ])
            .map_err(|e| format!("Failed to write balance record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record(
        op_type: &str,
        to_account: Option<AccountId>,
        to_currency: Option<&str>,
        amount: Option<&str>,
    ) -> OperationCsvRecord {
        OperationCsvRecord {
            op_type: op_type.to_string(),
            account: 1,
            to_account,
            currency: "USD".to_string(),
            to_currency: to_currency.map(str::to_string),
            amount: amount.map(str::to_string),
        }
    }

    #[rstest]
    #[case("deposit", OperationKind::Deposit)]
    #[case("DEPOSIT", OperationKind::Deposit)] // case insensitive
    #[case("withdraw", OperationKind::Withdraw)]
    #[case("withdrawal", OperationKind::Withdraw)]
    #[case("Exchange", OperationKind::Exchange)]
    #[case("transfer", OperationKind::Transfer)]
    fn test_convert_csv_record_kinds(#[case] op_type: &str, #[case] expected: OperationKind) {
        let csv_record = record(op_type, Some(2), Some("EUR"), Some("100.0"));

        let operation = convert_csv_record(csv_record).unwrap();

        assert_eq!(operation.kind(), expected);
        assert_eq!(operation.amount(), Decimal::new(1000, 1));
    }

    #[test]
    fn test_convert_csv_record_builds_transfer() {
        let operation = convert_csv_record(record("transfer", Some(2), None, Some("10"))).unwrap();

        assert_eq!(
            operation,
            Operation::transfer(1, 2, "USD", Decimal::from(10))
        );
    }

    #[test]
    fn test_convert_csv_record_builds_exchange() {
        let operation =
            convert_csv_record(record("exchange", None, Some("EUR"), Some("2.5"))).unwrap();

        assert_eq!(
            operation,
            Operation::exchange(1, "USD", "EUR", Decimal::new(25, 1))
        );
    }

    #[rstest]
    #[case::invalid_type("bogus", None, None, Some("1"), "Invalid operation type")]
    #[case::missing_amount("deposit", None, None, None, "requires an amount")]
    #[case::empty_amount("withdraw", None, None, Some(""), "requires an amount")]
    #[case::whitespace_amount("deposit", None, None, Some("  "), "requires an amount")]
    #[case::invalid_amount("deposit", None, None, Some("ten"), "Invalid amount")]
    #[case::transfer_without_target("transfer", None, None, Some("1"), "requires a to_account")]
    #[case::exchange_without_target("exchange", None, None, Some("1"), "requires a to_currency")]
    #[case::exchange_empty_target("exchange", None, Some(""), Some("1"), "requires a to_currency")]
    fn test_convert_csv_record_errors(
        #[case] op_type: &str,
        #[case] to_account: Option<AccountId>,
        #[case] to_currency: Option<&str>,
        #[case] amount: Option<&str>,
        #[case] expected_error: &str,
    ) {
        let result = convert_csv_record(record(op_type, to_account, to_currency, amount));

        assert!(result.unwrap_err().contains(expected_error));
    }

    #[test]
    fn test_convert_csv_record_keeps_non_positive_amounts() {
        // Rejected later by the processor, not by the parser
        let operation = convert_csv_record(record("deposit", None, None, Some("-5"))).unwrap();
        assert_eq!(operation.amount(), Decimal::from(-5));
    }

    #[rstest]
    #[case::empty(vec![], "account,currency,balance\n")]
    #[case::sorted_by_account_then_currency(
        vec![
            Account::new(2).with_balance("USD", Decimal::new(105, 1)),
            Account::new(1)
                .with_balance("USD", Decimal::from(1000))
                .with_balance("EUR", Decimal::new(1001234, 4)),
        ],
        "account,currency,balance\n1,EUR,100.1234\n1,USD,1000.0000\n2,USD,10.5000\n"
    )]
    #[case::account_without_currencies(vec![Account::new(7)], "account,currency,balance\n")]
    fn test_write_balances_csv(#[case] accounts: Vec<Account>, #[case] expected_output: &str) {
        let mut output = Vec::new();

        write_balances_csv(&accounts, &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), expected_output);
    }
}
