//! Error types for the cashier bank
//!
//! Every failure an operation can hit is classified into one of the variants
//! below. All of them are operation-local: they abort the one operation being
//! processed and the cashier that hit them moves on to the next queue item.
//!
//! # Error Categories
//!
//! - **Lookup Errors**: the referenced account is not registered
//! - **Validation Errors**: non-positive amount, unknown currency, untracked balance
//! - **Balance Errors**: not enough funds for a withdrawal, exchange or transfer
//! - **Internal Errors**: panics caught while processing, runtime/thread failures

use super::account::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the bank
///
/// Each variant carries the context needed to render a human-readable event
/// for observers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BankError {
    /// The account referenced by an operation is not registered
    #[error("account {account} not found")]
    AccountNotFound {
        /// The missing account ID
        account: AccountId,
    },

    /// The operation is malformed or refers to something the bank does not know
    ///
    /// Raised for non-positive amounts, currencies without an exchange rate,
    /// and currencies the account does not track.
    #[error("invalid operation: {reason}")]
    InvalidOperation {
        /// Description of what made the operation invalid
        reason: String,
    },

    /// The account does not hold enough of the currency
    #[error(
        "insufficient {currency} funds on account {account}: available {available}, requested {requested}"
    )]
    InsufficientFunds {
        /// Account that was short
        account: AccountId,
        /// Currency of the balance that was checked
        currency: String,
        /// Balance at the time of the check
        available: Decimal,
        /// Amount the operation needed
        requested: Decimal,
    },

    /// An unclassified failure
    ///
    /// Covers panics caught by a cashier while processing an operation and
    /// failures to spawn worker threads or the rate ticker runtime.
    #[error("internal error: {message}")]
    Internal {
        /// Raw failure message
        message: String,
    },
}

impl BankError {
    /// Create an AccountNotFound error
    pub fn account_not_found(account: AccountId) -> Self {
        BankError::AccountNotFound { account }
    }

    /// Create an InvalidOperation error
    pub fn invalid_operation(reason: impl Into<String>) -> Self {
        BankError::InvalidOperation {
            reason: reason.into(),
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(
        account: AccountId,
        currency: &str,
        available: Decimal,
        requested: Decimal,
    ) -> Self {
        BankError::InsufficientFunds {
            account,
            currency: currency.to_string(),
            available,
            requested,
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        BankError::Internal {
            message: message.into(),
        }
    }

    /// Unknown currency, shared by every operation kind
    pub(crate) fn unknown_currency(currency: &str) -> Self {
        Self::invalid_operation(format!("no exchange rate for currency '{}'", currency))
    }

    /// Currency the account was never opened with
    pub(crate) fn untracked_currency(account: AccountId, currency: &str) -> Self {
        Self::invalid_operation(format!(
            "account {} does not track currency '{}'",
            account, currency
        ))
    }

    pub(crate) fn non_positive_amount(amount: Decimal) -> Self {
        Self::invalid_operation(format!("amount must be positive, got {}", amount))
    }

    pub(crate) fn overflow(account: AccountId, currency: &str) -> Self {
        Self::invalid_operation(format!(
            "arithmetic overflow on {} balance of account {}",
            currency, account
        ))
    }
}
