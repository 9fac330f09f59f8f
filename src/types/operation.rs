//! Operation types for the cashier bank
//!
//! An operation is one requested financial action. It is immutable once
//! constructed and is consumed by exactly one cashier.

use super::account::{AccountId, Currency};
use rust_decimal::Decimal;
use std::fmt;

/// Kind of operation, used for logging and CSV parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Deposit,
    Withdraw,
    Exchange,
    Transfer,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Deposit => "deposit",
            OperationKind::Withdraw => "withdraw",
            OperationKind::Exchange => "exchange",
            OperationKind::Transfer => "transfer",
        };
        f.write_str(name)
    }
}

/// A financial operation submitted to the bank
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Credit `amount` of `currency` to an account
    Deposit {
        account: AccountId,
        currency: Currency,
        amount: Decimal,
    },

    /// Debit `amount` of `currency` from an account
    ///
    /// Requires the balance to be at least `amount`.
    Withdraw {
        account: AccountId,
        currency: Currency,
        amount: Decimal,
    },

    /// Convert between two currencies held by the same account
    ///
    /// The quantity moved is `amount * rate(from) / rate(to)`; it is debited
    /// from `from_currency` and credited to `to_currency`.
    Exchange {
        account: AccountId,
        from_currency: Currency,
        to_currency: Currency,
        amount: Decimal,
    },

    /// Move `amount` of `currency` from one account to another
    ///
    /// Executed as a debit and a credit under separate account locks, with a
    /// compensating credit back to the sender if the second step fails.
    Transfer {
        from: AccountId,
        to: AccountId,
        currency: Currency,
        amount: Decimal,
    },
}

impl Operation {
    pub fn deposit(account: AccountId, currency: impl Into<Currency>, amount: Decimal) -> Self {
        Operation::Deposit {
            account,
            currency: currency.into(),
            amount,
        }
    }

    pub fn withdraw(account: AccountId, currency: impl Into<Currency>, amount: Decimal) -> Self {
        Operation::Withdraw {
            account,
            currency: currency.into(),
            amount,
        }
    }

    pub fn exchange(
        account: AccountId,
        from_currency: impl Into<Currency>,
        to_currency: impl Into<Currency>,
        amount: Decimal,
    ) -> Self {
        Operation::Exchange {
            account,
            from_currency: from_currency.into(),
            to_currency: to_currency.into(),
            amount,
        }
    }

    pub fn transfer(
        from: AccountId,
        to: AccountId,
        currency: impl Into<Currency>,
        amount: Decimal,
    ) -> Self {
        Operation::Transfer {
            from,
            to,
            currency: currency.into(),
            amount,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Deposit { .. } => OperationKind::Deposit,
            Operation::Withdraw { .. } => OperationKind::Withdraw,
            Operation::Exchange { .. } => OperationKind::Exchange,
            Operation::Transfer { .. } => OperationKind::Transfer,
        }
    }

    pub fn amount(&self) -> Decimal {
        match self {
            Operation::Deposit { amount, .. }
            | Operation::Withdraw { amount, .. }
            | Operation::Exchange { amount, .. }
            | Operation::Transfer { amount, .. } => *amount,
        }
    }

    /// Every account the operation touches, sender first for transfers
    pub fn accounts(&self) -> Vec<AccountId> {
        match self {
            Operation::Deposit { account, .. }
            | Operation::Withdraw { account, .. }
            | Operation::Exchange { account, .. } => vec![*account],
            Operation::Transfer { from, to, .. } => vec![*from, *to],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Operation::deposit(1, "USD", Decimal::ONE), OperationKind::Deposit, vec![1])]
    #[case(Operation::withdraw(2, "USD", Decimal::ONE), OperationKind::Withdraw, vec![2])]
    #[case(Operation::exchange(3, "USD", "EUR", Decimal::ONE), OperationKind::Exchange, vec![3])]
    #[case(Operation::transfer(4, 5, "USD", Decimal::ONE), OperationKind::Transfer, vec![4, 5])]
    fn test_kind_and_accounts(
        #[case] operation: Operation,
        #[case] kind: OperationKind,
        #[case] accounts: Vec<AccountId>,
    ) {
        assert_eq!(operation.kind(), kind);
        assert_eq!(operation.accounts(), accounts);
        assert_eq!(operation.amount(), Decimal::ONE);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(OperationKind::Withdraw.to_string(), "withdraw");
        assert_eq!(OperationKind::Transfer.to_string(), "transfer");
    }
}
