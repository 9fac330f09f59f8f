//! Per-operation processing logic
//!
//! This module provides the `TransactionProcessor` struct, which executes one
//! operation against the account store and exchange rate table.
//!
//! # Locking discipline
//!
//! Every balance mutation happens under the owning account's lock, and no
//! operation ever holds two account locks at once. Deposits, withdrawals and
//! exchanges touch a single account and are atomic under its lock. Transfers
//! run as two locked steps:
//!
//! 1. debit the sender under the sender's lock, then release it
//! 2. credit the receiver under the receiver's lock
//!
//! If step 2 fails, the sender is re-locked and credited back before the
//! original error is returned. Between the steps the money is in flight and
//! the debit is visible to observers. Since no operation holds two account
//! locks, opposite-direction transfers cannot deadlock.
//!
//! # Architecture
//!
//! ```text
//! TransactionProcessor
//!     ├── Arc<AccountStore>   (membership map + per-account locks)
//!     ├── Arc<ExchangeRates>  (volatile market rates)
//!     └── Arc<EventBus>       (human-readable events)
//! ```

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::error;

use super::{AccountStore, EventBus, ExchangeRates};
use crate::types::{Account, AccountId, BankError, Operation};

/// Executes operations; cheap to clone and share across cashiers
#[derive(Debug, Clone)]
pub struct TransactionProcessor {
    accounts: Arc<AccountStore>,
    rates: Arc<ExchangeRates>,
    events: Arc<EventBus>,
}

impl TransactionProcessor {
    pub fn new(
        accounts: Arc<AccountStore>,
        rates: Arc<ExchangeRates>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            accounts,
            rates,
            events,
        }
    }

    /// Route an operation to its handler
    pub fn process(&self, operation: &Operation) -> Result<(), BankError> {
        match operation {
            Operation::Deposit {
                account,
                currency,
                amount,
            } => self.deposit(*account, currency, *amount),
            Operation::Withdraw {
                account,
                currency,
                amount,
            } => self.withdraw(*account, currency, *amount),
            Operation::Exchange {
                account,
                from_currency,
                to_currency,
                amount,
            } => self.exchange(*account, from_currency, to_currency, *amount),
            Operation::Transfer {
                from,
                to,
                currency,
                amount,
            } => self.transfer(*from, *to, currency, *amount),
        }
    }

    /// Credit `amount` of `currency` to an account
    ///
    /// # Returns
    ///
    /// * `Err(BankError::InvalidOperation)` - non-positive amount, unknown or untracked currency
    /// * `Err(BankError::AccountNotFound)` - the account is not registered
    pub fn deposit(
        &self,
        account_id: AccountId,
        currency: &str,
        amount: Decimal,
    ) -> Result<(), BankError> {
        ensure_positive(amount)?;
        self.ensure_known_currency(currency)?;

        self.accounts
            .update(account_id, |account| credit(account, currency, amount))?;

        self.events.publish(&format!(
            "deposited {} {} to account {}",
            amount, currency, account_id
        ));
        Ok(())
    }

    /// Debit `amount` of `currency` from an account
    ///
    /// # Returns
    ///
    /// * `Err(BankError::InsufficientFunds)` - balance is below `amount`
    /// * plus every error [`deposit`](Self::deposit) can return
    pub fn withdraw(
        &self,
        account_id: AccountId,
        currency: &str,
        amount: Decimal,
    ) -> Result<(), BankError> {
        ensure_positive(amount)?;
        self.ensure_known_currency(currency)?;

        self.accounts.update(account_id, |account| {
            let balance = tracked_balance(account, currency)?;
            if balance < amount {
                return Err(BankError::insufficient_funds(
                    account_id, currency, balance, amount,
                ));
            }
            debit(account, currency, amount)
        })?;

        self.events.publish(&format!(
            "withdrew {} {} from account {}",
            amount, currency, account_id
        ));
        Ok(())
    }

    /// Exchange between two currencies of one account
    ///
    /// The quantity `amount * rate(from) / rate(to)` is debited from
    /// `from_currency` and credited to `to_currency`. Rates are read while
    /// holding the account lock, but the two reads are not atomic with respect
    /// to the rate ticker.
    pub fn exchange(
        &self,
        account_id: AccountId,
        from_currency: &str,
        to_currency: &str,
        amount: Decimal,
    ) -> Result<(), BankError> {
        ensure_positive(amount)?;
        if from_currency == to_currency {
            return Err(BankError::invalid_operation(format!(
                "cannot exchange '{}' into itself",
                from_currency
            )));
        }

        let quantity = self.accounts.update(account_id, |account| {
            let from_balance = tracked_balance(account, from_currency)?;
            tracked_balance(account, to_currency)?;

            let factor = self.exchange_factor(from_currency, to_currency)?;
            let quantity = amount
                .checked_mul(factor)
                .ok_or_else(|| BankError::overflow(account_id, from_currency))?;

            if from_balance < quantity {
                return Err(BankError::insufficient_funds(
                    account_id,
                    from_currency,
                    from_balance,
                    quantity,
                ));
            }

            debit(account, from_currency, quantity)?;
            credit(account, to_currency, quantity)?;
            Ok(quantity)
        })?;

        self.events.publish(&format!(
            "exchanged {} {} for {} {} on account {}",
            quantity, from_currency, quantity, to_currency, account_id
        ));
        Ok(())
    }

    /// Move `amount` of `currency` between two accounts
    ///
    /// The sender must keep a positive remainder: a transfer of the whole
    /// balance is rejected with `InsufficientFunds`. On failure after the
    /// debit, the sender is made whole again before the error is returned.
    pub fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        currency: &str,
        amount: Decimal,
    ) -> Result<(), BankError> {
        ensure_positive(amount)?;
        self.ensure_known_currency(currency)?;

        let sender = self
            .accounts
            .get(from)
            .ok_or_else(|| BankError::account_not_found(from))?;
        let receiver = self
            .accounts
            .get(to)
            .ok_or_else(|| BankError::account_not_found(to))?;

        // Phase 1: debit the sender under its lock only
        {
            let mut account = sender.lock();
            let balance = tracked_balance(&account, currency)?;
            if balance <= amount {
                return Err(BankError::insufficient_funds(from, currency, balance, amount));
            }
            debit(&mut account, currency, amount)?;
        }
        self.events.publish(&format!(
            "transfer {} {} from account {} to account {}: debit committed",
            amount, currency, from, to
        ));

        // Phase 2: credit the receiver under its lock only
        let credited = {
            let mut account = receiver.lock();
            credit(&mut account, currency, amount)
        };

        if let Err(failure) = credited {
            self.events.publish(&format!(
                "transfer {} {} from account {} to account {} failed, returning funds",
                amount, currency, from, to
            ));

            let compensated = {
                let mut account = sender.lock();
                credit(&mut account, currency, amount)
            };
            match compensated {
                Ok(()) => self.events.publish(&format!(
                    "returned {} {} to account {}",
                    amount, currency, from
                )),
                Err(compensation_error) => error!(
                    from,
                    to,
                    currency,
                    %amount,
                    error = %compensation_error,
                    "could not return transfer funds to sender"
                ),
            }
            return Err(failure);
        }

        self.events.publish(&format!(
            "transferred {} {} from account {} to account {}",
            amount, currency, from, to
        ));
        Ok(())
    }

    fn ensure_known_currency(&self, currency: &str) -> Result<(), BankError> {
        if self.rates.contains(currency) {
            Ok(())
        } else {
            Err(BankError::unknown_currency(currency))
        }
    }

    /// `rate(from) / rate(to)` as a decimal
    fn exchange_factor(&self, from_currency: &str, to_currency: &str) -> Result<Decimal, BankError> {
        let from_rate = self
            .rates
            .get(from_currency)
            .ok_or_else(|| BankError::unknown_currency(from_currency))?;
        let to_rate = self
            .rates
            .get(to_currency)
            .ok_or_else(|| BankError::unknown_currency(to_currency))?;

        Decimal::try_from(from_rate / to_rate).map_err(|_| {
            BankError::invalid_operation(format!(
                "exchange factor {} / {} is not representable",
                from_rate, to_rate
            ))
        })
    }
}

fn ensure_positive(amount: Decimal) -> Result<(), BankError> {
    if amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(BankError::non_positive_amount(amount))
    }
}

fn tracked_balance(account: &Account, currency: &str) -> Result<Decimal, BankError> {
    account
        .balance(currency)
        .ok_or_else(|| BankError::untracked_currency(account.id, currency))
}

fn credit(account: &mut Account, currency: &str, amount: Decimal) -> Result<(), BankError> {
    let id = account.id;
    let balance = account
        .balances
        .get_mut(currency)
        .ok_or_else(|| BankError::untracked_currency(id, currency))?;
    *balance = balance
        .checked_add(amount)
        .ok_or_else(|| BankError::overflow(id, currency))?;
    Ok(())
}

/// Caller has already checked the balance covers `amount`
fn debit(account: &mut Account, currency: &str, amount: Decimal) -> Result<(), BankError> {
    let id = account.id;
    let balance = account
        .balances
        .get_mut(currency)
        .ok_or_else(|| BankError::untracked_currency(id, currency))?;
    *balance = balance
        .checked_sub(amount)
        .ok_or_else(|| BankError::overflow(id, currency))?;
    Ok(())
}
