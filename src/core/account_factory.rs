//! Account creation
//!
//! New accounts track every currency in the exchange rate table at creation
//! time, each with a zero balance. Currencies added to the table later are
//! not picked up by existing accounts.

use super::{AccountStore, ExchangeRates};
use crate::types::{Account, AccountId};
use rand::Rng;

/// Creates accounts with unused IDs
#[derive(Debug, Clone, Copy)]
pub struct AccountFactory<'a> {
    rates: &'a ExchangeRates,
    accounts: &'a AccountStore,
}

impl<'a> AccountFactory<'a> {
    pub fn new(rates: &'a ExchangeRates, accounts: &'a AccountStore) -> Self {
        Self { rates, accounts }
    }

    /// Create (but do not register) an account
    ///
    /// If `id` is `None`, or already registered, a random unused ID is drawn
    /// instead. Uniqueness is only checked against the store at call time;
    /// two concurrent callers can still race on the same ID.
    pub fn create(&self, id: Option<AccountId>) -> Account {
        let mut rng = rand::thread_rng();
        let mut id = id.unwrap_or_else(|| rng.gen());
        while self.accounts.contains(id) {
            id = rng.gen();
        }
        Account::with_currencies(id, self.rates.currencies())
    }
}
