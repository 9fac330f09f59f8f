//! Thread-safe account storage
//!
//! This module provides the `AccountStore` struct, the membership map from
//! account ID to account record.
//!
//! # Design
//!
//! The store uses `DashMap` so that lookups and registrations are safe from
//! any thread without a global lock. Each account additionally sits behind its
//! own `parking_lot::Mutex`: that mutex is the account's lock domain, and every
//! balance mutation happens while holding it.
//!
//! Lookups hand out a cloned `Arc` to the account and release the map's shard
//! lock before the account lock is taken. A thread therefore never holds a
//! shard lock and an account lock at the same time, and the transaction
//! processor never holds two account locks at once.

use crate::types::{Account, AccountId, BankError};
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Shared handle to one account's lock domain
pub type AccountHandle = Arc<Mutex<Account>>;

/// Thread-safe account membership map
///
/// Accounts are never removed. Registering an existing ID replaces the
/// account (last writer wins); callers are expected to use unique IDs.
#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: DashMap<AccountId, AccountHandle>,
}

impl AccountStore {
    /// Create a new empty AccountStore
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Register an account under its ID
    ///
    /// # Returns
    ///
    /// `true` if an account with the same ID was replaced.
    pub fn register(&self, account: Account) -> bool {
        let id = account.id;
        self.accounts
            .insert(id, Arc::new(Mutex::new(account)))
            .is_some()
    }

    /// Get the lock domain of an account
    ///
    /// Never blocks on account locks; only the map's shard lock is taken,
    /// and only for the duration of the lookup.
    pub fn get(&self, id: AccountId) -> Option<AccountHandle> {
        self.accounts.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, id: AccountId) -> bool {
        self.accounts.contains_key(&id)
    }

    /// Run `f` against an account while holding its lock
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - whatever the closure returned
    /// * `Err(BankError::AccountNotFound)` - if the account is not registered
    /// * `Err(...)` - any error returned by the closure
    pub fn update<T, F>(&self, id: AccountId, f: F) -> Result<T, BankError>
    where
        F: FnOnce(&mut Account) -> Result<T, BankError>,
    {
        let handle = self.get(id).ok_or_else(|| BankError::account_not_found(id))?;
        let mut account = handle.lock();
        f(&mut account)
    }

    /// Copy of an account's current state
    pub fn snapshot(&self, id: AccountId) -> Option<Account> {
        self.get(id).map(|handle| handle.lock().clone())
    }

    /// Current balance of one currency
    pub fn balance(&self, id: AccountId, currency: &str) -> Option<Decimal> {
        self.get(id).and_then(|handle| handle.lock().balance(currency))
    }

    /// Copies of every account, sorted by ID
    ///
    /// Each account is locked separately, so the result is not a consistent
    /// cut across accounts while cashiers are running.
    pub fn all_accounts(&self) -> Vec<Account> {
        let handles: Vec<AccountHandle> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut accounts: Vec<Account> = handles.iter().map(|handle| handle.lock().clone()).collect();
        accounts.sort_by_key(|account| account.id);
        accounts
    }

    pub fn ids(&self) -> Vec<AccountId> {
        let mut ids: Vec<AccountId> = self.accounts.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn usd_account(id: AccountId, balance: i64) -> Account {
        Account::with_currencies(id, ["USD"]).with_balance("USD", Decimal::from(balance))
    }

    #[test]
    fn test_register_and_get() {
        let store = AccountStore::new();

        assert!(!store.register(usd_account(1, 10)));

        let handle = store.get(1).unwrap();
        assert_eq!(handle.lock().balance("USD"), Some(Decimal::from(10)));
        assert!(store.get(2).is_none());
    }

    #[test]
    fn test_register_overwrites_existing_id() {
        let store = AccountStore::new();

        store.register(usd_account(1, 10));
        assert!(store.register(usd_account(1, 99)));

        assert_eq!(store.len(), 1);
        assert_eq!(store.balance(1, "USD"), Some(Decimal::from(99)));
    }

    #[test]
    fn test_update_missing_account_returns_not_found() {
        let store = AccountStore::new();

        let result = store.update(5, |_account| Ok(()));

        assert_eq!(result, Err(BankError::account_not_found(5)));
    }

    #[test]
    fn test_update_returns_error_from_closure() {
        let store = AccountStore::new();
        store.register(usd_account(1, 10));

        let result: Result<(), BankError> =
            store.update(1, |_account| Err(BankError::invalid_operation("nope")));

        assert!(matches!(result, Err(BankError::InvalidOperation { .. })));
        assert_eq!(store.balance(1, "USD"), Some(Decimal::from(10)));
    }

    #[test]
    fn test_all_accounts_sorted_by_id() {
        let store = AccountStore::new();
        for id in [3, 1, 2] {
            store.register(usd_account(id, 0));
        }

        let ids: Vec<AccountId> = store.all_accounts().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(store.ids(), vec![1, 2, 3]);
    }

    #[test]
    fn test_concurrent_updates_same_account() {
        let store = Arc::new(AccountStore::new());
        store.register(usd_account(1, 0));
        let mut handles = vec![];

        // 100 threads, each adding 1 under the account lock
        for _ in 0..100 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                store
                    .update(1, |account| {
                        let balance = account.balances.get_mut("USD").unwrap();
                        *balance += Decimal::ONE;
                        Ok(())
                    })
                    .unwrap();
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.balance(1, "USD"), Some(Decimal::from(100)));
    }

    #[test]
    fn test_concurrent_registration_different_accounts() {
        let store = Arc::new(AccountStore::new());
        let mut handles = vec![];

        for id in 0..10 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                store.register(usd_account(id, 0));
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 10);
    }
}
