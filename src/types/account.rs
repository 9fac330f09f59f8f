//! Account-related types for the cashier bank
//!
//! An account holds one balance per currency it was opened with. Operations
//! never add currencies to an existing account; the set is fixed at creation.

use rust_decimal::Decimal;
use std::collections::HashMap;

/// Account identifier
pub type AccountId = u32;

/// Currency code such as `USD`
pub type Currency = String;

/// Client account state
///
/// Balances are non-negative after every committed operation. The invariant is
/// enforced by the transaction processor at operation boundaries, not by this
/// type.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The account ID
    pub id: AccountId,

    /// Balance per tracked currency
    pub balances: HashMap<Currency, Decimal>,
}

impl Account {
    /// Create an account that tracks no currencies
    pub fn new(id: AccountId) -> Self {
        Account {
            id,
            balances: HashMap::new(),
        }
    }

    /// Create an account with a zero balance for each of `currencies`
    ///
    /// # Arguments
    ///
    /// * `id` - The account ID
    /// * `currencies` - Currency codes the account will track
    pub fn with_currencies<I, S>(id: AccountId, currencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Currency>,
    {
        Account {
            id,
            balances: currencies
                .into_iter()
                .map(|currency| (currency.into(), Decimal::ZERO))
                .collect(),
        }
    }

    /// Builder-style helper that sets the opening balance of one currency
    pub fn with_balance(mut self, currency: impl Into<Currency>, amount: Decimal) -> Self {
        self.balances.insert(currency.into(), amount);
        self
    }

    /// Balance of `currency`, or `None` if the account does not track it
    pub fn balance(&self, currency: &str) -> Option<Decimal> {
        self.balances.get(currency).copied()
    }

    /// Whether the account tracks `currency`
    pub fn tracks(&self, currency: &str) -> bool {
        self.balances.contains_key(currency)
    }
}
