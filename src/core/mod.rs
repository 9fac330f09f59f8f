//! Core business logic module
//!
//! This module contains the bank's processing components:
//! - `exchange_rates` - Shared currency rate table and perturbation
//! - `account_store` - Account registry with one lock per account
//! - `account_factory` - Opening accounts against the known currencies
//! - `queue` - FIFO operation queue with blocking take and drain
//! - `processor` - Deposit, withdraw, exchange and two-phase transfer
//! - `cashier` - Worker threads draining the queue
//! - `rate_ticker` - Background rate perturbation timer
//! - `events` / `traits` - Observer fan-out
//! - `bank` - Coordinator tying the above together

pub mod account_factory;
pub mod account_store;
pub mod bank;
pub mod cashier;
pub mod events;
pub mod exchange_rates;
pub mod processor;
pub mod queue;
pub mod rate_ticker;
pub mod stats;
pub mod traits;

pub use account_factory::AccountFactory;
pub use account_store::{AccountHandle, AccountStore};
pub use bank::{Bank, BankConfig};
pub use cashier::{Cashier, CashierContext, CashierState};
pub use events::EventBus;
pub use exchange_rates::{jitter_factor, ExchangeRates};
pub use processor::TransactionProcessor;
pub use queue::TransactionQueue;
pub use rate_ticker::RateTicker;
pub use stats::{ProcessingStats, StatsSnapshot};
pub use traits::Observer;
