//! Cashier Bank Library
//! # Overview
//!
//! A concurrent multi-currency bank: producers submit operations to a shared
//! FIFO queue, a pool of cashier threads drains it, and every balance change
//! happens under a per-account lock. A background ticker perturbs exchange
//! rates while cashiers run.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Account, Operation, BankError)
//! - [`core`] - Processing components:
//!   - [`core::bank`] - Coordinator: lifecycle, submission, queries
//!   - [`core::processor`] - Per-operation logic and the two-phase transfer
//!   - [`core::cashier`] - Worker threads
//!   - [`core::queue`] - Blocking FIFO with drain notification
//!   - [`core::account_store`] / [`core::exchange_rates`] - Shared state
//! - [`observers`] - Event sinks (tracing, file, in-memory)
//! - [`io`] - CSV operation input and balance output
//! - [`scenario`] - Workloads run by the binary
//! - [`cli`] - CLI arguments parsing
//!
//! # Operations
//!
//! - **Deposit**: Credit a tracked currency
//! - **Withdraw**: Debit a tracked currency (requires balance >= amount)
//! - **Exchange**: Convert between two tracked currencies of one account at
//!   the current rates
//! - **Transfer**: Move funds between accounts as a debit then a credit, with
//!   a compensating credit back if the second step fails
//!
//! # Example
//!
//! ```no_run
//! use cashier_bank::{Bank, BankConfig, Operation};
//! use rust_decimal::Decimal;
//!
//! // A single cashier processes operations in submission order
//! let config = BankConfig {
//!     worker_count: 1,
//!     ..BankConfig::default()
//! };
//! let bank = Bank::new(config).unwrap();
//! let alice = bank.open_account(Some(1));
//! let bob = bank.open_account(Some(2));
//!
//! bank.submit(Operation::deposit(alice, "USD", Decimal::from(100)));
//! bank.submit(Operation::transfer(alice, bob, "USD", Decimal::from(40)));
//! bank.drain_and_stop(None);
//!
//! assert_eq!(bank.balance(bob, "USD"), Some(Decimal::from(40)));
//! ```

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod observers;
pub mod scenario;
pub mod types;

pub use core::{Bank, BankConfig, Observer, StatsSnapshot};
pub use io::write_balances_csv;
pub use observers::{FileObserver, LogObserver, RecordingObserver};
pub use types::{Account, AccountId, BankError, Currency, Operation, OperationKind};
