//! Bank coordinator
//!
//! `Bank` owns the exchange rate table, the account store, the operation queue,
//! the cashier pool and the rate ticker, and exposes the producer-facing API:
//! registering accounts and observers, submitting operations, draining and
//! stopping.
//!
//! # Architecture
//!
//! ```text
//! Bank
//!     ├── Arc<ExchangeRates>        (perturbed by RateTicker)
//!     ├── Arc<AccountStore>         (one lock per account)
//!     ├── Arc<TransactionQueue>     (FIFO, drained by cashiers)
//!     ├── Arc<EventBus>             (observer fan-out)
//!     ├── Vec<Cashier>              (N worker threads)
//!     └── Option<RateTicker>        (background timer)
//! ```
//!
//! # Ordering
//!
//! Submission order is preserved in the queue, but nothing orders processing
//! across cashiers. Two operations on the same account are serialized only by
//! that account's lock: a later submission can be locked first if another
//! cashier takes it before the earlier one is locked.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::{
    AccountFactory, AccountStore, Cashier, CashierContext, CashierState, EventBus, ExchangeRates,
    Observer, ProcessingStats, RateTicker, StatsSnapshot, TransactionProcessor, TransactionQueue,
};
use crate::types::{Account, AccountId, BankError, Operation};

/// Default number of cashiers
pub const DEFAULT_CASHIER_COUNT: usize = 5;

/// Longest accepted idle poll timeout
pub const MAX_POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// Default jitter power applied by the rate ticker
pub const DEFAULT_JITTER_POWER: f64 = 5.0;

/// Configuration for a [`Bank`]
#[derive(Clone, Debug)]
pub struct BankConfig {
    /// Number of cashier threads
    pub worker_count: usize,
    /// Currencies and rates seeded at construction
    pub initial_rates: Vec<(String, f64)>,
    /// Time between rate perturbations; zero disables the ticker
    pub rate_update_period: Duration,
    /// Jitter power for perturbation, must exceed 0.5
    pub rate_jitter_power: f64,
    /// How long an idle cashier waits on the queue before rechecking its stop flag
    pub poll_timeout: Duration,
    /// Overall drain timeout used by [`Bank::shutdown`]; `None` waits indefinitely
    pub drain_timeout: Option<Duration>,
    /// Start cashiers and the ticker in [`Bank::new`]
    pub auto_start: bool,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_CASHIER_COUNT,
            initial_rates: vec![
                ("USD".to_string(), 1.0),
                ("RUB".to_string(), 130.0),
                ("EUR".to_string(), 1.29),
            ],
            rate_update_period: Duration::from_secs(60),
            rate_jitter_power: DEFAULT_JITTER_POWER,
            poll_timeout: Duration::from_millis(1),
            drain_timeout: None,
            auto_start: true,
        }
    }
}

impl BankConfig {
    /// Create a BankConfig with custom worker settings
    ///
    /// Invalid values are replaced by their defaults with a warning.
    pub fn new(worker_count: usize, rate_jitter_power: f64, poll_timeout: Duration) -> Self {
        Self {
            worker_count,
            rate_jitter_power,
            poll_timeout,
            ..Self::default()
        }
        .validated()
    }

    /// Replace invalid fields by their defaults, warning for each one
    pub fn validated(mut self) -> Self {
        let default = Self::default();

        if self.worker_count == 0 {
            warn!(
                "Invalid worker_count ({}), using default ({})",
                self.worker_count, default.worker_count
            );
            self.worker_count = default.worker_count;
        }

        if !(self.rate_jitter_power > 0.5 && self.rate_jitter_power.is_finite()) {
            warn!(
                "Invalid rate_jitter_power ({}), using default ({})",
                self.rate_jitter_power, default.rate_jitter_power
            );
            self.rate_jitter_power = default.rate_jitter_power;
        }

        if self.poll_timeout.is_zero() || self.poll_timeout > MAX_POLL_TIMEOUT {
            warn!(
                "Invalid poll_timeout ({:?}), using default ({:?})",
                self.poll_timeout, default.poll_timeout
            );
            self.poll_timeout = default.poll_timeout;
        }

        let before = self.initial_rates.len();
        self.initial_rates
            .retain(|(_, rate)| *rate > 0.0 && rate.is_finite());
        if self.initial_rates.len() != before {
            warn!(
                "Dropped {} non-positive initial exchange rates",
                before - self.initial_rates.len()
            );
        }

        self
    }
}

/// The bank coordinator
///
/// All methods take `&self`, so a `Bank` can be shared across producer
/// threads behind an `Arc`.
#[derive(Debug)]
pub struct Bank {
    config: BankConfig,
    rates: Arc<ExchangeRates>,
    accounts: Arc<AccountStore>,
    queue: Arc<TransactionQueue>,
    events: Arc<EventBus>,
    stats: Arc<ProcessingStats>,
    processor: TransactionProcessor,
    cashiers: Mutex<Vec<Cashier>>,
    ticker: Mutex<Option<RateTicker>>,
}

impl Bank {
    /// Build a bank, seeding the rate table and starting it if configured
    pub fn new(config: BankConfig) -> Result<Self, BankError> {
        let config = config.validated();

        let rates = Arc::new(ExchangeRates::from_pairs(config.initial_rates.iter().cloned()));
        let accounts = Arc::new(AccountStore::new());
        let events = Arc::new(EventBus::new());
        let processor = TransactionProcessor::new(
            Arc::clone(&accounts),
            Arc::clone(&rates),
            Arc::clone(&events),
        );

        let bank = Self {
            rates,
            accounts,
            queue: Arc::new(TransactionQueue::new()),
            events,
            stats: Arc::new(ProcessingStats::new()),
            processor,
            cashiers: Mutex::new(Vec::new()),
            ticker: Mutex::new(None),
            config,
        };

        if bank.config.auto_start {
            bank.start()?;
        }
        Ok(bank)
    }

    /// Start the cashiers and the rate ticker
    ///
    /// Does nothing for components that are already running. A bank that was
    /// stopped can be started again.
    pub fn start(&self) -> Result<(), BankError> {
        {
            let mut cashiers = self.cashiers.lock();
            if cashiers.is_empty() {
                for id in 0..self.config.worker_count {
                    cashiers.push(Cashier::spawn(id, self.cashier_context())?);
                }
                info!(count = cashiers.len(), "cashiers started");
            }
        }

        let mut ticker = self.ticker.lock();
        if ticker.is_none() && !self.config.rate_update_period.is_zero() {
            *ticker = Some(RateTicker::spawn(
                Arc::clone(&self.rates),
                Arc::clone(&self.events),
                self.config.rate_update_period,
                self.config.rate_jitter_power,
            )?);
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        !self.cashiers.lock().is_empty()
    }

    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    pub fn add_observer(&self, observer: Arc<dyn Observer>) {
        self.events.subscribe(observer);
    }

    pub fn add_observers<I>(&self, observers: I)
    where
        I: IntoIterator<Item = Arc<dyn Observer>>,
    {
        for observer in observers {
            self.events.subscribe(observer);
        }
    }

    /// Register an account, replacing any account with the same ID
    pub fn register_account(&self, account: Account) {
        let id = account.id;
        if self.accounts.register(account) {
            warn!(account = id, "account replaced by re-registration");
        }
        self.events.publish(&format!("account {} registered", id));
    }

    pub fn register_accounts<I>(&self, accounts: I)
    where
        I: IntoIterator<Item = Account>,
    {
        for account in accounts {
            self.register_account(account);
        }
    }

    /// Factory that opens accounts against this bank's currencies
    pub fn account_factory(&self) -> AccountFactory<'_> {
        AccountFactory::new(&self.rates, &self.accounts)
    }

    /// Create and register an account tracking every known currency
    ///
    /// Returns the ID actually used, which differs from `id` if it was taken.
    pub fn open_account(&self, id: Option<AccountId>) -> AccountId {
        let account = self.account_factory().create(id);
        let id = account.id;
        self.register_account(account);
        id
    }

    /// Append one operation to the queue
    pub fn submit(&self, operation: Operation) {
        self.queue.submit(operation);
    }

    /// Append operations in iteration order
    pub fn submit_all<I>(&self, operations: I) -> usize
    where
        I: IntoIterator<Item = Operation>,
    {
        self.queue.submit_all(operations)
    }

    /// Discard every queued operation; returns how many were dropped
    pub fn clear_queue(&self) -> usize {
        let dropped = self.queue.clear();
        if dropped > 0 {
            info!(dropped, "queue cleared");
        }
        dropped
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Insert or overwrite an exchange rate
    pub fn set_exchange_rate(&self, currency: impl Into<String>, rate: f64) {
        self.rates.set(currency, rate);
    }

    /// Overwrite an exchange rate only if the currency is known
    pub fn update_exchange_rate(&self, currency: &str, rate: f64) -> bool {
        self.rates.update(currency, rate)
    }

    pub fn exchange_rate(&self, currency: &str) -> Option<f64> {
        self.rates.get(currency)
    }

    pub fn accounts(&self) -> &Arc<AccountStore> {
        &self.accounts
    }

    pub fn account(&self, id: AccountId) -> Option<Account> {
        self.accounts.snapshot(id)
    }

    pub fn balance(&self, id: AccountId, currency: &str) -> Option<Decimal> {
        self.accounts.balance(id, currency)
    }

    pub fn accounts_snapshot(&self) -> Vec<Account> {
        self.accounts.all_accounts()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn cashier_states(&self) -> Vec<CashierState> {
        self.cashiers.lock().iter().map(Cashier::state).collect()
    }

    /// Process one operation on the calling thread, bypassing the queue
    pub fn execute(&self, operation: &Operation) -> Result<(), BankError> {
        self.cashier_context().handle(operation)
    }

    /// Wait until the queue is observed empty
    ///
    /// Returns `false` if `timeout` elapsed first. Operations already taken by
    /// cashiers may still be in progress when this returns.
    pub fn drain(&self, timeout: Option<Duration>) -> bool {
        if !self.is_running() {
            return self.queue.is_empty();
        }
        self.queue.wait_until_empty(timeout)
    }

    /// Drain the queue, then stop every cashier and the ticker
    ///
    /// Operations still queued when `timeout` elapses are abandoned: never
    /// taken, never reported. Operations already taken run to completion.
    /// Returns whether the queue was drained.
    pub fn drain_and_stop(&self, timeout: Option<Duration>) -> bool {
        let drained = self.drain(timeout);
        if !drained {
            warn!(
                remaining = self.queue.len(),
                "drain timed out, abandoning queued operations"
            );
        }
        self.stop_all();
        drained
    }

    /// [`drain_and_stop`](Self::drain_and_stop) with the configured drain timeout
    pub fn shutdown(&self) -> bool {
        self.drain_and_stop(self.config.drain_timeout)
    }

    /// Stop every cashier and the ticker regardless of queue depth
    pub fn force_stop(&self) {
        self.stop_all();
    }

    fn stop_all(&self) {
        let cashiers: Vec<Cashier> = std::mem::take(&mut *self.cashiers.lock());
        for cashier in &cashiers {
            cashier.request_stop();
        }
        let count = cashiers.len();
        for cashier in cashiers {
            cashier.stop();
        }
        if count > 0 {
            info!(count, "cashiers stopped");
        }

        if let Some(ticker) = self.ticker.lock().take() {
            ticker.stop();
        }
    }

    fn cashier_context(&self) -> CashierContext {
        CashierContext {
            queue: Arc::clone(&self.queue),
            processor: self.processor.clone(),
            events: Arc::clone(&self.events),
            stats: Arc::clone(&self.stats),
            poll_timeout: self.config.poll_timeout,
        }
    }
}

impl Drop for Bank {
    fn drop(&mut self) {
        self.stop_all();
    }
}
