//! Background perturbation of exchange rates
//!
//! The ticker runs on its own single-worker tokio runtime, independent of the
//! cashier threads. The first perturbation happens one full period after
//! start, then once per period.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use super::{EventBus, ExchangeRates};
use crate::types::BankError;

/// Handle to the running perturbation timer; cancelled on stop or drop
#[derive(Debug)]
pub struct RateTicker {
    runtime: Option<Runtime>,
    task: JoinHandle<()>,
}

impl RateTicker {
    /// Start perturbing `rates` every `period` with the given jitter power
    ///
    /// `period` must be non-zero.
    pub fn spawn(
        rates: Arc<ExchangeRates>,
        events: Arc<EventBus>,
        period: Duration,
        power: f64,
    ) -> Result<Self, BankError> {
        if period.is_zero() {
            return Err(BankError::internal("rate ticker period must be non-zero"));
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("rate-ticker")
            .enable_time()
            .build()
            .map_err(|e| BankError::internal(format!("failed to build rate ticker runtime: {}", e)))?;

        let task = runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                rates.perturb_all(power);
                debug!(rates = ?rates.snapshot(), "exchange rates perturbed");
                events.publish("exchange rates updated");
            }
        });

        Ok(Self {
            runtime: Some(runtime),
            task,
        })
    }

    /// Cancel the timer without waiting for the runtime to wind down
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.task.abort();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl Drop for RateTicker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
