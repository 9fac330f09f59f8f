//! Shared exchange rate table
//!
//! Rates are approximate market data: a background ticker perturbs them while
//! cashiers read them. The table is safe for concurrent access, but there is
//! no consistent snapshot across two reads. An exchange that reads two rates
//! may observe a perturbation between the reads, and a reader may see a table
//! that is only partially perturbed.

use dashmap::DashMap;
use rand::Rng;

/// Multiplier applied to a rate by one perturbation
///
/// `u` is a uniform draw in `[0, 1)`. For `power > 0.5` the factor lies in
/// `(1 - 0.5 / power, 1 + 0.5 / power]` and is always positive.
pub fn jitter_factor(u: f64, power: f64) -> f64 {
    1.0 + (0.5 - u) / power
}

/// Thread-safe mapping from currency code to rate
#[derive(Debug, Default)]
pub struct ExchangeRates {
    rates: DashMap<String, f64>,
}

impl ExchangeRates {
    pub fn new() -> Self {
        Self {
            rates: DashMap::new(),
        }
    }

    /// Build a table from `(currency, rate)` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let table = Self::new();
        for (currency, rate) in pairs {
            table.set(currency, rate);
        }
        table
    }

    /// Insert or overwrite a rate unconditionally
    pub fn set(&self, currency: impl Into<String>, rate: f64) {
        self.rates.insert(currency.into(), rate);
    }

    /// Overwrite a rate only if the currency is already known
    ///
    /// Returns `true` if the rate was updated.
    pub fn update(&self, currency: &str, rate: f64) -> bool {
        match self.rates.get_mut(currency) {
            Some(mut entry) => {
                *entry.value_mut() = rate;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, currency: &str) -> Option<f64> {
        self.rates.get(currency).map(|entry| *entry.value())
    }

    pub fn contains(&self, currency: &str) -> bool {
        self.rates.contains_key(currency)
    }

    /// Currency codes currently in the table, sorted
    pub fn currencies(&self) -> Vec<String> {
        let mut currencies: Vec<String> = self.rates.iter().map(|entry| entry.key().clone()).collect();
        currencies.sort();
        currencies
    }

    /// Copy of every `(currency, rate)` pair, sorted by currency
    ///
    /// Entries are read one at a time, so a concurrent perturbation may be
    /// half-applied in the result.
    pub fn snapshot(&self) -> Vec<(String, f64)> {
        let mut pairs: Vec<(String, f64)> = self
            .rates
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Perturb every rate with the thread-local RNG
    pub fn perturb_all(&self, power: f64) {
        self.perturb_all_with(power, &mut rand::thread_rng());
    }

    /// Multiply each rate by its own [`jitter_factor`]
    ///
    /// Every currency draws independently and is updated under its own entry
    /// lock; the table as a whole is not updated atomically.
    pub fn perturb_all_with<R: Rng + ?Sized>(&self, power: f64, rng: &mut R) {
        for mut entry in self.rates.iter_mut() {
            let factor = jitter_factor(rng.gen::<f64>(), power);
            *entry.value_mut() *= factor;
        }
    }
}
