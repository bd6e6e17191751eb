//! Rolling behavioral baseline for a single user.
//!
//! The profile keeps the last `PROFILE_WINDOW` accepted amounts and the
//! mean / sample standard deviation of exactly that window. Stats are
//! recomputed from scratch on every update, never maintained incrementally.

use serde::{Deserialize, Serialize};

/// Maximum number of amounts retained in the baseline window.
pub const PROFILE_WINDOW: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    history: Vec<f64>,
    mean:    f64,
    std_dev: f64,
}

impl UserProfile {
    /// Build a profile from an initial history. Only the last
    /// `PROFILE_WINDOW` amounts are kept. An empty history is allowed here
    /// but rejected by the scorer.
    pub fn new(history: Vec<f64>) -> Self {
        let skip = history.len().saturating_sub(PROFILE_WINDOW);
        let history: Vec<f64> = history.into_iter().skip(skip).collect();
        let (mean, std_dev) = window_stats(&history);
        Self { history, mean, std_dev }
    }

    /// Return a new profile with `amount` appended and the oldest amount
    /// evicted once the window is full. `self` is left untouched.
    ///
    /// Callers only feed amounts from LOW-risk transactions so outliers
    /// never shift the baseline.
    pub fn update(&self, amount: f64) -> Self {
        let mut history = self.history.clone();
        history.push(amount);
        Self::new(history)
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// Mean and Bessel-corrected standard deviation. A single sample has
/// std_dev 0; an empty window yields (0, 0).
fn window_stats(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    if n == 1 {
        return (mean, 0.0);
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (mean, (sum_sq / (n - 1) as f64).sqrt())
}
