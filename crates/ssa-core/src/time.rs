//! Run configuration and the log-tick clock.
//!
//! Simulation time is a continuous `f64`.  Reactions fire at arbitrary real
//! times; observers are sampled on a regular grid of `log_period` instead.

use crate::{CoreError, CoreResult};

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
///
/// Typically loaded from a JSON file by the application crate and passed to
/// the simulation builder.  The run length is not part of it: it is given to
/// each `run` call.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Simulated time between two log samples.  `f64::INFINITY` disables
    /// periodic logging.
    pub log_period: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self { seed: 0, log_period: 1.0 }
    }
}

impl SimConfig {
    pub fn new(seed: u64, log_period: f64) -> Self {
        Self { seed, log_period }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.log_period.is_nan() || self.log_period <= 0.0 {
            return Err(CoreError::Config(format!(
                "log period must be positive, got {}",
                self.log_period
            )));
        }
        Ok(())
    }
}

// ── LogClock ──────────────────────────────────────────────────────────────────

/// Tracks the next log tick and hands out every tick up to a limit.
///
/// A jump of several periods yields each skipped tick in turn, so observers
/// never miss a sample.
#[derive(Clone, Debug)]
pub struct LogClock {
    period: f64,
    next:   f64,
}

impl LogClock {
    /// A clock whose first tick is at `period` (time 0 is not a tick).
    pub fn new(period: f64) -> Self {
        Self { period, next: period }
    }

    /// The next tick that has not been handed out yet.
    #[inline]
    pub fn next_tick(&self) -> f64 {
        self.next
    }

    /// Pop the next tick if it is `<= limit`.
    #[inline]
    pub fn pop_due(&mut self, limit: f64) -> Option<f64> {
        if self.next <= limit {
            let tick = self.next;
            self.next += self.period;
            Some(tick)
        } else {
            None
        }
    }
}
