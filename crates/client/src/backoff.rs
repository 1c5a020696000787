//! Exponential backoff with jitter
//!
//! Delay grows by `multiplier` per attempt, capped at `max_backoff`, with
//! uniform jitter applied so synchronized clients do not retry in lockstep.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// Stateful delay generator for one retry sequence
#[derive(Debug)]
pub(crate) struct Backoff {
    next: Duration,
    max: Duration,
    multiplier: f64,
    jitter: f64,
}

impl Backoff {
    pub(crate) fn new(retry: &RetryConfig) -> Self {
        Self {
            next: retry.initial_backoff,
            max: retry.max_backoff,
            multiplier: retry.multiplier,
            jitter: retry.jitter,
        }
    }

    /// Next delay to sleep before retrying
    ///
    /// Advances the internal state; each call returns a larger base delay
    /// until the cap is reached.
    pub(crate) fn next_delay(&mut self) -> Duration {
        let base = self.next;

        let grown = base.mul_f64(self.multiplier);
        self.next = if grown > self.max { self.max } else { grown };

        if self.jitter == 0.0 {
            return base;
        }

        // Uniform jitter in [1 - jitter, 1 + jitter]
        let factor = 1.0 + rand::thread_rng().gen_range(-self.jitter..=self.jitter);
        base.mul_f64(factor)
    }
}
