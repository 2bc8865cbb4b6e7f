//! Wall-clock to tick conversion.
//!
//! Hosts feed elapsed real time into a [`TickClock`] and run as many
//! simulation ticks as it reports due. The leftover fraction is exposed
//! for presentation-side interpolation and never feeds back into the
//! simulation.

use std::time::Duration;

/// Fixed-step accumulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickClock {
    interval: Duration,
    accumulated: Duration,
    max_catch_up: u32,
}

impl TickClock {
    /// Create a clock with a tick interval.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            accumulated: Duration::ZERO,
            max_catch_up: u32::MAX,
        }
    }

    /// Create a clock from a tick length in milliseconds.
    #[must_use]
    pub fn from_millis(tick_ms: u64) -> Self {
        Self::new(Duration::from_millis(tick_ms))
    }

    /// Limit how many ticks a single `advance` may report.
    ///
    /// Time beyond the limit is dropped.
    #[must_use]
    pub fn with_max_catch_up(mut self, ticks: u32) -> Self {
        self.max_catch_up = ticks.max(1);
        self
    }

    /// Tick interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Add elapsed time and return the number of ticks now due.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulated += elapsed;
        let mut due = 0;
        while self.accumulated >= self.interval {
            if due == self.max_catch_up {
                self.accumulated = Duration::ZERO;
                tracing::debug!(dropped_ticks = true, "tick clock fell behind");
                break;
            }
            self.accumulated -= self.interval;
            due += 1;
        }
        due
    }

    /// Fraction of the next tick already elapsed, in `[0, 1)`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.accumulated.as_secs_f64() / self.interval.as_secs_f64()
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::from_millis(crate::config::DEFAULT_TICK_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_partial_ticks() {
        let mut clock = TickClock::default();
        assert_eq!(clock.advance(Duration::from_millis(300)), 0);
        assert!((clock.progress() - 0.5).abs() < 1e-9);
        assert_eq!(clock.advance(Duration::from_millis(300)), 1);
        assert_eq!(clock.progress(), 0.0);
    }

    #[test]
    fn test_reports_multiple_ticks() {
        let mut clock = TickClock::from_millis(100);
        assert_eq!(clock.advance(Duration::from_millis(350)), 3);
        assert!((clock.progress() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_catch_up_limit() {
        let mut clock = TickClock::from_millis(100).with_max_catch_up(2);
        assert_eq!(clock.advance(Duration::from_secs(5)), 2);
        assert_eq!(clock.progress(), 0.0);
    }
}
