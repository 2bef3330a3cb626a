//! Monotonic time source for wall-clock gated timers.
//!
//! The simulation never reads the system clock itself: every step is handed a
//! `now` value and [`SimClock`] keeps it monotonic.

use bevy::prelude::*;
use std::time::{Duration, Instant};

/// Anything able to report time elapsed since the run started.
pub trait ClockSource {
    fn now(&mut self) -> Duration;
}

/// Real monotonic clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct InstantClock {
    start: Instant,
}

impl InstantClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl ClockSource for InstantClock {
    fn now(&mut self) -> Duration {
        self.start.elapsed()
    }
}

/// Synthetic clock advancing a fixed step each time it is read.
/// Used for headless runs and tests where real time should not matter.
#[derive(Debug, Clone, Copy)]
pub struct FixedStepClock {
    next: Duration,
    step: Duration,
}

impl FixedStepClock {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            next: Duration::ZERO,
            step: Duration::from_secs_f64(1.0 / tick_rate.max(1) as f64),
        }
    }
}

impl ClockSource for FixedStepClock {
    fn now(&mut self) -> Duration {
        let now = self.next;
        self.next += self.step;
        now
    }
}

/// Time as seen by the simulation for the current step.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimClock {
    pub now: Duration,
    pub delta: Duration,
}

impl SimClock {
    /// Advance to `now`. Returns `false` when `now` is earlier than the current
    /// time, in which case the clock is held where it was.
    pub fn advance_to(&mut self, now: Duration) -> bool {
        if now < self.now {
            self.delta = Duration::ZERO;
            return false;
        }
        self.delta = now - self.now;
        self.now = now;
        true
    }

    /// Time elapsed since `since`, saturating at zero.
    pub fn since(&self, since: Duration) -> Duration {
        self.now.saturating_sub(since)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_refuses_to_go_backwards() {
        let mut clock = SimClock::default();
        assert!(clock.advance_to(Duration::from_millis(50)));
        assert!(!clock.advance_to(Duration::from_millis(10)));
        assert_eq!(clock.now, Duration::from_millis(50));
        assert_eq!(clock.delta, Duration::ZERO);
    }

    #[test]
    fn fixed_step_clock_starts_at_zero() {
        let mut clock = FixedStepClock::new(50);
        assert_eq!(clock.now(), Duration::ZERO);
        assert_eq!(clock.now(), Duration::from_millis(20));
    }
}
