#![forbid(unsafe_code)]

//! Explicit periodic task.
//!
//! There is no background timer. The owner polls an [`Interval`] with the
//! current instant and receives the number of periods that came due since the
//! last poll. A host event loop typically polls once per frame.
//!
//! # Catch-up
//!
//! When several periods elapse between polls, every one of them is reported:
//! polling 3.5 periods late returns 3 and schedules the next tick half a
//! period later. The schedule never drifts because deadlines advance by whole
//! periods from the start instant.
//!
//! A deadline past the range of [`Instant`] means the interval never fires.

use std::time::Duration;

use web_time::Instant;

/// Shortest accepted period. Zero periods are clamped up to this.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// A fixed-rate schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    period: Duration,
    /// `None` once the deadline is no longer representable.
    next_due: Option<Instant>,
}

impl Interval {
    /// First tick is due one `period` after `start`.
    #[must_use]
    pub fn new(period: Duration, start: Instant) -> Self {
        let period = period.max(MIN_PERIOD);
        Self {
            period,
            next_due: start.checked_add(period),
        }
    }

    /// One tick per second, matching a wall clock display.
    #[must_use]
    pub fn every_second(start: Instant) -> Self {
        Self::new(Duration::from_secs(1), start)
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Deadline of the next tick, if it is representable.
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// Number of ticks due at `now`. Advances the schedule past them.
    ///
    /// Saturates at `u32::MAX` for absurdly long gaps.
    pub fn poll(&mut self, now: Instant) -> u32 {
        let Some(next_due) = self.next_due else {
            return 0;
        };
        if now < next_due {
            return 0;
        }
        let late = now.duration_since(next_due);
        let due = late.as_nanos() / self.period.as_nanos() + 1;
        let ticks = u32::try_from(due).unwrap_or(u32::MAX);
        self.next_due = next_due.checked_add(self.period.saturating_mul(ticks));
        ticks
    }

    /// Restart the schedule from `now`, dropping any pending ticks.
    pub fn reset(&mut self, now: Instant) {
        self.next_due = now.checked_add(self.period);
    }
}
