//! Bounded polling, the one place a run ever suspends.

use std::time::Duration;

use tracing::debug;

use crate::error::Result;

/// Source of sleeps, swapped out in tests so polling runs instantly.
pub trait Clock {
    fn sleep(&self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// How often and how long to re-check a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: 12,
            interval: Duration::from_secs(5),
        }
    }
}

/// Evaluates `predicate` up to `max_attempts` times, sleeping `interval`
/// between attempts (never after the last one).
///
/// Returns `Ok(true)` as soon as the predicate holds and `Ok(false)` once the
/// attempts are used up. Errors from the predicate abort the wait immediately.
pub fn wait_until<F>(clock: &dyn Clock, settings: PollSettings, mut predicate: F) -> Result<bool>
where
    F: FnMut() -> Result<bool>,
{
    for attempt in 1..=settings.max_attempts {
        if predicate()? {
            return Ok(true);
        }
        if attempt < settings.max_attempts {
            debug!(attempt, max = settings.max_attempts, "condition not met yet");
            clock.sleep(settings.interval);
        }
    }
    Ok(false)
}
