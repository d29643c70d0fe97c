//! Coalesces bursts of resize notifications into one rebuild.

use std::time::{Duration, Instant};

/// Quiet period after the last resize before the scene is rebuilt.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Holds the most recent value until no new one has arrived for `delay`.
#[derive(Debug)]
pub struct ResizeDebouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> ResizeDebouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record a new value, replacing any pending one and restarting the wait.
    pub fn notify(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Take the pending value if the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now.saturating_duration_since(*at) >= self.delay => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    /// Forget any pending value.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl<T> Default for ResizeDebouncer<T> {
    fn default() -> Self {
        Self::new(RESIZE_DEBOUNCE)
    }
}
