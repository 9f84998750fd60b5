//! Clock-gated admission for classifier invocations

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Global cooldown gate shared by all ingestion attempts
///
/// The gate meters how often the pipeline is allowed to run at all, not
/// how often it succeeds: the timestamp is stamped at admission, so a
/// flood of incoming media costs at most one classifier round-trip per
/// window regardless of how each attempt ends.
pub struct CooldownGate {
    last_admitted: Mutex<Option<Instant>>,
}

impl CooldownGate {
    /// Create a gate that has never admitted anything
    pub fn new() -> Self {
        Self {
            last_admitted: Mutex::new(None),
        }
    }

    /// Atomically check the elapsed time and claim the window
    ///
    /// Returns `true` when at least `cooldown` has passed since the last
    /// admission (or nothing was ever admitted), updating the timestamp
    /// in the same critical section so two concurrent attempts can never
    /// both pass for the same window.
    pub fn try_acquire(&self, cooldown: Duration) -> bool {
        let mut last = self
            .last_admitted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();
        match *last {
            Some(at) if now.duration_since(at) < cooldown => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::new()
    }
}
