//! Per-second rates derived from monotonic counters (network/disk totals).

use std::collections::HashMap;
use std::time::Instant;

struct CounterSample {
    value: f64,
    at: Instant,
    last_rate: f64,
}

/// Owns the previous (value, time) pair per counter key and turns cumulative
/// readings into per-second rates.
#[derive(Default)]
pub struct RateTracker {
    samples: HashMap<String, CounterSample>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// First observation of a key yields 0.0 (no fabricated rate). A counter
    /// that decreased is treated as a fresh baseline, also yielding 0.0.
    /// Zero elapsed time returns the last computed rate without touching state.
    pub fn rate(&mut self, key: &str, current: f64, now: Instant) -> f64 {
        match self.samples.get_mut(key) {
            None => {
                self.samples.insert(
                    key.to_string(),
                    CounterSample {
                        value: current,
                        at: now,
                        last_rate: 0.0,
                    },
                );
                0.0
            }
            Some(prev) => {
                // Instant::duration_since saturates, so elapsed is never negative
                let elapsed = now.duration_since(prev.at).as_secs_f64();
                if elapsed <= 0.0 {
                    return prev.last_rate;
                }
                if current < prev.value {
                    // counter reset (sleep, driver reload): rebaseline
                    prev.value = current;
                    prev.at = now;
                    prev.last_rate = 0.0;
                    return 0.0;
                }
                let rate = (current - prev.value) / elapsed;
                prev.value = current;
                prev.at = now;
                prev.last_rate = rate;
                rate
            }
        }
    }
}
