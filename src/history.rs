//! Small utilities to manage bounded history buffers for sparklines.

use std::collections::{HashMap, VecDeque};

pub const DEFAULT_CAPACITY: usize = 30;

pub fn push_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    // cap can shrink at runtime (config reload), so drain instead of a single pop
    while dq.len() >= cap.max(1) {
        dq.pop_front();
    }
    dq.push_back(v);
}

// Keeps one f64 deque per metric key; series are created lazily on first push
// and live for the process lifetime.
pub struct HistoryBuffer {
    series: HashMap<String, VecDeque<f64>>,
    caps: HashMap<String, usize>,
    default_cap: usize,
}

impl HistoryBuffer {
    pub fn new(default_cap: usize) -> Self {
        Self {
            series: HashMap::new(),
            caps: HashMap::new(),
            default_cap: default_cap.max(1),
        }
    }

    fn cap_for(&self, key: &str) -> usize {
        self.caps.get(key).copied().unwrap_or(self.default_cap)
    }

    // Configure capacity for one key; an existing series keeps its newest values.
    pub fn set_capacity(&mut self, key: &str, cap: usize) {
        let cap = cap.max(1);
        self.caps.insert(key.to_string(), cap);
        if let Some(dq) = self.series.get_mut(key) {
            while dq.len() > cap {
                dq.pop_front();
            }
        }
    }

    pub fn push(&mut self, key: &str, value: f64) {
        let cap = self.cap_for(key);
        let dq = self
            .series
            .entry(key.to_string())
            .or_insert_with(|| VecDeque::with_capacity(cap));
        push_capped(dq, value, cap);
    }

    /// Oldest-first copy of the series, empty if the key has never been pushed.
    pub fn snapshot(&self, key: &str) -> Vec<f64> {
        self.series
            .get(key)
            .map(|dq| dq.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
