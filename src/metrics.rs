//! Metric registry: lazy, per-tick memoized resolution of metric keys.
//!
//! A key is computed at most once per tick, and only if some placeholder
//! actually references it. Raw samples are memoized separately so e.g.
//! `ram_percent` and `ram_used` share a single memory refresh.

use std::collections::HashMap;
use std::time::Instant;

use thiserror::Error;
use tracing::warn;

use crate::commands::CommandRunner;
use crate::config::Config;
use crate::history::HistoryBuffer;
use crate::rates::RateTracker;
use crate::sampler::{DiskTotals, MemorySample, NetTotals, SampleSource, TopProcess};
use crate::sparkline::{self, SparklineStyle};

/// Substituted for any key that cannot be resolved.
pub const SENTINEL: &str = "N/A";

pub const SPARKLINE_SUFFIX: &str = "_sparkline";

#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Float(f64),
    Int(u64),
    Text(String),
    /// A `data:image/png;base64,…` URI ready for inline embedding.
    Image(String),
}

impl MetricValue {
    pub fn sentinel() -> Self {
        MetricValue::Text(SENTINEL.to_string())
    }

    /// Numeric view, parsing text so numeric custom-command output can feed
    /// a sparkline series.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Float(v) => Some(*v),
            MetricValue::Int(v) => Some(*v as f64),
            MetricValue::Text(s) => s.trim().parse().ok(),
            MetricValue::Image(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum MetricError {
    #[error("unknown metric key: {0}")]
    UnknownMetric(String),
    #[error("{0} sample unavailable")]
    SampleUnavailable(&'static str),
    #[error("series for {0} is not numeric")]
    NonNumericSeries(String),
    #[error("sparkline encoding failed: {0}")]
    Render(#[from] png::EncodingError),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Unit {
    Bytes,
    Kb,
    Mb,
    Gb,
}

impl Unit {
    fn parse(tok: &str) -> Option<Unit> {
        match tok {
            "bytes" => Some(Unit::Bytes),
            "kb" => Some(Unit::Kb),
            "mb" => Some(Unit::Mb),
            "gb" => Some(Unit::Gb),
            _ => None,
        }
    }

    fn divisor(self) -> f64 {
        match self {
            Unit::Bytes => 1.0,
            Unit::Kb => 1024.0,
            Unit::Mb => 1024.0 * 1024.0,
            Unit::Gb => 1024.0 * 1024.0 * 1024.0,
        }
    }

    fn scale(self, raw: u64) -> MetricValue {
        match self {
            Unit::Bytes => MetricValue::Int(raw),
            _ => MetricValue::Float(raw as f64 / self.divisor()),
        }
    }
}

// Outer Option: sampled this tick yet? Inner Option: source available?
#[derive(Default)]
struct TickCache {
    now: Option<Instant>,
    resolved: HashMap<String, MetricValue>,
    cpu: Option<Option<f64>>,
    memory: Option<Option<MemorySample>>,
    net: Option<Option<NetTotals>>,
    disk: Option<Option<DiskTotals>>,
    top: Option<Option<TopProcess>>,
}

/// The orchestration hub: owns the sampler, rate baselines, history buffers
/// and sparkline styles, and memoizes everything for the current tick.
pub struct MetricRegistry<S: SampleSource> {
    sampler: S,
    rates: RateTracker,
    history: HistoryBuffer,
    commands: CommandRunner,
    styles: HashMap<String, SparklineStyle>,
    tick: TickCache,
}

impl<S: SampleSource> MetricRegistry<S> {
    pub fn new(sampler: S, commands: CommandRunner) -> Self {
        Self {
            sampler,
            rates: RateTracker::new(),
            history: HistoryBuffer::default(),
            commands,
            styles: HashMap::new(),
            tick: TickCache::default(),
        }
    }

    /// Apply per-key sparkline styles and history capacities. Safe to call
    /// between ticks on a configuration reload.
    pub fn apply_config(&mut self, config: &Config) {
        for (key, style) in &config.sparklines {
            self.history.set_capacity(key, style.max_length);
            self.styles.insert(key.clone(), style.clone());
        }
    }

    /// Oldest-first copy of a key's history series.
    pub fn series(&self, key: &str) -> Vec<f64> {
        self.history.snapshot(key)
    }

    /// Open a new tick scope: the previous tick's cache is discarded whole.
    pub fn begin_tick(&mut self, now: Instant) {
        self.tick = TickCache {
            now: Some(now),
            ..TickCache::default()
        };
    }

    fn tick_now(&self) -> Instant {
        self.tick.now.unwrap_or_else(Instant::now)
    }

    /// Resolve a key within the active tick. Never fails: per-key errors are
    /// logged and degrade to the sentinel, which is then itself memoized so a
    /// second resolution performs no additional sampling.
    pub fn resolve(&mut self, key: &str) -> MetricValue {
        if let Some(v) = self.tick.resolved.get(key) {
            return v.clone();
        }
        let value = match self.compute(key) {
            Ok(v) => v,
            Err(MetricError::UnknownMetric(k)) => {
                warn!("requested unknown metric key: {k}");
                MetricValue::sentinel()
            }
            Err(e) => {
                warn!("failed to resolve {key}: {e}");
                MetricValue::sentinel()
            }
        };
        self.tick
            .resolved
            .insert(key.to_string(), value.clone());
        value
    }

    fn compute(&mut self, key: &str) -> Result<MetricValue, MetricError> {
        if let Some(base) = key.strip_suffix(SPARKLINE_SUFFIX) {
            return self.compute_sparkline(base);
        }
        // custom keys shadow the built-in families
        if self.commands.is_registered(key) {
            return match self.commands.latest(key) {
                Some(text) => Ok(MetricValue::Text(text)),
                None => Err(MetricError::SampleUnavailable("custom command")),
            };
        }
        match key {
            "cpu_percent" => Ok(MetricValue::Float(self.cpu_sample()?)),
            "ram_percent" => {
                let m = self.memory_sample()?;
                Ok(MetricValue::Float(percent(m.used, m.total)))
            }
            "swap_percent" => {
                let m = self.memory_sample()?;
                Ok(MetricValue::Float(percent(m.swap_used, m.swap_total)))
            }
            "top_process_name" => Ok(MetricValue::Text(self.top_sample()?.name)),
            "top_process_cpu_percent" => {
                Ok(MetricValue::Float(self.top_sample()?.cpu_percent as f64))
            }
            _ => self.compute_family(key),
        }
    }

    // Resolve the base key, append it to its history series, then render the
    // series with the key's configured style.
    fn compute_sparkline(&mut self, base: &str) -> Result<MetricValue, MetricError> {
        let value = self.resolve(base);
        let v = value
            .as_f64()
            .ok_or_else(|| MetricError::NonNumericSeries(base.to_string()))?;
        self.history.push(base, v);
        let series = self.history.snapshot(base);
        let style = self.styles.get(base).cloned().unwrap_or_default();
        let uri = sparkline::render_data_uri(&series, &style)?;
        Ok(MetricValue::Image(uri))
    }

    // Suffix-structured key families: ram_*/swap_* fields with optional unit,
    // network_*/disk_* counters with optional unit and _per_sec.
    fn compute_family(&mut self, key: &str) -> Result<MetricValue, MetricError> {
        if let Some(rest) = key.strip_prefix("ram_") {
            let m = self.memory_sample()?;
            return mem_field(key, rest, m.total, m.used, Some(m.available));
        }
        if let Some(rest) = key.strip_prefix("swap_") {
            let m = self.memory_sample()?;
            return mem_field(key, rest, m.swap_total, m.swap_used, None);
        }
        if let Some(rest) = key.strip_prefix("network_") {
            let totals = self.net_sample()?;
            return self.counter_key(key, rest, "network", |dir| match dir {
                "recv" => Some(totals.received),
                "sent" => Some(totals.transmitted),
                _ => None,
            });
        }
        if let Some(rest) = key.strip_prefix("disk_") {
            let totals = self.disk_sample()?;
            return self.counter_key(key, rest, "disk", |dir| match dir {
                "read" => Some(totals.read),
                "written" => Some(totals.written),
                _ => None,
            });
        }
        Err(MetricError::UnknownMetric(key.to_string()))
    }

    // `<unit>_<direction>[_per_sec]`, e.g. bytes_recv_per_sec, mb_read.
    // Rate baselines are keyed per direction so all unit variants share one.
    fn counter_key(
        &mut self,
        key: &str,
        rest: &str,
        family: &str,
        lookup: impl Fn(&str) -> Option<u64>,
    ) -> Result<MetricValue, MetricError> {
        let (rest, per_sec) = match rest.strip_suffix("_per_sec") {
            Some(r) => (r, true),
            None => (rest, false),
        };
        let parsed = rest.split_once('_').and_then(|(unit_tok, dir)| {
            Unit::parse(unit_tok).and_then(|unit| lookup(dir).map(|raw| (unit, dir, raw)))
        });
        let Some((unit, dir, raw)) = parsed else {
            return Err(MetricError::UnknownMetric(key.to_string()));
        };
        if per_sec {
            let now = self.tick_now();
            let rate = self.rates.rate(&format!("{family}_{dir}"), raw as f64, now);
            Ok(MetricValue::Float(rate / unit.divisor()))
        } else {
            Ok(unit.scale(raw))
        }
    }

    fn cpu_sample(&mut self) -> Result<f64, MetricError> {
        if self.tick.cpu.is_none() {
            self.tick.cpu = Some(self.sampler.cpu_percent());
        }
        self.tick
            .cpu
            .unwrap()
            .ok_or(MetricError::SampleUnavailable("cpu"))
    }

    fn memory_sample(&mut self) -> Result<MemorySample, MetricError> {
        if self.tick.memory.is_none() {
            self.tick.memory = Some(self.sampler.memory());
        }
        self.tick
            .memory
            .unwrap()
            .ok_or(MetricError::SampleUnavailable("memory"))
    }

    fn net_sample(&mut self) -> Result<NetTotals, MetricError> {
        if self.tick.net.is_none() {
            self.tick.net = Some(self.sampler.network_totals());
        }
        self.tick
            .net
            .unwrap()
            .ok_or(MetricError::SampleUnavailable("network"))
    }

    fn disk_sample(&mut self) -> Result<DiskTotals, MetricError> {
        if self.tick.disk.is_none() {
            self.tick.disk = Some(self.sampler.disk_totals());
        }
        self.tick
            .disk
            .unwrap()
            .ok_or(MetricError::SampleUnavailable("disk"))
    }

    fn top_sample(&mut self) -> Result<TopProcess, MetricError> {
        if self.tick.top.is_none() {
            self.tick.top = Some(self.sampler.top_process());
        }
        self.tick
            .top
            .clone()
            .unwrap()
            .ok_or(MetricError::SampleUnavailable("top process"))
    }
}

fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    }
}

// `total`, `used`, `available` plus `_kb`/`_mb`/`_gb` variants.
fn mem_field(
    key: &str,
    rest: &str,
    total: u64,
    used: u64,
    available: Option<u64>,
) -> Result<MetricValue, MetricError> {
    let (field, unit) = match rest.rsplit_once('_') {
        Some((f, tok)) if Unit::parse(tok).is_some() => (f, Unit::parse(tok).unwrap()),
        _ => (rest, Unit::Bytes),
    };
    let raw = match field {
        "total" => total,
        "used" => used,
        "available" => match available {
            Some(v) => v,
            None => return Err(MetricError::UnknownMetric(key.to_string())),
        },
        _ => return Err(MetricError::UnknownMetric(key.to_string())),
    };
    Ok(unit.scale(raw))
}
