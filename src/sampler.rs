//! Sample source: OS counters read through persistent sysinfo handles.

use once_cell::sync::OnceCell;
use sysinfo::{
    CpuRefreshKind, Disks, MemoryRefreshKind, Networks, ProcessRefreshKind, ProcessesToUpdate,
    RefreshKind, System,
};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default)]
pub struct MemorySample {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub swap_total: u64,
    pub swap_used: u64,
}

/// Cumulative byte totals summed across all interfaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetTotals {
    pub received: u64,
    pub transmitted: u64,
}

/// Cumulative I/O byte totals summed across all volumes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskTotals {
    pub read: u64,
    pub written: u64,
}

#[derive(Debug, Clone)]
pub struct TopProcess {
    pub name: String,
    pub cpu_percent: f32,
}

/// What the resolution pipeline needs from the OS. Every method returns `None`
/// when the underlying source is unavailable; callers substitute a sentinel.
pub trait SampleSource {
    fn cpu_percent(&mut self) -> Option<f64>;
    fn memory(&mut self) -> Option<MemorySample>;
    fn network_totals(&mut self) -> Option<NetTotals>;
    fn disk_totals(&mut self) -> Option<DiskTotals>;
    /// Highest-CPU process; `None` when process enumeration is unavailable
    /// (disabled, or requires elevation the process does not have).
    fn top_process(&mut self) -> Option<TopProcess>;
}

// Process enumeration can be costly (and elevation-gated on some platforms);
// disable with TRAYMON_TOP_PROCESS=0.
fn top_process_enabled() -> bool {
    static ON: OnceCell<bool> = OnceCell::new();
    *ON.get_or_init(|| {
        std::env::var("TRAYMON_TOP_PROCESS")
            .map(|v| v != "0")
            .unwrap_or(true)
    })
}

/// Holds the sysinfo handles for the process lifetime so cumulative network
/// and disk counters keep counting across refreshes.
pub struct SysinfoSampler {
    sys: System,
    networks: Networks,
    disks: Disks,
}

impl SysinfoSampler {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything());
        let mut sys = System::new_with_specifics(refresh_kind);
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let mut networks = Networks::new();
        networks.refresh(true);
        let mut disks = Disks::new();
        disks.refresh(true);

        Self {
            sys,
            networks,
            disks,
        }
    }
}

impl Default for SysinfoSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSource for SysinfoSampler {
    fn cpu_percent(&mut self) -> Option<f64> {
        let sys = &mut self.sys;
        if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sys.refresh_cpu_usage()))
            .is_err()
        {
            warn!("sysinfo cpu refresh panicked");
            return None;
        }
        Some(self.sys.global_cpu_usage() as f64)
    }

    fn memory(&mut self) -> Option<MemorySample> {
        let sys = &mut self.sys;
        if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sys.refresh_memory())).is_err()
        {
            warn!("sysinfo memory refresh panicked");
            return None;
        }
        let total = self.sys.total_memory();
        let available = self.sys.available_memory();
        Some(MemorySample {
            total,
            used: total.saturating_sub(available),
            available,
            swap_total: self.sys.total_swap(),
            swap_used: self.sys.used_swap(),
        })
    }

    fn network_totals(&mut self) -> Option<NetTotals> {
        // don't drop interfaces that momentarily disappear
        self.networks.refresh(false);
        let mut totals = NetTotals::default();
        for (_name, data) in self.networks.iter() {
            totals.received = totals.received.saturating_add(data.total_received());
            totals.transmitted = totals.transmitted.saturating_add(data.total_transmitted());
        }
        Some(totals)
    }

    fn disk_totals(&mut self) -> Option<DiskTotals> {
        self.disks.refresh(false);
        let mut totals = DiskTotals::default();
        for d in self.disks.iter() {
            let usage = d.usage();
            totals.read = totals.read.saturating_add(usage.total_read_bytes);
            totals.written = totals.written.saturating_add(usage.total_written_bytes);
        }
        Some(totals)
    }

    fn top_process(&mut self) -> Option<TopProcess> {
        if !top_process_enabled() {
            return None;
        }
        let sys = &mut self.sys;
        let refreshed = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            sys.refresh_processes_specifics(
                ProcessesToUpdate::All,
                false,
                ProcessRefreshKind::nothing().with_cpu().with_memory(),
            )
        }));
        if refreshed.is_err() {
            warn!("sysinfo process refresh panicked");
            return None;
        }
        let n_cpus = self.sys.cpus().len().max(1) as f32;
        self.sys
            .processes()
            .values()
            .max_by(|a, b| {
                a.cpu_usage()
                    .partial_cmp(&b.cpu_usage())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|p| TopProcess {
                name: p.name().to_string_lossy().into_owned(),
                cpu_percent: (p.cpu_usage() / n_cpus).min(100.0),
            })
    }
}
