use newwork_types::ProcessStatus;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct SupervisorCounters {
    pub starts: AtomicU64,
    pub restarts: AtomicU64,
    pub probes: AtomicU64,
    pub probe_failures: AtomicU64,
    pub unexpected_exits: AtomicU64,
}

impl SupervisorCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SupervisorStats {
    pub status: ProcessStatus,
    pub pid: Option<u32>,
    pub starts: u64,
    pub restarts: u64,
    pub probes: u64,
    pub probe_failures: u64,
    pub unexpected_exits: u64,
    /// Seconds since the current child was spawned.
    pub uptime_secs: Option<u64>,
}

impl SupervisorStats {
    pub(crate) fn collect(
        counters: &SupervisorCounters,
        status: ProcessStatus,
        pid: Option<u32>,
        uptime_secs: Option<u64>,
    ) -> Self {
        Self {
            status,
            pid,
            starts: counters.starts.load(Ordering::Relaxed),
            restarts: counters.restarts.load(Ordering::Relaxed),
            probes: counters.probes.load(Ordering::Relaxed),
            probe_failures: counters.probe_failures.load(Ordering::Relaxed),
            unexpected_exits: counters.unexpected_exits.load(Ordering::Relaxed),
            uptime_secs,
        }
    }

    pub fn probe_success_rate(&self) -> f64 {
        if self.probes == 0 {
            return 1.0;
        }
        (self.probes - self.probe_failures.min(self.probes)) as f64 / self.probes as f64
    }
}
