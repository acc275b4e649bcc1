//! Accounting values read from a cgroup.
//!
//! Every level is optional: `None` means the controller or counter was not
//! present, which is distinct from a counter that reads zero.

use super::stats::{MemoryLimit, MemoryUsage};

/// Snapshot of the accounting counters of one cgroup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metrics {
    pub cpu: Option<CpuMetrics>,
    pub memory: Option<MemoryMetrics>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuMetrics {
    pub usage: Option<CpuUsage>,
}

/// Cumulative CPU time, in nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuUsage {
    pub total: u64,
    pub user: u64,
    pub kernel: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryMetrics {
    pub usage: Option<MemoryEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryEntry {
    /// Resident usage in bytes.
    pub usage: u64,
    /// `None` if unlimited or the limit file is absent.
    pub limit: Option<u64>,
}

impl MemoryEntry {
    /// Combines a usage and a limit file; without usage there is no entry.
    pub(super) fn from_stats(
        usage: Option<MemoryUsage>,
        limit: Option<MemoryLimit>,
    ) -> Option<Self> {
        usage.map(|usage| MemoryEntry {
            usage: usage.usage_bytes,
            limit: limit.and_then(|limit| limit.limit_bytes),
        })
    }
}

impl Metrics {
    /// Total CPU time in nanoseconds, if reported.
    pub fn cpu_total(&self) -> Option<u64> {
        self.cpu.as_ref()?.usage.map(|usage| usage.total)
    }

    /// Memory usage in bytes, if reported.
    pub fn memory_usage(&self) -> Option<u64> {
        self.memory.as_ref()?.usage.map(|entry| entry.usage)
    }
}
