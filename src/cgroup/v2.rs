use std::path::{Path, PathBuf};

use super::procfile::CgroupEntry;
use super::stats::{CpuStat, KeyValueStat, MemoryLimit, MemoryUsage, SingleLineStat};
use super::{
    Cgroup, CpuMetrics, CpuUsage, Hierarchy, LoadError, MemoryEntry, MemoryMetrics, Metrics,
    MetricsError, Tolerance, utils,
};

/// A cgroup in the unified hierarchy.
#[derive(Debug, Clone)]
pub struct V2Cgroup {
    dir: PathBuf,
}

impl V2Cgroup {
    /// Directory of the cgroup below the cgroup2 mount.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Finds the unified entry of `pid` and resolves it below `root`.
///
/// `origin` is the `/proc/<pid>/cgroup` file the entries came from, used in
/// error messages.
pub(super) fn locate(
    pid: u32,
    entries: &[CgroupEntry<'_>],
    root: &Path,
    origin: &Path,
) -> Result<V2Cgroup, LoadError> {
    let entry = entries
        .iter()
        .find(|entry| entry.is_unified())
        .ok_or_else(|| LoadError::MissingEntry {
            pid,
            hierarchy: Hierarchy::V2,
            path: origin.to_path_buf(),
        })?;

    let dir = root.join(entry.path.trim_start_matches('/'));
    if !dir.is_dir() {
        return Err(LoadError::Deleted { pid });
    }

    log::trace!("Resolved cgroup v2 of pid {pid}: {}", dir.display());
    Ok(V2Cgroup { dir })
}

impl Cgroup for V2Cgroup {
    fn stat(&self, tolerance: Tolerance) -> Result<Metrics, MetricsError> {
        let cpu_stat = utils::read_stat(
            &self.dir.join("cpu.stat"),
            tolerance,
            CpuStat::from_reader,
        )?;
        let memory_usage = utils::read_stat(
            &self.dir.join("memory.current"),
            tolerance,
            MemoryUsage::from_reader,
        )?;
        let memory_limit = utils::read_stat(
            &self.dir.join("memory.max"),
            tolerance,
            MemoryLimit::from_reader,
        )?;

        let cpu = cpu_stat.map(|stat| CpuMetrics {
            usage: stat.usage_nanos().map(|total| CpuUsage {
                total,
                user: stat.user_nanos(),
                kernel: stat.system_nanos(),
            }),
        });
        // Without the memory controller enabled neither file exists.
        let memory = (memory_usage.is_some() || memory_limit.is_some()).then(|| MemoryMetrics {
            usage: MemoryEntry::from_stats(memory_usage, memory_limit),
        });

        Ok(Metrics { cpu, memory })
    }
}
