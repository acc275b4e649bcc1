use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::procfile::CgroupEntry;
use super::stats::{
    CpuAcctStat, CpuAcctUsage, KeyValueStat, MemoryLimit, MemoryUsage, SingleLineStat,
};
use super::{
    Cgroup, CpuMetrics, CpuUsage, Hierarchy, LoadError, MemoryEntry, MemoryMetrics, Metrics,
    MetricsError, Tolerance, utils,
};

const CPUACCT: &str = "cpuacct";
const MEMORY: &str = "memory";

/// A cgroup in the legacy hierarchy: one directory per mounted controller.
#[derive(Debug, Clone)]
pub struct V1Cgroup {
    dirs: HashMap<String, PathBuf>,
}

impl V1Cgroup {
    /// Directory of the given controller, if the process is in one.
    pub fn dir(&self, controller: &str) -> Option<&Path> {
        self.dirs.get(controller).map(PathBuf::as_path)
    }
}

/// Resolves every controller of `pid` that is mounted and whose directory
/// still exists.
///
/// Controllers the process lists but that are not mounted are skipped. If no
/// controller is left the cgroup is considered deleted.
pub(super) fn locate(
    pid: u32,
    entries: &[CgroupEntry<'_>],
    mounts: &HashMap<String, PathBuf>,
    origin: &Path,
) -> Result<V1Cgroup, LoadError> {
    let mut legacy = entries.iter().filter(|entry| !entry.is_unified()).peekable();
    if legacy.peek().is_none() {
        return Err(LoadError::MissingEntry {
            pid,
            hierarchy: Hierarchy::V1,
            path: origin.to_path_buf(),
        });
    }

    let mut dirs = HashMap::new();
    for entry in legacy {
        for controller in &entry.controllers {
            let Some(mount) = mounts.get(*controller) else {
                continue;
            };
            let dir = mount.join(entry.path.trim_start_matches('/'));
            if dir.is_dir() {
                dirs.insert((*controller).to_owned(), dir);
            }
        }
    }

    if dirs.is_empty() {
        return Err(LoadError::Deleted { pid });
    }
    log::trace!(
        "Resolved cgroup v1 of pid {pid}: controllers={:?}",
        dirs.keys().collect::<Vec<_>>()
    );
    Ok(V1Cgroup { dirs })
}

impl Cgroup for V1Cgroup {
    fn stat(&self, tolerance: Tolerance) -> Result<Metrics, MetricsError> {
        let cpu = match self.dirs.get(CPUACCT) {
            Some(dir) => {
                let usage = utils::read_stat(
                    &dir.join("cpuacct.usage"),
                    tolerance,
                    CpuAcctUsage::from_reader,
                )?;
                let split = utils::read_stat(
                    &dir.join("cpuacct.stat"),
                    tolerance,
                    CpuAcctStat::from_reader,
                )?
                .unwrap_or_default();
                Some(CpuMetrics {
                    usage: usage.map(|usage| CpuUsage {
                        total: usage.total_nanos,
                        user: split.user_nanos(),
                        kernel: split.system_nanos(),
                    }),
                })
            }
            None => None,
        };

        let memory = match self.dirs.get(MEMORY) {
            Some(dir) => {
                let usage = utils::read_stat(
                    &dir.join("memory.usage_in_bytes"),
                    tolerance,
                    MemoryUsage::from_reader,
                )?;
                let limit = utils::read_stat(
                    &dir.join("memory.limit_in_bytes"),
                    tolerance,
                    MemoryLimit::from_reader,
                )?;
                Some(MemoryMetrics {
                    usage: MemoryEntry::from_stats(usage, limit),
                })
            }
            None => None,
        };

        Ok(Metrics { cpu, memory })
    }
}
