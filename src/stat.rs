//! Per-container resource usage snapshot.
//!
//! A [`ContainerStat`] combines the disk usage of a container's writable
//! layer with the CPU time and memory its cgroup accounts for. Disk usage,
//! cgroup resolution and counter reads are hard failures; an individual CPU
//! or memory counter the host does not provide reads as `0`.

use std::sync::Arc;

use crate::cgroup::{LoadError, Loader, MetricsError, Tolerance};
use crate::container::ContainerHandle;
use crate::fsutil::{UsageError, UsageInfo, UsageReader};

/// Point-in-time resource usage of one container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ContainerStat {
    fs: UsageInfo,
    memory_bytes: u64,
    cpu_nanoseconds: u64,
}

impl ContainerStat {
    pub fn new(fs: UsageInfo, memory_bytes: u64, cpu_nanoseconds: u64) -> Self {
        Self {
            fs,
            memory_bytes,
            cpu_nanoseconds,
        }
    }

    /// Disk usage of the container's base directory.
    pub fn fs(&self) -> UsageInfo {
        self.fs
    }

    pub fn memory_bytes(&self) -> u64 {
        self.memory_bytes
    }

    /// Cumulative CPU time since the cgroup was created.
    pub fn cpu_nanoseconds(&self) -> u64 {
        self.cpu_nanoseconds
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not get fs usage: {0}")]
    FilesystemUsage(#[source] UsageError),
    #[error("could not load cgroups of process {pid}: {source}")]
    CgroupLoad {
        pid: u32,
        #[source]
        source: LoadError,
    },
    #[error("could not fetch metrics of process {pid}: {source}")]
    MetricsRead {
        pid: u32,
        #[source]
        source: MetricsError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Produces [`ContainerStat`] snapshots from a disk usage reader and a cgroup loader.
#[derive(Clone)]
pub struct StatReader {
    usage: Arc<dyn UsageReader>,
    cgroups: Arc<dyn Loader>,
}

impl StatReader {
    pub fn new(usage: Arc<dyn UsageReader>, cgroups: Arc<dyn Loader>) -> Self {
        Self { usage, cgroups }
    }

    /// Takes a snapshot of `container`.
    ///
    /// The call blocks on directory traversal and kernel files; async callers
    /// should run it via `tokio::task::spawn_blocking`.
    ///
    /// # Errors
    ///
    /// - [`Error::FilesystemUsage`] if the base directory cannot be measured.
    /// - [`Error::CgroupLoad`] if the cgroup of the container's process
    ///   cannot be resolved.
    /// - [`Error::MetricsRead`] if an accounting file exists but cannot be
    ///   read or parsed.
    pub fn stat(&self, container: &impl ContainerHandle) -> Result<ContainerStat> {
        let fs = self
            .usage
            .usage(container.base_dir())
            .map_err(Error::FilesystemUsage)?;

        let pid = container.pid();
        let cgroup = self
            .cgroups
            .load(pid)
            .map_err(|source| Error::CgroupLoad { pid, source })?;
        let metrics = cgroup
            .stat(Tolerance::IgnoreNotExist)
            .map_err(|source| Error::MetricsRead { pid, source })?;

        Ok(ContainerStat {
            fs,
            memory_bytes: metrics.memory_usage().unwrap_or(0),
            cpu_nanoseconds: metrics.cpu_total().unwrap_or(0),
        })
    }
}

impl std::fmt::Debug for StatReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatReader").finish_non_exhaustive()
    }
}
