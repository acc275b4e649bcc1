//! Cgroup accounting reader.
//!
//! Resolves the cgroup a process belongs to and reads its CPU and memory
//! accounting counters. Exactly one hierarchy version is active per reader:
//!
//! - [`Hierarchy::V1`]: one mount per controller (or co-mounted group), with
//!   `cpuacct.usage`, `cpuacct.stat`, `memory.usage_in_bytes` and
//!   `memory.limit_in_bytes`.
//! - [`Hierarchy::V2`]: a single unified mount, with `cpu.stat`,
//!   `memory.current` and `memory.max`.
//!
//! # Key Components
//!
//! - [`Loader`] / [`Cgroup`]: the seams the stat aggregator depends on.
//! - [`SysfsLoader`]: the implementation backed by `/proc` and the cgroup filesystem.
//! - [`Metrics`]: optional-at-every-level counters returned by [`Cgroup::stat`].
//!
//! # Platform Requirements
//!
//! - Linux, with read access to `/proc/<pid>/cgroup` and the cgroup mount(s).
mod error;
mod loader;
mod metrics;
pub(crate) mod procfile;
pub mod stats;
mod utils;
mod v1;
mod v2;

use std::fmt;
use std::str::FromStr;

pub use error::{LoadError, MetricsError, SetupError};
pub use loader::SysfsLoader;
pub use metrics::{CpuMetrics, CpuUsage, MemoryEntry, MemoryMetrics, Metrics};
pub use v1::V1Cgroup;
pub use v2::V2Cgroup;

/// Cgroup hierarchy version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hierarchy {
    V1,
    V2,
}

impl fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hierarchy::V1 => f.write_str("v1"),
            Hierarchy::V2 => f.write_str("v2"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid cgroup hierarchy `{0}`, expected `v1` or `v2`")]
pub struct InvalidHierarchy(pub String);

impl FromStr for Hierarchy {
    type Err = InvalidHierarchy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" | "1" => Ok(Hierarchy::V1),
            "v2" | "2" | "unified" => Ok(Hierarchy::V2),
            other => Err(InvalidHierarchy(other.to_owned())),
        }
    }
}

/// How [`Cgroup::stat`] treats accounting files that do not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tolerance {
    /// A missing file is an error.
    #[default]
    Strict,
    /// A missing file leaves the corresponding counter absent.
    IgnoreNotExist,
}

/// Resolves the cgroup of a process.
pub trait Loader: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the process is gone or none of its cgroup
    /// directories can be found.
    fn load(&self, pid: u32) -> Result<Box<dyn Cgroup>, LoadError>;
}

/// A resolved cgroup whose counters can be read.
pub trait Cgroup {
    /// # Errors
    ///
    /// Returns a [`MetricsError`] if a file cannot be read or parsed. With
    /// [`Tolerance::IgnoreNotExist`] a missing file is not an error.
    fn stat(&self, tolerance: Tolerance) -> Result<Metrics, MetricsError>;
}
