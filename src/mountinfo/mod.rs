//! Cgroup mount detection from `/proc/<pid>/mountinfo`.
mod detect;
mod error;
mod parser;

pub use detect::{CgroupMounts, detect_cgroup_mounts, resolve_mount_dir};
pub use error::{Error, Result};
