use std::path::{Path, PathBuf};

use super::checks::{
    contains_proc_mount, has_marker_file, is_pid_namespace_isolated, matches_container_cgroup,
};
use super::{Error, Result};

/// Available runtime environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    /// Running directly on the host.
    Host,
    /// Running inside a containerized environment (e.g., Docker, Kubernetes, Podman).
    Container,
}

/// Inputs of the runtime environment heuristics.
#[derive(Debug, Clone)]
pub struct Probe {
    /// Root as seen by this process, normally `/`.
    pub self_root: PathBuf,
    /// Where the host root is expected when running in a container.
    pub rootfs: PathBuf,
    /// Whether the `container` environment variable is set.
    pub container_var: bool,
}

impl Probe {
    /// Runs the heuristics in order, stopping at the first positive one:
    ///
    /// 1. `<rootfs>/proc` exists and init's PID namespace differs from ours.
    /// 2. Our own `/proc/self/cgroup` names a container runtime or container id.
    /// 3. A runtime marker file exists or the `container` variable is set.
    ///
    /// Failing checks are logged as warnings and count as negative.
    pub fn detect(&self) -> RuntimeEnvironment {
        match contains_proc_mount(&self.rootfs) {
            Ok(true) => match is_pid_namespace_isolated(&self.self_root, &self.rootfs) {
                Ok(true) => return RuntimeEnvironment::Container,
                Ok(false) => {}
                Err(err) => log::warn!(
                    "Namespace check failed when detecting runtime environment: {}",
                    err
                ),
            },
            Ok(false) => {}
            Err(err) => log::warn!("Failed to determine presence of /proc in rootfs: {}", err),
        }

        match matches_container_cgroup(&self.self_root.join("proc/self/cgroup")) {
            Ok(true) => return RuntimeEnvironment::Container,
            Ok(false) => {}
            Err(err) => log::warn!("Cgroup analysis failed during runtime detection: {}", err),
        }

        if self.container_var || has_marker_file(&self.self_root) {
            return RuntimeEnvironment::Container;
        }

        RuntimeEnvironment::Host
    }
}

/// Detects whether this process runs in a container or on the host, given the
/// expected host root mount `rootfs`.
pub fn detect_runtime_environment(rootfs: impl AsRef<Path>) -> RuntimeEnvironment {
    Probe {
        self_root: PathBuf::from("/"),
        rootfs: rootfs.as_ref().to_path_buf(),
        container_var: std::env::var_os("container").is_some(),
    }
    .detect()
}

/// Returns the directory holding the host's root filesystem.
///
/// # Errors
///
/// Returns [`Error::MissingRootfs`] if running in a container without the host
/// root mounted at `rootfs`.
pub fn resolve_rootfs(environment: RuntimeEnvironment, rootfs: &Path) -> Result<PathBuf> {
    match environment {
        RuntimeEnvironment::Host => Ok(PathBuf::from("/")),
        RuntimeEnvironment::Container if rootfs.is_dir() => Ok(rootfs.to_path_buf()),
        RuntimeEnvironment::Container => Err(Error::MissingRootfs {
            path: rootfs.to_path_buf(),
        }),
    }
}
