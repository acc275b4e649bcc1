//! Environment detection module.
//!
//! Decides whether the process runs directly on the host or inside a
//! container, and from that which directory holds the host's root filesystem.
//! Inside a container the host root has to be bind-mounted (e.g. at `/rootfs`)
//! and the container started with `--privileged` (or an equivalent set of
//! capabilities) for the host's `/proc` and cgroup mounts to be readable.
mod checks;
mod detect;
mod error;

pub use detect::{Probe, RuntimeEnvironment, detect_runtime_environment, resolve_rootfs};
pub use error::{Error, Result};
