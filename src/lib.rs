//! Container Stat: per-container resource usage snapshots.
//!
//! A snapshot combines the disk usage of a container's writable layer with
//! the CPU time and memory accounted to its cgroup (v1 or v2). Containers are
//! registered over an HTTP API, which also serves their snapshots.

use std::sync::Arc;

use cgroup::SysfsLoader;
use config::Config;
use fsutil::DiskUsage;
use monitor::Monitor;
use stat::StatReader;

pub mod api;
pub mod cgroup;
pub mod config;
pub mod container;
pub mod environment;
pub mod error;
pub mod fsutil;
pub mod monitor;
pub mod mountinfo;
pub mod stat;

// in container it is really important to have "--privileged" and the host
// root mounted at ROOTFS_MOUNT_PATH, otherwise neither /proc/<pid>/cgroup of
// other containers nor their cgroup directories are visible.

/// Runs the service.
///
/// Reads the [`Config`], resolves the host root, detects the cgroup
/// hierarchy and serves the API until the listener fails.
///
/// # Errors
///
/// Possible errors include:
/// - Invalid configuration values.
/// - Running in a container without the host root mounted.
/// - No usable cgroup mount on the host.
/// - Failure to bind the listen address.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    log::debug!("Configuration: {:?}", config);

    let runtime_env = environment::detect_runtime_environment(&config.rootfs);
    log::debug!("Runtime environment: {:?}", runtime_env);
    let rootfs = environment::resolve_rootfs(runtime_env, &config.rootfs)?;
    log::debug!("Final rootfs: {}", rootfs.display());

    let loader = SysfsLoader::new(config.hierarchy, &rootfs)?;
    log::info!("Reading cgroup {} accounting", loader.hierarchy());

    let reader = StatReader::new(Arc::new(DiskUsage), Arc::new(loader));
    let monitor = Arc::new(Monitor::new(reader));

    api::APIServer::new(monitor)
        .listen(config.listen_addr)
        .await?;
    Ok(())
}
