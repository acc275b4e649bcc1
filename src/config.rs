//! Startup configuration read from environment variables.
//!
//! | Variable            | Default        | Meaning                                   |
//! |---------------------|----------------|-------------------------------------------|
//! | `ROOTFS_MOUNT_PATH` | `/rootfs`      | Host root mount when run in a container   |
//! | `CGROUP_HIERARCHY`  | `auto`         | `v1`, `v2` or `auto`                      |
//! | `LISTEN_ADDR`       | `0.0.0.0:3000` | Bind address of the HTTP API              |

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::cgroup::{Hierarchy, InvalidHierarchy};

const ROOTFS_MOUNT_PATH: &str = "ROOTFS_MOUNT_PATH";
const CGROUP_HIERARCHY: &str = "CGROUP_HIERARCHY";
const LISTEN_ADDR: &str = "LISTEN_ADDR";

const DEFAULT_ROOTFS: &str = "/rootfs";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value for `CGROUP_HIERARCHY`: {0}")]
    Hierarchy(#[source] InvalidHierarchy),
    #[error("invalid value for `LISTEN_ADDR` `{value}`: {source}")]
    ListenAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where the host root is mounted when running in a container.
    pub rootfs: PathBuf,
    /// `None` selects the hierarchy from the host's cgroup mounts.
    pub hierarchy: Option<Hierarchy>,
    pub listen_addr: SocketAddr,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Unset and empty variables take their default.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key| lookup(key).filter(|value| !value.trim().is_empty());

        let rootfs = var(ROOTFS_MOUNT_PATH).unwrap_or_else(|| DEFAULT_ROOTFS.to_owned());

        let hierarchy = match var(CGROUP_HIERARCHY).as_deref().map(str::trim) {
            None | Some("auto") => None,
            Some(value) => Some(value.parse::<Hierarchy>().map_err(Error::Hierarchy)?),
        };

        let listen_addr = var(LISTEN_ADDR).unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_owned());
        let listen_addr = listen_addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|source| Error::ListenAddr {
                value: listen_addr.clone(),
                source,
            })?;

        Ok(Self {
            rootfs: PathBuf::from(rootfs),
            hierarchy,
            listen_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.rootfs, PathBuf::from("/rootfs"));
        assert_eq!(config.hierarchy, None);
        assert_eq!(config.listen_addr, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            (ROOTFS_MOUNT_PATH, "/host"),
            (CGROUP_HIERARCHY, "v1"),
            (LISTEN_ADDR, "127.0.0.1:8080"),
        ])
        .unwrap();
        assert_eq!(config.rootfs, PathBuf::from("/host"));
        assert_eq!(config.hierarchy, Some(Hierarchy::V1));
        assert_eq!(config.listen_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_auto_and_empty_values() {
        let config = config(&[(CGROUP_HIERARCHY, "auto"), (ROOTFS_MOUNT_PATH, " ")]).unwrap();
        assert_eq!(config.hierarchy, None);
        assert_eq!(config.rootfs, PathBuf::from("/rootfs"));
    }

    #[test]
    fn test_invalid_values() {
        let err = config(&[(CGROUP_HIERARCHY, "v3")]).unwrap_err();
        assert!(matches!(err, Error::Hierarchy(_)));

        let err = config(&[(LISTEN_ADDR, "localhost")]).unwrap_err();
        match err {
            Error::ListenAddr { value, .. } => assert_eq!(value, "localhost"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
