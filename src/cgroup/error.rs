use std::path::PathBuf;

use crate::fsutil;

use super::Hierarchy;

/// Errors that may occur while resolving the cgroup of a process.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("process {pid} does not exist: `{path}` is missing")]
    ProcessNotFound { pid: u32, path: PathBuf },
    #[error(transparent)]
    FileOpen(#[from] fsutil::FileOpenError),
    #[error("failed to read file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse line in file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: super::procfile::ParseError,
    },
    #[error("process {pid} has no cgroup {hierarchy} entry in `{path}`")]
    MissingEntry {
        pid: u32,
        hierarchy: Hierarchy,
        path: PathBuf,
    },
    #[error("cgroup of process {pid} has been deleted")]
    Deleted { pid: u32 },
}

/// Errors that may occur while reading the accounting files of a cgroup.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error(transparent)]
    FileOpen(#[from] fsutil::FileOpenError),
    #[error("failed to read cgroup file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that may occur while setting up a [`super::SysfsLoader`].
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Mounts(#[from] crate::mountinfo::Error),
    #[error("cgroup {hierarchy} hierarchy is not mounted")]
    MissingHierarchy { hierarchy: Hierarchy },
}
