use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open file `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Opens a file at the given path and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened.
///
/// # Example
/// ```no_run
/// # use container_stat::fsutil;
/// let reader = fsutil::open_file_reader("/sys/fs/cgroup/memory.current")?;
/// # Ok::<(), fsutil::FileOpenError>(())
/// ```
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, FileOpenError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileOpenError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Disk consumption of a directory tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct UsageInfo {
    /// Apparent size of all files, directories excluded.
    pub bytes: u64,
    /// Number of distinct inodes, the root included.
    pub inodes: u64,
}

/// Error that occurs when the usage of a directory tree cannot be determined.
#[derive(Debug, thiserror::Error)]
#[error("failed to measure disk usage under `{root}`: {source}")]
pub struct UsageError {
    pub root: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Measures how much disk space a directory tree occupies.
pub trait UsageReader: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`UsageError`] whenever the usage cannot be fully determined.
    /// Implementations never return a partial value.
    fn usage(&self, root: &Path) -> Result<UsageInfo, UsageError>;
}

/// [`UsageReader`] walking the tree on the local filesystem, like `du`.
///
/// Sizes are apparent sizes (`st_size`) of everything but directories.
/// Symlinks are not followed and hard-linked files are counted once.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskUsage;

impl UsageReader for DiskUsage {
    fn usage(&self, root: &Path) -> Result<UsageInfo, UsageError> {
        let to_error = |source: walkdir::Error| UsageError {
            root: root.to_path_buf(),
            source: source.into(),
        };

        let mut seen = HashSet::new();
        let mut info = UsageInfo::default();
        for entry in WalkDir::new(root).follow_links(false) {
            let metadata = entry.and_then(|e| e.metadata()).map_err(to_error)?;
            if !seen.insert((metadata.dev(), metadata.ino())) {
                continue;
            }
            info.inodes += 1;
            if !metadata.is_dir() {
                info.bytes += metadata.len();
            }
        }

        log::trace!(
            "Disk usage of `{}`: bytes={}, inodes={}",
            root.display(),
            info.bytes,
            info.inodes
        );
        Ok(info)
    }
}
