use crate::fsutil;

use super::parser::parse_mount_info_line;
use super::{Error, Result};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Superblock options of v1 cgroup mounts that do not name a controller.
const GENERIC_OPTIONS: &[&str] = &[
    "rw",
    "ro",
    "xattr",
    "noprefix",
    "clone_children",
    "cpuset_v2_mode",
    "favordynmods",
];

/// Cgroup filesystems mounted in a mount namespace.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CgroupMounts {
    /// Mount point of every v1 controller, keyed by controller name
    /// (e.g. `cpuacct`, `memory`, `name=systemd`).
    pub v1: HashMap<String, PathBuf>,
    /// Mount point of the unified (v2) hierarchy, if mounted.
    pub v2: Option<PathBuf>,
}

impl CgroupMounts {
    /// Returns `true` if the accounting controllers are mounted as v1 hierarchies.
    ///
    /// Hybrid hosts mount a `name=systemd` v1 tree next to a cgroup2 tree
    /// without any controllers; those count as v2.
    pub fn has_v1_accounting(&self) -> bool {
        self.v1.contains_key("cpuacct") || self.v1.contains_key("memory")
    }
}

/// Collects all cgroup mount points by parsing the given `mountinfo` file.
///
/// # Errors
///
/// - [`Error::FileOpen`] if the file can't be opened.
/// - [`Error::ReadLine`] if reading from the file fails.
/// - [`Error::Parse`] if parsing any line fails.
/// - [`Error::MissingCgroupMount`] if neither a `cgroup` nor a `cgroup2` mount is found.
///
/// # Example
///
/// ```no_run
/// use container_stat::mountinfo::detect_cgroup_mounts;
///
/// let mounts = detect_cgroup_mounts("/proc/self/mountinfo").unwrap();
/// println!("cgroup2 root: {:?}", mounts.v2);
/// ```
pub fn detect_cgroup_mounts(path: impl AsRef<Path>) -> Result<CgroupMounts> {
    let path = path.as_ref();
    let buf = fsutil::open_file_reader(path)?;

    detect_cgroup_mounts_from_reader(buf, path)
}

/// Reader-based implementation of [`detect_cgroup_mounts`].
///
/// `origin` is only used in error messages. The first mount wins when a
/// controller or the unified hierarchy is mounted more than once.
fn detect_cgroup_mounts_from_reader<R: BufRead>(
    mut reader: R,
    origin: &Path,
) -> Result<CgroupMounts> {
    let mut line = String::with_capacity(256);
    let mut mounts = CgroupMounts::default();

    while reader
        .read_line(&mut line)
        .map_err(|source| Error::ReadLine {
            path: origin.to_path_buf(),
            source,
        })?
        != 0
    {
        let mount_info = parse_mount_info_line(line.as_str()).map_err(|source| Error::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        match mount_info.fs_type {
            "cgroup2" if mounts.v2.is_none() => {
                log::debug!(
                    "Found `cgroup2` mount point with root `{}`: {}",
                    mount_info.root,
                    mount_info.mount_point
                );
                mounts.v2 = Some(PathBuf::from(mount_info.mount_point));
            }
            "cgroup" => {
                log::debug!(
                    "Found `cgroup` mount point for `{}`: {}",
                    mount_info.super_options,
                    mount_info.mount_point
                );
                let controllers = mount_info.super_options.split(',').filter(|option| {
                    !GENERIC_OPTIONS.contains(option) && !option.starts_with("release_agent=")
                });
                for controller in controllers {
                    mounts
                        .v1
                        .entry(controller.to_owned())
                        .or_insert_with(|| PathBuf::from(mount_info.mount_point));
                }
            }
            _ => {}
        }

        line.clear();
    }

    if mounts.v1.is_empty() && mounts.v2.is_none() {
        return Err(Error::MissingCgroupMount {
            path: origin.to_path_buf(),
        });
    }
    Ok(mounts)
}

/// Resolves a mount point as seen from the host below `rootfs`, and checks
/// that it is a directory.
///
/// Mountinfo paths are absolute, so the leading `/` is dropped before joining.
///
/// # Errors
///
/// - [`Error::Canonicalization`] if the path cannot be canonicalized.
/// - [`Error::Metadata`] if its metadata cannot be read.
/// - [`Error::NotADirectory`] if the resolved path is not a directory.
pub fn resolve_mount_dir(rootfs: &Path, mount_point: &Path) -> Result<PathBuf> {
    let raw = rootfs.join(mount_point.strip_prefix("/").unwrap_or(mount_point));
    let canonical = std::fs::canonicalize(&raw).map_err(|e| Error::Canonicalization {
        path: raw.clone(),
        source: e,
    })?;

    let metadata = std::fs::metadata(&canonical).map_err(|e| Error::Metadata {
        path: canonical.clone(),
        source: e,
    })?;

    if !metadata.is_dir() {
        return Err(Error::NotADirectory { path: canonical });
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn detect(contents: &str) -> Result<CgroupMounts> {
        detect_cgroup_mounts_from_reader(Cursor::new(contents.as_bytes()), Path::new("/dummy"))
    }

    #[test]
    fn test_detect_unified_host() {
        let input = "\
25 1 0:24 / /proc rw,relatime - proc proc rw
35 24 0:30 / /sys/fs/cgroup rw,nosuid,nodev,noexec,relatime shared:9 - cgroup2 cgroup2 rw,nsdelegate
";
        let mounts = detect(input).unwrap();
        assert_eq!(mounts.v2, Some(PathBuf::from("/sys/fs/cgroup")));
        assert!(mounts.v1.is_empty());
        assert!(!mounts.has_v1_accounting());
    }

    #[test]
    fn test_detect_legacy_host() {
        let input = "\
30 25 0:26 / /sys/fs/cgroup/systemd rw,nosuid shared:10 - cgroup cgroup rw,xattr,name=systemd
31 25 0:27 / /sys/fs/cgroup/cpu,cpuacct rw,nosuid shared:13 - cgroup cgroup rw,cpu,cpuacct
32 25 0:28 / /sys/fs/cgroup/memory rw,nosuid shared:14 - cgroup cgroup rw,memory
";
        let mounts = detect(input).unwrap();
        assert!(mounts.has_v1_accounting());
        assert_eq!(
            mounts.v1.get("cpuacct"),
            Some(&PathBuf::from("/sys/fs/cgroup/cpu,cpuacct"))
        );
        assert_eq!(
            mounts.v1.get("cpu"),
            Some(&PathBuf::from("/sys/fs/cgroup/cpu,cpuacct"))
        );
        assert_eq!(
            mounts.v1.get("memory"),
            Some(&PathBuf::from("/sys/fs/cgroup/memory"))
        );
        assert_eq!(
            mounts.v1.get("name=systemd"),
            Some(&PathBuf::from("/sys/fs/cgroup/systemd"))
        );
        assert!(!mounts.v1.contains_key("rw"));
        assert!(!mounts.v1.contains_key("xattr"));
    }

    #[test]
    fn test_detect_hybrid_host_without_v1_accounting() {
        let input = "\
30 25 0:26 / /sys/fs/cgroup/systemd rw,nosuid - cgroup cgroup rw,xattr,name=systemd
29 25 0:25 / /sys/fs/cgroup/unified rw,nosuid - cgroup2 cgroup2 rw
";
        let mounts = detect(input).unwrap();
        assert!(!mounts.has_v1_accounting());
        assert_eq!(mounts.v2, Some(PathBuf::from("/sys/fs/cgroup/unified")));
    }

    #[test]
    fn test_detect_first_of_multiple_cgroup2_mounts() {
        let input = "\
43 35 0:39 / /sys/fs/cgroup rw nosuid,nodev,noexec,relatime - cgroup2 cgroup rw
42 35 0:39 / /ignored rw nosuid,nodev,noexec,relatime - cgroup2 cgroup rw
";
        let mounts = detect(input).unwrap();
        assert_eq!(mounts.v2, Some(PathBuf::from("/sys/fs/cgroup")));
    }

    #[test]
    fn test_detect_missing_cgroup_mount() {
        let err = detect("25 1 0:24 / /proc rw,relatime - proc proc rw\n").unwrap_err();
        match err {
            Error::MissingCgroupMount { path } => assert_eq!(path, Path::new("/dummy")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_detect_invalid_line() {
        let err = detect("invalid mountinfo line").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_detect_from_tempfile() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            "42 35 0:39 / /sys/fs/cgroup rw nosuid,nodev,noexec,relatime - cgroup2 cgroup rw"
        )
        .unwrap();

        let mounts = detect_cgroup_mounts(tmp.path()).unwrap();
        assert_eq!(mounts.v2, Some(PathBuf::from("/sys/fs/cgroup")));
    }

    #[test]
    fn test_detect_missing_file() {
        let err = detect_cgroup_mounts("/definitely/does/not/exist").unwrap_err();
        assert!(matches!(err, Error::FileOpen(_)));
    }

    #[test]
    fn test_resolve_mount_dir_below_rootfs() {
        let rootfs = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(rootfs.path().join("sys/fs/cgroup")).unwrap();

        let resolved = resolve_mount_dir(rootfs.path(), Path::new("/sys/fs/cgroup")).unwrap();
        assert_eq!(
            resolved,
            std::fs::canonicalize(rootfs.path().join("sys/fs/cgroup")).unwrap()
        );
    }

    #[test]
    #[cfg(target_family = "unix")]
    fn test_resolve_mount_dir_symlink() {
        use std::os::unix::fs as unix_fs;
        let rootfs = tempfile::tempdir().unwrap();
        std::fs::create_dir(rootfs.path().join("real")).unwrap();
        unix_fs::symlink(rootfs.path().join("real"), rootfs.path().join("link")).unwrap();

        let resolved = resolve_mount_dir(rootfs.path(), Path::new("/link")).unwrap();
        assert_eq!(
            resolved,
            std::fs::canonicalize(rootfs.path().join("real")).unwrap()
        );
    }

    #[test]
    fn test_resolve_mount_dir_not_directory() {
        let rootfs = tempfile::tempdir().unwrap();
        std::fs::write(rootfs.path().join("file"), "content").unwrap();

        let err = resolve_mount_dir(rootfs.path(), Path::new("/file")).unwrap_err();
        assert!(matches!(err, Error::NotADirectory { .. }));
    }

    #[test]
    fn test_resolve_mount_dir_missing() {
        let rootfs = tempfile::tempdir().unwrap();

        let err = resolve_mount_dir(rootfs.path(), Path::new("/sys/fs/cgroup")).unwrap_err();
        assert!(matches!(err, Error::Canonicalization { .. }));
    }
}
