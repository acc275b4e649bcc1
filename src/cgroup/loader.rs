use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{fsutil, mountinfo};

use super::procfile::parse_cgroup_line;
use super::{Cgroup, Hierarchy, LoadError, Loader, SetupError, v1, v2};

#[derive(Debug, Clone)]
enum Mounts {
    V1(HashMap<String, PathBuf>),
    V2(PathBuf),
}

/// [`Loader`] reading `/proc/<pid>/cgroup` and the cgroup filesystem.
#[derive(Debug, Clone)]
pub struct SysfsLoader {
    proc_root: PathBuf,
    mounts: Mounts,
}

impl SysfsLoader {
    /// Detects the cgroup mounts of the host whose root filesystem is at `rootfs`.
    ///
    /// With `hierarchy` set to `None` the version is chosen from the mounts:
    /// v1 if the accounting controllers are mounted as v1, v2 otherwise.
    ///
    /// # Errors
    ///
    /// Returns a [`SetupError`] if `<rootfs>/proc/1/mountinfo` cannot be read or
    /// the requested hierarchy is not mounted.
    pub fn new(
        hierarchy: Option<Hierarchy>,
        rootfs: impl AsRef<Path>,
    ) -> Result<Self, SetupError> {
        let rootfs = rootfs.as_ref();
        let mounts = mountinfo::detect_cgroup_mounts(rootfs.join("proc/1/mountinfo"))?;
        let hierarchy = hierarchy.unwrap_or(if mounts.has_v1_accounting() {
            Hierarchy::V1
        } else {
            Hierarchy::V2
        });
        let proc_root = rootfs.join("proc");

        match hierarchy {
            Hierarchy::V1 => {
                let mut resolved = HashMap::with_capacity(mounts.v1.len());
                for (controller, mount_point) in mounts.v1 {
                    match mountinfo::resolve_mount_dir(rootfs, &mount_point) {
                        Ok(dir) => {
                            resolved.insert(controller, dir);
                        }
                        Err(err) => log::warn!("Skipping cgroup controller `{controller}`: {err}"),
                    }
                }
                if resolved.is_empty() {
                    return Err(SetupError::MissingHierarchy { hierarchy });
                }
                Ok(Self::v1(proc_root, resolved))
            }
            Hierarchy::V2 => {
                let mount_point = mounts
                    .v2
                    .ok_or(SetupError::MissingHierarchy { hierarchy })?;
                let root = mountinfo::resolve_mount_dir(rootfs, &mount_point)?;
                log::debug!("Final Cgroup Root: {}", root.display());
                Ok(Self::v2(proc_root, root))
            }
        }
    }

    /// Creates a v1 loader from already resolved controller mount directories.
    pub fn v1(proc_root: impl Into<PathBuf>, mounts: HashMap<String, PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            mounts: Mounts::V1(mounts),
        }
    }

    /// Creates a v2 loader from an already resolved cgroup2 mount directory.
    pub fn v2(proc_root: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            mounts: Mounts::V2(root.into()),
        }
    }

    pub fn hierarchy(&self) -> Hierarchy {
        match self.mounts {
            Mounts::V1(_) => Hierarchy::V1,
            Mounts::V2(_) => Hierarchy::V2,
        }
    }

    /// Reads `/proc/<pid>/cgroup`, mapping a missing file to [`LoadError::ProcessNotFound`].
    fn read_proc_cgroup(&self, pid: u32, path: &Path) -> Result<String, LoadError> {
        let reader = match fsutil::open_file_reader(path) {
            Ok(reader) => reader,
            Err(err) if err.source.kind() == ErrorKind::NotFound => {
                return Err(LoadError::ProcessNotFound {
                    pid,
                    path: err.path,
                });
            }
            Err(err) => return Err(err.into()),
        };

        std::io::read_to_string(reader).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Loader for SysfsLoader {
    fn load(&self, pid: u32) -> Result<Box<dyn Cgroup>, LoadError> {
        let path = self.proc_root.join(pid.to_string()).join("cgroup");
        let contents = self.read_proc_cgroup(pid, &path)?;
        let entries = contents
            .lines()
            .filter(|line| !line.is_empty())
            .map(parse_cgroup_line)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| LoadError::Parse {
                path: path.clone(),
                source,
            })?;

        match &self.mounts {
            Mounts::V1(mounts) => Ok(Box::new(v1::locate(pid, &entries, mounts, &path)?)),
            Mounts::V2(root) => Ok(Box::new(v2::locate(pid, &entries, root, &path)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgroup::Tolerance;

    struct Host {
        rootfs: tempfile::TempDir,
    }

    impl Host {
        fn new() -> Self {
            Self {
                rootfs: tempfile::tempdir().unwrap(),
            }
        }

        fn path(&self) -> &Path {
            self.rootfs.path()
        }

        fn write(&self, relative: &str, contents: &str) {
            let path = self.path().join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
        }

        fn mkdir(&self, relative: &str) {
            std::fs::create_dir_all(self.path().join(relative)).unwrap();
        }
    }

    const UNIFIED_MOUNTINFO: &str =
        "35 24 0:30 / /sys/fs/cgroup rw,nosuid,nodev,noexec,relatime - cgroup2 cgroup2 rw\n";
    const LEGACY_MOUNTINFO: &str = "\
31 25 0:27 / /sys/fs/cgroup/cpu,cpuacct rw,nosuid - cgroup cgroup rw,cpu,cpuacct
32 25 0:28 / /sys/fs/cgroup/memory rw,nosuid - cgroup cgroup rw,memory
33 25 0:29 / /sys/fs/cgroup/blkio rw,nosuid - cgroup cgroup rw,blkio
";

    #[test]
    fn test_new_detects_unified_hierarchy() {
        let host = Host::new();
        host.write("proc/1/mountinfo", UNIFIED_MOUNTINFO);
        host.mkdir("sys/fs/cgroup");

        let loader = SysfsLoader::new(None, host.path()).unwrap();
        assert_eq!(loader.hierarchy(), Hierarchy::V2);
    }

    #[test]
    fn test_new_detects_legacy_hierarchy() {
        let host = Host::new();
        host.write("proc/1/mountinfo", LEGACY_MOUNTINFO);
        host.mkdir("sys/fs/cgroup/cpu,cpuacct");
        host.mkdir("sys/fs/cgroup/memory");

        // blkio is not present below the rootfs and gets skipped.
        let loader = SysfsLoader::new(None, host.path()).unwrap();
        assert_eq!(loader.hierarchy(), Hierarchy::V1);
    }

    #[test]
    fn test_new_requested_hierarchy_missing() {
        let host = Host::new();
        host.write("proc/1/mountinfo", LEGACY_MOUNTINFO);

        let err = SysfsLoader::new(Some(Hierarchy::V2), host.path()).unwrap_err();
        assert!(matches!(
            err,
            SetupError::MissingHierarchy {
                hierarchy: Hierarchy::V2
            }
        ));
    }

    #[test]
    fn test_new_without_mountinfo() {
        let host = Host::new();

        let err = SysfsLoader::new(None, host.path()).unwrap_err();
        assert!(matches!(err, SetupError::Mounts(_)));
    }

    #[test]
    fn test_load_v2_end_to_end() {
        let host = Host::new();
        host.write("proc/1/mountinfo", UNIFIED_MOUNTINFO);
        host.write("proc/4242/cgroup", "0::/system.slice/cri-abc.scope\n");
        host.write(
            "sys/fs/cgroup/system.slice/cri-abc.scope/cpu.stat",
            "usage_usec 1000\n",
        );
        host.write(
            "sys/fs/cgroup/system.slice/cri-abc.scope/memory.current",
            "2097152\n",
        );

        let loader = SysfsLoader::new(Some(Hierarchy::V2), host.path()).unwrap();
        let metrics = loader
            .load(4242)
            .unwrap()
            .stat(Tolerance::IgnoreNotExist)
            .unwrap();
        assert_eq!(metrics.cpu_total(), Some(1_000_000));
        assert_eq!(metrics.memory_usage(), Some(2_097_152));
    }

    #[test]
    fn test_load_v1_end_to_end() {
        let host = Host::new();
        host.write("proc/1/mountinfo", LEGACY_MOUNTINFO);
        host.write(
            "proc/4242/cgroup",
            "4:cpu,cpuacct:/docker/abc\n3:memory:/docker/abc\n1:name=systemd:/docker/abc\n",
        );
        host.write("sys/fs/cgroup/cpu,cpuacct/docker/abc/cpuacct.usage", "77\n");
        host.mkdir("sys/fs/cgroup/memory/docker/abc");

        let loader = SysfsLoader::new(None, host.path()).unwrap();
        let metrics = loader
            .load(4242)
            .unwrap()
            .stat(Tolerance::IgnoreNotExist)
            .unwrap();
        assert_eq!(metrics.cpu_total(), Some(77));
        assert_eq!(metrics.memory_usage(), None);
    }

    #[test]
    fn test_load_missing_process() {
        let host = Host::new();
        let loader = SysfsLoader::v2(host.path().join("proc"), host.path().join("cgroup"));

        let err = loader.load(31337).err().unwrap();
        match err {
            LoadError::ProcessNotFound { pid, path } => {
                assert_eq!(pid, 31337);
                assert_eq!(path, host.path().join("proc/31337/cgroup"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_malformed_proc_file() {
        let host = Host::new();
        host.write("proc/5/cgroup", "garbage\n");
        let loader = SysfsLoader::v2(host.path().join("proc"), host.path().join("cgroup"));

        let err = loader.load(5).err().unwrap();
        assert!(matches!(err, LoadError::Parse { .. }));
    }
}
