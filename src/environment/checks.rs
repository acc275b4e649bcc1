use std::fs;
use std::path::Path;

use super::{Error, Result};
use crate::cgroup::procfile::parse_cgroup_line;
use crate::fsutil;

/// Cgroup path segments created by common container runtimes.
const RUNTIME_MARKERS: &[&str] = &["docker", "kubepods", "containerd", "libpod", "crio"];

/// Marker files container runtimes place in the container's root.
const MARKER_FILES: &[&str] = &[".dockerenv", "run/.containerenv"];

/// Shortest length of a hex container id as it appears in cgroup paths.
const MIN_CONTAINER_ID_LEN: usize = 32;

/// Returns `true` if `rootfs` contains a `proc` directory.
///
/// # Errors
///
/// Returns [`Error::ExistenceCheck`] if the existence of `<rootfs>/proc` cannot
/// be determined.
pub(super) fn contains_proc_mount(rootfs: &Path) -> Result<bool> {
    let path = rootfs.join("proc");

    path.try_exists()
        .map_err(|source| Error::ExistenceCheck { path, source })
}

/// Returns `true` if the PID namespace of our own process differs from the
/// one of the init process below `rootfs`.
///
/// # Errors
///
/// Returns [`Error::ReadSymlink`] if either namespace link cannot be read.
pub(super) fn is_pid_namespace_isolated(self_root: &Path, rootfs: &Path) -> Result<bool> {
    let read_ns = |path: &Path| {
        fs::read_link(path).map_err(|source| Error::ReadSymlink {
            path: path.to_path_buf(),
            source,
        })
    };

    let own = read_ns(&self_root.join("proc/self/ns/pid"))?;
    let init = read_ns(&rootfs.join("proc/1/ns/pid"))?;

    Ok(own != init)
}

/// Returns `true` if a cgroup path in the given `/proc/<pid>/cgroup` file
/// belongs to a container runtime.
///
/// Lines that cannot be parsed are ignored.
///
/// # Errors
///
/// - [`Error::FileOpen`] if the file cannot be opened.
/// - [`Error::Read`] if reading from it fails.
pub(super) fn matches_container_cgroup(path: &Path) -> Result<bool> {
    let reader = fsutil::open_file_reader(path)?;
    let contents = std::io::read_to_string(reader).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let found = contents
        .lines()
        .filter_map(|line| parse_cgroup_line(line).ok())
        .flat_map(|entry| entry.path.split('/'))
        .any(|segment| {
            RUNTIME_MARKERS.iter().any(|marker| segment.contains(marker))
                || segment.split(['-', '.']).any(is_container_id)
        });
    Ok(found)
}

/// Returns `true` if a runtime marker file exists below `self_root`.
pub(super) fn has_marker_file(self_root: &Path) -> bool {
    MARKER_FILES
        .iter()
        .any(|marker| fs::symlink_metadata(self_root.join(marker)).is_ok())
}

/// Returns `true` if `s` looks like a hex container id.
fn is_container_id(s: &str) -> bool {
    s.len() >= MIN_CONTAINER_ID_LEN && s.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cgroup_file(contents: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(contents.as_bytes()).unwrap();
        tmp
    }

    #[test]
    fn test_is_container_id() {
        assert!(is_container_id(&"deadbeef".repeat(8)));
        assert!(!is_container_id("deadbeef"));
        assert!(!is_container_id(&"xyz".repeat(20)));
    }

    #[test]
    fn test_matches_runtime_marker() {
        let tmp = cgroup_file("0::/system.slice/docker-abc.scope\n");
        assert!(matches_container_cgroup(tmp.path()).unwrap());
    }

    #[test]
    fn test_matches_bare_container_id() {
        let id = "0123456789abcdef".repeat(4);
        let tmp = cgroup_file(&format!("4:cpu,cpuacct:/{id}\n0::/{id}\n"));
        assert!(matches_container_cgroup(tmp.path()).unwrap());

        let tmp = cgroup_file(&format!("0::/system.slice/cri-{id}.scope\n"));
        assert!(matches_container_cgroup(tmp.path()).unwrap());
    }

    #[test]
    fn test_host_cgroup() {
        let tmp = cgroup_file("0::/user.slice/user-1000.slice/session-2.scope\ngarbage\n");
        assert!(!matches_container_cgroup(tmp.path()).unwrap());
    }

    #[test]
    fn test_missing_cgroup_file() {
        let err = matches_container_cgroup(Path::new("/definitely/does/not/exist")).unwrap_err();
        assert!(matches!(err, Error::FileOpen(_)));
    }

    #[test]
    fn test_marker_files() {
        let root = tempfile::tempdir().unwrap();
        assert!(!has_marker_file(root.path()));

        std::fs::create_dir(root.path().join("run")).unwrap();
        std::fs::write(root.path().join("run/.containerenv"), "").unwrap();
        assert!(has_marker_file(root.path()));
    }

    #[test]
    #[cfg(target_family = "unix")]
    fn test_pid_namespace_isolation() {
        use std::os::unix::fs as unix_fs;
        let own = tempfile::tempdir().unwrap();
        let host = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(own.path().join("proc/self/ns")).unwrap();
        std::fs::create_dir_all(host.path().join("proc/1/ns")).unwrap();
        unix_fs::symlink("pid:[4026532198]", own.path().join("proc/self/ns/pid")).unwrap();

        unix_fs::symlink("pid:[4026531836]", host.path().join("proc/1/ns/pid")).unwrap();
        assert!(is_pid_namespace_isolated(own.path(), host.path()).unwrap());

        std::fs::remove_file(host.path().join("proc/1/ns/pid")).unwrap();
        unix_fs::symlink("pid:[4026532198]", host.path().join("proc/1/ns/pid")).unwrap();
        assert!(!is_pid_namespace_isolated(own.path(), host.path()).unwrap());
    }

    #[test]
    fn test_pid_namespace_unreadable() {
        let root = tempfile::tempdir().unwrap();
        let err = is_pid_namespace_isolated(root.path(), root.path()).unwrap_err();
        assert!(matches!(err, Error::ReadSymlink { .. }));
    }

    #[test]
    fn test_contains_proc_mount() {
        let root = tempfile::tempdir().unwrap();
        assert!(!contains_proc_mount(root.path()).unwrap());
        std::fs::create_dir(root.path().join("proc")).unwrap();
        assert!(contains_proc_mount(root.path()).unwrap());
    }
}
