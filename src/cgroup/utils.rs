use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;

use crate::fsutil;

use super::{MetricsError, Tolerance};

/// Opens `path` and applies the given reader function to it.
///
/// Returns `Ok(None)` if the file does not exist and `tolerance` allows it.
pub fn read_stat<T>(
    path: &Path,
    tolerance: Tolerance,
    reader: impl FnOnce(&mut BufReader<File>) -> std::io::Result<T>,
) -> Result<Option<T>, MetricsError> {
    let mut file = match fsutil::open_file_reader(path) {
        Ok(file) => file,
        Err(err)
            if err.source.kind() == ErrorKind::NotFound
                && tolerance == Tolerance::IgnoreNotExist =>
        {
            log::trace!("Skipping absent cgroup file `{}`", path.display());
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };

    reader(&mut file)
        .map(Some)
        .map_err(|source| MetricsError::Read {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgroup::stats::{MemoryUsage, SingleLineStat};

    #[test]
    fn test_read_stat_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.current");
        std::fs::write(&path, "4096\n").unwrap();

        let usage = read_stat(&path, Tolerance::Strict, MemoryUsage::from_reader).unwrap();
        assert_eq!(usage, Some(MemoryUsage { usage_bytes: 4096 }));
    }

    #[test]
    fn test_read_stat_absent_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.current");

        let usage = read_stat(&path, Tolerance::IgnoreNotExist, MemoryUsage::from_reader).unwrap();
        assert_eq!(usage, None);
    }

    #[test]
    fn test_read_stat_absent_strict() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.current");

        let err = read_stat(&path, Tolerance::Strict, MemoryUsage::from_reader).unwrap_err();
        match err {
            MetricsError::FileOpen(err) => assert_eq!(err.path, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_stat_malformed_is_never_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.current");
        std::fs::write(&path, "garbage\n").unwrap();

        let err =
            read_stat(&path, Tolerance::IgnoreNotExist, MemoryUsage::from_reader).unwrap_err();
        match err {
            MetricsError::Read { source, .. } => {
                assert_eq!(source.kind(), ErrorKind::InvalidData)
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
