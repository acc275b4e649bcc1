//! Memory accounting files for both hierarchy versions.
//!
//! Usage comes from `memory.current` (v2) or `memory.usage_in_bytes` (v1);
//! both hold a single byte count and parse into [`MemoryUsage`]. Limits come
//! from `memory.max` (v2, `max` when unlimited) or `memory.limit_in_bytes`
//! (v1, a very large number when unlimited) and parse into [`MemoryLimit`].

use std::io::BufRead;

use super::SingleLineStat;
use super::parser::read_u64_line;

/// Current memory usage of a cgroup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryUsage {
    /// Total memory usage in bytes.
    pub usage_bytes: u64,
}

impl SingleLineStat for MemoryUsage {
    /// Parses a byte count.
    ///
    /// # Errors
    ///
    /// Returns an error of kind `InvalidData` if the value cannot be parsed as a `u64`.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            usage_bytes: read_u64_line(buf)?,
        })
    }
}

/// Memory limit of a cgroup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryLimit {
    /// Memory usage limit in bytes, `None` if no limit is set.
    pub limit_bytes: Option<u64>,
}

impl SingleLineStat for MemoryLimit {
    /// Parses either a byte count or `max`. Anything unparsable is treated as
    /// unlimited.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut line = String::new();
        buf.read_line(&mut line)?;
        let limit_bytes = match line.trim() {
            "max" => None,
            value => value.parse::<u64>().ok(),
        };

        Ok(MemoryLimit { limit_bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgroup::stats::error::{StatParseError, extract_stat_parse_error};

    #[test]
    fn test_parse_empty_memory_usage() {
        let err = MemoryUsage::from_reader(&mut "".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        match extract_stat_parse_error(&err) {
            StatParseError::InvalidValue { value, line, .. } => {
                assert_eq!(value, "");
                assert_eq!(*line, 1);
            }
            _ => panic!("Expected InvalidValue Error"),
        }
    }

    #[test]
    fn test_parse_memory_usage() {
        let stat = MemoryUsage::from_reader(&mut "2097152\n".as_bytes()).unwrap();
        assert_eq!(stat.usage_bytes, 2_097_152);
    }

    #[test]
    fn test_parse_invalid_memory_usage() {
        let err = MemoryUsage::from_reader(&mut "abcd\n".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_parse_memory_limit() {
        let limit = MemoryLimit::from_reader(&mut "max\n".as_bytes()).unwrap();
        assert_eq!(limit.limit_bytes, None);

        let limit = MemoryLimit::from_reader(&mut "104857600\n".as_bytes()).unwrap();
        assert_eq!(limit.limit_bytes, Some(104_857_600));

        // v1 reports "unlimited" as the page-aligned maximum.
        let limit = MemoryLimit::from_reader(&mut "9223372036854771712\n".as_bytes()).unwrap();
        assert_eq!(limit.limit_bytes, Some(9_223_372_036_854_771_712));
    }

    #[test]
    fn test_invalid_memory_limit() {
        let limit = MemoryLimit::from_reader(&mut "abc\n".as_bytes()).unwrap();
        assert_eq!(limit.limit_bytes, None);
    }
}
