//! Generic parsing traits for cgroup accounting files.
//!
//! Two shapes of file cover everything the accounting reader needs:
//!
//! - [`KeyValueStat`]: one `key value` pair per line, e.g. `cpu.stat` (v2) or
//!   `cpuacct.stat` (v1).
//! - [`SingleLineStat`]: a single scalar on the first line, e.g.
//!   `memory.current`, `memory.max` or `cpuacct.usage`.
//!
//! # Example: Implementing `KeyValueStat`
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::LazyLock;
//! use container_stat::cgroup::stats::KeyValueStat;
//!
//! #[derive(Default)]
//! struct PidsEvents {
//!     max: u64,
//! }
//!
//! static HANDLERS: LazyLock<HashMap<&'static str, fn(&mut PidsEvents, u64)>> =
//!     LazyLock::new(|| {
//!         let mut m: HashMap<&'static str, fn(&mut PidsEvents, u64)> = HashMap::new();
//!         m.insert("max", |s, v| s.max = v);
//!         m
//!     });
//!
//! impl KeyValueStat for PidsEvents {
//!     const ALLOW_DUPLICATE_KEYS: bool = false;
//!
//!     fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
//!         &HANDLERS
//!     }
//! }
//!
//! let events = PidsEvents::from_reader(&mut "max 3\n".as_bytes()).unwrap();
//! assert_eq!(events.max, 3);
//! ```

use std::collections::{HashMap, HashSet};
use std::io::BufRead;

use super::StatParseError;

/// Parser for line-oriented `key value` accounting files.
///
/// Implementors only list the keys they care about; every other key is
/// ignored. Lines without a value are skipped.
pub trait KeyValueStat: Default
where
    Self: 'static,
{
    /// If `false`, a key seen twice is reported as [`StatParseError::DuplicateField`].
    const ALLOW_DUPLICATE_KEYS: bool;

    /// Known keys and the setter applying a parsed value to `Self`.
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)>;

    /// Reads the whole buffer and applies every known key.
    ///
    /// Reading stops early once every known key has been seen and duplicates
    /// are disallowed.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if reading fails, or a [`StatParseError`] wrapped
    /// in an `io::Error` of kind `InvalidData` if a known key carries a value
    /// that is not an unsigned integer.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut stat = Self::default();
        let handlers = Self::field_handlers();
        let mut seen_keys = HashSet::with_capacity(handlers.len());

        let mut line = String::new();
        let mut lineno = 0;
        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            let mut parts = line.split_whitespace();
            if let (Some(key), Some(val)) = (parts.next(), parts.next()) {
                Self::parse_and_set(key, val, &mut stat, lineno, handlers, &mut seen_keys)?;
            }
            if !Self::ALLOW_DUPLICATE_KEYS && seen_keys.len() == handlers.len() {
                break;
            }
            line.clear();
        }

        Ok(stat)
    }

    /// Parses `val` and hands it to the handler registered for `key`, if any.
    fn parse_and_set(
        key: &str,
        val: &str,
        stat: &mut Self,
        lineno: usize,
        handlers: &HashMap<&'static str, fn(&mut Self, u64)>,
        seen_keys: &mut HashSet<&'static str>,
    ) -> std::io::Result<()> {
        let Some((k, handler)) = handlers.get_key_value(key) else {
            return Ok(());
        };

        let parsed = val
            .parse::<u64>()
            .map_err(|source| StatParseError::InvalidKeyValue {
                key: key.to_string(),
                value: val.to_string(),
                line: lineno,
                source,
            })?;
        if !seen_keys.insert(*k) && !Self::ALLOW_DUPLICATE_KEYS {
            return Err(StatParseError::DuplicateField {
                field: key.to_string(),
                line: lineno,
            }
            .into());
        }
        handler(stat, parsed);
        Ok(())
    }
}

/// Parser for files holding a single value on their first line.
pub trait SingleLineStat: Sized + Default {
    /// Parses the first line of `buf`.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if reading fails or the value is malformed.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self>;
}

/// Reads the first line of `buf` and parses it as a `u64`.
///
/// Shared by the [`SingleLineStat`] implementations whose file must contain a
/// number.
pub(super) fn read_u64_line<R: BufRead>(buf: &mut R) -> std::io::Result<u64> {
    let mut line = String::new();
    buf.read_line(&mut line)?;
    let line = line.trim();
    line.parse::<u64>().map_err(|source| {
        StatParseError::InvalidValue {
            value: line.to_string(),
            line: 1,
            source,
        }
        .into()
    })
}
