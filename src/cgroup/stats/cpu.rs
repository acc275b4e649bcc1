//! CPU accounting files for both hierarchy versions.
//!
//! - v2 `cpu.stat`: `usage_usec`, `user_usec`, `system_usec` in microseconds,
//!   parsed into [`CpuStat`].
//! - v1 `cpuacct.usage`: total CPU time in nanoseconds, parsed into
//!   [`CpuAcctUsage`].
//! - v1 `cpuacct.stat`: `user` and `system` in clock ticks, parsed into
//!   [`CpuAcctStat`].
//!
//! # Examples
//!
//! ```rust
//! use container_stat::cgroup::stats::{CpuAcctUsage, CpuStat, KeyValueStat, SingleLineStat};
//!
//! let stat = CpuStat::from_reader(&mut "usage_usec 1000\nuser_usec 600\n".as_bytes()).unwrap();
//! assert_eq!(stat.usage_nanos(), Some(1_000_000));
//!
//! let usage = CpuAcctUsage::from_reader(&mut "123456789\n".as_bytes()).unwrap();
//! assert_eq!(usage.total_nanos, 123_456_789);
//! ```

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::LazyLock;

use super::parser::read_u64_line;
use super::{KeyValueStat, SingleLineStat};

const NANOS_PER_MICRO: u64 = 1_000;

/// The kernel reports `cpuacct.stat` in USER_HZ, which is fixed at 100 on Linux.
const USER_HZ: u64 = 100;
const NANOS_PER_TICK: u64 = 1_000_000_000 / USER_HZ;

/// Parsed `cpu.stat` (cgroup v2).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuStat {
    /// Total CPU time (user + system) in microseconds, `None` if not reported.
    pub usage_usec: Option<u64>,
    /// Time spent in user space in microseconds.
    pub user_usec: u64,
    /// Time spent in the kernel in microseconds.
    pub system_usec: u64,
}

impl CpuStat {
    fn set_usage_usec(&mut self, usage_usec: u64) {
        self.usage_usec = Some(usage_usec);
    }

    fn set_user_usec(&mut self, user_usec: u64) {
        self.user_usec = user_usec;
    }

    fn set_system_usec(&mut self, system_usec: u64) {
        self.system_usec = system_usec;
    }

    pub fn usage_nanos(&self) -> Option<u64> {
        self.usage_usec
            .map(|usage_usec| usage_usec.saturating_mul(NANOS_PER_MICRO))
    }

    pub fn user_nanos(&self) -> u64 {
        self.user_usec.saturating_mul(NANOS_PER_MICRO)
    }

    pub fn system_nanos(&self) -> u64 {
        self.system_usec.saturating_mul(NANOS_PER_MICRO)
    }
}

type Setter = fn(&mut CpuStat, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(3);

    m.insert("usage_usec", CpuStat::set_usage_usec);
    m.insert("user_usec", CpuStat::set_user_usec);
    m.insert("system_usec", CpuStat::set_system_usec);

    m
});

impl KeyValueStat for CpuStat {
    const ALLOW_DUPLICATE_KEYS: bool = false;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}

/// Parsed `cpuacct.usage` (cgroup v1).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuAcctUsage {
    /// Total CPU time consumed by all tasks in the cgroup, in nanoseconds.
    pub total_nanos: u64,
}

impl SingleLineStat for CpuAcctUsage {
    /// # Errors
    ///
    /// Fails with `InvalidData` if the line is not an unsigned integer.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            total_nanos: read_u64_line(buf)?,
        })
    }
}

/// Parsed `cpuacct.stat` (cgroup v1), in clock ticks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuAcctStat {
    pub user_ticks: u64,
    pub system_ticks: u64,
}

impl CpuAcctStat {
    pub fn user_nanos(&self) -> u64 {
        self.user_ticks.saturating_mul(NANOS_PER_TICK)
    }

    pub fn system_nanos(&self) -> u64 {
        self.system_ticks.saturating_mul(NANOS_PER_TICK)
    }
}

static ACCT_SETTERS: LazyLock<HashMap<&'static str, fn(&mut CpuAcctStat, u64)>> =
    LazyLock::new(|| {
        let mut m: HashMap<&'static str, fn(&mut CpuAcctStat, u64)> = HashMap::with_capacity(2);

        m.insert("user", |s, v| s.user_ticks = v);
        m.insert("system", |s, v| s.system_ticks = v);

        m
    });

impl KeyValueStat for CpuAcctStat {
    const ALLOW_DUPLICATE_KEYS: bool = false;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &ACCT_SETTERS
    }
}
