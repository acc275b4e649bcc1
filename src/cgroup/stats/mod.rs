//! Parsers for the raw cgroup accounting files.
//!
//! Each type here maps one kernel file to a strongly typed value. The
//! hierarchy-specific readers in [`super::v1`] and [`super::v2`] decide which
//! files to open and fold the parsed values into [`super::Metrics`].

mod cpu;
mod error;
mod memory;
mod parser;

pub use cpu::{CpuAcctStat, CpuAcctUsage, CpuStat};
pub use error::StatParseError;
pub use memory::{MemoryLimit, MemoryUsage};
pub use parser::{KeyValueStat, SingleLineStat};
