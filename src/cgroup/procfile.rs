//! Parser for `/proc/<pid>/cgroup`.
//!
//! Each line has the form `<hierarchy-id>:<controller-list>:<cgroup-path>`:
//!
//! - v1: an arbitrary hierarchy id, a comma-separated controller list (e.g.
//!   `cpu,cpuacct`) and the path of those controllers relative to their mount.
//! - v2: always `0`, an empty controller list, and the unified path relative to
//!   the cgroup2 mount.
//!
//! See [`cgroups(7)`](https://man7.org/linux/man-pages/man7/cgroups.7.html).

use std::num::ParseIntError;

/// Represents a parsed `/proc/<pid>/cgroup` line.
#[derive(Debug, PartialEq, Eq)]
pub struct CgroupEntry<'a> {
    pub hierarchy_id: u32,
    /// Empty for the unified hierarchy.
    pub controllers: Vec<&'a str>,
    pub path: &'a str,
}

impl CgroupEntry<'_> {
    /// Returns `true` if this is the cgroup v2 entry.
    pub fn is_unified(&self) -> bool {
        self.hierarchy_id == 0 && self.controllers.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("missing `{field}` in line: `{line}`")]
    MissingField { field: &'static str, line: String },
    #[error("invalid hierarchy id in line `{line}`: {source}")]
    InvalidHierarchyId {
        line: String,
        #[source]
        source: ParseIntError,
    },
}

/// Parses a single line of `/proc/<pid>/cgroup`.
///
/// The path may itself contain `:`, so only the first two separators split.
///
/// # Errors
///
/// Returns [`ParseError`] if a field is missing or the hierarchy id is not a number.
pub fn parse_cgroup_line(line: &str) -> Result<CgroupEntry<'_>, ParseError> {
    let trimmed = line.trim_end_matches('\n');
    let mut fields = trimmed.splitn(3, ':');
    let mut field = |name| {
        fields.next().ok_or_else(|| ParseError::MissingField {
            field: name,
            line: trimmed.to_owned(),
        })
    };

    let id = field("hierarchy-id")?;
    let controllers = field("controller-list")?;
    let path = field("cgroup-path")?;

    let hierarchy_id = id
        .parse::<u32>()
        .map_err(|source| ParseError::InvalidHierarchyId {
            line: trimmed.to_owned(),
            source,
        })?;
    let controllers = controllers
        .split(',')
        .filter(|c| !c.is_empty())
        .collect();

    Ok(CgroupEntry {
        hierarchy_id,
        controllers,
        path,
    })
}
