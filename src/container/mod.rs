use std::borrow::Borrow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod error;

pub use error::{Error, Result};

/// The maximum allowed length for a [`ContainerID`].
const CONTAINER_ID_MAX_LEN: usize = 255;

/// A validated container identifier.
///
/// # Examples
///
/// ```
/// # use container_stat::container::ContainerID;
/// let raw_id = "abc123abc123abc123abc123abc123abc123abc123abc123abc123abc123abcd";
/// let container_id = ContainerID::new(raw_id).unwrap();
/// assert_eq!(container_id.as_ref(), "abc123abc123abc123abc123abc123abc123abc123abc123abc123abc123abcd");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerID(Arc<str>);

impl ContainerID {
    /// Creates a new `ContainerID` from the given raw id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerID`] if the input is empty, longer than
    /// [`CONTAINER_ID_MAX_LEN`], or contains a `/`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use container_stat::container::ContainerID;
    /// assert!(ContainerID::new("web-1").is_ok());
    /// assert!(ContainerID::new("").is_err());
    /// assert!(ContainerID::new("a/b").is_err());
    /// ```
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        if src.is_empty() || src.len() > CONTAINER_ID_MAX_LEN || src.contains('/') {
            return Err(Error::InvalidContainerID(src.to_owned()));
        }

        Ok(Self(src.into()))
    }

    pub fn to_arc(&self) -> Arc<str> {
        Arc::clone(&self.0)
    }
}

impl AsRef<str> for ContainerID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the stat aggregator needs to know about a running container.
///
/// Both accessors are expected to be cheap and free of side effects.
pub trait ContainerHandle {
    /// Directory holding the container's writable layer.
    fn base_dir(&self) -> &Path;

    /// Id of the container's supervising process.
    fn pid(&self) -> u32;
}

/// A container registered with the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    id: ContainerID,
    base_dir: PathBuf,
    pid: u32,
}

impl Container {
    pub fn new(id: ContainerID, base_dir: impl Into<PathBuf>, pid: u32) -> Self {
        Self {
            id,
            base_dir: base_dir.into(),
            pid,
        }
    }

    pub fn id(&self) -> &ContainerID {
        &self.id
    }
}

impl ContainerHandle for Container {
    fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn pid(&self) -> u32 {
        self.pid
    }
}
