use std::path::PathBuf;
use std::sync::Arc;

use serde::ser::SerializeStruct;

use crate::container::ContainerID;
use crate::stat::ContainerStat;

/// Snapshot of one container in a listing.
#[derive(Debug)]
pub struct ContainerStatEntry {
    pub id: Arc<str>,
    pub stat: ContainerStat,
}

impl serde::Serialize for ContainerStatEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut entry = serializer.serialize_struct("ContainerStatEntry", 2)?;
        entry.serialize_field("id", &*self.id)?;
        entry.serialize_field("stat", &self.stat)?;
        entry.end()
    }
}

impl ContainerStatEntry {
    pub fn new(id: &ContainerID, stat: ContainerStat) -> Self {
        Self {
            id: id.to_arc(),
            stat,
        }
    }
}

/// Request body for registering a container.
#[derive(Debug, serde::Deserialize)]
pub struct RegisterContainer {
    pub base_dir: PathBuf,
    pub pid: u32,
}
