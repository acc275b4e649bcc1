use dashmap::DashMap;

use crate::container::{Container, ContainerHandle, ContainerID};
use crate::stat::{self, ContainerStat, StatReader};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("container `{0}` is not registered")]
    MissingContainer(ContainerID),
    #[error(transparent)]
    Stat(#[from] stat::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Tracks registered containers and takes snapshots of them on demand.
#[derive(Debug)]
pub struct Monitor {
    containers: DashMap<ContainerID, Container>,
    reader: StatReader,
}

impl Monitor {
    pub fn new(reader: StatReader) -> Self {
        Self {
            containers: DashMap::new(),
            reader,
        }
    }

    /// Registers a container, replacing any previous one with the same id.
    pub fn register_container(&self, container: Container) {
        log::debug!(
            "Registering container: container_id={}, pid={}",
            container.id(),
            container.pid()
        );
        self.containers.insert(container.id().clone(), container);
    }

    /// Stops tracking a container, returning it if it was registered.
    pub fn remove_container(&self, container_id: &str) -> Option<Container> {
        self.containers
            .remove(container_id)
            .map(|(_, container)| container)
    }

    pub fn get(&self, container_id: &str) -> Option<Container> {
        self.containers
            .get(container_id)
            .map(|entry| entry.value().clone())
    }

    pub fn size(&self) -> usize {
        self.containers.len()
    }

    /// Takes a snapshot of a single registered container.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingContainer`] for an unknown id and [`Error::Stat`]
    /// if the snapshot fails.
    pub fn stat_container(&self, container_id: &ContainerID) -> Result<ContainerStat> {
        let container = self
            .get(container_id.as_ref())
            .ok_or_else(|| Error::MissingContainer(container_id.clone()))?;
        Ok(self.reader.stat(&container)?)
    }

    /// Collects a snapshot of every registered container.
    ///
    /// Failures are logged and skipped. A container whose cgroup can no longer
    /// be loaded has exited and is removed.
    pub fn collect_stats(&self, out: &mut Vec<(ContainerID, ContainerStat)>) {
        // Clone first so no shard lock is held across filesystem walks.
        let containers: Vec<Container> = self
            .containers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        for container in containers {
            match self.reader.stat(&container) {
                Ok(stat) => out.push((container.id().clone(), stat)),
                Err(err) => {
                    log::error!(
                        target: "container monitor",
                        "failed reading container stats: container_id={}, error={}",
                        container.id(),
                        err
                    );
                    if matches!(err, stat::Error::CgroupLoad { .. }) {
                        self.containers.remove(container.id());
                    }
                }
            }
        }
    }
}
