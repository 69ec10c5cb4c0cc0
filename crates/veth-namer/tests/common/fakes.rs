//! In-memory collaborators for driving the reconciler without Docker or
//! root privileges.
//!
//! Every fake appends to a shared [`Journal`] so tests can assert on call
//! order.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use veth_namer::docker::{Container, ContainerRuntime, NetworkEvent, NetworkMode};
use veth_namer::enumerate::{ContainerLink, LinkEnumerator};
use veth_namer::rename::{HostLink, HostLinks};
use veth_namer::{Error, Result};

/// Ordered record of collaborator calls.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == entry)
    }
}

/// Bridge-mode container with its own namespace.
pub fn container(id: &str, name: &str) -> Container {
    Container {
        id: id.to_string(),
        name: name.to_string(),
        network_mode: NetworkMode::Other("bridge".into()),
        sandbox_key: format!("/var/run/docker/netns/{}", id),
    }
}

/// Docker event for a container joining a network.
pub fn connect_event(container: &str) -> NetworkEvent {
    NetworkEvent {
        kind: "network".into(),
        action: "connect".into(),
        actor_id: "net0".into(),
        container: Some(container.to_string()),
    }
}

pub type EventItems = tokio_stream::Iter<std::vec::IntoIter<Result<NetworkEvent>>>;

#[derive(Default)]
pub struct FakeRuntime {
    pub journal: Journal,
    pub containers: HashMap<String, Container>,
    pub running: Vec<String>,
    pub events: RefCell<Vec<Result<NetworkEvent>>>,
    pub fail_list: bool,
}

impl FakeRuntime {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            ..Default::default()
        }
    }

    /// Register a running container.
    pub fn run(mut self, container: Container) -> Self {
        self.running.push(container.id.clone());
        self.containers.insert(container.id.clone(), container);
        self
    }

    /// Register a container that is not listed as running.
    pub fn known(mut self, container: Container) -> Self {
        self.containers.insert(container.id.clone(), container);
        self
    }

    pub fn event(self, event: Result<NetworkEvent>) -> Self {
        self.events.borrow_mut().push(event);
        self
    }
}

impl ContainerRuntime for FakeRuntime {
    type Events = EventItems;

    async fn running_containers(&self) -> Result<Vec<String>> {
        self.journal.push("list");
        if self.fail_list {
            return Err(Error::Http("connection refused".into()));
        }
        Ok(self.running.clone())
    }

    async fn inspect_container(&self, id: &str) -> Result<Container> {
        self.journal.push(format!("inspect {}", id));
        self.containers.get(id).cloned().ok_or_else(|| Error::Docker {
            status: 404,
            message: format!("No such container: {}", id),
        })
    }

    async fn network_connect_events(&self) -> Result<Self::Events> {
        self.journal.push("subscribe");
        Ok(tokio_stream::iter(self.events.take()))
    }
}

#[derive(Default)]
pub struct FakeEnumerator {
    pub journal: Journal,
    pub links: HashMap<String, Vec<ContainerLink>>,
}

impl FakeEnumerator {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            ..Default::default()
        }
    }

    /// Declare the links of a container's namespace.
    pub fn links(mut self, container: &Container, links: &[(&str, u32)]) -> Self {
        self.links.insert(
            container.sandbox_key.clone(),
            links
                .iter()
                .map(|(name, index)| ContainerLink::new(*name, *index))
                .collect(),
        );
        self
    }
}

impl LinkEnumerator for FakeEnumerator {
    async fn container_links(&self, netns: &str) -> Result<Vec<ContainerLink>> {
        self.journal.push(format!("enumerate {}", netns));
        self.links
            .get(netns)
            .cloned()
            .ok_or_else(|| Error::Enumeration(format!("cannot enter {}", netns)))
    }
}

#[derive(Default)]
pub struct FakeLinks {
    pub journal: Journal,
    pub names: RefCell<HashMap<u32, String>>,
    pub refuse: HashSet<u32>,
}

impl FakeLinks {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            ..Default::default()
        }
    }

    pub fn link(self, index: u32, name: &str) -> Self {
        self.names.borrow_mut().insert(index, name.to_string());
        self
    }

    pub fn name(&self, index: u32) -> Option<String> {
        self.names.borrow().get(&index).cloned()
    }
}

impl HostLinks for FakeLinks {
    async fn link_by_index(&self, index: u32) -> Result<HostLink> {
        let name = self.name(index).ok_or(Error::LinkNotFound { index })?;
        Ok(HostLink { index, name })
    }

    async fn rename_link(&self, index: u32, name: &str) -> Result<()> {
        self.journal.push(format!("rename {} {}", index, name));
        if self.refuse.contains(&index) {
            return Err(Error::Netlink(veth_namer::netlink::Error::from_errno(
                -libc::EEXIST,
            )));
        }
        self.names.borrow_mut().insert(index, name.to_string());
        Ok(())
    }
}
