//! Docker Engine API collaborator.
//!
//! The reconciler only needs three things from the container runtime: the
//! running containers, an inspect record per container and the stream of
//! network connect events. [`ContainerRuntime`] names exactly that, and
//! [`DockerClient`] implements it over the daemon socket.

mod client;
mod events;
pub mod types;

use std::future::Future;

use tokio_stream::Stream;

pub use client::{DEFAULT_API_VERSION, DEFAULT_DOCKER_HOST, DockerClient, negotiate_version};
pub use events::EventStream;

use crate::error::Result;

/// Container runtime operations consumed by the reconciler.
pub trait ContainerRuntime {
    /// Stream of network events.
    type Events: Stream<Item = Result<NetworkEvent>> + Unpin;

    /// IDs of the running containers.
    fn running_containers(&self) -> impl Future<Output = Result<Vec<String>>>;

    /// Inspect a container by ID or name.
    fn inspect_container(&self, id: &str) -> impl Future<Output = Result<Container>>;

    /// Subscribe to network connect events.
    ///
    /// Events published after this returns are delivered by the stream.
    fn network_connect_events(&self) -> impl Future<Output = Result<Self::Events>>;
}

/// Network mode of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkMode {
    /// Shares the host network stack.
    Host,
    /// No networking.
    None,
    /// Bridge, user-defined network, `container:<id>`, ...
    Other(String),
}

impl From<&str> for NetworkMode {
    fn from(mode: &str) -> Self {
        match mode {
            "host" => NetworkMode::Host,
            "none" => NetworkMode::None,
            other => NetworkMode::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkMode::Host => write!(f, "host"),
            NetworkMode::None => write!(f, "none"),
            NetworkMode::Other(mode) => write!(f, "{}", mode),
        }
    }
}

impl NetworkMode {
    /// Check if containers in this mode own no links of their own.
    pub fn has_own_links(&self) -> bool {
        matches!(self, NetworkMode::Other(_))
    }
}

/// Identity of a container as needed for link renaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    /// Runtime-assigned ID.
    pub id: String,
    /// Human-assigned name, possibly with `/` separated segments.
    pub name: String,
    /// Network mode.
    pub network_mode: NetworkMode,
    /// Path of the container's network namespace.
    pub sandbox_key: String,
}

impl From<types::ContainerInspect> for Container {
    fn from(inspect: types::ContainerInspect) -> Self {
        Self {
            network_mode: NetworkMode::from(inspect.host_config.network_mode.as_str()),
            id: inspect.id,
            name: inspect.name,
            sandbox_key: inspect.network_settings.sandbox_key,
        }
    }
}

/// Event type of network events.
pub const NETWORK_EVENT_TYPE: &str = "network";

/// Action of a container joining a network.
pub const CONNECT_ACTION: &str = "connect";

/// A runtime event as seen by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEvent {
    /// Event type.
    pub kind: String,
    /// Event action.
    pub action: String,
    /// ID of the emitting object.
    pub actor_id: String,
    /// `container` attribute, if present.
    pub container: Option<String>,
}

impl NetworkEvent {
    /// Check if this is a container joining a network.
    pub fn is_network_connect(&self) -> bool {
        self.kind == NETWORK_EVENT_TYPE && self.action == CONNECT_ACTION
    }
}

impl From<types::Event> for NetworkEvent {
    fn from(mut event: types::Event) -> Self {
        Self {
            container: event.actor.attributes.remove("container"),
            kind: event.kind,
            action: event.action,
            actor_id: event.actor.id,
        }
    }
}
