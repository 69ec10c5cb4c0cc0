//! Docker Engine API wire types.
//!
//! Only the fields the renamer reads are modelled; everything else in the
//! daemon's answers is ignored.

use std::collections::HashMap;

use serde::Deserialize;

/// Container summary (for list).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerSummary {
    /// Container ID.
    pub id: String,
}

/// Container inspect response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerInspect {
    /// Container ID.
    pub id: String,
    /// Container name, with a leading `/`.
    #[serde(default)]
    pub name: String,
    /// Host configuration.
    #[serde(default)]
    pub host_config: HostConfig,
    /// Network settings.
    #[serde(default)]
    pub network_settings: NetworkSettings,
}

/// Host configuration subset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostConfig {
    /// Network mode (`bridge`, `host`, `none`, `container:<id>`, ...).
    #[serde(default)]
    pub network_mode: String,
}

/// Network settings subset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkSettings {
    /// Path of the container's network namespace.
    #[serde(default)]
    pub sandbox_key: String,
}

/// Event from `/events`.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Object type (`container`, `network`, ...).
    #[serde(rename = "Type", default)]
    pub kind: String,
    /// Action (`connect`, `start`, ...).
    #[serde(rename = "Action", default)]
    pub action: String,
    /// Object that emitted the event.
    #[serde(rename = "Actor", default)]
    pub actor: EventActor,
}

/// Event actor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventActor {
    /// Object ID (the network ID for network events).
    #[serde(rename = "ID", default)]
    pub id: String,
    /// Attributes; network events carry `container` and `name`.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

/// Error body returned by the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}
