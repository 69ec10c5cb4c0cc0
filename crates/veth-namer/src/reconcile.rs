//! Keeping host link names in line with container names.
//!
//! Two drivers share one per-container procedure:
//!
//! - [`Reconciler::sweep`] walks every running container once, sorted by
//!   name so repeated runs log in the same order;
//! - [`Reconciler::listen`] subscribes to network connect events, sweeps,
//!   then handles events one at a time until the event stream breaks.
//!
//! Reconciling is idempotent, so a container seen by both the sweep and an
//! event is simply checked twice.

use tokio_stream::StreamExt;

use crate::docker::{Container, ContainerRuntime, NetworkEvent};
use crate::enumerate::LinkEnumerator;
use crate::error::{Error, Result};
use crate::naming::LinkNamer;
use crate::rename::{HostLinks, RenameOutcome, Renamer};

/// Namespace path suffix of the shared default namespace.
const DEFAULT_NETNS_SUFFIX: &str = "/default";

/// Reconciliation engine.
pub struct Reconciler<R, E, L> {
    runtime: R,
    enumerator: E,
    renamer: Renamer<L>,
    namer: LinkNamer,
}

impl<R, E, L> Reconciler<R, E, L>
where
    R: ContainerRuntime,
    E: LinkEnumerator,
    L: HostLinks,
{
    /// Create an engine. `dry_run` suppresses the rename requests only.
    pub fn new(runtime: R, enumerator: E, links: L, namer: LinkNamer, dry_run: bool) -> Self {
        Self {
            runtime,
            enumerator,
            renamer: Renamer::new(links, dry_run),
            namer,
        }
    }

    /// Get the renamer.
    pub fn renamer(&self) -> &Renamer<L> {
        &self.renamer
    }

    /// Reconcile every running container once.
    ///
    /// Listing and inspect failures are logged; they never stop the sweep.
    pub async fn sweep(&self) {
        let ids = match self.runtime.running_containers().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!("Listing containers failed: {}", e);
                return;
            }
        };

        let mut containers = Vec::with_capacity(ids.len());
        for id in ids {
            match self.runtime.inspect_container(&id).await {
                Ok(container) => containers.push(container),
                // Stopped between listing and inspecting.
                Err(e) if e.is_not_found() => {
                    tracing::debug!("Container {} is gone: {}", id, e)
                }
                Err(e) => tracing::error!("Inspect failed for container ID {}: {}", id, e),
            }
        }

        containers.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        for container in &containers {
            self.reconcile_container(container).await;
        }
    }

    /// Subscribe to network connect events, sweep, then reconcile every
    /// connecting container.
    ///
    /// Only returns on failure: a transport error or the end of the event
    /// stream. Both mean the daemon connection is gone.
    pub async fn listen(&self) -> Result<()> {
        // Subscribe first so a container connecting during the sweep is not lost.
        let mut events = self.runtime.network_connect_events().await?;

        self.sweep().await;

        while let Some(event) = events.next().await {
            self.handle_event(event?).await;
        }

        Err(Error::EventStreamClosed)
    }

    /// Reconcile the container an event refers to.
    pub async fn handle_event(&self, event: NetworkEvent) {
        if !event.is_network_connect() {
            tracing::trace!("Ignoring event: {} {}", event.kind, event.action);
            return;
        }

        tracing::debug!(
            "Event: ID: {}, container: {:?}",
            event.actor_id,
            event.container
        );

        let Some(id) = event.container.as_deref() else {
            tracing::error!("Event has no container ID: {}", event.actor_id);
            return;
        };

        match self.runtime.inspect_container(id).await {
            Ok(container) => {
                self.reconcile_container(&container).await;
            }
            Err(e) => tracing::error!("Inspect failed for container ID {}: {}", id, e),
        }
    }

    /// Bring the host link names of one container in line.
    ///
    /// Returns one outcome per link that reached the renamer.
    pub async fn reconcile_container(&self, container: &Container) -> Vec<RenameOutcome> {
        if container.name.is_empty() {
            tracing::error!(
                "Cannot make host link name: container name must not be empty: {}",
                container.id
            );
            return Vec::new();
        }

        if !container.network_mode.has_own_links() {
            tracing::debug!(
                "Container is running in {} network mode, skipping: {} {}",
                container.network_mode,
                container.name,
                container.id
            );
            return Vec::new();
        }

        if container.sandbox_key.is_empty() {
            tracing::error!(
                "Sandbox is not defined for container: {} {}",
                container.name,
                container.id
            );
            return Vec::new();
        }
        if container.sandbox_key.ends_with(DEFAULT_NETNS_SUFFIX) {
            tracing::error!(
                "Container uses default namespace, this is not supported: {} {}",
                container.name,
                container.id
            );
            return Vec::new();
        }

        let links = match self.enumerator.container_links(&container.sandbox_key).await {
            Ok(links) => links,
            Err(e) => {
                tracing::error!(
                    "Listing links failed for container: {} {}: {}",
                    container.name,
                    container.id,
                    e
                );
                return Vec::new();
            }
        };

        let mut outcomes = Vec::with_capacity(links.len());
        for link in links {
            if link.name.is_empty() {
                tracing::error!(
                    "Cannot make host link name: container link name must not be empty: {} {}",
                    container.id,
                    link.parent_index
                );
                continue;
            }

            let host_link = match self.renamer.resolve(link.parent_index).await {
                Ok(host_link) => host_link,
                Err(e) => {
                    tracing::error!(
                        "Resolving host link {} failed for container: {} {}: {}",
                        link.parent_index,
                        container.name,
                        link.name,
                        e
                    );
                    continue;
                }
            };

            let target = match self.namer.host_link_name(&container.name, &link.name) {
                Ok(target) => target,
                Err(e) => {
                    tracing::error!(
                        "Cannot make host link name: {}: {} {}",
                        e,
                        container.name,
                        link.name
                    );
                    continue;
                }
            };

            outcomes.push(
                self.renamer
                    .rename(&host_link, &target, &container.name, &link.name)
                    .await,
            );
        }

        outcomes
    }
}
