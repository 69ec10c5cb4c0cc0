//! Renaming host links.
//!
//! Renaming is idempotent: a link that already carries its target name is left
//! alone and no kernel request is sent. In dry-run mode every step runs except
//! the final rename request.

use std::future::Future;

use crate::error::{Error, Result};
use crate::netlink::Connection;

/// Snapshot of a host link, resolved fresh for every rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLink {
    /// Interface index.
    pub index: u32,
    /// Current name.
    pub name: String,
}

/// Host link operations.
pub trait HostLinks {
    /// Resolve a link by interface index.
    fn link_by_index(&self, index: u32) -> impl Future<Output = Result<HostLink>>;

    /// Rename the link with the given index.
    fn rename_link(&self, index: u32, name: &str) -> impl Future<Output = Result<()>>;
}

impl HostLinks for Connection {
    async fn link_by_index(&self, index: u32) -> Result<HostLink> {
        let link = self
            .get_link_by_index(index)
            .await?
            .ok_or(Error::LinkNotFound { index })?;

        Ok(HostLink {
            index: link.ifindex(),
            name: link.name().unwrap_or_default().to_string(),
        })
    }

    async fn rename_link(&self, index: u32, name: &str) -> Result<()> {
        Ok(self.set_link_name_by_index(index, name).await?)
    }
}

/// Result of a rename attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The link already had the target name.
    Unchanged,
    /// The link was renamed.
    Renamed,
    /// The link would have been renamed.
    DryRun,
    /// The kernel refused the rename.
    Failed,
}

/// Applies target names to host links.
#[derive(Debug)]
pub struct Renamer<L> {
    links: L,
    dry_run: bool,
}

impl<L: HostLinks> Renamer<L> {
    pub fn new(links: L, dry_run: bool) -> Self {
        Self { links, dry_run }
    }

    /// Check whether renames are only reported.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Get the host link backend.
    pub fn links(&self) -> &L {
        &self.links
    }

    /// Resolve the host link with the given index.
    pub async fn resolve(&self, index: u32) -> Result<HostLink> {
        self.links.link_by_index(index).await
    }

    /// Give `link` the name `target`.
    ///
    /// `container` and `container_link` only label the log lines. Failures are
    /// logged and reported as [`RenameOutcome::Failed`]; they never abort the
    /// caller.
    pub async fn rename(
        &self,
        link: &HostLink,
        target: &str,
        container: &str,
        container_link: &str,
    ) -> RenameOutcome {
        if link.name == target {
            tracing::debug!(
                "Link was renamed already: {} {}: {}",
                container,
                container_link,
                link.name
            );
            return RenameOutcome::Unchanged;
        }

        if !self.dry_run
            && let Err(e) = self.links.rename_link(link.index, target).await
        {
            tracing::error!(
                "Link rename failed: {} {}: {} => {}: {}",
                container,
                container_link,
                link.name,
                target,
                e
            );
            return RenameOutcome::Failed;
        }

        tracing::info!(
            "Link renamed: {} {}: {} => {}",
            container,
            container_link,
            link.name,
            target
        );

        if self.dry_run {
            RenameOutcome::DryRun
        } else {
            RenameOutcome::Renamed
        }
    }
}
