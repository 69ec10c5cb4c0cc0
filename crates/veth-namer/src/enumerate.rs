//! Listing the links of a container network namespace.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::reexec;

/// A veth end found inside a container namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerLink {
    /// Link name inside the container.
    pub name: String,
    /// Index of the peer link on the host.
    pub parent_index: u32,
}

impl ContainerLink {
    pub fn new(name: impl Into<String>, parent_index: u32) -> Self {
        Self {
            name: name.into(),
            parent_index,
        }
    }
}

/// Lists the veth links of a network namespace.
pub trait LinkEnumerator {
    /// List the veth links inside the namespace at `netns`.
    fn container_links(&self, netns: &str) -> impl Future<Output = Result<Vec<ContainerLink>>>;
}

/// Enumerator running each query in a re-executed copy of the current binary.
///
/// The child joins the namespace; the calling process never does.
#[derive(Debug, Clone)]
pub struct ReexecEnumerator {
    exe: PathBuf,
}

impl Default for ReexecEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ReexecEnumerator {
    /// Re-execute the running binary.
    pub fn new() -> Self {
        let proc_exe = Path::new("/proc/self/exe");
        let exe = if proc_exe.exists() {
            proc_exe.to_path_buf()
        } else {
            std::env::current_exe().unwrap_or_else(|_| proc_exe.to_path_buf())
        };
        Self { exe }
    }

    /// Use another executable implementing the re-entry protocol.
    pub fn with_executable(exe: impl Into<PathBuf>) -> Self {
        Self { exe: exe.into() }
    }

    /// Executable that is spawned.
    pub fn executable(&self) -> &Path {
        &self.exe
    }
}

impl LinkEnumerator for ReexecEnumerator {
    async fn container_links(&self, netns: &str) -> Result<Vec<ContainerLink>> {
        let output = Command::new(&self.exe)
            .env(reexec::REEXEC_ENV, reexec::PRINT_NS_LINKS)
            .env(reexec::NETNS_ENV, netns)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                Error::Enumeration(format!("cannot run {}: {}", self.exe.display(), e))
            })?;

        if !output.status.success() {
            return Err(Error::Enumeration(format!(
                "helper for {} exited with {}",
                netns, output.status
            )));
        }

        reexec::parse_links_output(&output.stdout)
    }
}
