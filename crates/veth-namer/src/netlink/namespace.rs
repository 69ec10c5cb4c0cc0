//! Network namespace switching.
//!
//! Joining a namespace affects the whole calling thread. The only caller is the
//! re-entry child, which runs single-threaded and exits right after its query.

use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::path::Path;

use super::error::{Error, Result};

/// Namespace file of the calling thread.
const SELF_NETNS: &str = "/proc/thread-self/ns/net";

/// Enter a network namespace by path.
///
/// The returned guard switches the thread back to its original namespace when
/// dropped.
pub fn enter_path<P: AsRef<Path>>(path: P) -> Result<NamespaceGuard> {
    let path = path.as_ref();
    let namespace_error = |source| Error::Namespace {
        path: path.display().to_string(),
        source,
    };

    let original = File::open(SELF_NETNS).map_err(|source| Error::Namespace {
        path: SELF_NETNS.to_string(),
        source,
    })?;

    let target = File::open(path).map_err(namespace_error)?;
    join(&target).map_err(namespace_error)?;

    Ok(NamespaceGuard { original })
}

/// Move the calling thread into the network namespace behind `file`.
fn join(file: &File) -> std::io::Result<()> {
    // SAFETY: the fd belongs to an open namespace file for the whole call.
    let ret = unsafe { libc::setns(file.as_raw_fd(), libc::CLONE_NEWNET) };
    if ret < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// A guard that restores the original namespace when dropped.
#[derive(Debug)]
pub struct NamespaceGuard {
    original: File,
}

impl Drop for NamespaceGuard {
    fn drop(&mut self) {
        if let Err(e) = join(&self.original) {
            tracing::warn!("failed to restore network namespace: {}", e);
        }
    }
}
