//! Common test utilities for integration tests.
//!
//! Provides `TestNamespace` for isolated network namespace testing
//! and helper macros for conditional test execution.

#![allow(dead_code)]

use std::io;
use std::process::Command;
use std::sync::atomic::{AtomicU32, Ordering};

use veth_namer::netlink::{Connection, Error, Result, namespace};

/// Global counter for unique namespace names.
static NAMESPACE_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Generate a unique namespace name for this test.
fn unique_ns_name(prefix: &str) -> String {
    let id = NAMESPACE_COUNTER.fetch_add(1, Ordering::SeqCst);
    let pid = std::process::id();
    format!("vn-{}-{}-{}", prefix, pid, id)
}

fn run(cmd: &mut Command) -> Result<()> {
    let output = cmd.output()?;

    if !output.status.success() {
        return Err(Error::Io(io::Error::other(format!(
            "command failed: {:?}: {}",
            cmd,
            String::from_utf8_lossy(&output.stderr)
        ))));
    }
    Ok(())
}

/// A named network namespace deleted on drop.
pub struct TestNamespace {
    name: String,
}

impl TestNamespace {
    /// Create a new test namespace with a unique name.
    pub fn new(prefix: &str) -> Result<Self> {
        let name = unique_ns_name(prefix);
        run(Command::new("ip").args(["netns", "add", name.as_str()]))?;
        Ok(Self { name })
    }

    /// Get the namespace name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the namespace file, as Docker reports it in `SandboxKey`.
    pub fn path(&self) -> String {
        format!("/var/run/netns/{}", self.name)
    }

    /// Open a connection bound to this namespace.
    pub fn connection(&self) -> Result<Connection> {
        let _guard = namespace::enter_path(self.path())?;
        Connection::new()
    }

    /// Run `ip` inside the namespace.
    pub fn ip(&self, args: &[&str]) -> Result<()> {
        run(Command::new("ip")
            .args(["netns", "exec", self.name.as_str(), "ip"])
            .args(args))
    }

    /// Create a veth pair with `local_name` here and `remote_name` in `other`.
    pub fn connect_to(
        &self,
        other: &TestNamespace,
        local_name: &str,
        remote_name: &str,
    ) -> Result<()> {
        self.ip(&[
            "link", "add", local_name, "type", "veth", "peer", "name", remote_name,
        ])?;
        self.ip(&["link", "set", remote_name, "netns", &other.name])
    }

    /// Add a dummy interface.
    pub fn add_dummy(&self, name: &str) -> Result<()> {
        self.ip(&["link", "add", name, "type", "dummy"])
    }
}

impl Drop for TestNamespace {
    fn drop(&mut self) {
        let _ = Command::new("ip")
            .args(["netns", "del", self.name.as_str()])
            .status();
    }
}

/// Check if running as root.
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Skip the test if not running as root.
#[macro_export]
macro_rules! require_root {
    () => {
        if !crate::common::is_root() {
            eprintln!("Skipping test: requires root");
            return Ok(());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ns_name() {
        let name1 = unique_ns_name("test");
        let name2 = unique_ns_name("test");
        assert_ne!(name1, name2);
        assert!(name1.starts_with("vn-test-"));
    }
}
