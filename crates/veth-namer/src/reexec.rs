//! Re-entry protocol for listing links inside another network namespace.
//!
//! The daemon never joins a container namespace itself. It re-executes its
//! own binary with two environment variables set:
//!
//! - `DOCKER_VETH_NAMER_REEXEC=PrintNsLinks` selects the action;
//! - `DOCKER_VETH_NAMER_NETNS=<path>` names the namespace to join.
//!
//! The child joins the namespace, dumps its veth links and prints a single
//! JSON line on stdout:
//!
//! ```text
//! [{"Name":"eth0","ParentIndex":42}]
//! ```
//!
//! On any failure the child prints nothing to stdout and exits with status 1,
//! so an empty answer is always an error and never "no links".

use std::ffi::OsString;
use std::io::Write;

use crate::enumerate::ContainerLink;
use crate::error::{Error, Result};
use crate::netlink::{Connection, LinkMessage, namespace};

/// Environment variable carrying the re-entry action.
pub const REEXEC_ENV: &str = "DOCKER_VETH_NAMER_REEXEC";

/// Environment variable carrying the namespace path.
pub const NETNS_ENV: &str = "DOCKER_VETH_NAMER_NETNS";

/// Action printing the veth links of a namespace.
pub const PRINT_NS_LINKS: &str = "PrintNsLinks";

/// Check whether this process was spawned to run a re-entry action.
///
/// Must be called before anything else in `main`, in particular before any
/// async runtime or extra thread exists.
pub fn requested() -> bool {
    std::env::var_os(REEXEC_ENV).is_some()
}

/// Run the requested re-entry action and return the process exit code.
pub fn run_child() -> i32 {
    let action = std::env::var_os(REEXEC_ENV).unwrap_or_default();
    if action != PRINT_NS_LINKS {
        tracing::error!("unknown re-entry action: {:?}", action);
        return 1;
    }

    let Some(netns) = std::env::var_os(NETNS_ENV).filter(|p| !p.is_empty()) else {
        tracing::error!("{} is not set", NETNS_ENV);
        return 1;
    };

    match print_ns_links(netns) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("listing namespace links failed: {}", e);
            1
        }
    }
}

fn print_ns_links(netns: OsString) -> Result<()> {
    // The namespace switch is per thread; the socket is created on this thread
    // by a current-thread runtime so it lives in the container namespace.
    let _guard = namespace::enter_path(&netns)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()?;
    let links = runtime.block_on(async {
        let conn = Connection::new()?;
        conn.get_links().await
    })?;

    // Encode fully before writing so a failure never leaves partial output.
    let encoded = serde_json::to_string(&veth_links(links))?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", encoded)?;
    stdout.flush()?;

    Ok(())
}

/// Keep the veth ends of a link dump.
pub fn veth_links(links: impl IntoIterator<Item = LinkMessage>) -> Vec<ContainerLink> {
    links
        .into_iter()
        .filter(LinkMessage::is_veth)
        .map(|link| ContainerLink {
            name: link.name().unwrap_or_default().to_string(),
            parent_index: link.peer_index().unwrap_or(0),
        })
        .collect()
}

/// Decode the child's stdout.
///
/// Empty output is an error. A literal `null` is accepted as no links.
pub fn parse_links_output(stdout: &[u8]) -> Result<Vec<ContainerLink>> {
    let stdout = stdout.trim_ascii();
    if stdout.is_empty() {
        return Err(Error::Enumeration("helper produced no output".into()));
    }

    let links: Option<Vec<ContainerLink>> = serde_json::from_slice(stdout)?;
    Ok(links.unwrap_or_default())
}
