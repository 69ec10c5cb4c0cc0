//! Rename the host-side veth links of Docker containers after the container.
//!
//! Docker names the host end of a container's veth pair `veth` followed by a
//! few random hex digits. This crate renames those links to something derived
//! from the container name and the in-container interface, e.g. the `eth0` of
//! container `my/random_web` becomes `vrandom_web-0` on the host.
//!
//! # Components
//!
//! - [`naming`] - pure host link name synthesis
//! - [`enumerate`] - lists veth links inside a container namespace by
//!   re-executing the current binary ([`reexec`])
//! - [`rename`] - idempotent, dry-run aware link renaming
//! - [`reconcile`] - startup sweep plus the network-connect event loop
//! - [`docker`] - minimal Docker Engine API client
//! - [`netlink`] - rtnetlink plumbing
//!
//! # Example
//!
//! ```ignore
//! use veth_namer::{Config, DockerClient, LinkNamer, Reconciler, ReexecEnumerator};
//! use veth_namer::netlink::Connection;
//!
//! let namer = LinkNamer::new(Config::load("/etc/docker-veth-namer.yml")?);
//! let docker = DockerClient::connect_from_env().await?;
//! let reconciler = Reconciler::new(docker, ReexecEnumerator::new(), Connection::new()?, namer, false);
//!
//! reconciler.listen().await?;
//! ```

pub mod config;
pub mod docker;
pub mod enumerate;
pub mod error;
pub mod naming;
pub mod netlink;
pub mod reconcile;
pub mod reexec;
pub mod rename;
pub mod util;

pub use config::{Config, Replacement};
pub use docker::{Container, ContainerRuntime, DockerClient, NetworkEvent, NetworkMode};
pub use enumerate::{ContainerLink, LinkEnumerator, ReexecEnumerator};
pub use error::{Error, Result};
pub use naming::{LinkNamer, NameError};
pub use reconcile::Reconciler;
pub use rename::{HostLink, HostLinks, RenameOutcome, Renamer};
