//! Async rtnetlink plumbing for Linux network interfaces.
//!
//! Covers exactly what host link renaming needs: dumping links with their
//! kind and peer index, looking a link up by index, renaming it, and joining
//! another network namespace.
//!
//! # Example
//!
//! ```ignore
//! use veth_namer::netlink::Connection;
//!
//! let conn = Connection::new()?;
//! for link in conn.get_links().await? {
//!     println!("{}: {:?} ({:?})", link.ifindex(), link.name(), link.kind());
//! }
//! conn.set_link_name_by_index(42, "vweb-0").await?;
//! ```

mod connection;
mod error;
mod link;
pub mod namespace;
mod socket;
mod wire;

pub use connection::Connection;
pub use error::{Error, Result};
pub use link::{LinkMessage, VETH_KIND};
