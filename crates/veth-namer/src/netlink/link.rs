//! Link queries and renames.
//!
//! Only what pairs veth ends is decoded: the name, `IFLA_LINK` (peer index)
//! and the `IFLA_LINKINFO` kind.

use zerocopy::FromBytes;

use super::connection::Connection;
use super::error::{Error, Result};
use super::wire::{self, IfInfoMsg, LinkRequest};

/// Link kind reported by the kernel for veth devices.
pub const VETH_KIND: &str = "veth";

/// A decoded RTM_NEWLINK answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkMessage {
    index: u32,
    name: Option<String>,
    peer_index: Option<u32>,
    kind: Option<String>,
}

impl LinkMessage {
    /// Decode the payload of an RTM_NEWLINK message.
    pub fn from_bytes(payload: &[u8]) -> Result<Self> {
        let (ifinfo, attrs) = IfInfoMsg::read_from_prefix(payload).map_err(|_| {
            Error::Malformed(format!("ifinfomsg truncated to {} bytes", payload.len()))
        })?;

        let mut link = LinkMessage {
            index: ifinfo.index as u32,
            ..Default::default()
        };

        for (kind, value) in wire::attributes(attrs) {
            match kind {
                wire::IFLA_IFNAME => link.name = Some(wire::attr_string(value)?),
                wire::IFLA_LINK => link.peer_index = Some(wire::attr_u32(value)?),
                wire::IFLA_LINKINFO => {
                    link.kind = wire::attributes(value)
                        .find(|(kind, _)| *kind == wire::IFLA_INFO_KIND)
                        .map(|(_, value)| wire::attr_string(value))
                        .transpose()?;
                }
                _ => {}
            }
        }

        Ok(link)
    }

    /// Interface index.
    pub fn ifindex(&self) -> u32 {
        self.index
    }

    /// Interface name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Index of the linked device. For a veth end this is its peer, numbered
    /// in the peer's namespace.
    pub fn peer_index(&self) -> Option<u32> {
        self.peer_index
    }

    /// Link kind (`veth`, `bridge`, ...).
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// One end of a veth pair.
    pub fn is_veth(&self) -> bool {
        self.kind() == Some(VETH_KIND)
    }
}

impl Connection {
    /// List every link of the connection's namespace.
    pub async fn get_links(&self) -> Result<Vec<LinkMessage>> {
        let request = LinkRequest::new(wire::RTM_GETLINK, wire::NLM_F_DUMP, 0);
        let payloads = self
            .exchange(request)
            .await
            .map_err(|e| e.during("listing links"))?;

        let mut links = Vec::with_capacity(payloads.len());
        for payload in payloads {
            match LinkMessage::from_bytes(&payload) {
                Ok(link) => links.push(link),
                Err(e) => tracing::debug!("skipping undecodable link message: {}", e),
            }
        }

        Ok(links)
    }

    /// Look a link up by interface index; `None` when no such link exists.
    pub async fn get_link_by_index(&self, index: u32) -> Result<Option<LinkMessage>> {
        let request = LinkRequest::new(wire::RTM_GETLINK, 0, index);
        match self.exchange(request).await {
            Ok(payloads) => payloads
                .first()
                .map(|payload| LinkMessage::from_bytes(payload))
                .transpose(),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.during(format!("looking up link {}", index))),
        }
    }

    /// Rename the link with the given index.
    pub async fn set_link_name_by_index(&self, index: u32, name: &str) -> Result<()> {
        let request = LinkRequest::new(wire::RTM_SETLINK, wire::NLM_F_ACK, index)
            .string(wire::IFLA_IFNAME, name);

        self.exchange(request)
            .await
            .map(drop)
            .map_err(|e| e.during(format!("renaming link {} to {}", index, name)))
    }
}
