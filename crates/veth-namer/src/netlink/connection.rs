//! Request/answer exchange over the route socket.

use super::error::{Error, Result};
use super::socket::RouteSocket;
use super::wire::{self, LinkRequest, Message};

/// rtnetlink connection.
///
/// Operations act on the network namespace the connection was opened in.
pub struct Connection {
    socket: RouteSocket,
}

impl Connection {
    /// Open a connection in the caller's current network namespace.
    pub fn new() -> Result<Self> {
        Ok(Self {
            socket: RouteSocket::open()?,
        })
    }

    /// Send `request` and collect the payloads answered to it.
    ///
    /// Dumps end with `NLMSG_DONE`, ACK requests with a zero error, and plain
    /// requests with their single reply.
    pub(crate) async fn exchange(&self, request: LinkRequest) -> Result<Vec<Vec<u8>>> {
        let seq = self.socket.send(request).await?;
        let mut reply = Reply::new(seq);

        while !reply.complete {
            let data = self.socket.recv().await?;
            for msg in wire::messages(&data) {
                reply.push(msg?)?;
            }
        }

        Ok(reply.payloads)
    }
}

/// Answers collected for one sequence number.
#[derive(Debug)]
struct Reply {
    seq: u32,
    payloads: Vec<Vec<u8>>,
    complete: bool,
}

impl Reply {
    fn new(seq: u32) -> Self {
        Self {
            seq,
            payloads: Vec::new(),
            complete: false,
        }
    }

    fn push(&mut self, msg: Message<'_>) -> Result<()> {
        if msg.header.seq != self.seq || self.complete {
            return Ok(());
        }

        match msg.header.kind {
            wire::NLMSG_ERROR => {
                let code = wire::error_code(msg.payload)?;
                if code != 0 {
                    return Err(Error::from_errno(code));
                }
                self.complete = true;
            }
            wire::NLMSG_DONE => self.complete = true,
            _ => {
                self.payloads.push(msg.payload.to_vec());
                if msg.header.flags & wire::NLM_F_MULTI == 0 {
                    self.complete = true;
                }
            }
        }

        Ok(())
    }
}
