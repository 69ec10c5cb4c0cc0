//! Non-blocking `NETLINK_ROUTE` socket on the tokio reactor.

use std::sync::atomic::{AtomicU32, Ordering};

use bytes::BytesMut;
use netlink_sys::{Socket, SocketAddr, protocols};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;

use super::error::Result;
use super::wire::LinkRequest;

/// Large enough for one batch of a link dump.
const RECV_BUF_SIZE: usize = 32768;

/// Route socket bound to the network namespace of the thread that opened it.
pub(crate) struct RouteSocket {
    fd: AsyncFd<Socket>,
    seq: AtomicU32,
    pid: u32,
}

impl RouteSocket {
    pub fn open() -> Result<Self> {
        let mut socket = Socket::new(protocols::NETLINK_ROUTE)?;
        socket.set_non_blocking(true)?;

        let mut addr = SocketAddr::new(0, 0);
        socket.bind(&addr)?;
        socket.get_address(&mut addr)?;

        Ok(Self {
            pid: addr.port_number(),
            fd: AsyncFd::new(socket)?,
            seq: AtomicU32::new(1),
        })
    }

    /// Send a request, returning the sequence number its answers carry.
    pub async fn send(&self, request: LinkRequest) -> Result<u32> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let msg = request.finish(seq, self.pid);

        self.fd
            .async_io(Interest::WRITABLE, |socket| socket.send(&msg, 0))
            .await?;
        Ok(seq)
    }

    /// Receive one datagram.
    pub async fn recv(&self) -> Result<BytesMut> {
        let mut buf = BytesMut::with_capacity(RECV_BUF_SIZE);
        self.fd
            .async_io(Interest::READABLE, |socket| socket.recv(&mut buf, 0))
            .await?;
        Ok(buf)
    }
}
