//! Streaming decoder for `/events`.
//!
//! The daemon answers with one JSON object per line over a body that stays
//! open for as long as the subscription lives.

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::{Bytes, BytesMut};
use hyper::body::Body;
use tokio_stream::Stream;

use super::NetworkEvent;
use super::types::Event;
use crate::error::{Error, Result};

/// Stream of events decoded from a newline-delimited JSON body.
///
/// Lines that fail to decode are logged and skipped. A body error is yielded
/// once as `Err(Error::Http)`, after which the stream ends.
pub struct EventStream<B> {
    body: B,
    buf: BytesMut,
    done: bool,
}

impl<B> EventStream<B> {
    /// Wrap a response body.
    pub fn new(body: B) -> Self {
        Self {
            body,
            buf: BytesMut::new(),
            done: false,
        }
    }

    /// Decode the next complete line in the buffer, if any.
    fn next_buffered(&mut self) -> Option<NetworkEvent> {
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line = self.buf.split_to(pos + 1);
            let line = line[..pos].trim_ascii();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_slice::<Event>(line) {
                Ok(event) => return Some(event.into()),
                Err(e) => tracing::warn!("skipping undecodable docker event: {}", e),
            }
        }
        None
    }
}

impl<B> Stream for EventStream<B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: std::fmt::Display,
{
    type Item = Result<NetworkEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(event) = this.next_buffered() {
                return Poll::Ready(Some(Ok(event)));
            }
            if this.done {
                return Poll::Ready(None);
            }

            match ready!(Pin::new(&mut this.body).poll_frame(cx)) {
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        this.buf.extend_from_slice(&data);
                    }
                }
                Some(Err(e)) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(Error::Http(e.to_string()))));
                }
                None => {
                    // Flush a final line without trailing newline.
                    this.done = true;
                    if !this.buf.is_empty() {
                        this.buf.extend_from_slice(b"\n");
                    }
                }
            }
        }
    }
}
