//! rtnetlink wire format: the headers and attributes the link requests use.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::error::{Error, Result};

/// Netlink message and attribute alignment.
const ALIGN_TO: usize = 4;

pub(crate) const fn align(len: usize) -> usize {
    (len + ALIGN_TO - 1) & !(ALIGN_TO - 1)
}

/// Message types.
pub(crate) const NLMSG_ERROR: u16 = 2;
pub(crate) const NLMSG_DONE: u16 = 3;
pub(crate) const RTM_GETLINK: u16 = 18;
pub(crate) const RTM_SETLINK: u16 = 19;

/// Message flags.
pub(crate) const NLM_F_REQUEST: u16 = 0x01;
pub(crate) const NLM_F_MULTI: u16 = 0x02;
pub(crate) const NLM_F_ACK: u16 = 0x04;
pub(crate) const NLM_F_DUMP: u16 = 0x100 | 0x200;

/// Link attributes.
pub(crate) const IFLA_IFNAME: u16 = 3;
pub(crate) const IFLA_LINK: u16 = 5;
pub(crate) const IFLA_LINKINFO: u16 = 18;
pub(crate) const IFLA_INFO_KIND: u16 = 1;

/// Top bits of `nla_type` carry flags, not the type.
const NLA_TYPE_MASK: u16 = 0x3fff;

/// struct nlmsghdr
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub(crate) struct Header {
    pub len: u32,
    pub kind: u16,
    pub flags: u16,
    pub seq: u32,
    pub pid: u32,
}

pub(crate) const HEADER_LEN: usize = std::mem::size_of::<Header>();

/// struct ifinfomsg
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub(crate) struct IfInfoMsg {
    pub family: u8,
    pub pad: u8,
    pub kind: u16,
    pub index: i32,
    pub flags: u32,
    pub change: u32,
}

/// struct rtattr
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct AttrHeader {
    len: u16,
    kind: u16,
}

const ATTR_HEADER_LEN: usize = std::mem::size_of::<AttrHeader>();

/// A link request: `nlmsghdr` + `ifinfomsg` + attributes.
///
/// Sequence number and port id are stamped by the socket on send.
#[derive(Debug, Clone)]
pub(crate) struct LinkRequest {
    buf: Vec<u8>,
}

impl LinkRequest {
    pub fn new(kind: u16, flags: u16, index: u32) -> Self {
        let header = Header {
            kind,
            flags: NLM_F_REQUEST | flags,
            ..Default::default()
        };
        let ifinfo = IfInfoMsg {
            index: index as i32,
            ..Default::default()
        };

        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(header.as_bytes());
        buf.extend_from_slice(ifinfo.as_bytes());
        Self { buf }
    }

    /// Append a NUL-terminated string attribute.
    pub fn string(mut self, kind: u16, value: &str) -> Self {
        let len = ATTR_HEADER_LEN + value.len() + 1;
        let header = AttrHeader {
            len: len as u16,
            kind,
        };
        self.buf.extend_from_slice(header.as_bytes());
        self.buf.extend_from_slice(value.as_bytes());
        self.buf.push(0);
        self.buf.resize(align(self.buf.len()), 0);
        self
    }

    /// Finish the message for the given sequence number and port id.
    pub fn finish(mut self, seq: u32, pid: u32) -> Vec<u8> {
        let len = self.buf.len() as u32;
        self.buf[0..4].copy_from_slice(&len.to_ne_bytes());
        self.buf[8..12].copy_from_slice(&seq.to_ne_bytes());
        self.buf[12..16].copy_from_slice(&pid.to_ne_bytes());
        self.buf
    }
}

/// One message out of a receive buffer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Message<'a> {
    pub header: Header,
    pub payload: &'a [u8],
}

/// Split a datagram into messages. A bad length ends the iteration with an error.
pub(crate) fn messages(mut data: &[u8]) -> impl Iterator<Item = Result<Message<'_>>> {
    std::iter::from_fn(move || {
        if data.len() < HEADER_LEN {
            return None;
        }
        let (header, _) = Header::read_from_prefix(data).ok()?;
        let len = header.len as usize;
        if len < HEADER_LEN || len > data.len() {
            data = &[];
            return Some(Err(Error::Malformed(format!(
                "message length {} out of bounds",
                len
            ))));
        }

        let payload = &data[HEADER_LEN..len];
        data = data.get(align(len)..).unwrap_or(&[]);
        Some(Ok(Message { header, payload }))
    })
}

/// Walk the attributes of a payload as `(type, value)` pairs.
pub(crate) fn attributes(mut data: &[u8]) -> impl Iterator<Item = (u16, &[u8])> {
    std::iter::from_fn(move || {
        let (header, _) = AttrHeader::read_from_prefix(data).ok()?;
        let len = header.len as usize;
        if len < ATTR_HEADER_LEN || len > data.len() {
            return None;
        }

        let value = &data[ATTR_HEADER_LEN..len];
        let kind = header.kind & NLA_TYPE_MASK;
        data = data.get(align(len)..).unwrap_or(&[]);
        Some((kind, value))
    })
}

/// Decode a string attribute, dropping the trailing NUL.
pub(crate) fn attr_string(value: &[u8]) -> Result<String> {
    let end = value.iter().position(|&b| b == 0).unwrap_or(value.len());
    std::str::from_utf8(&value[..end])
        .map(str::to_string)
        .map_err(|e| Error::Malformed(format!("attribute is not UTF-8: {}", e)))
}

/// Decode a native-endian u32 attribute.
pub(crate) fn attr_u32(value: &[u8]) -> Result<u32> {
    value
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_ne_bytes)
        .ok_or_else(|| Error::Malformed(format!("u32 attribute of {} bytes", value.len())))
}

/// The errno of an `NLMSG_ERROR` payload; zero is an ACK.
pub(crate) fn error_code(payload: &[u8]) -> Result<i32> {
    payload
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .map(i32::from_ne_bytes)
        .ok_or_else(|| Error::Malformed("short error message".into()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const RTM_NEWLINK: u16 = 16;

    /// Build a kernel-side message for parser tests.
    pub(crate) fn reply(kind: u16, flags: u16, seq: u32, payload: &[u8]) -> Vec<u8> {
        let header = Header {
            len: (HEADER_LEN + payload.len()) as u32,
            kind,
            flags,
            seq,
            pid: 0,
        };
        let mut buf = header.as_bytes().to_vec();
        buf.extend_from_slice(payload);
        buf.resize(align(buf.len()), 0);
        buf
    }

    #[test]
    fn test_rename_request_layout() {
        let msg = LinkRequest::new(RTM_SETLINK, NLM_F_ACK, 42)
            .string(IFLA_IFNAME, "vweb-0")
            .finish(9, 1234);

        // header + ifinfomsg + attr header + "vweb-0\0" padded to 8
        assert_eq!(msg.len(), 16 + 16 + 4 + 8);

        let (header, rest) = Header::read_from_prefix(&msg).unwrap();
        assert_eq!(header.len as usize, msg.len());
        assert_eq!(header.kind, RTM_SETLINK);
        assert_eq!(header.flags, NLM_F_REQUEST | NLM_F_ACK);
        assert_eq!((header.seq, header.pid), (9, 1234));

        let (ifinfo, attrs) = IfInfoMsg::read_from_prefix(rest).unwrap();
        assert_eq!(ifinfo.index, 42);

        let (kind, value) = attributes(attrs).next().unwrap();
        assert_eq!(kind, IFLA_IFNAME);
        assert_eq!(attr_string(value).unwrap(), "vweb-0");
    }

    #[test]
    fn test_messages_in_one_datagram() {
        let mut data = reply(RTM_NEWLINK, NLM_F_MULTI, 7, &[1, 2, 3]);
        data.extend(reply(NLMSG_DONE, NLM_F_MULTI, 7, &0i32.to_ne_bytes()));

        let msgs: Vec<_> = messages(&data).collect::<Result<_>>().unwrap();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].header.kind, RTM_NEWLINK);
        assert_eq!(msgs[0].payload, &[1, 2, 3]);
        assert_eq!(msgs[1].header.kind, NLMSG_DONE);
    }

    #[test]
    fn test_oversized_message_length() {
        let mut data = reply(RTM_NEWLINK, 0, 1, &[0; 4]);
        data[0] = 0xff;
        let mut iter = messages(&data);
        assert!(matches!(iter.next(), Some(Err(Error::Malformed(_)))));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_nested_flag_masked_and_bogus_length_stops() {
        let mut buf = AttrHeader {
            len: 4,
            kind: IFLA_LINKINFO | 0x8000,
        }
        .as_bytes()
        .to_vec();
        buf.extend_from_slice(AttrHeader { len: 200, kind: 3 }.as_bytes());

        let attrs: Vec<_> = attributes(&buf).collect();
        assert_eq!(attrs, vec![(IFLA_LINKINFO, &[][..])]);
    }

    #[test]
    fn test_short_u32() {
        assert!(attr_u32(&[1, 2]).is_err());
        assert_eq!(attr_u32(&7u32.to_ne_bytes()).unwrap(), 7);
    }
}
