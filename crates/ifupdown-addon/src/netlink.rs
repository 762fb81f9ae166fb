//! Kernel netlink capability.
//!
//! A `NETLINK_ROUTE` socket opened on first use (or eagerly through
//! [`Netlink::connect`]). Requests are synchronous: every call sends one
//! request and reads replies until the kernel acknowledges or finishes
//! the dump.

use std::fmt;

use tracing::{debug, instrument};

use crate::cache::LinkInfo;
use crate::error::AddonResult;

/// Formats a hardware address as colon separated hex.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn format_mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(target_os = "linux")]
mod linux {
    use super::format_mac;
    use crate::cache::LinkInfo;
    use crate::error::{AddonError, AddonResult};
    use netlink_packet_core::{
        NetlinkHeader, NetlinkMessage, NetlinkPayload, NLM_F_ACK, NLM_F_DUMP, NLM_F_REQUEST,
    };
    use netlink_packet_route::link::{LinkAttribute, LinkFlags, LinkMessage};
    use netlink_packet_route::RouteNetlinkMessage;
    use netlink_sys::{protocols::NETLINK_ROUTE, Socket, SocketAddr};
    use tracing::trace;

    /// Header flags of a dump request.
    pub const DUMP_FLAGS: u16 = NLM_F_REQUEST | NLM_F_DUMP;
    /// Header flags of a change the kernel must acknowledge.
    pub const ACK_FLAGS: u16 = NLM_F_REQUEST | NLM_F_ACK;

    /// Serializes one request.
    pub fn encode_request(sequence: u32, flags: u16, payload: RouteNetlinkMessage) -> Vec<u8> {
        let mut header = NetlinkHeader::default();
        header.flags = flags;
        header.sequence_number = sequence;

        let mut packet = NetlinkMessage::new(header, NetlinkPayload::InnerMessage(payload));
        packet.finalize();

        let mut buf = vec![0u8; packet.buffer_len()];
        packet.serialize(&mut buf);
        buf
    }

    pub struct NetlinkSocket {
        socket: Socket,
        sequence: u32,
    }

    impl NetlinkSocket {
        pub fn open() -> AddonResult<Self> {
            let mut socket = Socket::new(NETLINK_ROUTE)
                .map_err(|e| AddonError::netlink("socket", e.to_string()))?;
            socket
                .bind_auto()
                .map_err(|e| AddonError::netlink("bind", e.to_string()))?;
            socket
                .connect(&SocketAddr::new(0, 0))
                .map_err(|e| AddonError::netlink("connect", e.to_string()))?;

            Ok(Self {
                socket,
                sequence: 0,
            })
        }

        fn request(
            &mut self,
            operation: &str,
            flags: u16,
            payload: RouteNetlinkMessage,
        ) -> AddonResult<Vec<RouteNetlinkMessage>> {
            self.sequence = self.sequence.wrapping_add(1);
            let buf = encode_request(self.sequence, flags, payload);

            self.socket
                .send(&buf, 0)
                .map_err(|e| AddonError::netlink(operation, e.to_string()))?;

            self.replies(operation)
        }

        fn replies(&mut self, operation: &str) -> AddonResult<Vec<RouteNetlinkMessage>> {
            let mut messages = Vec::new();

            loop {
                let (buf, _) = self
                    .socket
                    .recv_from_full()
                    .map_err(|e| AddonError::netlink(operation, e.to_string()))?;

                let mut offset = 0;
                while offset < buf.len() {
                    let msg = NetlinkMessage::<RouteNetlinkMessage>::deserialize(&buf[offset..])
                        .map_err(|e| AddonError::netlink(operation, e.to_string()))?;
                    let length = msg.header.length as usize;

                    match msg.payload {
                        NetlinkPayload::Done(_) => return Ok(messages),
                        NetlinkPayload::Error(err) => {
                            return match err.code {
                                // An error message without code is an ACK.
                                None => Ok(messages),
                                Some(code) => Err(AddonError::netlink(
                                    operation,
                                    std::io::Error::from_raw_os_error(-code.get()).to_string(),
                                )),
                            };
                        }
                        NetlinkPayload::InnerMessage(inner) => messages.push(inner),
                        _ => {}
                    }

                    if length == 0 {
                        break;
                    }
                    // Align to 4 bytes (netlink alignment requirement)
                    offset = (offset + length + 3) & !3;
                }

                trace!(operation, count = messages.len(), "Netlink replies so far");
            }
        }

        pub fn dump_links(&mut self) -> AddonResult<Vec<LinkInfo>> {
            let replies = self.request(
                "dump_links",
                DUMP_FLAGS,
                RouteNetlinkMessage::GetLink(LinkMessage::default()),
            )?;

            Ok(replies
                .iter()
                .filter_map(|msg| match msg {
                    RouteNetlinkMessage::NewLink(link) => link_info_from_message(link),
                    _ => None,
                })
                .collect())
        }

        pub fn set_mtu(&mut self, ifindex: u32, mtu: u32) -> AddonResult<()> {
            let mut msg = LinkMessage::default();
            msg.header.index = ifindex;
            msg.attributes.push(LinkAttribute::Mtu(mtu));

            self.request(
                "link_set_mtu",
                ACK_FLAGS,
                RouteNetlinkMessage::SetLink(msg),
            )
            .map(|_| ())
        }

        pub fn set_admin_state(&mut self, ifindex: u32, up: bool) -> AddonResult<()> {
            let mut msg = LinkMessage::default();
            msg.header.index = ifindex;
            msg.header.change_mask = LinkFlags::Up;
            if up {
                msg.header.flags = LinkFlags::Up;
            }

            self.request(
                "link_set_admin_state",
                ACK_FLAGS,
                RouteNetlinkMessage::SetLink(msg),
            )
            .map(|_| ())
        }
    }

    /// Extracts the fields the link cache keeps. Messages without a name
    /// are dropped.
    pub fn link_info_from_message(msg: &LinkMessage) -> Option<LinkInfo> {
        let mut info = LinkInfo::new(msg.header.index, String::new());
        info.up = msg.header.flags.contains(LinkFlags::Up);

        for attr in &msg.attributes {
            match attr {
                LinkAttribute::IfName(name) => info.name = name.clone(),
                LinkAttribute::Mtu(mtu) => info.mtu = Some(*mtu),
                LinkAttribute::Address(bytes) => info.address = Some(format_mac(bytes)),
                _ => {}
            }
        }

        if info.name.is_empty() {
            None
        } else {
            Some(info)
        }
    }

}

#[cfg(target_os = "linux")]
use linux::NetlinkSocket;

/// Stand-in for platforms without rtnetlink (development only).
#[cfg(not(target_os = "linux"))]
mod mock {
    use crate::cache::LinkInfo;
    use crate::error::{AddonError, AddonResult};

    pub struct NetlinkSocket;

    fn unavailable(operation: &str) -> AddonError {
        AddonError::netlink(operation, "netlink is only available on Linux")
    }

    impl NetlinkSocket {
        pub fn open() -> AddonResult<Self> {
            Err(unavailable("socket"))
        }

        pub fn dump_links(&mut self) -> AddonResult<Vec<LinkInfo>> {
            Err(unavailable("dump_links"))
        }

        pub fn set_mtu(&mut self, _ifindex: u32, _mtu: u32) -> AddonResult<()> {
            Err(unavailable("link_set_mtu"))
        }

        pub fn set_admin_state(&mut self, _ifindex: u32, _up: bool) -> AddonResult<()> {
            Err(unavailable("link_set_admin_state"))
        }
    }

}

#[cfg(not(target_os = "linux"))]
use mock::NetlinkSocket;

/// Netlink capability state.
#[derive(Default)]
pub struct Netlink {
    socket: Option<NetlinkSocket>,
}

impl fmt::Debug for Netlink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Netlink")
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl Netlink {
    /// Creates the capability without opening a socket.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    /// Opens the socket if it is not open yet.
    pub fn connect(&mut self) -> AddonResult<()> {
        self.socket().map(|_| ())
    }

    fn socket(&mut self) -> AddonResult<&mut NetlinkSocket> {
        let socket = match self.socket.take() {
            Some(socket) => socket,
            None => {
                let socket = NetlinkSocket::open()?;
                debug!("Netlink socket connected");
                socket
            }
        };
        Ok(self.socket.insert(socket))
    }

    /// Dumps every link known to the kernel.
    #[instrument(skip(self))]
    pub fn dump_links(&mut self) -> AddonResult<Vec<LinkInfo>> {
        let links = self.socket()?.dump_links()?;
        debug!(count = links.len(), "Dumped links");
        Ok(links)
    }

    #[instrument(skip(self))]
    pub fn link_set_mtu(&mut self, ifindex: u32, mtu: u32) -> AddonResult<()> {
        self.socket()?.set_mtu(ifindex, mtu)
    }

    /// Sets IFF_UP on or off.
    #[instrument(skip(self))]
    pub fn link_set_admin_state(&mut self, ifindex: u32, up: bool) -> AddonResult<()> {
        self.socket()?.set_admin_state(ifindex, up)
    }
}
