use crate::constants::ECHO_RECV_BUFFER_SIZE;
use crate::error::{NetpulseError, Result};
use crate::protocol::EchoPacket;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io::{ErrorKind, Read};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;
use tracing::{debug, warn};

/// Smallest read timeout handed to the OS; zero means "block forever" there
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Trait for ICMP echo socket operations
pub trait EchoSocket: Send + Sync {
    /// Send an echo request to `dest`
    fn send_echo(&self, packet: &EchoPacket, dest: Ipv4Addr) -> Result<usize>;

    /// Receive the next echo message
    fn recv_echo(&mut self) -> Result<EchoPacket>;

    /// Set the read timeout for the socket
    fn set_timeout(&self, timeout: Duration) -> Result<()>;

    /// Datagram ICMP sockets replace the identifier with their own port number
    fn rewrites_identifier(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SocketKind {
    Raw,
    Datagram,
}

/// ICMPv4 socket, raw when privileged, datagram ("ping socket") otherwise
#[derive(Debug)]
pub struct IcmpSocket {
    socket: Socket,
    kind: SocketKind,
}

impl IcmpSocket {
    /// Open a raw ICMP socket, falling back to an unprivileged datagram socket
    pub fn open() -> Result<Self> {
        match Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4)) {
            Ok(socket) => {
                debug!("Opened raw ICMP socket");
                Ok(Self {
                    socket,
                    kind: SocketKind::Raw,
                })
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                debug!(error = %e, "Raw ICMP socket denied, trying datagram ICMP");
                let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::ICMPV4))
                    .map_err(|e| {
                        warn!(error = %e, "Failed to open datagram ICMP socket");
                        NetpulseError::Socket(format!(
                            "ICMP sockets unavailable (needs CAP_NET_RAW or ping_group_range): {}",
                            e
                        ))
                    })?;
                Ok(Self {
                    socket,
                    kind: SocketKind::Datagram,
                })
            }
            Err(e) => {
                warn!(error = %e, "Failed to open raw ICMP socket");
                Err(NetpulseError::Socket(format!(
                    "Failed to open ICMP socket: {}",
                    e
                )))
            }
        }
    }
}

impl EchoSocket for IcmpSocket {
    fn send_echo(&self, packet: &EchoPacket, dest: Ipv4Addr) -> Result<usize> {
        let buf = packet.encode();
        let addr = SockAddr::from(SocketAddrV4::new(dest, 0));
        let bytes_sent = self.socket.send_to(&buf, &addr).map_err(|e| {
            warn!(error = %e, dest = %dest, "Failed to send echo request");
            NetpulseError::Io(e)
        })?;
        debug!(
            bytes_sent = bytes_sent,
            sequence = packet.sequence.0,
            dest = %dest,
            "Echo request sent"
        );
        Ok(bytes_sent)
    }

    fn recv_echo(&mut self) -> Result<EchoPacket> {
        let mut buf = [0u8; ECHO_RECV_BUFFER_SIZE];
        let len = self.socket.read(&mut buf).map_err(|e| {
            debug!(error = %e, "Failed to receive echo message");
            NetpulseError::Io(e)
        })?;
        let packet = EchoPacket::decode(&buf[..len])?;
        debug!(
            sequence = packet.sequence.0,
            bytes_received = len,
            "Echo message received"
        );
        Ok(packet)
    }

    fn set_timeout(&self, timeout: Duration) -> Result<()> {
        let timeout = timeout.max(MIN_READ_TIMEOUT);
        self.socket.set_read_timeout(Some(timeout)).map_err(|e| {
            warn!(error = %e, "Failed to set timeout");
            NetpulseError::Socket(format!("Failed to set timeout: {}", e))
        })
    }

    fn rewrites_identifier(&self) -> bool {
        self.kind == SocketKind::Datagram
    }
}


#[cfg(test)]
pub use tests::MockEchoSocket;
