use crate::constants::{ECHO_PAYLOAD, ICMP_HEADER_SIZE};
use crate::protocol::error::{ProtocolError, Result};
use tracing::debug;

const ICMP_ECHO_REPLY: u8 = 0;
const ICMP_ECHO_REQUEST: u8 = 8;

/// Minimum IPv4 header length in bytes
const IPV4_MIN_HEADER_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceNumber(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoKind {
    Request,
    Reply,
}

impl EchoKind {
    fn icmp_type(self) -> u8 {
        match self {
            EchoKind::Request => ICMP_ECHO_REQUEST,
            EchoKind::Reply => ICMP_ECHO_REPLY,
        }
    }
}

/// An ICMP echo request or reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoPacket {
    pub kind: EchoKind,
    pub identifier: u16,
    pub sequence: SequenceNumber,
    pub payload: Vec<u8>,
}

impl EchoPacket {
    pub fn request(identifier: u16, sequence: SequenceNumber) -> Self {
        Self {
            kind: EchoKind::Request,
            identifier,
            sequence,
            payload: ECHO_PAYLOAD.to_vec(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(ICMP_HEADER_SIZE + self.payload.len());
        buf.push(self.kind.icmp_type());
        buf.push(0); // code
        buf.extend_from_slice(&[0, 0]); // checksum placeholder
        buf.extend_from_slice(&self.identifier.to_be_bytes());
        buf.extend_from_slice(&self.sequence.0.to_be_bytes());
        buf.extend_from_slice(&self.payload);

        let sum = checksum(&buf);
        buf[2..4].copy_from_slice(&sum.to_be_bytes());
        buf
    }

    /// Decode an echo message.
    ///
    /// Raw sockets hand back the IPv4 header in front of the ICMP message,
    /// datagram ICMP sockets do not; both layouts are accepted.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let icmp = strip_ipv4_header(bytes)?;

        if icmp.len() < ICMP_HEADER_SIZE {
            debug!(
                expected = ICMP_HEADER_SIZE,
                actual = icmp.len(),
                "Invalid echo packet size"
            );
            return Err(ProtocolError::InvalidPacketSize {
                expected: ICMP_HEADER_SIZE,
                actual: icmp.len(),
            });
        }

        let kind = match icmp[0] {
            ICMP_ECHO_REPLY => EchoKind::Reply,
            ICMP_ECHO_REQUEST => EchoKind::Request,
            other => return Err(ProtocolError::UnexpectedType(other)),
        };

        let carried = u16::from_be_bytes([icmp[2], icmp[3]]);
        let mut scratch = icmp.to_vec();
        scratch[2] = 0;
        scratch[3] = 0;
        let computed = checksum(&scratch);
        if computed != carried {
            return Err(ProtocolError::ChecksumMismatch { computed, carried });
        }

        let packet = EchoPacket {
            kind,
            identifier: u16::from_be_bytes([icmp[4], icmp[5]]),
            sequence: SequenceNumber(u16::from_be_bytes([icmp[6], icmp[7]])),
            payload: icmp[ICMP_HEADER_SIZE..].to_vec(),
        };

        debug!(
            identifier = packet.identifier,
            sequence = packet.sequence.0,
            "Echo packet decoded successfully"
        );

        Ok(packet)
    }
}

fn strip_ipv4_header(bytes: &[u8]) -> Result<&[u8]> {
    match bytes.first() {
        Some(first) if first >> 4 == 4 => {
            let header_len = usize::from(first & 0x0f) * 4;
            if header_len < IPV4_MIN_HEADER_SIZE || bytes.len() < header_len {
                return Err(ProtocolError::InvalidPacketSize {
                    expected: header_len.max(IPV4_MIN_HEADER_SIZE),
                    actual: bytes.len(),
                });
            }
            Ok(&bytes[header_len..])
        }
        _ => Ok(bytes),
    }
}

/// RFC 1071 internet checksum
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u32::from(u16::from_be_bytes([chunk[0], chunk[1]]));
    }
    if let [last] = chunks.remainder() {
        sum += u32::from(*last) << 8;
    }
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}
