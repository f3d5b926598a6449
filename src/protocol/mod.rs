//! Wire formats used by the probe and discovery routines

pub mod arp;
pub mod echo;
pub mod error;

pub use arp::{build_request, parse_reply, ArpEndpoint, ArpReply};
pub use echo::{checksum, EchoKind, EchoPacket, SequenceNumber};
pub use error::{ProtocolError, Result as ProtocolResult};
