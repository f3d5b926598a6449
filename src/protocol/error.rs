use thiserror::Error;

/// Protocol-level errors for packet encoding/decoding
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid packet size: expected at least {expected}, got {actual}")]
    InvalidPacketSize { expected: usize, actual: usize },

    #[error("Checksum mismatch: computed {computed:#06x}, packet carries {carried:#06x}")]
    ChecksumMismatch { computed: u16, carried: u16 },

    #[error("Unexpected ICMP type {0}")]
    UnexpectedType(u8),

    #[error("Frame buffer too small for {0}")]
    FrameBuffer(&'static str),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
