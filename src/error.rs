use crate::protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetpulseError {
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings file error: {0}")]
    Settings(String),

    #[error("Socket error: {0}")]
    Socket(String),

    #[error("Discovery error: {0}")]
    Discovery(String),
}

impl NetpulseError {
    /// True when the error is a read deadline expiring rather than a real failure.
    ///
    /// Linux reports an expired `SO_RCVTIMEO` as `WouldBlock`, other platforms
    /// as `TimedOut`.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            NetpulseError::Io(e)
                if matches!(e.kind(), std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock)
        )
    }
}

pub type Result<T> = std::result::Result<T, NetpulseError>;
