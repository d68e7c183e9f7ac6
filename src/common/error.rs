// Error types and error handling

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Socket or file I/O failed underneath the protocol.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Bytes on the wire do not decode as any known packet.
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    /// The peer closed the stream short of the bytes a packet needs.
    #[error("transport closed early: got {got} of {expected} expected bytes")]
    TransportClosed { expected: usize, got: usize },

    /// Chunk size bounds that can never produce a plan.
    #[error("invalid chunk range: {0}")]
    InvalidRange(String),

    /// A well-formed packet arrived where the exchange does not allow it.
    #[error("protocol violation: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, Error>;
