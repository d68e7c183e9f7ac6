pub mod chunking;
pub mod client;
pub mod common;
pub mod protocol;
pub mod server;
pub mod transport;

// Export the building blocks so tests and callers can compose them
pub use crate::chunking::{ChunkPlan, ChunkRange};
pub use crate::common::config::{ClientConfig, ServerConfig, WireConfig};
pub use crate::common::error::{Error, Result};
pub use crate::protocol::{Packet, PacketCodec, PacketKind};
