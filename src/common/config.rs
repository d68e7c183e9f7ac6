// Configuration types and defaults

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::chunking::ChunkRange;
use crate::common::error::Result;

pub const DEFAULT_TYPE_BYTES: usize = 2;
pub const DEFAULT_LEN_BYTES: usize = 4;
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MIN_CHUNK_BYTES: u64 = 1;
pub const DEFAULT_MAX_CHUNK_BYTES: u64 = 1_000_000_000;
pub const DEFAULT_OUTPUT_DIR: &str = "files";

/// Header field widths, counted in logical bytes. A field of `n` logical
/// bytes occupies `8 * n` wire bytes, one per binary digit character.
///
/// Both peers must be constructed with identical widths; nothing on the
/// wire negotiates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireConfig {
    pub type_bytes: usize,
    pub len_bytes: usize,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            type_bytes: DEFAULT_TYPE_BYTES,
            len_bytes: DEFAULT_LEN_BYTES,
        }
    }
}

impl WireConfig {
    pub fn type_bits(&self) -> usize {
        self.type_bytes * 8
    }

    pub fn len_bits(&self) -> usize {
        self.len_bytes * 8
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_addr: SocketAddr,
    pub chunk_range: ChunkRange,
    pub output_dir: PathBuf,
    pub wire: WireConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8000".parse().unwrap(),
            chunk_range: ChunkRange::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            wire: WireConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self {
            server_addr,
            ..Default::default()
        }
    }

    pub fn with_chunk_range(mut self, min_bytes: u64, max_bytes: u64) -> Result<Self> {
        self.chunk_range = ChunkRange::new(min_bytes, max_bytes)?;
        Ok(self)
    }

    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    pub fn with_wire(mut self, wire: WireConfig) -> Self {
        self.wire = wire;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub max_chunks: Option<u64>,
    pub wire: WireConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".parse().unwrap(),
            max_chunks: None,
            wire: WireConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            ..Default::default()
        }
    }

    pub fn with_max_chunks(mut self, max_chunks: Option<u64>) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    pub fn with_wire(mut self, wire: WireConfig) -> Self {
        self.wire = wire;
        self
    }
}
