// Randomized byte-aligned chunk planning

use rand::Rng;

use crate::common::config::{DEFAULT_MAX_CHUNK_BYTES, DEFAULT_MIN_CHUNK_BYTES};
use crate::common::error::{Error, Result};

/// A remainder is whatever the byte-aligned chunks leave behind, so it is
/// never more than seven bit characters.
pub const MAX_REMAINDER_BITS: usize = 7;

/// Inclusive bounds, in bytes, for randomly drawn chunk sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    min_bytes: u64,
    max_bytes: u64,
}

impl Default for ChunkRange {
    fn default() -> Self {
        Self {
            min_bytes: DEFAULT_MIN_CHUNK_BYTES,
            max_bytes: DEFAULT_MAX_CHUNK_BYTES,
        }
    }
}

impl ChunkRange {
    pub fn new(min_bytes: u64, max_bytes: u64) -> Result<Self> {
        if min_bytes < 1 {
            return Err(Error::InvalidRange(format!(
                "minimum chunk size must be at least 1 byte, got {}",
                min_bytes
            )));
        }
        if max_bytes < min_bytes {
            return Err(Error::InvalidRange(format!(
                "maximum chunk size {} is smaller than minimum {}",
                max_bytes, min_bytes
            )));
        }
        Ok(Self {
            min_bytes,
            max_bytes,
        })
    }

    pub fn min_bytes(&self) -> u64 {
        self.min_bytes
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }
}

/// Partition of a document into whole-byte chunks plus a sub-byte tail.
///
/// Offsets are exclusive chunk ends counted in bit characters; every one
/// is a multiple of eight, and the last one plus `remainder_bits` equals
/// the document length the plan was drawn for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    offsets: Vec<u64>,
    remainder_bits: u64,
}

impl ChunkPlan {
    /// Draws a fresh partition of `total_bits`. Chunk sizes are uniform in
    /// the range, clamped down near the end so the plan never overruns the
    /// bytes that are left.
    pub fn plan<R: Rng>(total_bits: u64, range: ChunkRange, rng: &mut R) -> ChunkPlan {
        let mut bytes_left = total_bits / 8;
        let remainder_bits = total_bits % 8;

        let mut offsets = Vec::new();
        let mut end = 0u64;
        while bytes_left > 0 {
            let lo = range.min_bytes.min(bytes_left);
            let hi = range.max_bytes.min(bytes_left);
            let size = rng.gen_range(lo..=hi);
            bytes_left -= size;
            end += size * 8;
            offsets.push(end);
        }

        ChunkPlan {
            offsets,
            remainder_bits,
        }
    }

    /// Exclusive chunk-end offsets in bit characters.
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn remainder_bits(&self) -> u64 {
        self.remainder_bits
    }

    pub fn chunk_count(&self) -> u64 {
        self.offsets.len() as u64
    }

    /// Bit characters covered by the byte-aligned chunks.
    pub fn aligned_bits(&self) -> u64 {
        self.offsets.last().copied().unwrap_or(0)
    }

    pub fn total_bits(&self) -> u64 {
        self.aligned_bits() + self.remainder_bits
    }

    /// `(start, end)` bit ranges of the byte-aligned chunks, in order.
    pub fn ranges(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        let starts = std::iter::once(0).chain(self.offsets.iter().copied());
        starts.zip(self.offsets.iter().copied())
    }
}
