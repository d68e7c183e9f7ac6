// Chunking module - randomized document partitioning

pub mod planner;

pub use planner::{ChunkPlan, ChunkRange, MAX_REMAINDER_BITS};
