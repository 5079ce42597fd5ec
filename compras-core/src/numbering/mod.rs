//! Document numbering

mod allocator;

pub use allocator::{ResetAck, SequenceAllocator};
