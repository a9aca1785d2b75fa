//! Search index backends that live next to the pipeline instead of in a hosted service.
mod memory_index;

pub use memory_index::MemoryIndex;
