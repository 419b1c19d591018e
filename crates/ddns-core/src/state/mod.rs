//! State store implementations
//!
//! - [`FileStateStore`]: Plain-text file surviving restarts
//! - [`MemoryStateStore`]: In-memory only

pub mod file;
pub mod memory;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;
