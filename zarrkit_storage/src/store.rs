//! Stores.
//!
//! Additional stores are provided by other crates (e.g. `zarrkit_filesystem`).

mod memory_store;
pub use memory_store::MemoryStore;
