//! `Store` implementations bundled with this crate.

pub mod memory;

pub use memory::MemoryStore;
