//! Storage layer - the disk block service behind the buffer pool.
//!
//! This module handles persistent storage:
//! - [`BlockStore`] - The narrow interface the pool reads and writes through
//! - [`DiskManager`] - File-backed block store
//! - [`MemoryBlockStore`] - Heap-backed block store for tests and benchmarks
//! - [`page`] - The fixed-size page buffer

mod block_store;
mod disk_manager;
mod memory_store;
pub mod page;

pub use block_store::BlockStore;
pub use disk_manager::DiskManager;
pub use memory_store::MemoryBlockStore;
