//! Buffer pool management.
//!
//! The buffer pool is the in-memory cache layer between clients and a page
//! file. It manages a fixed pool of frames, each holding one page.
//!
//! # Components
//! - [`BufferPoolManager`] - The page cache: pin, unpin, dirty, write-back
//! - [`Frame`] - A slot in the buffer pool holding a page + control block
//! - [`PageHandle`] / [`PageGuard`] - Access to a pinned page
//! - [`BufferPoolStats`] - Hit/miss/eviction and I/O counters
//! - [`replacer`] - Eviction policy implementations

mod buffer_pool_manager;
mod frame;
mod page_guard;
pub mod replacer;
mod stats;

pub use buffer_pool_manager::BufferPoolManager;
pub use frame::Frame;
pub use page_guard::{PageGuard, PageHandle};
pub use replacer::{FrameMetadata, ReplacementPolicy, Replacer};
pub use stats::{BufferPoolStats, StatsSnapshot};
