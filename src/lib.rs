//! bufmgr - A fixed-capacity page buffer pool with interchangeable
//! replacement policies.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        client code                              │
//! │        pin_page / unpin_page / mark_dirty / force_page          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │       Buffer Pool (buffer/)                             │   │
//! │  │   ┌─────────────────────────────────────────────────┐   │   │
//! │  │   │  Replacement policies: FIFO | LRU | CLOCK | LFU │   │   │
//! │  │   │        (chosen when the pool is opened)         │   │   │
//! │  │   └─────────────────────────────────────────────────┘   │   │
//! │  │      BufferPoolManager + Frame + Statistics              │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Storage Layer (storage/)                       │   │
//! │  │     BlockStore: DiskManager (file) | MemoryBlockStore    │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FrameId, Error, config)
//! - [`buffer`] - Buffer pool management and eviction policies
//! - [`storage`] - Block stores and the page buffer
//!
//! # Quick Start
//! ```no_run
//! use bufmgr::{BufferPoolManager, PageId, ReplacementPolicy};
//!
//! let mut pool = BufferPoolManager::open("pages.bin", 16, ReplacementPolicy::Lru)?;
//!
//! let page = pool.pin_page(PageId::new(0))?;
//! page.write().as_mut_slice()[..5].copy_from_slice(b"hello");
//! page.mark_dirty()?;
//! page.unpin()?;
//!
//! pool.shutdown()?;
//! # Ok::<(), bufmgr::Error>(())
//! ```

pub mod buffer;
pub mod common;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{BufferPoolConfig, Error, FrameId, PageId, Result};

pub use buffer::{
    BufferPoolManager, BufferPoolStats, Frame, FrameMetadata, PageGuard, PageHandle,
    ReplacementPolicy, Replacer, StatsSnapshot,
};
pub use storage::page::Page;
pub use storage::{BlockStore, DiskManager, MemoryBlockStore};
