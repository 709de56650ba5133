//! Error types for the buffer manager.

use thiserror::Error;

use crate::common::PageId;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors raised by the buffer pool and its block stores.
///
/// Every failure is returned to the caller. Nothing is printed and skipped.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the backing page file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Shutdown or a full flush was attempted while frames are pinned.
    #[error("buffer pool is in use: {pinned} frame(s) still pinned")]
    PoolBusy { pinned: usize },

    /// The page is not resident in the buffer pool.
    #[error("{0} is not resident in the buffer pool")]
    PageNotFound(PageId),

    /// Unpin was called on a page whose pin count is already zero.
    ///
    /// This indicates a bug - unpinning should match pinning.
    #[error("{0} is not pinned")]
    NotPinned(PageId),

    /// `force_page` was called on a clean frame.
    #[error("{0} was not modified")]
    PageNotModified(PageId),

    /// The requested page number is negative or the sentinel.
    #[error("invalid page number: {0}")]
    InvalidPageNumber(i64),

    /// Pin missed and every frame in the pool is pinned.
    #[error("buffer pool exhausted: all {pool_size} frames are pinned")]
    PoolExhausted { pool_size: usize },

    /// The block store was asked to read a page beyond its end.
    #[error("{page_id} does not exist (page file holds {page_count} pages)")]
    NonExistingPage { page_id: PageId, page_count: u32 },

    /// Invalid pool configuration (zero capacity, unknown policy, bad file).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The pool has already been shut down.
    #[error("buffer pool has been shut down")]
    PoolClosed,
}
