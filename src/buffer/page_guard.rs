//! Handles for pinned pages.
//!
//! - [`PageHandle`] - a pinned page; the client unpins it explicitly
//! - [`PageGuard`] - a [`PageHandle`] that unpins itself when dropped
//!
//! Both borrow the pool, so the pool cannot be shut down (which needs
//! `&mut self`) while any of them is alive.

use std::fmt;
use std::ops::Deref;

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

use crate::buffer::{BufferPoolManager, Frame};
use crate::common::{FrameId, PageId, Result};
use crate::storage::page::Page;

/// A pinned page.
///
/// Page bytes are reached through [`read`](Self::read) and
/// [`write`](Self::write), which take the frame's latch but not the pool
/// latch. Their guards borrow the handle, so the bytes stay locked only
/// while the page is pinned. Writing through the handle does not mark the
/// page dirty; call [`mark_dirty`](Self::mark_dirty) for that.
///
/// Dropping a handle does NOT unpin the page. Either call
/// [`unpin`](Self::unpin) or `BufferPoolManager::unpin_page`. A handle used
/// after its page was unpinned through the pool may observe another page.
///
/// # Example
/// ```
/// use bufmgr::{BufferPoolManager, MemoryBlockStore, PageId, ReplacementPolicy};
///
/// let pool = BufferPoolManager::new(2, ReplacementPolicy::Lru, MemoryBlockStore::new())?;
///
/// let page = pool.pin_page(PageId::new(0))?;
/// page.write().as_mut_slice()[..5].copy_from_slice(b"hello");
/// page.mark_dirty()?;
/// page.unpin()?;
/// # Ok::<(), bufmgr::Error>(())
/// ```
///
/// A byte guard cannot outlive the pin it came from:
/// ```compile_fail
/// use bufmgr::{BufferPoolManager, MemoryBlockStore, PageId, ReplacementPolicy};
///
/// let pool = BufferPoolManager::new(1, ReplacementPolicy::Fifo, MemoryBlockStore::new())?;
/// let page = pool.pin_page(PageId::new(0))?;
/// let bytes = page.read();
/// page.unpin()?;
/// assert_eq!(bytes.as_slice()[0], 0);
/// # Ok::<(), bufmgr::Error>(())
/// ```
pub struct PageHandle<'a> {
    pool: &'a BufferPoolManager,
    frame: &'a Frame,
    frame_id: FrameId,
    page_id: PageId,
}

impl<'a> PageHandle<'a> {
    /// Called by `BufferPoolManager::pin_page()` with the pool latch held.
    pub(crate) fn new(
        pool: &'a BufferPoolManager,
        frame: &'a Frame,
        frame_id: FrameId,
        page_id: PageId,
    ) -> Self {
        Self {
            pool,
            frame,
            frame_id,
            page_id,
        }
    }

    /// Get the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Get the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Shared access to the page bytes.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Page> {
        self.frame.page()
    }

    /// Exclusive access to the page bytes.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, Page> {
        self.frame.page_mut()
    }

    /// Mark the page as modified.
    pub fn mark_dirty(&self) -> Result<()> {
        self.pool.mark_dirty(self.page_id)
    }

    /// Release this pin.
    pub fn unpin(self) -> Result<()> {
        self.pool.unpin_page(self.page_id)
    }
}

impl fmt::Debug for PageHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageHandle")
            .field("page_id", &self.page_id)
            .field("frame_id", &self.frame_id)
            .finish()
    }
}

/// A pinned page that unpins itself when dropped.
///
/// Returned by `BufferPoolManager::fetch_page`. Derefs to [`PageHandle`].
///
/// # Example
/// ```
/// use bufmgr::{BufferPoolManager, MemoryBlockStore, PageId, ReplacementPolicy};
///
/// let pool = BufferPoolManager::new(2, ReplacementPolicy::Fifo, MemoryBlockStore::new())?;
/// {
///     let guard = pool.fetch_page(PageId::new(3))?;
///     assert_eq!(pool.get_pin_count(guard.page_id()), Some(1));
/// }
/// assert_eq!(pool.get_pin_count(PageId::new(3)), Some(0));
/// # Ok::<(), bufmgr::Error>(())
/// ```
pub struct PageGuard<'a> {
    handle: PageHandle<'a>,
}

impl<'a> PageGuard<'a> {
    pub(crate) fn new(handle: PageHandle<'a>) -> Self {
        Self { handle }
    }
}

impl<'a> Deref for PageGuard<'a> {
    type Target = PageHandle<'a>;

    #[inline]
    fn deref(&self) -> &PageHandle<'a> {
        &self.handle
    }
}

impl fmt::Debug for PageGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PageGuard").field(&self.handle).finish()
    }
}

impl Drop for PageGuard<'_> {
    fn drop(&mut self) {
        // Can only fail if the page was already unpinned through the pool.
        if let Err(e) = self.handle.pool.unpin_page(self.handle.page_id) {
            warn!(page_id = %self.handle.page_id, error = %e, "page guard could not unpin");
        }
    }
}
