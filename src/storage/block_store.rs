//! Block store - the disk block service the buffer pool reads and writes through.

use crate::common::{PageId, Result};
use crate::storage::page::Page;

/// A paged file: a sequence of fixed-size blocks addressed by [`PageId`].
///
/// The buffer pool only ever calls these methods; it never touches files
/// directly. Page `k` is the `k`-th block of [`PAGE_SIZE`] bytes, and every
/// transfer is exactly one page.
///
/// Implementations are not required to be thread-safe beyond `Send`: the
/// pool serializes all calls behind its latch.
///
/// [`PAGE_SIZE`]: crate::common::config::PAGE_SIZE
pub trait BlockStore: Send {
    /// Number of whole pages currently in the store.
    fn page_count(&self) -> u32;

    /// Grow the store by one zero-filled page. Returns its id.
    fn append_empty_block(&mut self) -> Result<PageId>;

    /// Read page `page_id` into `page`.
    ///
    /// # Errors
    /// `Error::NonExistingPage` if `page_id >= page_count()`.
    fn read_block(&mut self, page_id: PageId, page: &mut Page) -> Result<()>;

    /// Overwrite page `page_id` with `page`, extending the store if needed.
    fn write_block(&mut self, page_id: PageId, page: &Page) -> Result<()>;

    /// Push buffered writes to durable storage.
    fn sync(&mut self) -> Result<()> {
        Ok(())
    }

    /// Human-readable name of the backing store (a path, or `<memory>`).
    fn location(&self) -> String;

    /// Append empty pages until the store holds at least `page_count` pages.
    ///
    /// Returns the number of pages appended.
    fn ensure_capacity(&mut self, page_count: u32) -> Result<u32> {
        let mut appended = 0;
        while self.page_count() < page_count {
            self.append_empty_block()?;
            appended += 1;
        }
        Ok(appended)
    }
}

impl<S: BlockStore + ?Sized> BlockStore for Box<S> {
    fn page_count(&self) -> u32 {
        (**self).page_count()
    }

    fn append_empty_block(&mut self) -> Result<PageId> {
        (**self).append_empty_block()
    }

    fn read_block(&mut self, page_id: PageId, page: &mut Page) -> Result<()> {
        (**self).read_block(page_id, page)
    }

    fn write_block(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        (**self).write_block(page_id, page)
    }

    fn sync(&mut self) -> Result<()> {
        (**self).sync()
    }

    fn location(&self) -> String {
        (**self).location()
    }

    fn ensure_capacity(&mut self, page_count: u32) -> Result<u32> {
        (**self).ensure_capacity(page_count)
    }
}
