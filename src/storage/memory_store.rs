//! In-memory block store.

use crate::common::{Error, PageId, Result};
use crate::storage::block_store::BlockStore;
use crate::storage::page::Page;

/// A [`BlockStore`] that keeps every page on the heap.
///
/// Behaves like a page file that is never persisted: reads past the end fail,
/// writes past the end extend the store with zeroed pages. Used by tests and
/// benchmarks to exercise the pool without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    pages: Vec<Box<Page>>,
    writes: u64,
}

impl MemoryBlockStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `page_count` zeroed pages.
    pub fn with_pages(page_count: u32) -> Self {
        let mut store = Self::new();
        store.pages = (0..page_count).map(|_| Box::new(Page::new())).collect();
        store
    }

    /// Borrow a stored page, if it exists.
    pub fn page(&self, page_id: PageId) -> Option<&Page> {
        self.pages.get(page_id.0 as usize).map(|p| &**p)
    }

    /// Number of block writes performed against this store.
    pub fn write_count(&self) -> u64 {
        self.writes
    }
}

impl BlockStore for MemoryBlockStore {
    fn page_count(&self) -> u32 {
        // append_empty_block never grows past u32::MAX pages.
        u32::try_from(self.pages.len()).unwrap_or(u32::MAX)
    }

    fn append_empty_block(&mut self) -> Result<PageId> {
        let page_id = PageId::new(self.page_count());
        if !page_id.is_valid() {
            return Err(Error::InvalidPageNumber(page_id.as_i64()));
        }
        self.pages.push(Box::new(Page::new()));
        Ok(page_id)
    }

    fn read_block(&mut self, page_id: PageId, page: &mut Page) -> Result<()> {
        match self.pages.get(page_id.0 as usize) {
            Some(stored) => {
                page.copy_from(stored);
                Ok(())
            }
            None => Err(Error::NonExistingPage {
                page_id,
                page_count: self.page_count(),
            }),
        }
    }

    fn write_block(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        if !page_id.is_valid() {
            return Err(Error::InvalidPageNumber(page_id.as_i64()));
        }
        self.ensure_capacity(page_id.0 + 1)?;
        self.pages[page_id.0 as usize].copy_from(page);
        self.writes += 1;
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store() {
        let mut store = MemoryBlockStore::new();
        assert_eq!(store.page_count(), 0);

        let mut page = Page::new();
        let err = store.read_block(PageId::new(0), &mut page).unwrap_err();
        assert!(matches!(
            err,
            Error::NonExistingPage { page_count: 0, .. }
        ));
    }

    #[test]
    fn test_append_and_read() {
        let mut store = MemoryBlockStore::new();
        assert_eq!(store.append_empty_block().unwrap(), PageId::new(0));
        assert_eq!(store.append_empty_block().unwrap(), PageId::new(1));

        let mut page = Page::new();
        page.as_mut_slice()[0] = 0xEE;
        store.read_block(PageId::new(1), &mut page).unwrap();
        assert_eq!(page.as_slice()[0], 0);
    }

    #[test]
    fn test_write_extends_store() {
        let mut store = MemoryBlockStore::new();

        let mut page = Page::new();
        page.as_mut_slice()[0] = 0x42;
        store.write_block(PageId::new(4), &page).unwrap();

        assert_eq!(store.page_count(), 5);
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.page(PageId::new(4)).unwrap().as_slice()[0], 0x42);
        assert_eq!(store.page(PageId::new(2)).unwrap().as_slice()[0], 0);
    }

    #[test]
    fn test_write_invalid_page_rejected() {
        let mut store = MemoryBlockStore::new();
        let err = store.write_block(PageId::INVALID, &Page::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidPageNumber(-1)));
        assert_eq!(store.page_count(), 0);
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_ensure_capacity() {
        let mut store = MemoryBlockStore::with_pages(2);
        assert_eq!(store.ensure_capacity(5).unwrap(), 3);
        assert_eq!(store.ensure_capacity(5).unwrap(), 0);
        assert_eq!(store.page_count(), 5);
    }
}
