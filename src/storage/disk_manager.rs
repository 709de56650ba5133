//! Disk Manager - file-backed block store.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Reading and writing pages
//! - Appending empty pages
//! - Creating, opening and destroying the page file

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::block_store::BlockStore;
use crate::storage::page::Page;

/// Manages disk I/O for a single page file.
///
/// # File Layout
/// The page file is a flat sequence of pages:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// Page N is located at file offset `N × PAGE_SIZE`. A trailing partial page
/// (if the file was truncated externally) is not counted.
///
/// # Thread Safety
/// `DiskManager` is **single-threaded**. The `BufferPoolManager` serializes
/// access to it behind the pool latch.
///
/// # Durability
/// By default every write is followed by `fsync()`. Pools that only need
/// durability at flush/shutdown can turn this off with
/// [`DiskManager::with_sync_writes`].
#[derive(Debug)]
pub struct DiskManager {
    file: File,
    path: PathBuf,
    /// Number of pages in the file.
    page_count: u32,
    sync_writes: bool,
}

impl DiskManager {
    /// Create a new, empty page file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path.as_ref())?;

        debug!(path = %path.as_ref().display(), "created page file");
        Ok(Self {
            file,
            path: path.as_ref().to_path_buf(),
            page_count: 0,
            sync_writes: true,
        })
    }

    /// Open an existing page file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path.as_ref())?;

        // Calculate page count from file size
        let file_size = file.metadata()?.len();
        let page_count = (file_size / PAGE_SIZE as u64) as u32;

        Ok(Self {
            file,
            path: path.as_ref().to_path_buf(),
            page_count,
            sync_writes: true,
        })
    }

    /// Open an existing page file, or create it if it doesn't exist.
    ///
    /// Opening the same path repeatedly is harmless.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Remove a page file from disk.
    pub fn destroy<P: AsRef<Path>>(path: P) -> Result<()> {
        fs::remove_file(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "destroyed page file");
        Ok(())
    }

    /// Enable or disable `fsync()` after every write.
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Path of the page file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the total size of the page file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_count as u64) * (PAGE_SIZE as u64)
    }

    fn offset(page_id: PageId) -> u64 {
        (page_id.0 as u64) * (PAGE_SIZE as u64)
    }

    fn maybe_sync(&mut self) -> Result<()> {
        if self.sync_writes {
            self.file.sync_all()?;
        }
        Ok(())
    }
}

impl BlockStore for DiskManager {
    #[inline]
    fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Extend the file with a zeroed page.
    fn append_empty_block(&mut self) -> Result<PageId> {
        let page_id = PageId::new(self.page_count);

        self.file.seek(SeekFrom::Start(Self::offset(page_id)))?;
        self.file.write_all(&[0u8; PAGE_SIZE])?;
        self.maybe_sync()?;

        self.page_count += 1;
        Ok(page_id)
    }

    fn read_block(&mut self, page_id: PageId, page: &mut Page) -> Result<()> {
        if page_id.0 >= self.page_count {
            return Err(Error::NonExistingPage {
                page_id,
                page_count: self.page_count,
            });
        }

        self.file.seek(SeekFrom::Start(Self::offset(page_id)))?;
        self.file.read_exact(page.as_mut_slice())?;
        Ok(())
    }

    /// Write a page in place.
    ///
    /// Writing past the end of the file extends it; the skipped pages read
    /// back as zeros.
    fn write_block(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        if !page_id.is_valid() {
            return Err(Error::InvalidPageNumber(page_id.as_i64()));
        }

        self.file.seek(SeekFrom::Start(Self::offset(page_id)))?;
        self.file.write_all(page.as_slice())?;
        self.maybe_sync()?;

        self.page_count = self.page_count.max(page_id.0 + 1);
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
