//! Buffer Pool Manager - the core page caching layer.
//!
//! The [`BufferPoolManager`] provides:
//! - Page caching between a [`BlockStore`] and memory
//! - Pin-based reference counting
//! - Dirty page write-back on eviction, force, flush and shutdown
//! - Interchangeable replacement policies (FIFO, LRU, CLOCK, LFU)

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::path::Path;

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::{debug, info, trace, warn};

use crate::buffer::replacer::{FrameMetadata, ReplacementPolicy, Replacer};
use crate::buffer::{BufferPoolStats, Frame, PageGuard, PageHandle};
use crate::common::config::DEFAULT_MAX_EXTENSION;
use crate::common::{BufferPoolConfig, Error, FrameId, PageId, Result};
use crate::storage::{BlockStore, DiskManager};

/// Everything guarded by the pool latch.
struct PoolState {
    /// Maps resident page IDs to frame IDs.
    page_table: HashMap<PageId, FrameId>,

    /// Empty frames; the lowest index is filled first.
    free_list: BTreeSet<FrameId>,

    /// Eviction policy for selecting victim frames.
    replacer: Box<dyn Replacer>,

    /// Backing page file.
    store: Box<dyn BlockStore>,
}

/// Manages a fixed pool of frames caching pages of one block store.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────────┐
/// │                     BufferPoolManager                        │
/// │  Mutex<Option<PoolState>>  (None once shut down)             │
/// │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────┐   │
/// │  │ page_table   │  │  free_list   │  │ replacer          │   │
/// │  │PageId → Fid  │  │BTreeSet<Fid> │  │ FIFO|LRU|CLOCK|LFU│   │
/// │  └──────┬───────┘  └──────────────┘  └───────────────────┘   │
/// │         │          ┌──────────────────────────────────────┐  │
/// │         │          │ store: Box<dyn BlockStore>           │  │
/// │         ▼          └──────────────────────────────────────┘  │
/// │  frames: Vec<Frame>  [Frame0] [Frame1] [Frame2] ...          │
/// │  stats:  BufferPoolStats (atomic counters)                   │
/// └──────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// - One pool latch serializes pin, unpin, mark-dirty, force, flush and
///   victim selection.
/// - `frames`: no pool lock for page bytes; each `Frame` has its own
///   `RwLock`, taken by [`PageHandle::read`] / [`PageHandle::write`].
/// - `stats`: atomic counters.
///
/// Lock order is pool latch, then frame latch. Byte guards borrow their
/// [`PageHandle`], so only pinned frames can be latched by clients and
/// eviction never waits on one. `force_page` reads the frame under the pool
/// latch; a thread holding that page's write guard must release it first.
///
/// # Usage
/// ```
/// use bufmgr::{BufferPoolManager, MemoryBlockStore, PageId, ReplacementPolicy};
///
/// let mut pool = BufferPoolManager::new(3, ReplacementPolicy::Clock, MemoryBlockStore::new())?;
///
/// let page = pool.pin_page(PageId::new(0))?;
/// page.write().as_mut_slice()[0] = 0xAB;
/// page.mark_dirty()?;
/// page.unpin()?;
///
/// pool.force_page(PageId::new(0))?;
/// assert_eq!(pool.num_write_io(), 1);
///
/// pool.shutdown()?;
/// # Ok::<(), bufmgr::Error>(())
/// ```
pub struct BufferPoolManager {
    /// Fixed pool of frames allocated at startup; emptied by shutdown.
    frames: Vec<Frame>,

    /// Pool latch.
    state: Mutex<Option<PoolState>>,

    /// Performance statistics and the aggregate I/O counters.
    stats: BufferPoolStats,

    /// Number of frames in the pool (immutable after construction).
    pool_size: usize,

    policy: ReplacementPolicy,

    /// Pages one pin may append past the end of the store.
    max_extension: u32,

    /// Where the pages live, for logs and dumps.
    location: String,
}

impl BufferPoolManager {
    /// Create a pool of `pool_size` frames over `store`.
    ///
    /// # Errors
    /// `Error::Configuration` if `pool_size` is 0.
    pub fn new(
        pool_size: usize,
        policy: ReplacementPolicy,
        store: impl BlockStore + 'static,
    ) -> Result<Self> {
        if pool_size == 0 {
            return Err(Error::Configuration(
                "pool_size must be greater than 0".to_string(),
            ));
        }

        let location = store.location();
        let state = PoolState {
            page_table: HashMap::with_capacity(pool_size),
            free_list: (0..pool_size).map(FrameId::new).collect(),
            replacer: policy.build(pool_size),
            store: Box::new(store),
        };

        info!(location = %location, pool_size, %policy, "buffer pool opened");

        Ok(Self {
            frames: (0..pool_size).map(|_| Frame::new()).collect(),
            state: Mutex::new(Some(state)),
            stats: BufferPoolStats::new(),
            pool_size,
            policy,
            max_extension: DEFAULT_MAX_EXTENSION,
            location,
        })
    }

    /// Limit how many empty pages one pin may append past the end of the
    /// store. `0` makes the pool read existing pages only.
    pub fn with_max_extension(mut self, max_extension: u32) -> Self {
        self.max_extension = max_extension;
        self
    }

    /// Open a pool over the page file at `path`, creating the file if missing.
    pub fn open<P: AsRef<Path>>(
        path: P,
        pool_size: usize,
        policy: ReplacementPolicy,
    ) -> Result<Self> {
        Self::new(pool_size, policy, DiskManager::open_or_create(path)?)
    }

    /// Open a pool as described by `config`.
    pub fn from_config(config: &BufferPoolConfig) -> Result<Self> {
        config.validate()?;
        let store = DiskManager::open_or_create(&config.page_file)?
            .with_sync_writes(config.sync_writes);
        Ok(Self::new(config.pool_size, config.policy, store)?
            .with_max_extension(config.max_extension))
    }

    // ========================================================================
    // Public API: pin / unpin / dirty
    // ========================================================================

    /// Pin a page, loading it into the pool if needed.
    ///
    /// On a miss the page goes into the lowest-indexed empty frame, or into a
    /// victim chosen by the replacement policy when the pool is full. A dirty
    /// victim is written back first. The page file is extended with empty
    /// pages if `page_id` lies past its end, by at most the pool's
    /// [`max_extension`](Self::with_max_extension).
    ///
    /// # Errors
    /// - `Error::InvalidPageNumber` for `PageId::INVALID`, or a page further
    ///   past the end of the store than the extension limit allows
    /// - `Error::PoolExhausted` if every frame is pinned
    /// - `Error::PoolClosed` after shutdown
    /// - I/O errors from the store
    pub fn pin_page(&self, page_id: PageId) -> Result<PageHandle<'_>> {
        let mut state = self.latch()?;
        if !page_id.is_valid() {
            return Err(Error::InvalidPageNumber(page_id.as_i64()));
        }

        let resident = state.page_table.get(&page_id).copied();
        let frame_id = match resident {
            Some(frame_id) => {
                self.handle_cache_hit(&mut state, frame_id);
                frame_id
            }
            None => self.handle_cache_miss(&mut state, page_id)?,
        };

        Ok(PageHandle::new(self, &self.frames[frame_id.0], frame_id, page_id))
    }

    /// Pin a page and get a guard that unpins it on drop.
    pub fn fetch_page(&self, page_id: PageId) -> Result<PageGuard<'_>> {
        self.pin_page(page_id).map(PageGuard::new)
    }

    /// Release one pin on a resident page.
    ///
    /// Never evicts or writes anything.
    ///
    /// # Errors
    /// - `Error::PageNotFound` if the page is not resident
    /// - `Error::NotPinned` if its pin count is already 0
    pub fn unpin_page(&self, page_id: PageId) -> Result<()> {
        let mut state = self.latch()?;
        let frame_id = Self::lookup(&state, page_id)?;

        match self.frames[frame_id.0].unpin() {
            None => Err(Error::NotPinned(page_id)),
            Some(0) => {
                state.replacer.set_evictable(frame_id, true);
                trace!(%page_id, %frame_id, "unpinned, now evictable");
                Ok(())
            }
            Some(_) => Ok(()),
        }
    }

    /// Mark a resident page as modified.
    pub fn mark_dirty(&self, page_id: PageId) -> Result<()> {
        let state = self.latch()?;
        let frame_id = Self::lookup(&state, page_id)?;
        self.frames[frame_id.0].mark_dirty();
        Ok(())
    }

    /// Pin count of a resident page, `None` if it is not resident.
    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        let state = self.latch().ok()?;
        let frame_id = state.page_table.get(&page_id)?;
        Some(self.frames[frame_id.0].pin_count())
    }

    // ========================================================================
    // Public API: write-back
    // ========================================================================

    /// Write a dirty resident page back to the store and mark it clean.
    ///
    /// # Errors
    /// - `Error::PageNotFound` if the page is not resident
    /// - `Error::PageNotModified` if the page is clean
    pub fn force_page(&self, page_id: PageId) -> Result<()> {
        let mut state = self.latch()?;
        let frame_id = Self::lookup(&state, page_id)?;

        if !self.frames[frame_id.0].is_dirty() {
            return Err(Error::PageNotModified(page_id));
        }
        self.write_back(&mut *state.store, frame_id, page_id)
    }

    /// Write every dirty page back to the store.
    ///
    /// # Errors
    /// `Error::PoolBusy` if any frame is pinned; nothing is written then.
    pub fn force_flush_pool(&self) -> Result<()> {
        let mut state = self.latch()?;
        self.ensure_unpinned()?;
        self.flush_dirty(&mut state)
    }

    /// Flush every dirty page and release all frames.
    ///
    /// Statistics and I/O counters stay readable afterwards; every other
    /// operation fails with `Error::PoolClosed`.
    ///
    /// # Errors
    /// - `Error::PoolBusy` if any frame is pinned; the pool is left untouched
    /// - `Error::PoolClosed` if the pool was already shut down
    pub fn shutdown(&mut self) -> Result<()> {
        {
            let mut state = self.latch()?;
            self.ensure_unpinned()?;
            self.flush_dirty(&mut state)?;
        }

        *self.state.get_mut() = None;
        self.frames.clear();

        info!(
            location = %self.location,
            reads = self.num_read_io(),
            writes = self.num_write_io(),
            "buffer pool shut down"
        );
        Ok(())
    }

    // ========================================================================
    // Public API: stats and introspection
    // ========================================================================

    /// Get buffer pool statistics.
    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    /// Get the pool size.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Get the replacement policy.
    pub fn policy(&self) -> ReplacementPolicy {
        self.policy
    }

    /// Whether `shutdown` has completed.
    pub fn is_closed(&self) -> bool {
        self.state.lock().is_none()
    }

    /// Blocks read from the store since the pool was created.
    pub fn num_read_io(&self) -> u64 {
        self.stats.snapshot().pages_read
    }

    /// Blocks written to the store since the pool was created.
    pub fn num_write_io(&self) -> u64 {
        self.stats.snapshot().pages_written
    }

    /// Number of pages in the backing store.
    pub fn store_page_count(&self) -> Result<u32> {
        Ok(self.latch()?.store.page_count())
    }

    /// Page held by each frame, `PageId::INVALID` for empty frames.
    ///
    /// One entry per frame; empty after shutdown.
    pub fn frame_contents(&self) -> Vec<PageId> {
        let _state = self.state.lock();
        self.frames
            .iter()
            .map(|f| f.page_id().unwrap_or(PageId::INVALID))
            .collect()
    }

    /// Dirty flag of each frame.
    pub fn dirty_flags(&self) -> Vec<bool> {
        let _state = self.state.lock();
        self.frames.iter().map(Frame::is_dirty).collect()
    }

    /// Pin count of each frame.
    pub fn fix_counts(&self) -> Vec<u32> {
        let _state = self.state.lock();
        self.frames.iter().map(Frame::pin_count).collect()
    }

    /// Replacement policy state of each frame, `None` for empty frames.
    pub fn frame_metadata(&self) -> Vec<Option<FrameMetadata>> {
        let state = self.state.lock();
        let Some(state) = state.as_ref() else {
            return Vec::new();
        };
        self.frames
            .iter()
            .enumerate()
            .map(|(idx, frame)| match frame.page_id() {
                Some(_) => state.replacer.metadata(FrameId::new(idx)),
                None => None,
            })
            .collect()
    }

    /// Compact one-line view of the frame table.
    ///
    /// Each frame renders as `[page dirty pins]` where `page` is `-1` for an
    /// empty frame and `dirty` is `x` or a space, e.g. `[3 0],[4x1],[-1 0]`.
    pub fn pool_content(&self) -> String {
        let _state = self.state.lock();
        self.frames
            .iter()
            .map(|f| {
                let page = f.page_id().unwrap_or(PageId::INVALID).as_i64();
                let dirty = if f.is_dirty() { 'x' } else { ' ' };
                format!("[{}{}{}]", page, dirty, f.pin_count())
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Multi-line diagnostic rendering of the whole frame table.
    pub fn dump(&self) -> String {
        let state = self.state.lock();
        let mut out = String::new();

        let _ = writeln!(
            out,
            "buffer pool over {} ({} frames, {})",
            self.location, self.pool_size, self.policy
        );

        let Some(state) = state.as_ref() else {
            let _ = writeln!(out, "  <shut down>");
            let _ = write!(out, "{}", self.stats.snapshot());
            return out;
        };

        if let Some(cursor) = state.replacer.cursor() {
            let _ = writeln!(out, "cursor: {}", cursor);
        }
        let _ = writeln!(
            out,
            "{:>5} {:>6} {:>5} {:>4} {:>6} {:>6}  {:<10} {:>10}",
            "frame", "page", "dirty", "pins", "reads", "writes", "policy", "crc32"
        );
        for (idx, frame) in self.frames.iter().enumerate() {
            let frame_id = FrameId::new(idx);
            let page = frame.page_id().unwrap_or(PageId::INVALID).as_i64();
            let metadata = match frame.page_id() {
                Some(_) => state
                    .replacer
                    .metadata(frame_id)
                    .map(|m| m.to_string())
                    .unwrap_or_default(),
                None => String::new(),
            };
            let _ = writeln!(
                out,
                "{:>5} {:>6} {:>5} {:>4} {:>6} {:>6}  {:<10} {:>10}",
                idx,
                page,
                if frame.is_dirty() { "yes" } else { "no" },
                frame.pin_count(),
                frame.read_count(),
                frame.write_count(),
                metadata,
                // A client may be writing the page right now.
                frame
                    .try_page()
                    .map(|p| format!("{:#010x}", p.checksum()))
                    .unwrap_or_else(|| "locked".to_string())
            );
        }
        let _ = write!(out, "{}", self.stats.snapshot());
        out
    }

    // ========================================================================
    // Internal: latch and lookups
    // ========================================================================

    /// Take the pool latch, failing if the pool was shut down.
    fn latch(&self) -> Result<MappedMutexGuard<'_, PoolState>> {
        MutexGuard::try_map(self.state.lock(), Option::as_mut).map_err(|_| Error::PoolClosed)
    }

    fn lookup(state: &PoolState, page_id: PageId) -> Result<FrameId> {
        state
            .page_table
            .get(&page_id)
            .copied()
            .ok_or(Error::PageNotFound(page_id))
    }

    /// Fail with `PoolBusy` if any frame is pinned. Call with the latch held.
    fn ensure_unpinned(&self) -> Result<()> {
        let pinned = self.frames.iter().filter(|f| f.is_pinned()).count();
        if pinned > 0 {
            return Err(Error::PoolBusy { pinned });
        }
        Ok(())
    }

    // ========================================================================
    // Internal: core pin logic
    // ========================================================================

    fn handle_cache_hit(&self, state: &mut PoolState, frame_id: FrameId) {
        let pin_count = self.frames[frame_id.0].pin();
        state.replacer.record_hit(frame_id);
        state.replacer.set_evictable(frame_id, false);
        self.stats.record_hit();
        trace!(%frame_id, pin_count, "buffer hit");
    }

    fn handle_cache_miss(&self, state: &mut PoolState, page_id: PageId) -> Result<FrameId> {
        // Checked before choosing a victim so a bad request evicts nothing.
        let reachable = u64::from(state.store.page_count()) + u64::from(self.max_extension);
        if u64::from(page_id.0) >= reachable {
            return Err(Error::InvalidPageNumber(page_id.as_i64()));
        }
        self.stats.record_miss();

        let frame_id = self.get_free_frame(state)?;
        if let Err(e) = self.load_page(state, frame_id, page_id) {
            // The frame is already empty; hand it back.
            state.free_list.insert(frame_id);
            return Err(e);
        }
        Ok(frame_id)
    }

    /// Read `page_id` into the empty frame `frame_id` and pin it.
    fn load_page(&self, state: &mut PoolState, frame_id: FrameId, page_id: PageId) -> Result<()> {
        let appended = state.store.ensure_capacity(page_id.0 + 1)?;
        if appended > 0 {
            debug!(%page_id, appended, "extended page file");
        }

        let frame = &self.frames[frame_id.0];
        state.store.read_block(page_id, &mut frame.page_mut())?;
        frame.record_read();
        self.stats.record_read();

        frame.set_page_id(Some(page_id));
        frame.clear_dirty();
        frame.pin();

        state.page_table.insert(page_id, frame_id);
        state.replacer.record_admission(frame_id);
        state.replacer.set_evictable(frame_id, false);
        Ok(())
    }

    // ========================================================================
    // Internal: frame allocation and eviction
    // ========================================================================

    /// Get an empty frame, evicting if necessary.
    fn get_free_frame(&self, state: &mut PoolState) -> Result<FrameId> {
        if let Some(frame_id) = state.free_list.pop_first() {
            return Ok(frame_id);
        }
        self.evict_page(state)
    }

    /// Ask the replacer for a victim, write it back if dirty, and empty it.
    fn evict_page(&self, state: &mut PoolState) -> Result<FrameId> {
        let frame_id = state.replacer.evict().ok_or(Error::PoolExhausted {
            pool_size: self.pool_size,
        })?;

        let frame = &self.frames[frame_id.0];
        let old_page_id = frame.page_id();

        if let Some(pid) = old_page_id {
            if frame.is_dirty() {
                if let Err(e) = self.write_back(&mut *state.store, frame_id, pid) {
                    // Victim stays resident and evictable.
                    state.replacer.set_evictable(frame_id, true);
                    return Err(e);
                }
            }
            state.page_table.remove(&pid);
        }

        state.replacer.remove(frame_id);
        frame.reset();
        self.stats.record_eviction();

        debug!(%frame_id, page_id = ?old_page_id, policy = %self.policy, "evicted");
        Ok(frame_id)
    }

    /// Write a frame's page to the store and mark it clean.
    fn write_back(&self, store: &mut dyn BlockStore, frame_id: FrameId, page_id: PageId) -> Result<()> {
        let frame = &self.frames[frame_id.0];
        store.write_block(page_id, &frame.page())?;

        frame.clear_dirty();
        frame.record_write();
        self.stats.record_write();
        debug!(%page_id, %frame_id, "wrote back dirty page");
        Ok(())
    }

    fn flush_dirty(&self, state: &mut PoolState) -> Result<()> {
        for (idx, frame) in self.frames.iter().enumerate() {
            if let Some(page_id) = frame.page_id() {
                if frame.is_dirty() {
                    self.write_back(&mut *state.store, FrameId::new(idx), page_id)?;
                }
            }
        }
        state.store.sync()
    }
}

impl Drop for BufferPoolManager {
    /// Best-effort write-back for pools that were never shut down.
    fn drop(&mut self) {
        let Some(mut state) = self.state.get_mut().take() else {
            return;
        };

        for (idx, frame) in self.frames.iter().enumerate() {
            let Some(page_id) = frame.page_id() else {
                continue;
            };
            if !frame.is_dirty() {
                continue;
            }
            if frame.is_pinned() {
                warn!(%page_id, pin_count = frame.pin_count(), "dropping pool with dirty pinned page");
                continue;
            }
            if let Err(e) = self.write_back(&mut *state.store, FrameId::new(idx), page_id) {
                warn!(%page_id, error = %e, "write-back failed while dropping pool");
            }
        }
        if let Err(e) = state.store.sync() {
            warn!(location = %self.location, error = %e, "sync failed while dropping pool");
        }
    }
}
