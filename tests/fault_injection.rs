//! Store failures in the middle of a miss must leave the pool consistent.
//!
//! `FaultyStore` wraps a `MemoryBlockStore` and fails reads or writes while
//! the matching switch is on. The switches are shared so a test can flip
//! them after the store has moved into the pool.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bufmgr::{
    BlockStore, BufferPoolManager, Error, FrameMetadata, MemoryBlockStore, Page, PageId,
    ReplacementPolicy, Result,
};

const POOL_SIZE: usize = 3;

#[derive(Debug, Default)]
struct Faults {
    reads: AtomicBool,
    writes: AtomicBool,
}

impl Faults {
    fn fail_reads(&self, on: bool) {
        self.reads.store(on, Ordering::SeqCst);
    }

    fn fail_writes(&self, on: bool) {
        self.writes.store(on, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct FaultyStore {
    inner: MemoryBlockStore,
    faults: Arc<Faults>,
}

fn injected(what: &str) -> Error {
    Error::Io(io::Error::other(format!("injected {} failure", what)))
}

impl BlockStore for FaultyStore {
    fn page_count(&self) -> u32 {
        self.inner.page_count()
    }

    fn append_empty_block(&mut self) -> Result<PageId> {
        self.inner.append_empty_block()
    }

    fn read_block(&mut self, page_id: PageId, page: &mut Page) -> Result<()> {
        if self.faults.reads.load(Ordering::SeqCst) {
            return Err(injected("read"));
        }
        self.inner.read_block(page_id, page)
    }

    fn write_block(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        if self.faults.writes.load(Ordering::SeqCst) {
            return Err(injected("write"));
        }
        self.inner.write_block(page_id, page)
    }

    fn location(&self) -> String {
        "<faulty>".to_string()
    }
}

fn faulty_pool(policy: ReplacementPolicy) -> (BufferPoolManager, Arc<Faults>) {
    let faults = Arc::new(Faults::default());
    let store = FaultyStore {
        inner: MemoryBlockStore::with_pages(16),
        faults: Arc::clone(&faults),
    };
    let pool = BufferPoolManager::new(POOL_SIZE, policy, store).unwrap();
    (pool, faults)
}

/// Pin `page`, stamp its number into byte 0, mark dirty, unpin.
fn stamp(pool: &BufferPoolManager, page: u32) {
    let handle = pool.pin_page(PageId::new(page)).unwrap();
    handle.write().as_mut_slice()[0] = page as u8;
    handle.mark_dirty().unwrap();
    handle.unpin().unwrap();
}

fn pin_unpin(pool: &BufferPoolManager, page: u32) {
    pool.pin_page(PageId::new(page)).unwrap().unpin().unwrap();
}

/// Checks that hold after any failed pin.
fn check_consistent(pool: &BufferPoolManager) {
    let contents = pool.frame_contents();
    let metadata = pool.frame_metadata();

    assert_eq!(pool.fix_counts(), vec![0; POOL_SIZE]);
    for (idx, page_id) in contents.iter().enumerate() {
        if page_id.is_valid() {
            assert!(metadata[idx].is_some(), "resident frame {} untracked", idx);
            assert_eq!(pool.get_pin_count(*page_id), Some(0));
        } else {
            assert!(metadata[idx].is_none(), "empty frame {} tracked", idx);
            assert!(!pool.dirty_flags()[idx], "empty frame {} dirty", idx);
        }
    }

    if pool.policy() == ReplacementPolicy::Lru {
        let mut ranks: Vec<usize> = metadata
            .iter()
            .flatten()
            .map(|m| match m {
                FrameMetadata::Lru { rank } => *rank,
                other => panic!("unexpected metadata {:?}", other),
            })
            .collect();
        ranks.sort_unstable();
        // Distinct and packed at the top of 0..POOL_SIZE
        let expected: Vec<usize> = (POOL_SIZE - ranks.len()..POOL_SIZE).collect();
        assert_eq!(ranks, expected);
    }
}

#[test]
fn test_failed_load_returns_frame_to_free_list() {
    for policy in ReplacementPolicy::ALL {
        let (pool, faults) = faulty_pool(policy);
        for page in 0..3 {
            pin_unpin(&pool, page);
        }

        faults.fail_reads(true);
        let err = pool.pin_page(PageId::new(5)).unwrap_err();
        assert!(matches!(err, Error::Io(_)), "{}", policy);

        // The victim was evicted, then the frame came back empty.
        let contents = pool.frame_contents();
        let empty: Vec<usize> = contents
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_valid())
            .map(|(idx, _)| idx)
            .collect();
        assert_eq!(empty.len(), 1, "{}: {:?}", policy, contents);
        assert!(!contents.contains(&PageId::new(5)));
        assert_eq!(pool.stats().snapshot().evictions, 1);
        check_consistent(&pool);

        // The next miss takes the freed frame without evicting again.
        faults.fail_reads(false);
        let handle = pool.pin_page(PageId::new(5)).unwrap();
        assert_eq!(handle.frame_id().0, empty[0], "{}", policy);
        handle.unpin().unwrap();
        assert_eq!(pool.stats().snapshot().evictions, 1);
        assert_eq!(pool.num_read_io(), 4);
        check_consistent(&pool);
    }
}

#[test]
fn test_failed_write_back_keeps_victim_resident() {
    for policy in ReplacementPolicy::ALL {
        let (pool, faults) = faulty_pool(policy);
        for page in 0..3 {
            stamp(&pool, page);
        }
        let before = pool.frame_contents();

        faults.fail_writes(true);
        let err = pool.pin_page(PageId::new(7)).unwrap_err();
        assert!(matches!(err, Error::Io(_)), "{}", policy);

        assert_eq!(pool.frame_contents(), before, "{}", policy);
        assert_eq!(pool.dirty_flags(), vec![true; POOL_SIZE]);
        assert_eq!(pool.num_write_io(), 0);
        assert_eq!(pool.stats().snapshot().evictions, 0);
        check_consistent(&pool);

        // Still evictable: the retry writes one victim back and loads page 7.
        faults.fail_writes(false);
        pin_unpin(&pool, 7);
        assert_eq!(pool.num_write_io(), 1);
        assert!(pool.frame_contents().contains(&PageId::new(7)));
        check_consistent(&pool);

        // Every stamped page survives, resident or written back.
        for page in 0..3u32 {
            let handle = pool.pin_page(PageId::new(page)).unwrap();
            assert_eq!(handle.read().as_slice()[0], page as u8, "{}", policy);
            handle.unpin().unwrap();
        }
    }
}

#[test]
fn test_failed_flush_keeps_pages_dirty() {
    let (mut pool, faults) = faulty_pool(ReplacementPolicy::Clock);
    stamp(&pool, 0);

    faults.fail_writes(true);
    assert!(matches!(pool.force_flush_pool(), Err(Error::Io(_))));
    assert!(matches!(pool.force_page(PageId::new(0)), Err(Error::Io(_))));
    assert!(pool.dirty_flags()[0]);
    assert!(matches!(pool.shutdown(), Err(Error::Io(_))));
    assert!(!pool.is_closed());

    faults.fail_writes(false);
    pool.shutdown().unwrap();
    assert_eq!(pool.num_write_io(), 1);
}

#[test]
fn test_drop_survives_write_failures() {
    let (pool, faults) = faulty_pool(ReplacementPolicy::Lfu);
    stamp(&pool, 0);
    stamp(&pool, 1);

    faults.fail_writes(true);
    drop(pool);
}
