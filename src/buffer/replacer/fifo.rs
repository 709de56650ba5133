//! FIFO (First-In-First-Out) replacement policy.

use crate::buffer::replacer::{FrameMetadata, ReplacementPolicy, Replacer};
use crate::common::FrameId;

/// Evicts pages in the order their frames were filled.
///
/// A circular cursor rests on the most recently admitted frame. Eviction
/// advances it to the next evictable frame, which is the oldest admission
/// still unpinned. Hits do not reorder anything.
#[derive(Debug)]
pub struct FifoReplacer {
    /// Frame of the most recent admission.
    cursor: usize,

    /// Frames that are currently evictable (pin_count == 0).
    evictable: Vec<bool>,
}

impl FifoReplacer {
    /// Create a FIFO replacer for `pool_size` frames.
    pub fn new(pool_size: usize) -> Self {
        Self {
            cursor: 0,
            evictable: vec![false; pool_size],
        }
    }
}

impl Replacer for FifoReplacer {
    fn policy(&self) -> ReplacementPolicy {
        ReplacementPolicy::Fifo
    }

    fn record_admission(&mut self, frame_id: FrameId) {
        self.cursor = frame_id.0;
    }

    fn record_hit(&mut self, _frame_id: FrameId) {}

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        self.evictable[frame_id.0] = evictable;
    }

    fn evict(&mut self) -> Option<FrameId> {
        let n = self.evictable.len();
        let victim = (1..=n)
            .map(|step| (self.cursor + step) % n)
            .find(|&idx| self.evictable[idx])?;

        self.cursor = victim;
        self.evictable[victim] = false;
        Some(FrameId::new(victim))
    }

    fn remove(&mut self, frame_id: FrameId) {
        self.evictable[frame_id.0] = false;
    }

    fn metadata(&self, _frame_id: FrameId) -> Option<FrameMetadata> {
        Some(FrameMetadata::Fifo)
    }

    fn cursor(&self) -> Option<FrameId> {
        Some(FrameId::new(self.cursor))
    }

    fn size(&self) -> usize {
        self.evictable.iter().filter(|&&e| e).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admit_all(replacer: &mut FifoReplacer, frames: &[usize]) {
        for &f in frames {
            replacer.record_admission(FrameId::new(f));
            replacer.set_evictable(FrameId::new(f), true);
        }
    }

    #[test]
    fn test_fifo_basic() {
        let mut replacer = FifoReplacer::new(3);
        admit_all(&mut replacer, &[0, 1, 2]);

        assert_eq!(replacer.size(), 3);

        // Should evict in FIFO order
        assert_eq!(replacer.evict(), Some(FrameId::new(0)));
        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
        assert_eq!(replacer.evict(), Some(FrameId::new(2)));
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_fifo_skips_pinned() {
        let mut replacer = FifoReplacer::new(3);
        admit_all(&mut replacer, &[0, 1, 2]);

        // Only frame 1 is evictable
        replacer.set_evictable(FrameId::new(0), false);
        replacer.set_evictable(FrameId::new(2), false);

        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
        assert_eq!(replacer.cursor(), Some(FrameId::new(1)));
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_fifo_cursor_wraps() {
        let mut replacer = FifoReplacer::new(3);
        admit_all(&mut replacer, &[0, 1, 2]);

        let victim = replacer.evict().unwrap();
        assert_eq!(victim, FrameId::new(0));
        replacer.record_admission(victim);
        replacer.set_evictable(victim, true);

        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
    }

    #[test]
    fn test_fifo_reaccess_no_reorder() {
        let mut replacer = FifoReplacer::new(2);
        admit_all(&mut replacer, &[0, 1]);

        replacer.record_hit(FrameId::new(0)); // Access again - should NOT reorder

        assert_eq!(replacer.evict(), Some(FrameId::new(0)));
        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
    }

    #[test]
    fn test_fifo_remove() {
        let mut replacer = FifoReplacer::new(2);
        admit_all(&mut replacer, &[0, 1]);

        replacer.remove(FrameId::new(0));

        assert_eq!(replacer.size(), 1);
        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
    }
}
