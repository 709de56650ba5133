//! LRU (Least Recently Used) replacement policy.

use crate::buffer::replacer::{FrameMetadata, ReplacementPolicy, Replacer};
use crate::common::FrameId;

/// Evicts the unpinned frame used least recently.
///
/// Each resident frame carries a rank in `[0, pool_size - 1]`; the most
/// recently admitted or touched frame holds `pool_size - 1`. Touching a frame
/// shifts every frame ranked above it down by one, so ranks of resident
/// frames stay distinct. Once the pool is full they are exactly a
/// permutation of `0..pool_size`.
#[derive(Debug)]
pub struct LruReplacer {
    /// Recency rank per frame, `None` for frames without a page.
    ranks: Vec<Option<usize>>,

    /// Frames that are currently evictable (pin_count == 0).
    evictable: Vec<bool>,
}

impl LruReplacer {
    /// Create an LRU replacer for `pool_size` frames.
    pub fn new(pool_size: usize) -> Self {
        Self {
            ranks: vec![None; pool_size],
            evictable: vec![false; pool_size],
        }
    }

    /// Make `frame_id` the most recently used frame.
    fn promote(&mut self, frame_id: FrameId) {
        let top = self.ranks.len() - 1;
        match self.ranks[frame_id.0] {
            Some(old) => {
                for rank in self.ranks.iter_mut().flatten() {
                    if *rank > old {
                        *rank -= 1;
                    }
                }
            }
            None => {
                // New resident: everyone else ages by one.
                for rank in self.ranks.iter_mut().flatten() {
                    *rank = rank.saturating_sub(1);
                }
            }
        }
        self.ranks[frame_id.0] = Some(top);
    }
}

impl Replacer for LruReplacer {
    fn policy(&self) -> ReplacementPolicy {
        ReplacementPolicy::Lru
    }

    fn record_admission(&mut self, frame_id: FrameId) {
        self.promote(frame_id);
    }

    fn record_hit(&mut self, frame_id: FrameId) {
        self.promote(frame_id);
    }

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        self.evictable[frame_id.0] = evictable;
    }

    fn evict(&mut self) -> Option<FrameId> {
        // min_by_key keeps the first minimum, so ties go to the lowest index.
        let victim = self
            .ranks
            .iter()
            .enumerate()
            .filter(|&(idx, _)| self.evictable[idx])
            .filter_map(|(idx, rank)| rank.map(|r| (idx, r)))
            .min_by_key(|&(_, rank)| rank)
            .map(|(idx, _)| idx)?;

        self.evictable[victim] = false;
        Some(FrameId::new(victim))
    }

    fn remove(&mut self, frame_id: FrameId) {
        self.evictable[frame_id.0] = false;
        if let Some(old) = self.ranks[frame_id.0].take() {
            // Close the gap from below so ranks stay packed at the top.
            for rank in self.ranks.iter_mut().flatten() {
                if *rank < old {
                    *rank += 1;
                }
            }
        }
    }

    fn metadata(&self, frame_id: FrameId) -> Option<FrameMetadata> {
        self.ranks[frame_id.0].map(|rank| FrameMetadata::Lru { rank })
    }

    fn size(&self) -> usize {
        self.evictable.iter().filter(|&&e| e).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranks(replacer: &LruReplacer) -> Vec<Option<usize>> {
        replacer.ranks.clone()
    }

    fn fill(replacer: &mut LruReplacer, n: usize) {
        for f in 0..n {
            replacer.record_admission(FrameId::new(f));
            replacer.set_evictable(FrameId::new(f), true);
        }
    }

    #[test]
    fn test_lru_admission_ranks() {
        let mut replacer = LruReplacer::new(5);

        replacer.record_admission(FrameId::new(0));
        assert_eq!(ranks(&replacer), vec![Some(4), None, None, None, None]);

        replacer.record_admission(FrameId::new(1));
        assert_eq!(ranks(&replacer), vec![Some(3), Some(4), None, None, None]);

        fill(&mut replacer, 5);
        assert_eq!(
            ranks(&replacer),
            vec![Some(0), Some(1), Some(2), Some(3), Some(4)]
        );
    }

    #[test]
    fn test_lru_touch_keeps_permutation() {
        let mut replacer = LruReplacer::new(5);
        fill(&mut replacer, 5);

        for f in [3, 4, 0, 2, 1] {
            replacer.record_hit(FrameId::new(f));
        }

        assert_eq!(
            ranks(&replacer),
            vec![Some(2), Some(4), Some(3), Some(0), Some(1)]
        );
    }

    #[test]
    fn test_lru_evicts_least_recent() {
        let mut replacer = LruReplacer::new(3);
        fill(&mut replacer, 3);

        // Touch frame 0: order is now 1, 2, 0 (oldest -> newest)
        replacer.record_hit(FrameId::new(0));

        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
        assert_eq!(replacer.evict(), Some(FrameId::new(2)));
        assert_eq!(replacer.evict(), Some(FrameId::new(0)));
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_lru_skips_pinned() {
        let mut replacer = LruReplacer::new(3);
        fill(&mut replacer, 3);

        replacer.set_evictable(FrameId::new(0), false);
        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
    }

    #[test]
    fn test_lru_readmission_after_evict() {
        let mut replacer = LruReplacer::new(3);
        fill(&mut replacer, 3);

        let victim = replacer.evict().unwrap();
        assert_eq!(victim, FrameId::new(0));
        replacer.record_admission(victim);

        assert_eq!(ranks(&replacer), vec![Some(2), Some(0), Some(1)]);
    }

    #[test]
    fn test_lru_remove_packs_ranks() {
        let mut replacer = LruReplacer::new(3);
        fill(&mut replacer, 3);

        replacer.remove(FrameId::new(1));
        assert_eq!(ranks(&replacer), vec![Some(1), None, Some(2)]);
        assert_eq!(replacer.metadata(FrameId::new(1)), None);
        assert_eq!(replacer.size(), 2);
    }
}
