//! LFU (Least Frequently Used) replacement policy.

use crate::buffer::replacer::{FrameMetadata, ReplacementPolicy, Replacer};
use crate::common::FrameId;

/// Evicts the unpinned frame with the fewest accesses since admission.
///
/// Admission sets a frame's frequency to 1 and every hit adds one. The
/// victim search makes one circular pass starting just after the cursor
/// (the last admitted frame) and takes the lowest frequency, keeping the
/// first one seen on ties. This spreads evictions of equally cold frames
/// around the pool instead of hammering frame 0.
#[derive(Debug)]
pub struct LfuReplacer {
    /// Frame of the most recent admission.
    cursor: usize,

    /// Access count per frame; zero for frames without a page.
    frequency: Vec<u32>,

    /// Frames that are currently evictable (pin_count == 0).
    evictable: Vec<bool>,
}

impl LfuReplacer {
    /// Create an LFU replacer for `pool_size` frames.
    pub fn new(pool_size: usize) -> Self {
        Self {
            cursor: 0,
            frequency: vec![0; pool_size],
            evictable: vec![false; pool_size],
        }
    }
}

impl Replacer for LfuReplacer {
    fn policy(&self) -> ReplacementPolicy {
        ReplacementPolicy::Lfu
    }

    fn record_admission(&mut self, frame_id: FrameId) {
        self.frequency[frame_id.0] = 1;
        self.cursor = frame_id.0;
    }

    fn record_hit(&mut self, frame_id: FrameId) {
        let freq = &mut self.frequency[frame_id.0];
        *freq = freq.saturating_add(1);
    }

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        self.evictable[frame_id.0] = evictable;
    }

    fn evict(&mut self) -> Option<FrameId> {
        let n = self.frequency.len();
        let mut victim: Option<usize> = None;

        for step in 1..=n {
            let idx = (self.cursor + step) % n;
            if !self.evictable[idx] {
                continue;
            }
            match victim {
                Some(best) if self.frequency[best] <= self.frequency[idx] => {}
                _ => victim = Some(idx),
            }
        }

        let victim = victim?;
        self.cursor = victim;
        self.evictable[victim] = false;
        Some(FrameId::new(victim))
    }

    fn remove(&mut self, frame_id: FrameId) {
        self.frequency[frame_id.0] = 0;
        self.evictable[frame_id.0] = false;
    }

    fn metadata(&self, frame_id: FrameId) -> Option<FrameMetadata> {
        match self.frequency[frame_id.0] {
            0 => None,
            frequency => Some(FrameMetadata::Lfu { frequency }),
        }
    }

    fn cursor(&self) -> Option<FrameId> {
        Some(FrameId::new(self.cursor))
    }

    fn size(&self) -> usize {
        self.evictable.iter().filter(|&&e| e).count()
    }
}
