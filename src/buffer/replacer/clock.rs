//! CLOCK (second chance) replacement policy.

use crate::buffer::replacer::{FrameMetadata, ReplacementPolicy, Replacer};
use crate::common::FrameId;

/// Approximates LRU with one reference bit per frame and a rotating hand.
///
/// Admission and hits set the frame's reference bit. When a victim is
/// needed the hand moves forward from its current position:
/// - pinned frames are skipped, their bit untouched
/// - a set bit is cleared and the frame gets a second chance
/// - the first evictable frame with a clear bit is the victim
///
/// The hand rests on the last admitted frame, and each hit nudges it one
/// slot forward.
#[derive(Debug)]
pub struct ClockReplacer {
    /// Current clock hand position.
    hand: usize,

    /// Reference bits for each frame.
    referenced: Vec<bool>,

    /// Frames that are currently evictable (pin_count == 0).
    evictable: Vec<bool>,
}

impl ClockReplacer {
    /// Create a CLOCK replacer for `pool_size` frames.
    pub fn new(pool_size: usize) -> Self {
        Self {
            hand: 0,
            referenced: vec![false; pool_size],
            evictable: vec![false; pool_size],
        }
    }

    fn advance(&mut self) {
        self.hand = (self.hand + 1) % self.referenced.len();
    }
}

impl Replacer for ClockReplacer {
    fn policy(&self) -> ReplacementPolicy {
        ReplacementPolicy::Clock
    }

    fn record_admission(&mut self, frame_id: FrameId) {
        self.referenced[frame_id.0] = true;
        self.hand = frame_id.0;
    }

    fn record_hit(&mut self, frame_id: FrameId) {
        self.referenced[frame_id.0] = true;
        self.advance();
    }

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        self.evictable[frame_id.0] = evictable;
    }

    fn evict(&mut self) -> Option<FrameId> {
        if !self.evictable.contains(&true) {
            return None;
        }

        // The first lap clears every evictable bit, so the second finds one.
        for _ in 0..(2 * self.referenced.len()) {
            self.advance();
            let idx = self.hand;

            if !self.evictable[idx] {
                continue;
            }
            if self.referenced[idx] {
                self.referenced[idx] = false;
            } else {
                self.evictable[idx] = false;
                return Some(FrameId::new(idx));
            }
        }
        None
    }

    fn remove(&mut self, frame_id: FrameId) {
        self.referenced[frame_id.0] = false;
        self.evictable[frame_id.0] = false;
    }

    fn metadata(&self, frame_id: FrameId) -> Option<FrameMetadata> {
        Some(FrameMetadata::Clock {
            referenced: self.referenced[frame_id.0],
        })
    }

    fn cursor(&self) -> Option<FrameId> {
        Some(FrameId::new(self.hand))
    }

    fn size(&self) -> usize {
        self.evictable.iter().filter(|&&e| e).count()
    }
}
