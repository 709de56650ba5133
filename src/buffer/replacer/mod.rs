//! Eviction policy implementations (replacers).
//!
//! Every policy implements [`Replacer`] and can be selected at pool
//! construction through [`ReplacementPolicy`]:
//! - [`FifoReplacer`] - First admitted, first evicted (circular cursor)
//! - [`LruReplacer`] - Least recently used (rank permutation)
//! - [`ClockReplacer`] - Second chance (reference bits + clock hand)
//! - [`LfuReplacer`] - Least frequently used (circular tie-breaking)
//!
//! # Protocol
//! The pool drives a replacer through four events:
//! ```text
//!   record_admission(f)     page loaded into frame f (pinned)
//!   record_hit(f)           resident page in frame f pinned again
//!   set_evictable(f, bool)  pin count of f reached / left zero
//!   evict() -> Option<f>    pool full, choose an unpinned victim
//! ```
//! `evict()` never spins: when no frame is evictable it returns `None` and
//! the pool reports `PoolExhausted`.

mod clock;
mod fifo;
mod lfu;
mod lru;

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::common::{Error, FrameId};

pub use clock::ClockReplacer;
pub use fifo::FifoReplacer;
pub use lfu::LfuReplacer;
pub use lru::LruReplacer;

/// Selects which [`Replacer`] a pool uses.
///
/// Parses case-insensitively from `"fifo"`, `"lru"`, `"clock"` and `"lfu"`;
/// anything else is a configuration error.
///
/// # Example
/// ```
/// use bufmgr::ReplacementPolicy;
///
/// let policy: ReplacementPolicy = "Clock".parse().unwrap();
/// assert_eq!(policy, ReplacementPolicy::Clock);
/// assert!("mru".parse::<ReplacementPolicy>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum ReplacementPolicy {
    Fifo,
    Lru,
    Clock,
    Lfu,
}

impl ReplacementPolicy {
    /// All built-in policies.
    pub const ALL: [ReplacementPolicy; 4] = [
        ReplacementPolicy::Fifo,
        ReplacementPolicy::Lru,
        ReplacementPolicy::Clock,
        ReplacementPolicy::Lfu,
    ];

    /// Build a replacer tracking `pool_size` frames.
    pub fn build(self, pool_size: usize) -> Box<dyn Replacer> {
        match self {
            ReplacementPolicy::Fifo => Box::new(FifoReplacer::new(pool_size)),
            ReplacementPolicy::Lru => Box::new(LruReplacer::new(pool_size)),
            ReplacementPolicy::Clock => Box::new(ClockReplacer::new(pool_size)),
            ReplacementPolicy::Lfu => Box::new(LfuReplacer::new(pool_size)),
        }
    }

    /// Lowercase name, as accepted by `FromStr`.
    pub fn name(self) -> &'static str {
        match self {
            ReplacementPolicy::Fifo => "fifo",
            ReplacementPolicy::Lru => "lru",
            ReplacementPolicy::Clock => "clock",
            ReplacementPolicy::Lfu => "lfu",
        }
    }
}

impl FromStr for ReplacementPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(ReplacementPolicy::Fifo),
            "lru" => Ok(ReplacementPolicy::Lru),
            "clock" => Ok(ReplacementPolicy::Clock),
            "lfu" => Ok(ReplacementPolicy::Lfu),
            _ => Err(Error::Configuration(format!(
                "unknown replacement policy '{}' (expected fifo, lru, clock or lfu)",
                s
            ))),
        }
    }
}

impl TryFrom<String> for ReplacementPolicy {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name().to_ascii_uppercase())
    }
}

/// Per-frame policy state, one variant per policy.
///
/// Returned by [`Replacer::metadata`] for introspection; the replacers keep
/// the state in their own typed vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMetadata {
    /// FIFO keeps no per-frame state; order lives in the cursor.
    Fifo,
    /// Recency rank: `pool_size - 1` is most recent, `0` least recent.
    Lru { rank: usize },
    /// CLOCK reference bit.
    Clock { referenced: bool },
    /// Access count since admission.
    Lfu { frequency: u32 },
}

impl fmt::Display for FrameMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameMetadata::Fifo => write!(f, "fifo"),
            FrameMetadata::Lru { rank } => write!(f, "rank={}", rank),
            FrameMetadata::Clock { referenced } => write!(f, "ref_bit={}", u8::from(*referenced)),
            FrameMetadata::Lfu { frequency } => write!(f, "freq={}", frequency),
        }
    }
}

/// A victim-selection strategy over a fixed set of frames.
///
/// Frame ids passed in are always `< pool_size` of the replacer.
pub trait Replacer: fmt::Debug + Send {
    /// Which policy this replacer implements.
    fn policy(&self) -> ReplacementPolicy;

    /// A page was just loaded into `frame_id` (free slot or victim).
    fn record_admission(&mut self, frame_id: FrameId);

    /// The resident page in `frame_id` was pinned again.
    fn record_hit(&mut self, frame_id: FrameId);

    /// Mark a frame as evictable (pin count zero) or not.
    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool);

    /// Select a victim among evictable frames.
    ///
    /// The returned frame is no longer evictable. Returns `None` if all
    /// frames are pinned.
    fn evict(&mut self) -> Option<FrameId>;

    /// Forget a frame entirely (it became empty).
    fn remove(&mut self, frame_id: FrameId);

    /// Policy state of a resident frame, `None` if the replacer does not
    /// track it.
    fn metadata(&self, frame_id: FrameId) -> Option<FrameMetadata>;

    /// Scan cursor position, for policies that have one.
    fn cursor(&self) -> Option<FrameId> {
        None
    }

    /// Number of evictable frames.
    fn size(&self) -> usize;
}
