//! Configuration for the buffer manager.
//!
//! Two kinds of configuration live here:
//! - Compile-time constants shared by the pool and every block store
//!   ([`PAGE_SIZE`] and the limits derived from it)
//! - [`BufferPoolConfig`], the runtime parameters a pool is opened with,
//!   loadable from TOML

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::buffer::replacer::ReplacementPolicy;
use crate::common::{Error, Result};

/// Size of a page in bytes (4KB).
///
/// Every frame buffer and every block transfer is exactly this size.
///
/// # Memory Layout
/// With 4KB pages and 32-bit PageIds:
/// - Max pages: 2^32 = 4,294,967,296 pages
/// - Max page file size: 4,294,967,296 × 4KB = 16TB
pub const PAGE_SIZE: usize = 4096;

/// Maximum number of pages with u32 PageId.
pub const MAX_PAGES: u64 = (u32::MAX as u64) + 1;

/// Maximum theoretical page file size in bytes.
pub const MAX_DB_SIZE_BYTES: u64 = MAX_PAGES * PAGE_SIZE as u64;

/// Default for how many pages a single pin may append past the end of the
/// page file (4 MiB with 4KB pages).
pub const DEFAULT_MAX_EXTENSION: u32 = 1024;

/// Runtime parameters for opening a buffer pool over a page file.
///
/// # Example
/// ```
/// use bufmgr::{BufferPoolConfig, ReplacementPolicy};
///
/// let config = BufferPoolConfig::from_toml_str(
///     r#"
///     page_file = "pages.bin"
///     pool_size = 3
///     policy = "clock"
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(config.pool_size, 3);
/// assert_eq!(config.policy, ReplacementPolicy::Clock);
/// assert!(config.sync_writes);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BufferPoolConfig {
    /// Path of the backing page file. Created on open if missing.
    pub page_file: PathBuf,

    /// Number of frames. Must be positive.
    pub pool_size: usize,

    /// Replacement policy used when the pool is full.
    pub policy: ReplacementPolicy,

    /// Whether every block write is followed by `fsync()`.
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,

    /// How many pages one pin may append past the end of the page file.
    /// Pinning a page further out fails with `InvalidPageNumber`.
    #[serde(default = "default_max_extension")]
    pub max_extension: u32,

    /// Opaque parameters reserved for future strategies.
    ///
    /// The four built-in policies ignore them.
    #[serde(default)]
    pub policy_params: BTreeMap<String, String>,
}

fn default_sync_writes() -> bool {
    true
}

fn default_max_extension() -> u32 {
    DEFAULT_MAX_EXTENSION
}

impl BufferPoolConfig {
    /// Create a config with default write syncing and no policy parameters.
    pub fn new(page_file: impl Into<PathBuf>, pool_size: usize, policy: ReplacementPolicy) -> Self {
        Self {
            page_file: page_file.into(),
            pool_size,
            policy,
            sync_writes: default_sync_writes(),
            max_extension: default_max_extension(),
            policy_params: BTreeMap::new(),
        }
    }

    /// Enable or disable `fsync()` after each block write.
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Set how many pages one pin may append past the end of the page file.
    pub fn with_max_extension(mut self, max_extension: u32) -> Self {
        self.max_extension = max_extension;
        self
    }

    /// Load and validate a config from a TOML file.
    ///
    /// # Errors
    /// `Error::Configuration` if the file cannot be read, does not parse,
    /// names an unknown policy, or fails validation.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: BufferPoolConfig =
            toml::from_str(text).map_err(|e| Error::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(Error::Configuration(
                "pool_size must be greater than 0".to_string(),
            ));
        }
        if self.page_file.as_os_str().is_empty() {
            return Err(Error::Configuration(
                "page_file must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
