//! Page identifier type.

use std::fmt;

use crate::common::Error;

/// Identifies a page in the backing page file.
///
/// Using `u32` allows for 4 billion pages:
/// - 4,294,967,296 pages × 4KB = 16TB maximum page file size
///
/// Page numbers coming from callers that use signed integers (where `-1`
/// traditionally means "no page") go through `TryFrom<i64>`, which rejects
/// negative values with [`Error::InvalidPageNumber`].
///
/// # Example
/// ```
/// use bufmgr::PageId;
///
/// let page_id = PageId::new(42);
/// assert!(page_id.is_valid());
/// assert_eq!(page_id.0, 42);
///
/// assert!(PageId::try_from(-1i64).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// Invalid/sentinel page ID.
    ///
    /// Marks an empty frame in snapshots; never a valid pin target.
    pub const INVALID: PageId = PageId(u32::MAX);

    /// Create a new PageId.
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Check if this page ID is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Signed page number, with the sentinel rendered as `-1`.
    #[inline]
    pub fn as_i64(&self) -> i64 {
        if self.is_valid() {
            i64::from(self.0)
        } else {
            -1
        }
    }
}

impl TryFrom<i64> for PageId {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u32::try_from(value) {
            Ok(raw) if raw != u32::MAX => Ok(PageId(raw)),
            _ => Err(Error::InvalidPageNumber(value)),
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Page(INVALID)")
        } else {
            write!(f, "Page({})", self.0)
        }
    }
}
