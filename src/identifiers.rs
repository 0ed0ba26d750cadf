//! Type-safe identifiers.
//!
//! Newtype wrappers prevent mixing bookmark identities with repeat task
//! identities at compile time.
//!
//! | Type | Backing | Source |
//! |------|---------|--------|
//! | [`BookmarkId`] | `u64` | Process-wide monotonic counter |
//! | [`RepeatId`] | `Uuid` | Random v4 per repeat invocation |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// BookmarkId
// ============================================================================

/// Counter backing [`BookmarkId::next`]. Starts at 1.
static NEXT_BOOKMARK_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a bookmark.
///
/// Distinct from the row index shown in the table, which shifts whenever an
/// earlier row is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookmarkId(u64);

impl BookmarkId {
    /// Allocates the next identifier.
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_BOOKMARK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BookmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// RepeatId
// ============================================================================

/// Identifier of one repeat invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepeatId(Uuid);

impl RepeatId {
    /// Generates a new random identifier.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RepeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
