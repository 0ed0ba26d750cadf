//! Error types for HTTP bookmarks.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use http_bookmarks::{Error, Result};
//!
//! fn first_host(store: &BookmarkStore) -> Result<String> {
//!     let bookmark = store.get(0)?;
//!     Ok(bookmark.host().to_string())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Store access | [`Error::IndexOutOfRange`], [`Error::NoSelection`] |
//! | Network | [`Error::NetworkFailure`], [`Error::InvalidService`] |
//! | External | [`Error::Io`], [`Error::Json`] |
//!
//! Missing response data is never an error: extraction degrades to empty
//! fields instead.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when session configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Store Errors
    // ========================================================================
    /// Row index outside the store.
    ///
    /// A programming error on the caller's side; fail fast.
    #[error("Row index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// The requested row.
        index: usize,
        /// Number of rows at the time of access.
        len: usize,
    },

    /// An operation needed a selected bookmark but none was selected.
    #[error("No bookmark selected")]
    NoSelection,

    // ========================================================================
    // Network Errors
    // ========================================================================
    /// Repeat request could not complete.
    ///
    /// Covers connection errors, timeouts and worker failures.
    #[error("Network failure talking to {target}: {message}")]
    NetworkFailure {
        /// `host:port` the request was sent to.
        target: String,
        /// Description of the failure.
        message: String,
    },

    /// Service descriptor cannot be used to issue a request.
    #[error("Invalid service: {message}")]
    InvalidService {
        /// Description of what is wrong with the service.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an index out of range error.
    #[inline]
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Creates a network failure error.
    #[inline]
    pub fn network_failure(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NetworkFailure {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid service error.
    #[inline]
    pub fn invalid_service(message: impl Into<String>) -> Self {
        Self::InvalidService {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error came from issuing a request.
    #[inline]
    #[must_use]
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            Self::NetworkFailure { .. } | Self::InvalidService { .. }
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NetworkFailure { .. } | Self::Io(_))
    }
}

// ============================================================================
// Tests
// ============================================================================
