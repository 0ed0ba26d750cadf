//! HTTP Bookmarks - Bookmark and repeat captured HTTP transactions.
//!
//! This library keeps an ordered, observable table of bookmarked
//! request/response pairs for a proxy or testing tool, and re-issues
//! bookmarked requests in the background.
//!
//! # Architecture
//!
//! Data flows in one direction:
//!
//! - **Capture**: a [`Transaction`] is passed to [`MetadataExtractor`], which
//!   copies its buffers through a [`BufferStore`] and extracts display fields
//! - **Table**: the resulting [`Bookmark`] is appended to the
//!   [`BookmarkStore`], which notifies observers with a [`TableEvent`]
//! - **Repeat**: the selected request is re-issued on a tokio task through an
//!   [`HttpIssuer`]; the result comes back to the session as a report
//!
//! Key design principles:
//!
//! - One owner: only [`BookmarkSession`] mutates bookmark state
//! - Workers never touch the store; they send reports over a channel
//! - Every host-tool service is a trait with a bundled default
//!
//! # Quick Start
//!
//! ```no_run
//! use http_bookmarks::{BookmarkSession, HttpService, Result, Transaction};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut session = BookmarkSession::builder().build()?;
//!
//!     // Bookmark a captured transaction
//!     let request = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n".to_vec();
//!     let mut captured = [Transaction::new(HttpService::http("example.com", 80), request)];
//!     session.add_bookmarks(&mut captured);
//!
//!     // Select it and repeat, recording the result as a new bookmark
//!     session.select_row(0)?;
//!     session.repeat_with(true)?;
//!     if let Some(completion) = session.next_completion().await {
//!         println!("{completion:?}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bookmark`] | [`Bookmark`], [`MetadataExtractor`], [`BookmarkStore`], table columns |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`repeat`] | Background repeat workers |
//! | [`session`] | [`BookmarkSession`], builder and configuration |
//! | [`transaction`] | Transactions and host-tool service traits |

// ============================================================================
// Modules
// ============================================================================

/// Bookmarks, extraction and the observable table.
pub mod bookmark;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for bookmarks and repeats.
pub mod identifiers;

/// Background repeat workers.
pub mod repeat;

/// Session lifecycle and configuration.
///
/// Use [`BookmarkSession::builder()`] to create a session.
pub mod session;

/// Transactions and the analyzer, buffer store and issuer seams.
pub mod transaction;

// ============================================================================
// Re-exports
// ============================================================================

// Bookmark types
pub use bookmark::{
    Bookmark, BookmarkStore, CellValue, Column, ColumnKind, Metadata, MetadataExtractor,
    TableEvent, TableObserver,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{BookmarkId, RepeatId};

// Repeat types
pub use repeat::{RepeatReport, RepeatWorkflow};

// Session types
pub use session::{
    BookmarkSession, BookmarksConfig, CapturingViewer, Completion, MessageEditor, MessageViewer,
    SessionBuilder, TracingViewer, ViewerEvent,
};

// Transaction types
pub use transaction::{
    BufferStore, Highlight, HttpAnalyzer, HttpIssuer, HttpService, MemoryStore, Protocol,
    TcpIssuer, TempFileStore, Transaction, TransactionAnalyzer, TransactionRef,
};
