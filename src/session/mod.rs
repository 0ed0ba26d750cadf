//! Session lifecycle and configuration.
//!
//! A [`BookmarkSession`] owns the bookmark table, the message editor and
//! the repeat queue. Create one with [`BookmarkSession::builder()`].

// ============================================================================
// Submodules
// ============================================================================

/// Session builder.
pub mod builder;

/// Core session type.
pub mod core;

/// Message editor and viewer seam.
pub mod editor;

/// Session configuration.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::SessionBuilder;
pub use core::{BookmarkSession, Completion};
pub use editor::{CapturingViewer, MessageEditor, MessageViewer, TracingViewer, ViewerEvent};
pub use options::BookmarksConfig;
