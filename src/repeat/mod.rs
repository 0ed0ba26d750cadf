//! Re-issuing bookmarked requests.
//!
//! [`RepeatWorkflow`] runs each repeat on its own tokio task and queues a
//! [`RepeatReport`] for the session to apply on the control thread.

// ============================================================================
// Submodules
// ============================================================================

/// Worker tasks and completion queue.
pub mod workflow;

// ============================================================================
// Re-exports
// ============================================================================

pub use workflow::{RepeatReport, RepeatWorkflow};
