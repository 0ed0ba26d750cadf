//! Builder pattern for session configuration.
//!
//! Every collaborator has a default, so the shortest setup is:
//!
//! ```ignore
//! use http_bookmarks::BookmarkSession;
//!
//! # async fn example() -> http_bookmarks::Result<()> {
//! let session = BookmarkSession::builder().build()?;
//! # Ok(())
//! # }
//! ```
//!
//! | Collaborator | Default |
//! |--------------|---------|
//! | [`TransactionAnalyzer`] | [`HttpAnalyzer`] |
//! | [`BufferStore`] | [`TempFileStore`] under `temp_prefix` |
//! | [`HttpIssuer`] | [`TcpIssuer`] with the configured timeouts |
//! | [`MessageViewer`] | [`TracingViewer`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;

use crate::error::{Error, Result};
use crate::transaction::{
    BufferStore, HttpAnalyzer, HttpIssuer, TcpIssuer, TempFileStore, TransactionAnalyzer,
};

use super::core::BookmarkSession;
use super::editor::{MessageViewer, TracingViewer};
use super::options::BookmarksConfig;

// ============================================================================
// SessionBuilder
// ============================================================================

/// Builder for a [`BookmarkSession`].
///
/// Use [`BookmarkSession::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct SessionBuilder {
    /// Session settings.
    config: BookmarksConfig,
    /// Request/response parser.
    analyzer: Option<Arc<dyn TransactionAnalyzer>>,
    /// Buffer externalization.
    buffers: Option<Arc<dyn BufferStore>>,
    /// Repeat issuer.
    issuer: Option<Arc<dyn HttpIssuer>>,
    /// Viewer collaborator.
    viewer: Option<Arc<dyn MessageViewer>>,
}

// ============================================================================
// SessionBuilder Implementation
// ============================================================================

impl SessionBuilder {
    /// Creates a builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the settings.
    #[inline]
    #[must_use]
    pub fn config(mut self, config: BookmarksConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the request/response analyzer.
    #[inline]
    #[must_use]
    pub fn analyzer(mut self, analyzer: Arc<dyn TransactionAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Sets the buffer store.
    #[inline]
    #[must_use]
    pub fn buffer_store(mut self, buffers: Arc<dyn BufferStore>) -> Self {
        self.buffers = Some(buffers);
        self
    }

    /// Sets the repeat issuer.
    #[inline]
    #[must_use]
    pub fn issuer(mut self, issuer: Arc<dyn HttpIssuer>) -> Self {
        self.issuer = Some(issuer);
        self
    }

    /// Sets the viewer collaborator.
    #[inline]
    #[must_use]
    pub fn viewer(mut self, viewer: Arc<dyn MessageViewer>) -> Self {
        self.viewer = Some(viewer);
        self
    }

    /// Builds the session with validation.
    ///
    /// Must be called from within a tokio runtime; repeats are spawned on it.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the settings are invalid
    /// - [`Error::Config`] if no tokio runtime is running
    /// - [`Error::Io`] if the default buffer directory cannot be created
    pub fn build(self) -> Result<BookmarkSession> {
        self.config.validate()?;
        let runtime = Self::validate_runtime()?;

        let buffers = match self.buffers {
            Some(buffers) => buffers,
            None => Arc::new(TempFileStore::new(&self.config.temp_prefix)?),
        };
        let analyzer = self
            .analyzer
            .unwrap_or_else(|| Arc::new(HttpAnalyzer::new()));
        let issuer = self.issuer.unwrap_or_else(|| {
            Arc::new(TcpIssuer::new(
                self.config.connect_timeout(),
                self.config.read_timeout(),
            ))
        });
        let viewer = self.viewer.unwrap_or_else(|| Arc::new(TracingViewer));

        Ok(BookmarkSession::new(
            self.config,
            analyzer,
            buffers,
            issuer,
            viewer,
            runtime,
        ))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SessionBuilder {
    /// Returns the current runtime handle.
    fn validate_runtime() -> Result<Handle> {
        Handle::try_current().map_err(|_| {
            Error::config(
                "A tokio runtime is required to run repeats.\n\
                 Build the session from within #[tokio::main] or Runtime::block_on.",
            )
        })
    }
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("config", &self.config)
            .field("analyzer", &self.analyzer.is_some())
            .field("buffers", &self.buffers.is_some())
            .field("issuer", &self.issuer.is_some())
            .field("viewer", &self.viewer.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio_test::{assert_err, assert_ok};

    use crate::transaction::MemoryStore;

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = SessionBuilder::new();
        assert!(builder.analyzer.is_none());
        assert!(builder.issuer.is_none());
        assert_eq!(builder.config, BookmarksConfig::default());
    }

    #[test]
    fn test_build_without_runtime_fails() {
        let err = assert_err!(
            SessionBuilder::new()
                .buffer_store(Arc::new(MemoryStore))
                .build()
        );
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("tokio runtime"));
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_config() {
        let err = SessionBuilder::new()
            .config(BookmarksConfig::new().with_max_parameters(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        let err = SessionBuilder::new()
            .config(BookmarksConfig::new().with_max_concurrent_repeats(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_build_with_defaults() {
        let session = assert_ok!(
            SessionBuilder::new()
                .config(BookmarksConfig::new().with_temp_prefix("http-bookmarks-test-"))
                .build()
        );
        assert_eq!(session.caption(), "[^]");
        assert_eq!(session.store().size(), 0);
        assert!(session.add_repeated_to_table());
    }
}
