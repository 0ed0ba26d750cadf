//! Bookmark session.
//!
//! The session is the single owner of bookmark state. Everything that
//! mutates the store runs on the thread holding `&mut BookmarkSession`;
//! repeat workers only produce [`RepeatReport`]s, which are applied by
//! [`process_completions`](BookmarkSession::process_completions) or
//! [`next_completion`](BookmarkSession::next_completion).

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::bookmark::{Bookmark, BookmarkStore, CellValue, Column, MetadataExtractor, TableEvent};
use crate::error::{Error, Result};
use crate::identifiers::RepeatId;
use crate::repeat::{RepeatReport, RepeatWorkflow};
use crate::transaction::{BufferStore, HttpIssuer, Transaction, TransactionAnalyzer};

use super::builder::SessionBuilder;
use super::editor::{MessageEditor, MessageViewer};
use super::options::BookmarksConfig;

// ============================================================================
// Completion
// ============================================================================

/// What applying a [`RepeatReport`] did.
#[derive(Debug)]
pub enum Completion {
    /// Response shown and recorded as a new bookmark.
    Bookmarked(Arc<Bookmark>),

    /// Response shown only.
    Shown,

    /// Failure reported to the viewer; the store is unchanged.
    Failed(Error),
}

impl Completion {
    /// Returns the new bookmark, if one was added.
    #[inline]
    #[must_use]
    pub fn bookmark(&self) -> Option<&Arc<Bookmark>> {
        match self {
            Self::Bookmarked(bookmark) => Some(bookmark),
            _ => None,
        }
    }

    /// Returns `true` if the repeat failed.
    #[inline]
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

// ============================================================================
// BookmarkSession
// ============================================================================

/// Bookmarks table, message editor and repeat queue for one tool session.
pub struct BookmarkSession {
    /// Session settings.
    config: BookmarksConfig,

    /// Bookmark rows.
    store: BookmarkStore,

    /// Turns transactions into bookmarks.
    extractor: MetadataExtractor,

    /// Selected bookmark's editable bytes.
    editor: MessageEditor,

    /// Viewer collaborator.
    viewer: Arc<dyn MessageViewer>,

    /// In-flight repeats.
    repeats: RepeatWorkflow,

    /// "Add repeated request to table" toggle.
    add_repeated_to_table: bool,
}

// ============================================================================
// BookmarkSession - Construction
// ============================================================================

impl BookmarkSession {
    /// Creates a session builder.
    #[inline]
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Assembles a session from validated parts.
    pub(crate) fn new(
        config: BookmarksConfig,
        analyzer: Arc<dyn TransactionAnalyzer>,
        buffers: Arc<dyn BufferStore>,
        issuer: Arc<dyn HttpIssuer>,
        viewer: Arc<dyn MessageViewer>,
        runtime: Handle,
    ) -> Self {
        let extractor = MetadataExtractor::with_config(analyzer, buffers, &config);
        let repeats = RepeatWorkflow::new(issuer, runtime, config.max_concurrent_repeats);
        let add_repeated_to_table = config.add_repeated_to_table;

        debug!(
            caption = %config.tab_caption,
            max_concurrent_repeats = ?config.max_concurrent_repeats,
            "Bookmark session created"
        );

        Self {
            config,
            store: BookmarkStore::new(),
            extractor,
            editor: MessageEditor::new(),
            viewer,
            repeats,
            add_repeated_to_table,
        }
    }
}

// ============================================================================
// BookmarkSession - Accessors
// ============================================================================

impl BookmarkSession {
    /// Returns the tab caption.
    #[inline]
    #[must_use]
    pub fn caption(&self) -> &str {
        &self.config.tab_caption
    }

    /// Returns the session settings.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &BookmarksConfig {
        &self.config
    }

    /// Returns the bookmark rows.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &BookmarkStore {
        &self.store
    }

    /// Returns the message editor.
    #[inline]
    #[must_use]
    pub fn editor(&self) -> &MessageEditor {
        &self.editor
    }

    /// Returns the cell at (`row`, `column`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `row` is past the end.
    pub fn value_at(&self, row: usize, column: Column) -> Result<CellValue> {
        self.store.value_at(row, column)
    }

    /// Registers a table observer.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: Fn(&TableEvent) + Send + Sync + 'static,
    {
        self.store.subscribe(observer);
    }

    /// Returns the "add repeated request to table" toggle.
    #[inline]
    #[must_use]
    pub fn add_repeated_to_table(&self) -> bool {
        self.add_repeated_to_table
    }

    /// Sets the "add repeated request to table" toggle.
    ///
    /// Repeats already running keep the value they started with.
    pub fn set_add_repeated_to_table(&mut self, enabled: bool) {
        self.add_repeated_to_table = enabled;
    }

    /// Returns the number of repeats not yet applied.
    #[inline]
    #[must_use]
    pub fn pending_repeats(&self) -> usize {
        self.repeats.pending()
    }
}

// ============================================================================
// BookmarkSession - Table Operations
// ============================================================================

impl BookmarkSession {
    /// Bookmarks each transaction, in order.
    ///
    /// Each transaction is annotated with the configured highlight and
    /// comment.
    pub fn add_bookmarks(&mut self, transactions: &mut [Transaction]) -> Vec<Arc<Bookmark>> {
        let added: Vec<_> = transactions
            .iter_mut()
            .map(|transaction| {
                let bookmark = self.extractor.create_bookmark(transaction, false);
                self.store.add(bookmark)
            })
            .collect();

        info!(count = added.len(), total = self.store.size(), "Bookmarks added");
        added
    }

    /// Loads the bookmark at `row` into the editor and viewer.
    ///
    /// # Errors
    ///
    /// - [`Error::IndexOutOfRange`] if `row` is past the end
    /// - [`Error::Io`] if the stored buffers cannot be read
    pub fn select_row(&mut self, row: usize) -> Result<()> {
        let bookmark = self.store.get(row)?;
        let transaction = bookmark.transaction().load()?;

        self.viewer
            .show_request(transaction.service(), transaction.request());
        self.viewer
            .show_response(transaction.response().unwrap_or_default());
        self.editor.load(bookmark.id(), transaction);

        debug!(row, id = %bookmark.id(), "Row selected");
        Ok(())
    }

    /// Replaces the request in the editor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSelection`] if no row is selected.
    pub fn edit_request(&mut self, request: Vec<u8>) -> Result<()> {
        self.editor.set_request(request)
    }

    /// Removes the given bookmarks by identity.
    pub fn remove_many(&mut self, selected: &[Arc<Bookmark>]) -> usize {
        self.store.remove_many(selected)
    }

    /// Removes the rows at `indices`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if any index is past the end.
    pub fn remove_rows(&mut self, indices: &[usize]) -> Result<usize> {
        self.store.remove_rows(indices)
    }

    /// Removes every bookmark.
    pub fn clear(&mut self) {
        self.store.clear();
    }
}

// ============================================================================
// BookmarkSession - Repeat
// ============================================================================

impl BookmarkSession {
    /// Repeats the editor's request using the toggle's current value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSelection`] if no row is selected.
    pub fn repeat(&mut self) -> Result<RepeatId> {
        self.repeat_with(self.add_repeated_to_table)
    }

    /// Repeats the editor's request.
    ///
    /// Returns immediately; the result is applied when completions are
    /// processed.
    ///
    /// # Arguments
    ///
    /// * `also_bookmark` - Record the result as a new repeated bookmark
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSelection`] if no row is selected.
    pub fn repeat_with(&mut self, also_bookmark: bool) -> Result<RepeatId> {
        let (Some(service), Some(request)) = (self.editor.service(), self.editor.request()) else {
            return Err(Error::NoSelection);
        };
        let service = service.clone();
        let request = request.to_vec();

        Ok(self.repeats.spawn(service, request, also_bookmark))
    }

    /// Applies every finished repeat without waiting.
    pub fn process_completions(&mut self) -> Vec<Completion> {
        let mut applied = Vec::new();
        while let Some(report) = self.repeats.try_next() {
            applied.push(self.apply(report));
        }
        applied
    }

    /// Waits for the next repeat to finish and applies it.
    ///
    /// Returns `None` when no repeat is in flight.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        let report = self.repeats.next().await?;
        Some(self.apply(report))
    }

    /// Applies one report on the owning thread.
    fn apply(&mut self, report: RepeatReport) -> Completion {
        let RepeatReport {
            id,
            also_bookmark,
            outcome,
            ..
        } = report;

        let mut transaction = match outcome {
            Ok(transaction) => transaction,
            Err(e) => {
                self.viewer.report_failure(&e);
                return Completion::Failed(e);
            }
        };

        let response = transaction.response().unwrap_or_default().to_vec();
        self.viewer.show_response(&response);
        self.editor.set_response(response);

        if !also_bookmark {
            debug!(%id, "Repeat shown");
            return Completion::Shown;
        }

        let bookmark = self.extractor.create_bookmark(&mut transaction, true);
        let bookmark = self.store.add(bookmark);
        info!(%id, bookmark = %bookmark.id(), "Repeat bookmarked");
        Completion::Bookmarked(bookmark)
    }
}

impl fmt::Debug for BookmarkSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookmarkSession")
            .field("caption", &self.config.tab_caption)
            .field("store", &self.store)
            .field("editor", &self.editor.bookmark())
            .field("repeats", &self.repeats)
            .field("add_repeated_to_table", &self.add_repeated_to_table)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
