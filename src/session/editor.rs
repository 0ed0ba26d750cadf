//! Message editor state and the viewer seam.
//!
//! Selecting a row loads the bookmark's bytes into the [`MessageEditor`].
//! The request there may be edited by hand before a repeat; the
//! [`MessageViewer`] is told whenever either side changes.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::identifiers::BookmarkId;
use crate::transaction::{HttpService, Transaction};

// ============================================================================
// MessageViewer
// ============================================================================

/// Renders request/response bytes and failure messages.
///
/// Called only from the thread that owns the session.
pub trait MessageViewer: Send + Sync {
    /// Displays a request.
    fn show_request(&self, service: &HttpService, request: &[u8]);

    /// Displays a response. Empty when the transaction had none.
    fn show_response(&self, response: &[u8]);

    /// Displays a failed repeat.
    fn report_failure(&self, error: &Error);
}

/// Viewer that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingViewer;

impl MessageViewer for TracingViewer {
    fn show_request(&self, service: &HttpService, request: &[u8]) {
        debug!(service = %service, len = request.len(), "Showing request");
    }

    fn show_response(&self, response: &[u8]) {
        debug!(len = response.len(), "Showing response");
    }

    fn report_failure(&self, error: &Error) {
        warn!(error = %error, "Repeat failed");
    }
}

/// One call received by a [`CapturingViewer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    /// [`MessageViewer::show_request`].
    Request {
        /// Target service.
        service: HttpService,
        /// Request bytes.
        bytes: Vec<u8>,
    },

    /// [`MessageViewer::show_response`].
    Response(Vec<u8>),

    /// [`MessageViewer::report_failure`], rendered with `Display`.
    Failure(String),
}

/// Viewer that records every call, for headless hosts.
#[derive(Debug, Default)]
pub struct CapturingViewer {
    events: Mutex<Vec<ViewerEvent>>,
}

impl CapturingViewer {
    /// Creates an empty viewer.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded calls.
    #[must_use]
    pub fn events(&self) -> Vec<ViewerEvent> {
        self.events.lock().clone()
    }

    /// Removes and returns the recorded calls.
    pub fn take_events(&self) -> Vec<ViewerEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Returns the most recently shown response.
    #[must_use]
    pub fn last_response(&self) -> Option<Vec<u8>> {
        self.events.lock().iter().rev().find_map(|event| match event {
            ViewerEvent::Response(bytes) => Some(bytes.clone()),
            _ => None,
        })
    }

    /// Returns every reported failure.
    #[must_use]
    pub fn failures(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ViewerEvent::Failure(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the number of responses shown.
    #[must_use]
    pub fn response_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, ViewerEvent::Response(_)))
            .count()
    }
}

impl MessageViewer for CapturingViewer {
    fn show_request(&self, service: &HttpService, request: &[u8]) {
        self.events.lock().push(ViewerEvent::Request {
            service: service.clone(),
            bytes: request.to_vec(),
        });
    }

    fn show_response(&self, response: &[u8]) {
        self.events.lock().push(ViewerEvent::Response(response.to_vec()));
    }

    fn report_failure(&self, error: &Error) {
        self.events.lock().push(ViewerEvent::Failure(error.to_string()));
    }
}

// ============================================================================
// MessageEditor
// ============================================================================

/// Contents of the editor after a row was selected.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Loaded {
    bookmark: BookmarkId,
    service: HttpService,
    request: Vec<u8>,
    response: Vec<u8>,
}

/// Editable copy of the selected bookmark.
#[derive(Debug, Clone, Default)]
pub struct MessageEditor {
    loaded: Option<Loaded>,
}

impl MessageEditor {
    /// Creates an empty editor.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the editor contents with `transaction`.
    pub fn load(&mut self, bookmark: BookmarkId, transaction: Transaction) {
        let response = transaction.response().map(<[u8]>::to_vec).unwrap_or_default();
        let service = transaction.service().clone();
        self.loaded = Some(Loaded {
            bookmark,
            service,
            request: transaction.request().to_vec(),
            response,
        });
    }

    /// Empties the editor.
    pub fn clear(&mut self) {
        self.loaded = None;
    }

    /// Returns `true` if a bookmark is loaded.
    #[inline]
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Returns the loaded bookmark's identity.
    #[inline]
    #[must_use]
    pub fn bookmark(&self) -> Option<BookmarkId> {
        self.loaded.as_ref().map(|l| l.bookmark)
    }

    /// Returns the service the request goes to.
    #[inline]
    #[must_use]
    pub fn service(&self) -> Option<&HttpService> {
        self.loaded.as_ref().map(|l| &l.service)
    }

    /// Returns the current, possibly edited, request.
    #[inline]
    #[must_use]
    pub fn request(&self) -> Option<&[u8]> {
        self.loaded.as_ref().map(|l| l.request.as_slice())
    }

    /// Returns the response shown next to the request.
    #[inline]
    #[must_use]
    pub fn response(&self) -> Option<&[u8]> {
        self.loaded.as_ref().map(|l| l.response.as_slice())
    }

    /// Replaces the request bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSelection`] if nothing is loaded.
    pub fn set_request(&mut self, request: Vec<u8>) -> Result<()> {
        let loaded = self.loaded.as_mut().ok_or(Error::NoSelection)?;
        loaded.request = request;
        Ok(())
    }

    /// Replaces the response bytes. Ignored if nothing is loaded.
    pub fn set_response(&mut self, response: Vec<u8>) {
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.response = response;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
