//! Bookmark entity.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::identifiers::BookmarkId;
use crate::transaction::{HttpService, TransactionRef};

// ============================================================================
// Metadata
// ============================================================================

/// Descriptive fields extracted from a transaction.
///
/// Every field is display text; anything that could not be determined is
/// an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    /// Local capture time, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,

    /// Host name.
    pub host: String,

    /// Full URL.
    pub url: String,

    /// Request method.
    pub method: String,

    /// Response status code.
    pub status_code: String,

    /// HTML page title.
    pub title: String,

    /// Inferred MIME type.
    pub mime_type: String,

    /// `http` or `https`.
    pub protocol: String,

    /// Path plus query.
    pub file: String,

    /// `name=value` pairs joined by `", "`.
    pub parameters: String,
}

// ============================================================================
// Bookmark
// ============================================================================

/// An immutable, durable snapshot of one transaction.
///
/// To correct a bookmark, remove it and add a new one.
#[derive(Debug, Clone)]
pub struct Bookmark {
    /// Stable identity.
    id: BookmarkId,

    /// Externalized request/response bytes.
    transaction: TransactionRef,

    /// Extracted fields.
    metadata: Metadata,

    /// Created by the repeat workflow.
    repeated: bool,
}

impl Bookmark {
    /// Creates a bookmark with a freshly allocated [`BookmarkId`].
    #[must_use]
    pub fn new(transaction: TransactionRef, metadata: Metadata, repeated: bool) -> Self {
        Self {
            id: BookmarkId::next(),
            transaction,
            metadata,
            repeated,
        }
    }
}

// ============================================================================
// Bookmark - Accessors
// ============================================================================

impl Bookmark {
    /// Returns the stable identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> BookmarkId {
        self.id
    }

    /// Returns the externalized transaction.
    #[inline]
    #[must_use]
    pub fn transaction(&self) -> &TransactionRef {
        &self.transaction
    }

    /// Returns the originating service.
    #[inline]
    #[must_use]
    pub fn service(&self) -> &HttpService {
        self.transaction.service()
    }

    /// Returns all extracted fields.
    #[inline]
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Returns the capture time.
    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.metadata.timestamp
    }

    /// Returns the host.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.metadata.host
    }

    /// Returns the URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.metadata.url
    }

    /// Returns the request method.
    #[inline]
    #[must_use]
    pub fn method(&self) -> &str {
        &self.metadata.method
    }

    /// Returns the status code, `""` without a response.
    #[inline]
    #[must_use]
    pub fn status_code(&self) -> &str {
        &self.metadata.status_code
    }

    /// Returns the page title, `""` if none was found.
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    /// Returns the inferred MIME type, `""` without a response.
    #[inline]
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.metadata.mime_type
    }

    /// Returns the protocol.
    #[inline]
    #[must_use]
    pub fn protocol(&self) -> &str {
        &self.metadata.protocol
    }

    /// Returns the path plus query.
    #[inline]
    #[must_use]
    pub fn file(&self) -> &str {
        &self.metadata.file
    }

    /// Returns the joined parameters.
    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &str {
        &self.metadata.parameters
    }

    /// Returns `true` if created by the repeat workflow.
    #[inline]
    #[must_use]
    pub fn is_repeated(&self) -> bool {
        self.repeated
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transaction;

    fn stored() -> TransactionRef {
        TransactionRef::in_memory(&Transaction::new(
            HttpService::http("a.test", 80),
            b"GET / HTTP/1.1\r\n\r\n".to_vec(),
        ))
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Bookmark::new(stored(), Metadata::default(), false);
        let b = Bookmark::new(stored(), Metadata::default(), false);
        assert_ne!(a.id(), b.id());
        assert!(b.id() > a.id());
    }

    #[test]
    fn test_accessors() {
        let metadata = Metadata {
            host: "a.test".into(),
            method: "GET".into(),
            parameters: "q=1".into(),
            ..Metadata::default()
        };
        let bookmark = Bookmark::new(stored(), metadata, true);

        assert_eq!(bookmark.host(), "a.test");
        assert_eq!(bookmark.method(), "GET");
        assert_eq!(bookmark.parameters(), "q=1");
        assert_eq!(bookmark.status_code(), "");
        assert_eq!(bookmark.service().port, 80);
        assert!(bookmark.is_repeated());
    }
}
