//! Metadata extraction.
//!
//! [`MetadataExtractor::create_bookmark`] turns a live transaction into a
//! [`Bookmark`]:
//!
//! 1. Copy the buffers through the [`BufferStore`]
//! 2. Analyze the request (host, URL, method, protocol, file, parameters)
//! 3. Analyze the response if there is one (status, MIME type)
//! 4. Pull the first `<title>` out of the response
//! 5. Annotate the source transaction
//!
//! Extraction never fails. Anything that cannot be determined is `""`, and
//! a store that cannot write falls back to an in-memory copy.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, LazyLock};

use chrono::Local;
use regex::Regex;
use tracing::{debug, warn};

use crate::session::BookmarksConfig;
use crate::transaction::{
    BufferStore, Highlight, Parameter, Transaction, TransactionAnalyzer, TransactionRef,
};

use super::entity::{Bookmark, Metadata};

// ============================================================================
// Constants
// ============================================================================

/// Display format of [`Metadata::timestamp`].
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Separator between joined parameters.
const PARAMETER_SEPARATOR: &str = ", ";

/// First non-greedy `<title>` element on a single line.
static TITLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title>(.*?)</title>").expect("title pattern is valid"));

// ============================================================================
// MetadataExtractor
// ============================================================================

/// Builds bookmarks from transactions.
#[derive(Clone)]
pub struct MetadataExtractor {
    /// Request/response parser.
    analyzer: Arc<dyn TransactionAnalyzer>,

    /// Buffer externalization.
    buffers: Arc<dyn BufferStore>,

    /// Parameters kept in the joined column.
    max_parameters: usize,

    /// Highlight applied to the source transaction.
    highlight: Highlight,

    /// Comment applied to the source transaction.
    comment: String,
}

impl MetadataExtractor {
    /// Creates an extractor with the default annotation and parameter limit.
    #[must_use]
    pub fn new(analyzer: Arc<dyn TransactionAnalyzer>, buffers: Arc<dyn BufferStore>) -> Self {
        Self::with_config(analyzer, buffers, &BookmarksConfig::default())
    }

    /// Creates an extractor using the annotation and limit from `config`.
    #[must_use]
    pub fn with_config(
        analyzer: Arc<dyn TransactionAnalyzer>,
        buffers: Arc<dyn BufferStore>,
        config: &BookmarksConfig,
    ) -> Self {
        Self {
            analyzer,
            buffers,
            max_parameters: config.max_parameters,
            highlight: config.highlight,
            comment: config.comment.clone(),
        }
    }

    /// Returns the parameter limit.
    #[inline]
    #[must_use]
    pub fn max_parameters(&self) -> usize {
        self.max_parameters
    }

    /// Creates a bookmark and annotates `transaction`.
    ///
    /// # Arguments
    ///
    /// * `transaction` - Source transaction; receives highlight and comment
    /// * `repeated` - `true` when called from the repeat workflow
    pub fn create_bookmark(&self, transaction: &mut Transaction, repeated: bool) -> Bookmark {
        let stored = self.externalize(transaction);
        let service = transaction.service();

        let request = self.analyzer.analyze_request(service, transaction.request());

        let (status_code, mime_type, title) = match transaction.response() {
            Some(bytes) => {
                let response = self.analyzer.analyze_response(bytes);
                (
                    response
                        .status_code
                        .map(|code| code.to_string())
                        .unwrap_or_default(),
                    response.inferred_mime_type,
                    extract_title(bytes),
                )
            }
            None => (String::new(), String::new(), String::new()),
        };

        let metadata = Metadata {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            host: request.host,
            url: request.url,
            method: request.method,
            status_code,
            title,
            mime_type,
            protocol: request.protocol,
            file: request.file,
            parameters: join_parameters(&request.parameters, self.max_parameters),
        };

        transaction.annotate(self.highlight, self.comment.clone());

        let bookmark = Bookmark::new(stored, metadata, repeated);
        debug!(
            id = %bookmark.id(),
            url = bookmark.url(),
            repeated,
            "Created bookmark"
        );
        bookmark
    }

    /// Copies the buffers, falling back to memory if the store fails.
    fn externalize(&self, transaction: &Transaction) -> TransactionRef {
        match self.buffers.externalize(transaction) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(
                    service = %transaction.service(),
                    error = %e,
                    "Buffer store failed, keeping bookmark in memory"
                );
                TransactionRef::in_memory(transaction)
            }
        }
    }
}

impl fmt::Debug for MetadataExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataExtractor")
            .field("max_parameters", &self.max_parameters)
            .field("highlight", &self.highlight)
            .field("comment", &self.comment)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Returns the text of the first `<title>` element, or `""`.
///
/// The response is decoded lossily, so invalid UTF-8 never hides a title.
#[must_use]
pub fn extract_title(response: &[u8]) -> String {
    let html = String::from_utf8_lossy(response);
    TITLE_PATTERN
        .captures(&html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Joins the first `limit` parameters as `name=value` with `", "`.
#[must_use]
pub fn join_parameters(parameters: &[Parameter], limit: usize) -> String {
    parameters
        .iter()
        .take(limit)
        .map(Parameter::to_string)
        .collect::<Vec<_>>()
        .join(PARAMETER_SEPARATOR)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::error::{Error, Result};
    use crate::transaction::{HttpAnalyzer, HttpService, MemoryStore, ParameterKind};

    struct FailingStore;

    impl BufferStore for FailingStore {
        fn externalize(&self, _transaction: &Transaction) -> Result<TransactionRef> {
            Err(Error::Io(std::io::Error::other("disk full")))
        }
    }

    fn extractor() -> MetadataExtractor {
        MetadataExtractor::new(Arc::new(HttpAnalyzer::new()), Arc::new(MemoryStore))
    }

    fn request(target: &str) -> Vec<u8> {
        format!("GET {target} HTTP/1.1\r\nHost: shop.test\r\n\r\n").into_bytes()
    }

    #[test]
    fn test_no_response_leaves_fields_empty() {
        let mut tx = Transaction::new(HttpService::http("shop.test", 80), request("/cart"));
        let bookmark = extractor().create_bookmark(&mut tx, false);

        assert_eq!(bookmark.status_code(), "");
        assert_eq!(bookmark.mime_type(), "");
        assert_eq!(bookmark.title(), "");
        assert_eq!(bookmark.host(), "shop.test");
        assert_eq!(bookmark.method(), "GET");
        assert_eq!(bookmark.file(), "/cart");
        assert!(!bookmark.is_repeated());
        assert!(!bookmark.transaction().has_response());
    }

    #[test]
    fn test_full_transaction() {
        let response = b"HTTP/1.1 404 Not Found\r\nContent-Type: text/html\r\n\r\n\
            <html><title>Missing</title></html>"
            .to_vec();
        let mut tx = Transaction::new(HttpService::https("shop.test", 443), request("/x?id=7"))
            .with_response(response);
        let bookmark = extractor().create_bookmark(&mut tx, true);

        assert_eq!(bookmark.status_code(), "404");
        assert_eq!(bookmark.mime_type(), "HTML");
        assert_eq!(bookmark.title(), "Missing");
        assert_eq!(bookmark.protocol(), "https");
        assert_eq!(bookmark.url(), "https://shop.test/x?id=7");
        assert_eq!(bookmark.file(), "/x?id=7");
        assert_eq!(bookmark.parameters(), "id=7");
        assert!(bookmark.is_repeated());
    }

    #[test]
    fn test_timestamp_format() {
        let mut tx = Transaction::new(HttpService::http("shop.test", 80), request("/"));
        let bookmark = extractor().create_bookmark(&mut tx, false);

        let parsed =
            chrono::NaiveDateTime::parse_from_str(bookmark.timestamp(), TIMESTAMP_FORMAT);
        assert!(parsed.is_ok(), "bad timestamp {:?}", bookmark.timestamp());
    }

    #[test]
    fn test_annotates_source_transaction() {
        let mut tx = Transaction::new(HttpService::http("shop.test", 80), request("/"));
        extractor().create_bookmark(&mut tx, false);

        assert_eq!(tx.highlight(), Some(Highlight::Magenta));
        assert_eq!(tx.comment(), Some("[^]"));
    }

    #[test]
    fn test_configured_annotation() {
        let config = BookmarksConfig::new()
            .with_highlight(Highlight::Green)
            .with_comment("saved");
        let extractor = MetadataExtractor::with_config(
            Arc::new(HttpAnalyzer::new()),
            Arc::new(MemoryStore),
            &config,
        );
        let mut tx = Transaction::new(HttpService::http("shop.test", 80), request("/"));
        extractor.create_bookmark(&mut tx, false);

        assert_eq!(tx.highlight(), Some(Highlight::Green));
        assert_eq!(tx.comment(), Some("saved"));
    }

    #[test]
    fn test_store_failure_falls_back_to_memory() {
        let extractor =
            MetadataExtractor::new(Arc::new(HttpAnalyzer::new()), Arc::new(FailingStore));
        let mut tx = Transaction::new(HttpService::http("shop.test", 80), request("/"));
        let bookmark = extractor.create_bookmark(&mut tx, false);

        assert_eq!(bookmark.transaction().request().unwrap(), request("/"));
        assert!(!bookmark.transaction().request_buffer().is_externalized());
    }

    #[test]
    fn test_title_first_match_non_greedy() {
        let html = b"<title>One</title><p>x</p><title>Two</title>";
        assert_eq!(extract_title(html), "One");
    }

    #[test]
    fn test_title_absent() {
        assert_eq!(extract_title(b"<html><body>no title</body></html>"), "");
        assert_eq!(extract_title(b""), "");
    }

    #[test]
    fn test_title_does_not_span_lines() {
        assert_eq!(extract_title(b"<title>a\nb</title>"), "");
    }

    #[test]
    fn test_title_survives_invalid_utf8() {
        let mut html = vec![0xff, 0xfe];
        html.extend_from_slice(b"<title>Ok</title>");
        assert_eq!(extract_title(&html), "Ok");
    }

    #[test]
    fn test_join_parameters_truncates_to_limit() {
        let params: Vec<Parameter> = (0..7)
            .map(|i| Parameter::new(format!("p{i}"), i.to_string(), ParameterKind::Url))
            .collect();

        assert_eq!(
            join_parameters(&params, 5),
            "p0=0, p1=1, p2=2, p3=3, p4=4"
        );
        assert_eq!(join_parameters(&params[..2], 5), "p0=0, p1=1");
        assert_eq!(join_parameters(&[], 5), "");
    }

    #[test]
    fn test_seven_query_parameters_keep_first_five() {
        let mut tx = Transaction::new(
            HttpService::http("shop.test", 80),
            request("/s?a=1&b=2&c=3&d=4&e=5&f=6&g=7"),
        );
        let bookmark = extractor().create_bookmark(&mut tx, false);
        assert_eq!(bookmark.parameters(), "a=1, b=2, c=3, d=4, e=5");
    }

    proptest! {
        #[test]
        fn prop_join_keeps_prefix_in_order(
            names in proptest::collection::vec("[a-z]{1,6}", 0..12),
            limit in 1usize..8,
        ) {
            let params: Vec<Parameter> = names
                .iter()
                .map(|n| Parameter::new(n.clone(), "v", ParameterKind::Url))
                .collect();
            let joined = join_parameters(&params, limit);

            let expected: Vec<String> = names
                .iter()
                .take(limit)
                .map(|n| format!("{n}=v"))
                .collect();
            prop_assert_eq!(joined, expected.join(", "));
        }

        #[test]
        fn prop_title_is_first_element(
            first in "[A-Za-z0-9 ]{0,20}",
            second in "[A-Za-z0-9 ]{0,20}",
            prefix in "[a-z ]{0,20}",
        ) {
            let html = format!("{prefix}<title>{first}</title><title>{second}</title>");
            prop_assert_eq!(extract_title(html.as_bytes()), first);
        }
    }
}
