//! Request and response analysis.
//!
//! The [`TransactionAnalyzer`] trait is the seam to the host tool's own
//! analysis service. [`HttpAnalyzer`] is a self-contained implementation for
//! raw HTTP/1.x messages.
//!
//! # Parameters
//!
//! Parameters are reported in the order they appear in the message: URL
//! query string first, then the `Cookie` header, then an
//! `application/x-www-form-urlencoded` body. Names and values are kept
//! exactly as they appear on the wire (no percent-decoding).

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tracing::trace;
use url::Url;

use super::types::HttpService;

// ============================================================================
// Constants
// ============================================================================

/// How much of a body is inspected when sniffing its MIME type.
const SNIFF_LEN: usize = 512;

// ============================================================================
// Parameter
// ============================================================================

/// Where a parameter was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// URL query string.
    Url,

    /// `Cookie` request header.
    Cookie,

    /// Form-encoded request body.
    Body,
}

/// A single request parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name as sent.
    pub name: String,

    /// Parameter value as sent.
    pub value: String,

    /// Parameter location.
    pub kind: ParameterKind,
}

impl Parameter {
    /// Creates a parameter.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            kind,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

// ============================================================================
// RequestInfo / ResponseInfo
// ============================================================================

/// Fields derived from a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    /// HTTP method.
    pub method: String,

    /// Full request URL.
    pub url: String,

    /// Host component of the URL.
    pub host: String,

    /// URL scheme.
    pub protocol: String,

    /// Path plus query string.
    pub file: String,

    /// Parameters in appearance order.
    pub parameters: Vec<Parameter>,
}

/// Fields derived from a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseInfo {
    /// Status code, when the status line parses.
    pub status_code: Option<u16>,

    /// MIME type inferred from the body, falling back to the stated type.
    pub inferred_mime_type: String,

    /// MIME type derived from `Content-Type` only.
    pub stated_mime_type: String,
}

// ============================================================================
// TransactionAnalyzer
// ============================================================================

/// Parses raw messages into descriptive fields.
///
/// Implementations must not fail: unparseable input yields empty fields.
pub trait TransactionAnalyzer: Send + Sync {
    /// Analyzes request bytes sent to `service`.
    fn analyze_request(&self, service: &HttpService, request: &[u8]) -> RequestInfo;

    /// Analyzes response bytes.
    fn analyze_response(&self, response: &[u8]) -> ResponseInfo;
}

// ============================================================================
// MessageHead
// ============================================================================

/// Start line, headers and body offset of an HTTP/1.x message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MessageHead {
    /// First line without the line terminator.
    pub start_line: String,

    /// Headers in order, names as sent.
    pub headers: Vec<(String, String)>,

    /// Offset of the first body byte, or the message length when the head
    /// is not terminated.
    pub body_offset: usize,
}

impl MessageHead {
    /// Parses the head of `bytes`. Returns `None` for an empty message.
    pub(crate) fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }

        let (head_end, body_offset) = match find_subslice(bytes, b"\r\n\r\n") {
            Some(pos) => (pos, pos + 4),
            None => match find_subslice(bytes, b"\n\n") {
                Some(pos) => (pos, pos + 2),
                None => (bytes.len(), bytes.len()),
            },
        };

        let head = String::from_utf8_lossy(&bytes[..head_end]);
        let mut lines = head.lines();
        let start_line = lines.next().unwrap_or_default().trim_end().to_string();

        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .collect();

        Some(Self {
            start_line,
            headers,
            body_offset,
        })
    }

    /// Returns the first header value with the given name (case-insensitive).
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the declared `Content-Length`, if valid.
    pub(crate) fn content_length(&self) -> Option<usize> {
        self.header("content-length")
            .and_then(|v| v.trim().parse().ok())
    }

    /// Returns `true` when the body uses chunked transfer coding.
    pub(crate) fn is_chunked(&self) -> bool {
        self.header("transfer-encoding")
            .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"))
    }
}

/// Returns the index of the first occurrence of `needle` in `haystack`.
pub(crate) fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

// ============================================================================
// HttpAnalyzer
// ============================================================================

/// Built-in analyzer for raw HTTP/1.x messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpAnalyzer;

impl HttpAnalyzer {
    /// Creates the analyzer.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TransactionAnalyzer for HttpAnalyzer {
    fn analyze_request(&self, service: &HttpService, request: &[u8]) -> RequestInfo {
        let Some(head) = MessageHead::parse(request) else {
            return RequestInfo {
                url: service.origin(),
                host: service.host.clone(),
                protocol: service.protocol.to_string(),
                ..Default::default()
            };
        };

        let mut parts = head.start_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let target = parts.next().unwrap_or("/").to_string();

        let absolute = target.starts_with("http://") || target.starts_with("https://");
        let raw_url = if absolute {
            target.clone()
        } else {
            format!("{}{}", service.origin(), target)
        };

        let (url, host, protocol, file) = match Url::parse(&raw_url) {
            Ok(parsed) => {
                let file = match parsed.query() {
                    Some(query) => format!("{}?{}", parsed.path(), query),
                    None => parsed.path().to_string(),
                };
                (
                    parsed.to_string(),
                    parsed.host_str().unwrap_or_default().to_string(),
                    parsed.scheme().to_string(),
                    file,
                )
            }
            Err(e) => {
                trace!(url = %raw_url, error = %e, "Request URL did not parse, passing through");
                (
                    raw_url,
                    service.host.clone(),
                    service.protocol.to_string(),
                    target.clone(),
                )
            }
        };

        let mut parameters = Vec::new();

        if let Some((_, query)) = target.split_once('?') {
            let query = query.split('#').next().unwrap_or_default();
            parameters.extend(split_pairs(query, '&', ParameterKind::Url));
        }

        for (name, value) in &head.headers {
            if name.eq_ignore_ascii_case("cookie") {
                parameters.extend(split_pairs(value, ';', ParameterKind::Cookie));
            }
        }

        let is_form = head
            .header("content-type")
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/x-www-form-urlencoded"));
        if is_form && head.body_offset < request.len() {
            let body = String::from_utf8_lossy(&request[head.body_offset..]);
            parameters.extend(split_pairs(body.trim_end(), '&', ParameterKind::Body));
        }

        RequestInfo {
            method,
            url,
            host,
            protocol,
            file,
            parameters,
        }
    }

    fn analyze_response(&self, response: &[u8]) -> ResponseInfo {
        let Some(head) = MessageHead::parse(response) else {
            return ResponseInfo::default();
        };

        let status_code = head
            .start_line
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse::<u16>().ok());

        let stated_mime_type = head
            .header("content-type")
            .map(mime_from_content_type)
            .unwrap_or_default()
            .to_string();

        let body = &response[head.body_offset.min(response.len())..];
        let inferred_mime_type = sniff_mime(body)
            .map(str::to_string)
            .unwrap_or_else(|| stated_mime_type.clone());

        ResponseInfo {
            status_code,
            inferred_mime_type,
            stated_mime_type,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Splits `name=value` pairs separated by `separator`, skipping empty items.
fn split_pairs(input: &str, separator: char, kind: ParameterKind) -> Vec<Parameter> {
    input
        .split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match item.split_once('=') {
            Some((name, value)) => Parameter::new(name, value, kind),
            None => Parameter::new(item, "", kind),
        })
        .collect()
}

/// Maps a `Content-Type` header value to the tool's MIME vocabulary.
fn mime_from_content_type(content_type: &str) -> &'static str {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "text/html" | "application/xhtml+xml" => "HTML",
        "application/json" | "text/json" => "JSON",
        "text/xml" | "application/xml" | "image/svg+xml" => "XML",
        "text/css" => "CSS",
        "text/plain" => "text",
        "image/png" => "PNG",
        "image/jpeg" | "image/jpg" => "JPEG",
        "image/gif" => "GIF",
        s if s.contains("javascript") || s.contains("ecmascript") => "script",
        s if s.ends_with("+json") => "JSON",
        s if s.ends_with("+xml") => "XML",
        s if s.starts_with("image/") => "image",
        s if s.starts_with("text/") => "text",
        _ => "",
    }
}

/// Infers a MIME type from the leading bytes of a body.
fn sniff_mime(body: &[u8]) -> Option<&'static str> {
    if body.starts_with(b"\x89PNG") {
        return Some("PNG");
    }
    if body.starts_with(b"\xFF\xD8\xFF") {
        return Some("JPEG");
    }
    if body.starts_with(b"GIF8") {
        return Some("GIF");
    }

    let prefix = &body[..body.len().min(SNIFF_LEN)];
    let text = String::from_utf8_lossy(prefix).to_ascii_lowercase();
    let trimmed = text.trim_start();

    if trimmed.starts_with("<!doctype html") || trimmed.starts_with("<html") {
        return Some("HTML");
    }
    if trimmed.starts_with("<?xml") {
        return Some("XML");
    }
    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_slice::<serde_json::Value>(body).is_ok()
    {
        return Some("JSON");
    }
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> HttpService {
        HttpService::https("shop.test", 443)
    }

    #[test]
    fn test_request_line_and_url() {
        let req = b"GET /items/list?page=2&sort=asc HTTP/1.1\r\nHost: shop.test\r\n\r\n";
        let info = HttpAnalyzer.analyze_request(&service(), req);

        assert_eq!(info.method, "GET");
        assert_eq!(info.host, "shop.test");
        assert_eq!(info.protocol, "https");
        assert_eq!(info.url, "https://shop.test/items/list?page=2&sort=asc");
        assert_eq!(info.file, "/items/list?page=2&sort=asc");
    }

    #[test]
    fn test_non_default_port_kept_in_url() {
        let req = b"GET / HTTP/1.1\r\n\r\n";
        let info = HttpAnalyzer.analyze_request(&HttpService::http("127.0.0.1", 8080), req);
        assert_eq!(info.url, "http://127.0.0.1:8080/");
        assert_eq!(info.file, "/");
    }

    #[test]
    fn test_absolute_form_target() {
        let req = b"GET http://other.test/x HTTP/1.1\r\n\r\n";
        let info = HttpAnalyzer.analyze_request(&service(), req);
        assert_eq!(info.host, "other.test");
        assert_eq!(info.protocol, "http");
    }

    #[test]
    fn test_parameters_in_appearance_order() {
        let req = b"POST /login?next=%2Fhome HTTP/1.1\r\n\
                    Host: shop.test\r\n\
                    Cookie: sid=abc; theme=dark\r\n\
                    Content-Type: application/x-www-form-urlencoded\r\n\r\n\
                    user=alice&pass=s3cret";
        let info = HttpAnalyzer.analyze_request(&service(), req);

        let pairs: Vec<String> = info.parameters.iter().map(ToString::to_string).collect();
        assert_eq!(
            pairs,
            vec!["next=%2Fhome", "sid=abc", "theme=dark", "user=alice", "pass=s3cret"]
        );
        assert_eq!(info.parameters[0].kind, ParameterKind::Url);
        assert_eq!(info.parameters[1].kind, ParameterKind::Cookie);
        assert_eq!(info.parameters[4].kind, ParameterKind::Body);
    }

    #[test]
    fn test_parameter_without_value() {
        let req = b"GET /?flag&a=1 HTTP/1.1\r\n\r\n";
        let info = HttpAnalyzer.analyze_request(&service(), req);
        assert_eq!(info.parameters[0].name, "flag");
        assert_eq!(info.parameters[0].value, "");
    }

    #[test]
    fn test_empty_request_yields_service_fields() {
        let info = HttpAnalyzer.analyze_request(&service(), b"");
        assert_eq!(info.method, "");
        assert_eq!(info.host, "shop.test");
        assert!(info.parameters.is_empty());
    }

    #[test]
    fn test_response_status_and_mime() {
        let res = b"HTTP/1.1 404 Not Found\r\nContent-Type: text/html; charset=utf-8\r\n\r\n<html></html>";
        let info = HttpAnalyzer.analyze_response(res);
        assert_eq!(info.status_code, Some(404));
        assert_eq!(info.inferred_mime_type, "HTML");
        assert_eq!(info.stated_mime_type, "HTML");
    }

    #[test]
    fn test_sniffed_mime_overrides_stated() {
        let res = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\n{\"ok\":true}";
        let info = HttpAnalyzer.analyze_response(res);
        assert_eq!(info.inferred_mime_type, "JSON");
        assert_eq!(info.stated_mime_type, "text");
    }

    #[test]
    fn test_script_content_type() {
        let res = b"HTTP/1.1 200 OK\r\nContent-Type: application/javascript\r\n\r\nvar a = 1;";
        assert_eq!(HttpAnalyzer.analyze_response(res).inferred_mime_type, "script");
    }

    #[test]
    fn test_garbage_response() {
        let info = HttpAnalyzer.analyze_response(b"not http at all");
        assert_eq!(info.status_code, None);
        assert_eq!(info.inferred_mime_type, "");
    }

    #[test]
    fn test_message_head_framing() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nTransfer-Encoding: Chunked\r\n\r\nhello";
        let head = MessageHead::parse(raw).unwrap();
        assert_eq!(head.start_line, "HTTP/1.1 200 OK");
        assert_eq!(head.content_length(), Some(5));
        assert!(head.is_chunked());
        assert_eq!(&raw[head.body_offset..], b"hello");
    }
}
