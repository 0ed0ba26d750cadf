//! Captured transaction types.
//!
//! A [`Transaction`] is one request/response pair as observed by the proxy,
//! together with the [`HttpService`] it was sent to. Transactions are owned
//! by the host tool; bookmarking annotates them in place.
//!
//! # Example
//!
//! ```ignore
//! use http_bookmarks::{HttpService, Transaction};
//!
//! let service = HttpService::http("example.com", 80);
//! let tx = Transaction::new(service, b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n".to_vec());
//! assert!(tx.response().is_none());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Protocol
// ============================================================================

/// Transport scheme of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Plain HTTP.
    #[default]
    Http,

    /// HTTP over TLS.
    Https,
}

impl Protocol {
    /// Returns the scheme string (`http` or `https`).
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// Returns the default port for the scheme.
    #[inline]
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// HttpService
// ============================================================================

/// Network service a request is sent to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HttpService {
    /// Host name or address.
    pub host: String,

    /// TCP port.
    pub port: u16,

    /// Scheme.
    pub protocol: Protocol,
}

impl HttpService {
    /// Creates a service descriptor.
    #[inline]
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, protocol: Protocol) -> Self {
        Self {
            host: host.into(),
            port,
            protocol,
        }
    }

    /// Creates a plain HTTP service descriptor.
    #[inline]
    #[must_use]
    pub fn http(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, Protocol::Http)
    }

    /// Creates an HTTPS service descriptor.
    #[inline]
    #[must_use]
    pub fn https(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, Protocol::Https)
    }

    /// Returns `host:port`.
    #[must_use]
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the origin URL, omitting the port when it is the default.
    #[must_use]
    pub fn origin(&self) -> String {
        if self.port == self.protocol.default_port() {
            format!("{}://{}", self.protocol, self.host)
        } else {
            format!("{}://{}:{}", self.protocol, self.host, self.port)
        }
    }

    /// Checks the descriptor can be used to open a connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidService`] for an empty host or port 0.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::invalid_service("empty host"));
        }
        if self.port == 0 {
            return Err(Error::invalid_service(format!(
                "port 0 for host {}",
                self.host
            )));
        }
        Ok(())
    }
}

impl fmt::Display for HttpService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.protocol, self.host, self.port)
    }
}

// ============================================================================
// Highlight
// ============================================================================

/// Row highlight colors understood by the host tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Highlight {
    /// `red`
    Red,
    /// `orange`
    Orange,
    /// `yellow`
    Yellow,
    /// `green`
    Green,
    /// `cyan`
    Cyan,
    /// `blue`
    Blue,
    /// `pink`
    Pink,
    /// `magenta`, applied to bookmarked transactions by default.
    #[default]
    Magenta,
    /// `gray`
    Gray,
}

impl Highlight {
    /// Returns the color name as the host tool expects it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Cyan => "cyan",
            Self::Blue => "blue",
            Self::Pink => "pink",
            Self::Magenta => "magenta",
            Self::Gray => "gray",
        }
    }
}

impl fmt::Display for Highlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Transaction
// ============================================================================

/// A captured request/response pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Service the request was sent to.
    service: HttpService,

    /// Raw request bytes.
    request: Vec<u8>,

    /// Raw response bytes, if a response was received.
    response: Option<Vec<u8>>,

    /// Highlight set by the operator or by bookmarking.
    highlight: Option<Highlight>,

    /// Comment set by the operator or by bookmarking.
    comment: Option<String>,
}

// ============================================================================
// Transaction - Constructors
// ============================================================================

impl Transaction {
    /// Creates a transaction with no response.
    #[inline]
    #[must_use]
    pub fn new(service: HttpService, request: impl Into<Vec<u8>>) -> Self {
        Self {
            service,
            request: request.into(),
            response: None,
            highlight: None,
            comment: None,
        }
    }

    /// Attaches response bytes.
    #[inline]
    #[must_use]
    pub fn with_response(mut self, response: impl Into<Vec<u8>>) -> Self {
        self.response = Some(response.into());
        self
    }
}

// ============================================================================
// Transaction - Accessors
// ============================================================================

impl Transaction {
    /// Returns the service descriptor.
    #[inline]
    #[must_use]
    pub fn service(&self) -> &HttpService {
        &self.service
    }

    /// Returns the raw request bytes.
    #[inline]
    #[must_use]
    pub fn request(&self) -> &[u8] {
        &self.request
    }

    /// Returns the raw response bytes, if any.
    #[inline]
    #[must_use]
    pub fn response(&self) -> Option<&[u8]> {
        self.response.as_deref()
    }

    /// Returns the highlight color, if set.
    #[inline]
    #[must_use]
    pub fn highlight(&self) -> Option<Highlight> {
        self.highlight
    }

    /// Returns the comment, if set.
    #[inline]
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Marks the transaction in the host tool's history.
    pub fn annotate(&mut self, highlight: Highlight, comment: impl Into<String>) {
        self.highlight = Some(highlight);
        self.comment = Some(comment.into());
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_omits_default_port() {
        assert_eq!(HttpService::http("a.test", 80).origin(), "http://a.test");
        assert_eq!(HttpService::https("a.test", 443).origin(), "https://a.test");
        assert_eq!(
            HttpService::http("a.test", 8080).origin(),
            "http://a.test:8080"
        );
    }

    #[test]
    fn test_validate_rejects_empty_host_and_zero_port() {
        assert!(HttpService::http("", 80).validate().is_err());
        assert!(HttpService::http("a.test", 0).validate().is_err());
        assert!(HttpService::http("a.test", 80).validate().is_ok());
    }

    #[test]
    fn test_annotate_sets_highlight_and_comment() {
        let mut tx = Transaction::new(HttpService::http("a.test", 80), b"GET / HTTP/1.1\r\n\r\n");
        assert!(tx.highlight().is_none());

        tx.annotate(Highlight::Magenta, "[^]");

        assert_eq!(tx.highlight(), Some(Highlight::Magenta));
        assert_eq!(tx.comment(), Some("[^]"));
    }

    #[test]
    fn test_highlight_serde_lowercase() {
        let json = serde_json::to_string(&Highlight::Magenta).unwrap();
        assert_eq!(json, "\"magenta\"");
        let parsed: Highlight = serde_json::from_str("\"cyan\"").unwrap();
        assert_eq!(parsed, Highlight::Cyan);
    }

    #[test]
    fn test_highlight_names_match_serde() {
        let all = [
            Highlight::Red,
            Highlight::Orange,
            Highlight::Yellow,
            Highlight::Green,
            Highlight::Cyan,
            Highlight::Blue,
            Highlight::Pink,
            Highlight::Magenta,
            Highlight::Gray,
        ];
        for color in all {
            let json = serde_json::to_string(&color).unwrap();
            assert_eq!(json, format!("\"{}\"", color.as_str()));
            assert_eq!(color.to_string(), color.as_str());
        }
        assert_eq!(Highlight::default(), Highlight::Magenta);
    }
}
