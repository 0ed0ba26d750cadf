//! Request issuing.
//!
//! [`HttpIssuer`] is the seam to the host tool's HTTP client. The built-in
//! [`TcpIssuer`] writes the raw request bytes to a TCP connection, wrapped in
//! TLS for HTTPS services, and reads back one HTTP/1.x response. HTTPS uses
//! the bundled web PKI roots unless a [`ClientConfig`] is supplied with
//! [`TcpIssuer::with_tls_config`].
//!
//! # Response Framing
//!
//! | Response | Complete when |
//! |----------|---------------|
//! | 1xx other than 101 | never; the interim head is dropped and reading continues |
//! | `Content-Length: n` | `n` body bytes received |
//! | `Transfer-Encoding: chunked` | zero-size chunk and trailer section received |
//! | 101 / 204 / 304, or a `HEAD` request | head received |
//! | otherwise | peer closes the connection |
//!
//! If the read deadline passes after part of the final response arrived, the
//! partial bytes are returned as the response. A deadline with nothing
//! received fails with [`Error::NetworkFailure`].

// ============================================================================
// Imports
// ============================================================================

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout, timeout_at};
use tokio_rustls::TlsConnector;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

use super::analyzer::{MessageHead, find_subslice};
use super::types::{HttpService, Protocol, Transaction};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for establishing the connection, TLS handshake included.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for receiving the complete response.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Read deadline used when the read timeout overflows the clock.
const FAR_DEADLINE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Read buffer size.
const READ_CHUNK: usize = 8 * 1024;

// ============================================================================
// HttpIssuer
// ============================================================================

/// Sends a raw request to a service and returns the resulting transaction.
#[async_trait]
pub trait HttpIssuer: Send + Sync {
    /// Issues `request` to `service`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidService`] if the service cannot be connected to
    /// - [`Error::NetworkFailure`] on connection errors, TLS failures or
    ///   timeouts
    async fn issue(&self, service: &HttpService, request: &[u8]) -> Result<Transaction>;
}

// ============================================================================
// TcpIssuer
// ============================================================================

/// HTTP/1.x issuer over TCP, with TLS for HTTPS services.
#[derive(Debug, Clone)]
pub struct TcpIssuer {
    /// Timeout for the TCP and TLS handshakes.
    connect_timeout: Duration,

    /// Timeout for writing the request and reading the full response.
    read_timeout: Duration,

    /// TLS client configuration; `None` uses [`default_tls_config`].
    tls: Option<Arc<ClientConfig>>,
}

impl Default for TcpIssuer {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT)
    }
}

impl TcpIssuer {
    /// Creates an issuer with explicit timeouts.
    #[inline]
    #[must_use]
    pub const fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            read_timeout,
            tls: None,
        }
    }

    /// Uses `config` for HTTPS services instead of the bundled roots.
    #[must_use]
    pub fn with_tls_config(mut self, config: Arc<ClientConfig>) -> Self {
        self.tls = Some(config);
        self
    }

    /// Returns the connect timeout.
    #[inline]
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the read timeout.
    #[inline]
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Opens a TCP connection to `service`.
    async fn connect(&self, service: &HttpService, peer: &str) -> Result<TcpStream> {
        timeout(
            self.connect_timeout,
            TcpStream::connect((service.host.as_str(), service.port)),
        )
        .await
        .map_err(|_| {
            Error::network_failure(
                peer,
                format!(
                    "connect timed out after {}ms",
                    self.connect_timeout.as_millis()
                ),
            )
        })?
        .map_err(|e| Error::network_failure(peer, e.to_string()))
    }

    /// Runs the TLS handshake for `service` over `stream`.
    async fn handshake(
        &self,
        service: &HttpService,
        stream: TcpStream,
        peer: &str,
    ) -> Result<tokio_rustls::client::TlsStream<TcpStream>> {
        let config = match &self.tls {
            Some(config) => Arc::clone(config),
            None => default_tls_config()?,
        };
        let name = ServerName::try_from(service.host.clone()).map_err(|e| {
            Error::invalid_service(format!("{} is not a TLS server name: {e}", service.host))
        })?;

        trace!(peer, "Starting TLS handshake");

        timeout(
            self.connect_timeout,
            TlsConnector::from(config).connect(name, stream),
        )
        .await
        .map_err(|_| {
            Error::network_failure(
                peer,
                format!(
                    "TLS handshake timed out after {}ms",
                    self.connect_timeout.as_millis()
                ),
            )
        })?
        .map_err(|e| Error::network_failure(peer, format!("TLS handshake failed: {e}")))
    }

    /// Writes `request` and reads one response.
    async fn exchange<S>(&self, stream: &mut S, peer: &str, request: &[u8]) -> Result<Vec<u8>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        stream
            .write_all(request)
            .await
            .map_err(|e| Error::network_failure(peer, e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| Error::network_failure(peer, e.to_string()))?;

        let head_only = request.starts_with(b"HEAD ");
        self.read_response(stream, peer, head_only).await
    }

    /// Reads one final response from `stream`, skipping interim heads.
    async fn read_response<S>(
        &self,
        stream: &mut S,
        peer: &str,
        head_only: bool,
    ) -> Result<Vec<u8>>
    where
        S: AsyncRead + Unpin,
    {
        let now = Instant::now();
        let deadline = now
            .checked_add(self.read_timeout)
            .unwrap_or(now + FAR_DEADLINE);
        let mut buf = Vec::with_capacity(READ_CHUNK);
        let mut chunk = vec![0u8; READ_CHUNK];

        loop {
            let read = match timeout_at(deadline, stream.read(&mut chunk)).await {
                Ok(Ok(read)) => read,
                // TLS peers that close without close_notify
                Ok(Err(e)) if e.kind() == io::ErrorKind::UnexpectedEof && !buf.is_empty() => 0,
                Ok(Err(e)) => return Err(Error::network_failure(peer, e.to_string())),
                Err(_) if buf.is_empty() => {
                    return Err(Error::network_failure(
                        peer,
                        format!(
                            "timed out after {}ms waiting for response",
                            self.read_timeout.as_millis()
                        ),
                    ));
                }
                Err(_) => {
                    warn!(
                        peer,
                        len = buf.len(),
                        "Read deadline passed, keeping partial response"
                    );
                    return Ok(buf);
                }
            };

            if read == 0 {
                if buf.is_empty() {
                    return Err(Error::network_failure(
                        peer,
                        "connection closed without a response",
                    ));
                }
                trace!(peer, len = buf.len(), "Peer closed connection");
                return Ok(buf);
            }

            buf.extend_from_slice(&chunk[..read]);

            loop {
                match frame(&buf, head_only) {
                    Frame::Partial => break,
                    Frame::Interim(len) => {
                        trace!(peer, len, "Skipping interim response");
                        buf.drain(..len);
                    }
                    Frame::Complete(end) => {
                        buf.truncate(end);
                        return Ok(buf);
                    }
                }
            }
        }
    }
}

#[async_trait]
impl HttpIssuer for TcpIssuer {
    async fn issue(&self, service: &HttpService, request: &[u8]) -> Result<Transaction> {
        service.validate()?;
        let target = service.authority();

        debug!(service = %service, len = request.len(), "Issuing request");

        let mut stream = self.connect(service, &target).await?;
        let response = match service.protocol {
            Protocol::Http => self.exchange(&mut stream, &target, request).await?,
            Protocol::Https => {
                let mut stream = self.handshake(service, stream, &target).await?;
                self.exchange(&mut stream, &target, request).await?
            }
        };

        debug!(service = %service, len = response.len(), "Response received");

        Ok(Transaction::new(service.clone(), request.to_vec()).with_response(response))
    }
}

// ============================================================================
// TLS
// ============================================================================

/// Builds the TLS client configuration used when none is supplied.
///
/// Trusts the Mozilla root program via `webpki-roots` and uses the
/// `aws-lc-rs` provider.
///
/// # Errors
///
/// Returns [`Error::Config`] if the provider rejects the default protocol
/// versions.
pub fn default_tls_config() -> Result<Arc<ClientConfig>> {
    let roots = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());

    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::config(format!("TLS client setup failed: {e}")))?
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(Arc::new(config))
}

// ============================================================================
// Framing
// ============================================================================

/// How far the bytes read so far get through a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    /// More bytes are needed.
    Partial,

    /// An interim 1xx head of this length comes first.
    Interim(usize),

    /// The final response ends at this offset.
    Complete(usize),
}

/// Frames the response at the start of `buf`.
fn frame(buf: &[u8], head_only: bool) -> Frame {
    if !ends_head(buf) {
        return Frame::Partial;
    }
    let Some(head) = MessageHead::parse(buf) else {
        return Frame::Partial;
    };

    let status = head
        .start_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .unwrap_or(0);

    if (100..200).contains(&status) && status != 101 {
        return Frame::Interim(head.body_offset);
    }
    if head_only || status == 101 || status == 204 || status == 304 {
        return Frame::Complete(head.body_offset);
    }
    if head.is_chunked() {
        return chunked_end(buf, head.body_offset).map_or(Frame::Partial, Frame::Complete);
    }
    match head.content_length() {
        Some(len) if buf.len() >= head.body_offset + len => {
            Frame::Complete(head.body_offset + len)
        }
        _ => Frame::Partial,
    }
}

/// Walks a chunked body starting at `offset`.
///
/// Returns the offset just past the trailer section's blank line, or `None`
/// while the body is incomplete or a size line does not parse.
fn chunked_end(buf: &[u8], mut offset: usize) -> Option<usize> {
    loop {
        let line = next_line(buf, offset)?;
        let size_field = std::str::from_utf8(&buf[offset..line]).ok()?;
        let size_field = size_field.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_field, 16).ok()?;
        offset = line + 2;

        if size == 0 {
            break;
        }
        offset = offset.checked_add(size)?.checked_add(2)?;
        if offset > buf.len() {
            return None;
        }
    }

    // Trailer fields until an empty line
    loop {
        let line = next_line(buf, offset)?;
        if line == offset {
            return Some(line + 2);
        }
        offset = line + 2;
    }
}

/// Returns the position of the CRLF ending the line that starts at `offset`.
fn next_line(buf: &[u8], offset: usize) -> Option<usize> {
    find_subslice(buf.get(offset..)?, b"\r\n").map(|pos| offset + pos)
}

/// Returns `true` if the head terminator has been received.
fn ends_head(buf: &[u8]) -> bool {
    find_subslice(buf, b"\r\n\r\n").is_some() || find_subslice(buf, b"\n\n").is_some()
}

// ============================================================================
// Tests
// ============================================================================
