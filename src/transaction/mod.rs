//! Captured transactions and the host-tool seams around them.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Transaction`] | Request/response pair plus its [`HttpService`] |
//! | [`TransactionAnalyzer`] | Parses requests and responses ([`HttpAnalyzer`]) |
//! | [`BufferStore`] | Externalizes buffers ([`TempFileStore`], [`MemoryStore`]) |
//! | [`HttpIssuer`] | Issues raw requests ([`TcpIssuer`]) |
//!
//! Every trait here stands in for a service the proxy tool already has; the
//! bundled implementations make the crate usable on its own.

// ============================================================================
// Submodules
// ============================================================================

/// Request and response analysis.
pub mod analyzer;

/// Durable buffer storage.
pub mod buffers;

/// Request issuing.
pub mod issuer;

/// Transaction and service types.
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use analyzer::{
    HttpAnalyzer, Parameter, ParameterKind, RequestInfo, ResponseInfo, TransactionAnalyzer,
};
pub use buffers::{BufferStore, MemoryStore, StoredBuffer, TempFileStore, TransactionRef};
pub use issuer::{HttpIssuer, TcpIssuer, default_tls_config};
pub use types::{Highlight, HttpService, Protocol, Transaction};
