//! Durable transaction buffers.
//!
//! Bookmarks must not keep the host tool's live buffers alive. A
//! [`BufferStore`] copies a transaction's request and response somewhere
//! that outlives the transaction and hands back a [`TransactionRef`].
//!
//! | Store | Backing | Cleanup |
//! |-------|---------|---------|
//! | [`TempFileStore`] | One file per buffer in a private temp directory | When the last reference drops |
//! | [`MemoryStore`] | Shared heap copy | When the last reference drops |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tempfile::{Builder as TempBuilder, TempDir, TempPath};
use tracing::debug;

use crate::error::Result;

use super::types::{HttpService, Transaction};

// ============================================================================
// BufferStore
// ============================================================================

/// Makes transaction buffers durable beyond the transaction's lifetime.
pub trait BufferStore: Send + Sync {
    /// Copies the request and response of `transaction`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the copy cannot be written.
    fn externalize(&self, transaction: &Transaction) -> Result<TransactionRef>;
}

// ============================================================================
// StoredBuffer
// ============================================================================

/// One externalized buffer.
#[derive(Clone)]
pub enum StoredBuffer {
    /// Heap copy.
    Memory(Arc<[u8]>),

    /// Temp file, deleted when the last clone drops.
    File {
        /// Path of the file.
        path: Arc<TempPath>,
        /// Keeps the containing directory alive.
        dir: Arc<TempDir>,
        /// Length in bytes.
        len: usize,
    },
}

impl StoredBuffer {
    /// Reads the buffer back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if a file-backed buffer cannot be read.
    pub fn read(&self) -> Result<Vec<u8>> {
        match self {
            Self::Memory(bytes) => Ok(bytes.to_vec()),
            Self::File { path, .. } => Ok(fs::read(&**path)?),
        }
    }

    /// Returns the length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Memory(bytes) => bytes.len(),
            Self::File { len, .. } => *len,
        }
    }

    /// Returns `true` for a zero-length buffer.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` when the buffer lives outside process memory.
    #[inline]
    #[must_use]
    pub fn is_externalized(&self) -> bool {
        matches!(self, Self::File { .. })
    }
}

impl fmt::Debug for StoredBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory(bytes) => f.debug_tuple("Memory").field(&bytes.len()).finish(),
            Self::File { path, len, .. } => f
                .debug_struct("File")
                .field("path", &**path)
                .field("len", len)
                .finish(),
        }
    }
}

// ============================================================================
// TransactionRef
// ============================================================================

/// Durable reference to a bookmarked transaction's bytes and service.
#[derive(Debug, Clone)]
pub struct TransactionRef {
    /// Originating service.
    service: HttpService,

    /// Request buffer.
    request: StoredBuffer,

    /// Response buffer, if the transaction had one.
    response: Option<StoredBuffer>,
}

impl TransactionRef {
    /// Creates a reference from already stored buffers.
    #[inline]
    #[must_use]
    pub fn new(service: HttpService, request: StoredBuffer, response: Option<StoredBuffer>) -> Self {
        Self {
            service,
            request,
            response,
        }
    }

    /// Deep-copies a transaction into memory.
    #[must_use]
    pub fn in_memory(transaction: &Transaction) -> Self {
        Self {
            service: transaction.service().clone(),
            request: StoredBuffer::Memory(Arc::from(transaction.request())),
            response: transaction
                .response()
                .map(|bytes| StoredBuffer::Memory(Arc::from(bytes))),
        }
    }

    /// Returns the originating service.
    #[inline]
    #[must_use]
    pub fn service(&self) -> &HttpService {
        &self.service
    }

    /// Returns `true` if a response was captured.
    #[inline]
    #[must_use]
    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    /// Returns the stored request buffer.
    #[inline]
    #[must_use]
    pub fn request_buffer(&self) -> &StoredBuffer {
        &self.request
    }

    /// Reads the request bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the backing file cannot be read.
    pub fn request(&self) -> Result<Vec<u8>> {
        self.request.read()
    }

    /// Reads the response bytes, `None` if there was no response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the backing file cannot be read.
    pub fn response(&self) -> Result<Option<Vec<u8>>> {
        self.response.as_ref().map(StoredBuffer::read).transpose()
    }

    /// Rebuilds an owned transaction from the stored bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if a backing file cannot be read.
    pub fn load(&self) -> Result<Transaction> {
        let tx = Transaction::new(self.service.clone(), self.request()?);
        Ok(match self.response()? {
            Some(response) => tx.with_response(response),
            None => tx,
        })
    }
}

// ============================================================================
// MemoryStore
// ============================================================================

/// Keeps buffers on the heap.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStore;

impl BufferStore for MemoryStore {
    fn externalize(&self, transaction: &Transaction) -> Result<TransactionRef> {
        Ok(TransactionRef::in_memory(transaction))
    }
}

// ============================================================================
// TempFileStore
// ============================================================================

/// Writes each buffer to its own file in a private temp directory.
///
/// The directory is removed once the store and every [`TransactionRef`]
/// produced by it have been dropped.
pub struct TempFileStore {
    /// Directory holding the buffer files.
    dir: Arc<TempDir>,
}

impl TempFileStore {
    /// Creates a store in the system temp directory.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Name prefix of the created directory
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the directory cannot be created.
    pub fn new(prefix: &str) -> Result<Self> {
        let dir = TempDir::with_prefix(prefix)?;
        debug!(path = %dir.path().display(), "Created buffer directory");
        Ok(Self { dir: Arc::new(dir) })
    }

    /// Returns the directory buffers are written to.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes one buffer to a new file.
    fn write_buffer(&self, kind: &str, bytes: &[u8]) -> Result<StoredBuffer> {
        let mut file = TempBuilder::new()
            .prefix(kind)
            .suffix(".bin")
            .tempfile_in(self.dir.path())?;
        file.write_all(bytes)?;
        file.flush()?;

        Ok(StoredBuffer::File {
            path: Arc::new(file.into_temp_path()),
            dir: Arc::clone(&self.dir),
            len: bytes.len(),
        })
    }
}

impl fmt::Debug for TempFileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TempFileStore")
            .field("path", &self.dir.path())
            .finish()
    }
}

impl BufferStore for TempFileStore {
    fn externalize(&self, transaction: &Transaction) -> Result<TransactionRef> {
        let request = self.write_buffer("req-", transaction.request())?;
        let response = transaction
            .response()
            .map(|bytes| self.write_buffer("res-", bytes))
            .transpose()?;

        debug!(
            service = %transaction.service(),
            request_len = request.len(),
            response_len = response.as_ref().map_or(0, StoredBuffer::len),
            "Externalized transaction buffers"
        );

        Ok(TransactionRef::new(
            transaction.service().clone(),
            request,
            response,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transaction {
        Transaction::new(HttpService::http("a.test", 80), b"GET / HTTP/1.1\r\n\r\n".to_vec())
            .with_response(b"HTTP/1.1 200 OK\r\n\r\nhi".to_vec())
    }

    #[test]
    fn test_memory_store_deep_copies() {
        let mut tx = sample();
        let stored = MemoryStore.externalize(&tx).unwrap();

        tx.annotate(crate::transaction::Highlight::Red, "changed");
        drop(tx);

        assert_eq!(stored.request().unwrap(), b"GET / HTTP/1.1\r\n\r\n");
        assert_eq!(stored.response().unwrap().unwrap(), b"HTTP/1.1 200 OK\r\n\r\nhi");
        assert!(!stored.request_buffer().is_externalized());
    }

    #[test]
    fn test_temp_file_store_round_trip() {
        let store = TempFileStore::new("http-bookmarks-test-").unwrap();
        let stored = store.externalize(&sample()).unwrap();

        assert!(stored.request_buffer().is_externalized());
        assert_eq!(stored.request_buffer().len(), 18);

        let loaded = stored.load().unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_temp_file_store_without_response() {
        let store = TempFileStore::new("http-bookmarks-test-").unwrap();
        let tx = Transaction::new(HttpService::http("a.test", 80), b"GET / HTTP/1.1\r\n\r\n".to_vec());
        let stored = store.externalize(&tx).unwrap();

        assert!(!stored.has_response());
        assert!(stored.response().unwrap().is_none());
    }

    #[test]
    fn test_directory_outlives_store() {
        let store = TempFileStore::new("http-bookmarks-test-").unwrap();
        let dir = store.path().to_path_buf();
        let stored = store.externalize(&sample()).unwrap();

        drop(store);
        assert!(dir.exists());
        assert_eq!(stored.request().unwrap(), b"GET / HTTP/1.1\r\n\r\n");

        drop(stored);
        assert!(!dir.exists());
    }
}
