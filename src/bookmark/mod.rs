//! Bookmarks and the table that holds them.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Bookmark`] | Immutable snapshot of one transaction |
//! | [`MetadataExtractor`] | Builds bookmarks from transactions |
//! | [`BookmarkStore`] | Ordered, observable collection |
//! | [`Column`] | Table columns and cell values |

// ============================================================================
// Submodules
// ============================================================================

/// Bookmark entity.
pub mod entity;

/// Metadata extraction.
pub mod extractor;

/// Ordered collection and change events.
pub mod store;

/// Columns and cells.
pub mod table;

// ============================================================================
// Re-exports
// ============================================================================

pub use entity::{Bookmark, Metadata};
pub use extractor::{MetadataExtractor, TIMESTAMP_FORMAT, extract_title, join_parameters};
pub use store::{BookmarkStore, TableEvent, TableObserver};
pub use table::{CellValue, Column, ColumnKind};
