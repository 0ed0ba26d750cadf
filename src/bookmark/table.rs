//! Table contract.
//!
//! | Index | Column | Kind |
//! |-------|--------|------|
//! | 0 | ID | Integer (row index) |
//! | 1 | Added | Text |
//! | 2 | Host | Text |
//! | 3 | URL | Text |
//! | 4 | Title | Text |
//! | 5 | Repeated | Boolean |
//! | 6 | Method | Text |
//! | 7 | Status | Text |
//! | 8 | Parameters | Text |
//! | 9 | MIME | Text |
//! | 10 | Protocol | Text |
//! | 11 | File | Text |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

use super::entity::Bookmark;

// ============================================================================
// ColumnKind
// ============================================================================

/// Value type rendered by a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnKind {
    /// Integer.
    Integer,
    /// Text.
    Text,
    /// Checkbox.
    Boolean,
}

// ============================================================================
// Column
// ============================================================================

/// Bookmark table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Column {
    /// Row index.
    Id,
    /// Capture time.
    Added,
    /// Host.
    Host,
    /// URL.
    Url,
    /// Page title.
    Title,
    /// Created by repeat.
    Repeated,
    /// Request method.
    Method,
    /// Status code.
    Status,
    /// Joined parameters.
    Parameters,
    /// Inferred MIME type.
    Mime,
    /// Protocol.
    Protocol,
    /// Path plus query.
    File,
}

impl Column {
    /// All columns in display order.
    pub const ALL: [Column; 12] = [
        Column::Id,
        Column::Added,
        Column::Host,
        Column::Url,
        Column::Title,
        Column::Repeated,
        Column::Method,
        Column::Status,
        Column::Parameters,
        Column::Mime,
        Column::Protocol,
        Column::File,
    ];

    /// Returns the column at `index`, if any.
    #[inline]
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns the display position.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the header text.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Added => "Added",
            Self::Host => "Host",
            Self::Url => "URL",
            Self::Title => "Title",
            Self::Repeated => "Repeated",
            Self::Method => "Method",
            Self::Status => "Status",
            Self::Parameters => "Parameters",
            Self::Mime => "MIME",
            Self::Protocol => "Protocol",
            Self::File => "File",
        }
    }

    /// Returns the value type.
    #[inline]
    #[must_use]
    pub const fn kind(self) -> ColumnKind {
        match self {
            Self::Id => ColumnKind::Integer,
            Self::Repeated => ColumnKind::Boolean,
            _ => ColumnKind::Text,
        }
    }

    /// Returns the cell for `bookmark` displayed at `row`.
    #[must_use]
    pub fn cell(self, row: usize, bookmark: &Bookmark) -> CellValue {
        match self {
            Self::Id => CellValue::Integer(row),
            Self::Added => CellValue::Text(bookmark.timestamp().to_string()),
            Self::Host => CellValue::Text(bookmark.host().to_string()),
            Self::Url => CellValue::Text(bookmark.url().to_string()),
            Self::Title => CellValue::Text(bookmark.title().to_string()),
            Self::Repeated => CellValue::Boolean(bookmark.is_repeated()),
            Self::Method => CellValue::Text(bookmark.method().to_string()),
            Self::Status => CellValue::Text(bookmark.status_code().to_string()),
            Self::Parameters => CellValue::Text(bookmark.parameters().to_string()),
            Self::Mime => CellValue::Text(bookmark.mime_type().to_string()),
            Self::Protocol => CellValue::Text(bookmark.protocol().to_string()),
            Self::File => CellValue::Text(bookmark.file().to_string()),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// CellValue
// ============================================================================

/// One table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Integer cell.
    Integer(usize),
    /// Text cell.
    Text(String),
    /// Checkbox cell.
    Boolean(bool),
}

impl CellValue {
    /// Returns the kind of this value.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ColumnKind {
        match self {
            Self::Integer(_) => ColumnKind::Integer,
            Self::Text(_) => ColumnKind::Text,
            Self::Boolean(_) => ColumnKind::Boolean,
        }
    }

    /// Returns the text, if this is a text cell.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
            Self::Boolean(value) => write!(f, "{value}"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::bookmark::Metadata;
    use crate::transaction::{HttpService, Transaction, TransactionRef};

    #[test]
    fn test_column_order_and_names() {
        let names: Vec<&str> = Column::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            [
                "ID", "Added", "Host", "URL", "Title", "Repeated", "Method", "Status",
                "Parameters", "MIME", "Protocol", "File"
            ]
        );
        for (i, column) in Column::ALL.iter().enumerate() {
            assert_eq!(column.index(), i);
            assert_eq!(Column::from_index(i), Some(*column));
        }
        assert_eq!(Column::from_index(12), None);
    }

    #[test]
    fn test_column_kinds() {
        assert_eq!(Column::Id.kind(), ColumnKind::Integer);
        assert_eq!(Column::Repeated.kind(), ColumnKind::Boolean);
        assert_eq!(Column::Title.kind(), ColumnKind::Text);
    }

    #[test]
    fn test_cells_match_kinds() {
        let stored = TransactionRef::in_memory(&Transaction::new(
            HttpService::http("a.test", 80),
            b"GET / HTTP/1.1\r\n\r\n".to_vec(),
        ));
        let metadata = Metadata {
            host: "a.test".into(),
            ..Metadata::default()
        };
        let bookmark = Bookmark::new(stored, metadata, true);

        for column in Column::ALL {
            assert_eq!(column.cell(3, &bookmark).kind(), column.kind());
        }
        assert_eq!(Column::Id.cell(3, &bookmark), CellValue::Integer(3));
        assert_eq!(Column::Repeated.cell(3, &bookmark), CellValue::Boolean(true));
        assert_eq!(Column::Host.cell(3, &bookmark).as_text(), Some("a.test"));
    }
}
