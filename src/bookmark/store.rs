//! Ordered bookmark collection.
//!
//! Row order is insertion order. Every mutation notifies subscribed
//! observers:
//!
//! | Operation | Event |
//! |-----------|-------|
//! | [`BookmarkStore::add`] | [`TableEvent::RowInserted`] with the new last index |
//! | [`BookmarkStore::remove_many`] | [`TableEvent::RowsChanged`] once |
//! | [`BookmarkStore::clear`] | [`TableEvent::RowsChanged`] |
//!
//! Observers may see a `RowsChanged` that changed nothing and must treat it
//! as a full refresh.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::slice;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::BookmarkId;

use super::entity::Bookmark;
use super::table::{CellValue, Column};

// ============================================================================
// Types
// ============================================================================

/// Change notification delivered to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableEvent {
    /// One row appended at this index.
    RowInserted(usize),

    /// Any number of rows removed or replaced.
    RowsChanged,
}

/// Observer callback.
pub type TableObserver = Box<dyn Fn(&TableEvent) + Send + Sync>;

// ============================================================================
// BookmarkStore
// ============================================================================

/// Ordered, observable list of bookmarks.
#[derive(Default)]
pub struct BookmarkStore {
    /// Rows in display order.
    rows: Vec<Arc<Bookmark>>,

    /// Registered observers.
    observers: Vec<TableObserver>,
}

impl BookmarkStore {
    /// Creates an empty store.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer. Observers cannot be removed.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: Fn(&TableEvent) + Send + Sync + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Appends a bookmark and returns the shared handle.
    pub fn add(&mut self, bookmark: Bookmark) -> Arc<Bookmark> {
        let bookmark = Arc::new(bookmark);
        self.rows.push(Arc::clone(&bookmark));

        let index = self.rows.len() - 1;
        debug!(id = %bookmark.id(), index, "Bookmark added");
        self.notify(TableEvent::RowInserted(index));

        bookmark
    }

    /// Removes every bookmark whose identity appears in `selected`.
    ///
    /// Bookmarks not in the store are ignored. Returns the number removed.
    pub fn remove_many(&mut self, selected: &[Arc<Bookmark>]) -> usize {
        let ids: FxHashSet<BookmarkId> = selected.iter().map(|b| b.id()).collect();
        let before = self.rows.len();
        self.rows.retain(|row| !ids.contains(&row.id()));

        let removed = before - self.rows.len();
        debug!(requested = selected.len(), removed, "Bookmarks removed");
        self.notify(TableEvent::RowsChanged);

        removed
    }

    /// Removes the rows at `indices`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if any index is past the end; no
    /// row is removed in that case.
    pub fn remove_rows(&mut self, indices: &[usize]) -> Result<usize> {
        let selected = indices
            .iter()
            .map(|&index| self.get(index))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.remove_many(&selected))
    }

    /// Removes every bookmark.
    pub fn clear(&mut self) {
        let removed = self.rows.len();
        self.rows.clear();
        debug!(removed, "Bookmarks cleared");
        self.notify(TableEvent::RowsChanged);
    }

    /// Returns the number of bookmarks.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the store is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the bookmark at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `index >= size()`.
    pub fn get(&self, index: usize) -> Result<Arc<Bookmark>> {
        self.rows
            .get(index)
            .cloned()
            .ok_or_else(|| Error::index_out_of_range(index, self.rows.len()))
    }

    /// Returns the row index of the bookmark with `id`.
    #[must_use]
    pub fn position(&self, id: BookmarkId) -> Option<usize> {
        self.rows.iter().position(|row| row.id() == id)
    }

    /// Iterates bookmarks in row order.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, Arc<Bookmark>> {
        self.rows.iter()
    }

    /// Returns the cell at (`row`, `column`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `row >= size()`.
    pub fn value_at(&self, row: usize, column: Column) -> Result<CellValue> {
        let bookmark = self
            .rows
            .get(row)
            .ok_or_else(|| Error::index_out_of_range(row, self.rows.len()))?;
        Ok(column.cell(row, bookmark))
    }

    /// Delivers `event` to every observer.
    fn notify(&self, event: TableEvent) {
        for observer in &self.observers {
            observer(&event);
        }
    }
}

impl<'a> IntoIterator for &'a BookmarkStore {
    type Item = &'a Arc<Bookmark>;
    type IntoIter = slice::Iter<'a, Arc<Bookmark>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for BookmarkStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookmarkStore")
            .field("rows", &self.rows.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use proptest::prelude::*;

    use crate::bookmark::Metadata;
    use crate::transaction::{HttpService, Transaction, TransactionRef};

    fn bookmark(host: &str) -> Bookmark {
        let stored = TransactionRef::in_memory(&Transaction::new(
            HttpService::http(host, 80),
            b"GET / HTTP/1.1\r\n\r\n".to_vec(),
        ));
        let metadata = Metadata {
            host: host.to_string(),
            ..Metadata::default()
        };
        Bookmark::new(stored, metadata, false)
    }

    fn recorded(store: &mut BookmarkStore) -> Arc<Mutex<Vec<TableEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        store.subscribe(move |event| sink.lock().push(*event));
        events
    }

    #[test]
    fn test_add_get_size() {
        let mut store = BookmarkStore::new();
        let events = recorded(&mut store);

        store.add(bookmark("a.test"));
        let added = store.add(bookmark("b.test"));

        assert_eq!(store.size(), 2);
        assert_eq!(store.get(1).unwrap().id(), added.id());
        assert_eq!(store.get(0).unwrap().host(), "a.test");
        assert_eq!(
            *events.lock(),
            [TableEvent::RowInserted(0), TableEvent::RowInserted(1)]
        );
    }

    #[test]
    fn test_get_out_of_range() {
        let mut store = BookmarkStore::new();
        store.add(bookmark("a.test"));

        let err = store.get(1).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 1, len: 1 }));
        assert!(store.value_at(5, Column::Host).is_err());
    }

    #[test]
    fn test_remove_many_by_identity() {
        let mut store = BookmarkStore::new();
        let a = store.add(bookmark("a.test"));
        let b = store.add(bookmark("b.test"));
        let c = store.add(bookmark("c.test"));
        let events = recorded(&mut store);

        let removed = store.remove_many(&[Arc::clone(&a), Arc::clone(&c)]);

        assert_eq!(removed, 2);
        assert_eq!(store.size(), 1);
        assert_eq!(store.get(0).unwrap().id(), b.id());
        assert_eq!(*events.lock(), [TableEvent::RowsChanged]);
    }

    #[test]
    fn test_remove_many_ignores_absent() {
        let mut store = BookmarkStore::new();
        store.add(bookmark("a.test"));
        let stranger = Arc::new(bookmark("x.test"));

        assert_eq!(store.remove_many(&[stranger]), 0);
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn test_equal_content_distinct_identity() {
        let mut store = BookmarkStore::new();
        let first = store.add(bookmark("same.test"));
        store.add(bookmark("same.test"));

        store.remove_many(&[first]);
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn test_remove_rows() {
        let mut store = BookmarkStore::new();
        store.add(bookmark("a.test"));
        store.add(bookmark("b.test"));
        store.add(bookmark("c.test"));

        assert_eq!(store.remove_rows(&[0, 2]).unwrap(), 2);
        assert_eq!(store.get(0).unwrap().host(), "b.test");

        assert!(store.remove_rows(&[0, 4]).is_err());
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn test_clear_twice() {
        let mut store = BookmarkStore::new();
        store.add(bookmark("a.test"));
        let events = recorded(&mut store);

        store.clear();
        store.clear();

        assert!(store.is_empty());
        assert_eq!(
            *events.lock(),
            [TableEvent::RowsChanged, TableEvent::RowsChanged]
        );
    }

    #[test]
    fn test_value_at_uses_row_index() {
        let mut store = BookmarkStore::new();
        store.add(bookmark("a.test"));
        store.add(bookmark("b.test"));
        store.remove_rows(&[0]).unwrap();

        assert_eq!(store.value_at(0, Column::Id).unwrap(), CellValue::Integer(0));
        assert_eq!(
            store.value_at(0, Column::Host).unwrap(),
            CellValue::Text("b.test".into())
        );
    }

    #[test]
    fn test_position_and_iter() {
        let mut store = BookmarkStore::new();
        store.add(bookmark("a.test"));
        let b = store.add(bookmark("b.test"));

        assert_eq!(store.position(b.id()), Some(1));
        let hosts: Vec<&str> = store.iter().map(|bm| bm.host()).collect();
        assert_eq!(hosts, ["a.test", "b.test"]);
    }

    proptest! {
        #[test]
        fn prop_remove_many_keeps_order_of_survivors(
            count in 0usize..20,
            picks in proptest::collection::vec(any::<bool>(), 20),
        ) {
            let mut store = BookmarkStore::new();
            let added: Vec<_> = (0..count)
                .map(|i| store.add(bookmark(&format!("h{i}.test"))))
                .collect();

            let selected: Vec<_> = added
                .iter()
                .zip(&picks)
                .filter(|(_, pick)| **pick)
                .map(|(b, _)| Arc::clone(b))
                .collect();
            let removed = store.remove_many(&selected);

            let expected: Vec<BookmarkId> = added
                .iter()
                .zip(&picks)
                .filter(|(_, pick)| !**pick)
                .map(|(b, _)| b.id())
                .collect();
            let actual: Vec<BookmarkId> = store.iter().map(|b| b.id()).collect();

            prop_assert_eq!(removed, selected.len());
            prop_assert_eq!(actual, expected);
        }
    }
}
