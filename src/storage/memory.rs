//! Reference-counted in-process catalog.
//!
//! Each ISBN maps to its latest [`Book`] payload and a copy count. A key is
//! present iff its count is at least 1; the payload and count live in one map
//! entry so they are always removed together.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use super::{CatalogStore, Result, StorageError};
use crate::domain::{Book, Isbn};

/// A book together with how many copies of it are shelved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holding {
    pub book: Book,
    pub copies: usize,
}

/// In-memory catalog keyed by ISBN
#[derive(Debug, Default)]
pub struct MemoryStore {
    holdings: Mutex<HashMap<Isbn, Holding>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Isbn, Holding>>> {
        self.holdings.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Add a copy, returning the new copy count.
    ///
    /// The stored title and author are replaced by `book`'s (last writer wins).
    pub fn insert(&self, book: Book) -> Result<usize> {
        let mut holdings = self.lock()?;
        let copies = match holdings.entry(book.isbn) {
            Entry::Occupied(mut slot) => {
                let holding = slot.get_mut();
                holding.book = book;
                holding.copies += 1;
                holding.copies
            }
            Entry::Vacant(slot) => {
                slot.insert(Holding { book, copies: 1 });
                1
            }
        };

        debug!(copies, "Inserted copy");
        Ok(copies)
    }

    /// Remove a copy, returning the remaining count.
    ///
    /// Removing an ISBN that is not present is a no-op returning 0.
    pub fn remove(&self, isbn: &Isbn) -> Result<usize> {
        let mut holdings = self.lock()?;
        let Entry::Occupied(mut slot) = holdings.entry(*isbn) else {
            debug!(%isbn, "Remove of absent ISBN ignored");
            return Ok(0);
        };

        if slot.get().copies <= 1 {
            slot.remove();
            return Ok(0);
        }

        let holding = slot.get_mut();
        holding.copies -= 1;
        Ok(holding.copies)
    }

    /// Current copy count, 0 if absent
    pub fn count(&self, isbn: &Isbn) -> Result<usize> {
        Ok(self.lock()?.get(isbn).map_or(0, |h| h.copies))
    }

    /// Stored payload for `isbn`
    pub fn get(&self, isbn: &Isbn) -> Result<Option<Book>> {
        Ok(self.lock()?.get(isbn).map(|h| h.book.clone()))
    }

    pub fn isbns(&self) -> Result<Vec<Isbn>> {
        Ok(self.lock()?.keys().copied().collect())
    }

    pub fn distinct_count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Total copies across all ISBNs
    pub fn size(&self) -> Result<usize> {
        Ok(self.lock()?.values().map(|h| h.copies).sum())
    }

    fn matching<F>(&self, predicate: F) -> Result<Vec<Holding>>
    where
        F: Fn(&Book) -> bool,
    {
        Ok(self
            .lock()?
            .values()
            .filter(|h| predicate(&h.book))
            .cloned()
            .collect())
    }
}

impl CatalogStore for MemoryStore {
    type Key = Isbn;
    type Receipt = usize;
    type Item = Holding;

    fn insert(&self, book: &Book) -> Result<usize> {
        MemoryStore::insert(self, book.clone())
    }

    fn erase(&self, isbn: &Isbn) -> Result<()> {
        self.remove(isbn).map(|_| ())
    }

    fn size(&self) -> Result<usize> {
        MemoryStore::size(self)
    }

    fn copies(&self, isbn: &Isbn) -> Result<usize> {
        self.count(isbn)
    }

    fn distinct_count(&self) -> Result<usize> {
        MemoryStore::distinct_count(self)
    }

    fn isbns(&self) -> Result<Vec<Isbn>> {
        MemoryStore::isbns(self)
    }

    fn title_like(&self, needle: &str) -> Result<Vec<Holding>> {
        let needle = needle.to_ascii_lowercase();
        self.matching(|book| book.title.to_ascii_lowercase().contains(&needle))
    }

    fn author_like(&self, needle: &str) -> Result<Vec<Holding>> {
        let needle = needle.to_ascii_lowercase();
        self.matching(|book| book.author.to_ascii_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(isbn: &str, title: &str, author: &str) -> Book {
        Book::new(Isbn::parse(isbn).unwrap(), title, author)
    }

    #[test]
    fn test_duplicate_insert_counts_copies() {
        let store = MemoryStore::new();
        let hamlet = book("9788027237142", "Hamlet", "William Shakespeare");

        assert_eq!(store.insert(hamlet.clone()).unwrap(), 1);
        assert_eq!(store.insert(hamlet.clone()).unwrap(), 2);
        assert_eq!(store.count(&hamlet.isbn).unwrap(), 2);
        assert_eq!(store.distinct_count().unwrap(), 1);
        assert_eq!(store.size().unwrap(), 2);
    }

    #[test]
    fn test_last_writer_wins() {
        let store = MemoryStore::new();
        store
            .insert(book("9788027237142", "Hamlet", "Shakespeare"))
            .unwrap();
        store
            .insert(book("9788027237142", "Hamlet, Prince of Denmark", "William Shakespeare"))
            .unwrap();

        let stored = store
            .get(&Isbn::parse("9788027237142").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(stored.title, "Hamlet, Prince of Denmark");
        assert_eq!(stored.author, "William Shakespeare");
    }

    #[test]
    fn test_remove_to_zero_drops_entry() {
        let store = MemoryStore::new();
        let hamlet = book("9788027237142", "Hamlet", "William Shakespeare");
        store.insert(hamlet.clone()).unwrap();
        store.insert(hamlet.clone()).unwrap();

        assert_eq!(store.remove(&hamlet.isbn).unwrap(), 1);
        assert_eq!(store.remove(&hamlet.isbn).unwrap(), 0);

        assert_eq!(store.count(&hamlet.isbn).unwrap(), 0);
        assert!(store.isbns().unwrap().is_empty());
        assert!(store.get(&hamlet.isbn).unwrap().is_none());
        assert_eq!(store.distinct_count().unwrap(), 0);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let store = MemoryStore::new();
        let isbn = Isbn::parse("0306406152").unwrap();

        assert_eq!(store.remove(&isbn).unwrap(), 0);
        assert_eq!(store.count(&isbn).unwrap(), 0);
        assert!(store.isbns().unwrap().is_empty());

        // Still counts from 1 afterwards
        assert_eq!(store.insert(book("0306406152", "T", "A")).unwrap(), 1);
    }

    #[test]
    fn test_search_ignores_ascii_case() {
        let store = MemoryStore::new();
        store
            .insert(book("9788027237142", "Hamlet", "William Shakespeare"))
            .unwrap();
        store
            .insert(book("9781438279336", "Siddhartha", "Hermann Hesse"))
            .unwrap();

        let found = store.title_like("iddh").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].book.title, "Siddhartha");

        assert_eq!(store.author_like("William").unwrap().len(), 1);
        assert_eq!(store.author_like("william").unwrap().len(), 1);
        assert_eq!(store.title_like("HAMLET").unwrap().len(), 1);

        // Only ASCII letters fold
        store
            .insert(book("9780199536924", "Nana", "Émile Zola"))
            .unwrap();
        assert_eq!(store.author_like("Émile ZOLA").unwrap().len(), 1);
        assert!(store.author_like("émile").unwrap().is_empty());
    }
}
