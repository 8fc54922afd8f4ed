//! Catalog storage backends.
//!
//! Two interchangeable backends implement [`CatalogStore`]:
//! - [`MemoryStore`]: ISBN-keyed copy counts, lost on drop
//! - [`SqliteLibrary`]: one UUID-keyed row per physical copy, with loan tracking
//!
//! # Architecture
//!
//! ```text
//! CatalogStore (insert / erase / size / copies / distinct_count / isbns / search)
//!   ├── MemoryStore     Mutex<HashMap<Isbn, (Book, count)>>
//!   └── SqliteLibrary   Mutex<Connection> ── sql (statements, row decoding)
//!                                         └─ loan (acquire / release)
//! ```

pub mod loan;
pub mod memory;
pub mod sql;
pub mod sqlite;

use thiserror::Error;

use crate::domain::{Book, Isbn};

pub use memory::MemoryStore;
pub use sqlite::SqliteLibrary;

/// Errors surfaced by storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("cannot decode column `{column}` from value {value:?}")]
    Decode { column: &'static str, value: String },

    #[error("storage lock poisoned")]
    LockPoisoned,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// What a caller should do about a [`StorageError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Engine or connection failure; the operation did not take effect
    Internal,

    /// A precondition on the arguments did not hold
    InvalidArgument,
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Database(_) | Self::Decode { .. } | Self::LockPoisoned => ErrorKind::Internal,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }
}

pub type Result<T, E = StorageError> = std::result::Result<T, E>;

/// Operations shared by every catalog backend.
///
/// Backends differ in how a copy is identified (`Key`), what an insert hands
/// back (`Receipt`) and what searches return (`Item`). Loan transitions are
/// not part of the shared contract; see [`SqliteLibrary::acquire`].
pub trait CatalogStore {
    /// Identifies what [`erase`](Self::erase) removes
    type Key;

    /// Returned by [`insert`](Self::insert)
    type Receipt;

    /// Returned by searches
    type Item;

    /// Add one copy of `book`
    fn insert(&self, book: &Book) -> Result<Self::Receipt>;

    /// Remove one copy
    fn erase(&self, key: &Self::Key) -> Result<()>;

    /// Total number of copies
    fn size(&self) -> Result<usize>;

    /// Number of copies of `isbn`, 0 if absent
    fn copies(&self, isbn: &Isbn) -> Result<usize>;

    /// Number of distinct ISBNs
    fn distinct_count(&self) -> Result<usize>;

    /// Every ISBN with at least one copy, in no particular order
    fn isbns(&self) -> Result<Vec<Isbn>>;

    /// Items whose title contains `needle`.
    ///
    /// Matching is literal and ignores ASCII case; non-ASCII characters must
    /// match exactly.
    fn title_like(&self, needle: &str) -> Result<Vec<Self::Item>>;

    /// Items whose author contains `needle`, matched like [`Self::title_like`]
    fn author_like(&self, needle: &str) -> Result<Vec<Self::Item>>;
}
