//! bookshelf - Book catalog store
//!
//! Tracks books by ISBN and physical copies by UUID, with two interchangeable
//! storage backends.
//!
//! # Architecture
//!
//! - Identifiers are fixed-size values: an ISBN is 14 inline bytes, a UUID 16
//! - The in-memory backend counts copies per ISBN
//! - The SQLite backend stores one row per copy and tracks loans per copy
//! - Loan transitions are single conditional updates, checked by affected rows
//!
//! # Modules
//!
//! - `domain`: Value types (Isbn, Uuid, Book, Record)
//! - `storage`: CatalogStore trait, MemoryStore, SqliteLibrary, loan protocol
//! - `config`: Path and logging configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Shelve two copies
//! bookshelf add 9788027237142 "Hamlet" "William Shakespeare" --copies 2
//!
//! # Check one out
//! bookshelf loan <uuid>
//!
//! # Search by author
//! bookshelf search --author William
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod storage;

// Re-export main types at crate root for convenience
pub use domain::{Book, Isbn, IsbnError, LoanState, Record, Uuid};
pub use storage::{CatalogStore, ErrorKind, MemoryStore, SqliteLibrary, StorageError};
