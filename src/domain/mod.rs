//! Domain types for the catalog.
//!
//! This module contains the core value types:
//! - Isbn: Validated fixed-width book identifier
//! - Uuid: Per-copy identifier with canonical text form
//! - Book / Record: A work, and one physical copy of it

pub mod book;
pub mod isbn;
pub mod uuid;

// Re-export commonly used types
pub use book::{Book, LoanState, Record};
pub use isbn::{Isbn, IsbnError};
pub use self::uuid::{EntropySource, InvalidUuid, OsEntropy, Uuid, UuidText};
