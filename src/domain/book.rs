//! Books and their persisted copies.

use serde::{Deserialize, Serialize};

use super::isbn::Isbn;
use super::uuid::Uuid;

/// A catalogued work.
///
/// Carries no identity of its own: the in-memory store keys it by ISBN, the
/// SQLite store gives every physical copy its own [`Uuid`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub isbn: Isbn,
    pub title: String,
    pub author: String,
}

impl Book {
    pub fn new(isbn: Isbn, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            isbn,
            title: title.into(),
            author: author.into(),
        }
    }
}

/// Loan state of a single copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanState {
    /// On the shelf
    Available,

    /// Checked out
    Loaned,
}

impl LoanState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Loaned => "loaned",
        }
    }
}

/// One physical, independently loanable copy of a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Primary key, unique per copy
    pub uuid: Uuid,

    pub isbn: Isbn,

    pub title: String,

    pub author: String,

    /// Whether the copy is currently checked out
    #[serde(default)]
    pub loaned: bool,
}

impl Record {
    /// A freshly shelved copy of `book`
    pub fn new(uuid: Uuid, book: Book) -> Self {
        Self {
            uuid,
            isbn: book.isbn,
            title: book.title,
            author: book.author,
            loaned: false,
        }
    }

    pub fn state(&self) -> LoanState {
        if self.loaned {
            LoanState::Loaned
        } else {
            LoanState::Available
        }
    }

    /// The work this copy belongs to
    pub fn book(&self) -> Book {
        Book {
            isbn: self.isbn,
            title: self.title.clone(),
            author: self.author.clone(),
        }
    }
}

impl From<Record> for Book {
    fn from(record: Record) -> Self {
        Self {
            isbn: record.isbn,
            title: record.title,
            author: record.author,
        }
    }
}
