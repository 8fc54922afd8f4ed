//! Statement texts and row decoding for the SQLite backend.
//!
//! All statements take positional parameters; values are never interpolated
//! into the SQL text.

use rusqlite::Row;

use super::{Result, StorageError};
use crate::domain::{Isbn, Record, Uuid};

/// Schema and supporting indexes, safe to run on every open
pub const INIT_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS record(
        uuid TEXT PRIMARY KEY,
        isbn TEXT NOT NULL,
        title TEXT NOT NULL,
        author TEXT NOT NULL,
        loaned INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_record_isbn ON record(isbn);
    CREATE INDEX IF NOT EXISTS idx_record_title ON record(title);
    CREATE INDEX IF NOT EXISTS idx_record_author ON record(author);
    CREATE INDEX IF NOT EXISTS idx_record_uuid_loaned ON record(uuid, loaned);
"#;

/// Params: uuid, isbn, title, author
pub const INSERT: &str =
    "INSERT INTO record (uuid, isbn, title, author, loaned) VALUES (?1, ?2, ?3, ?4, 0)";

/// Params: uuid
pub const ERASE: &str = "DELETE FROM record WHERE uuid = ?1";

/// Delete and return the deleted row in one statement. Params: uuid
pub const TAKE: &str =
    "DELETE FROM record WHERE uuid = ?1 RETURNING uuid, isbn, title, author, loaned";

pub const COUNT: &str = "SELECT COUNT(*) FROM record";

pub const COUNT_DISTINCT_ISBN: &str = "SELECT COUNT(DISTINCT isbn) FROM record";

/// Params: isbn
pub const COUNT_FOR_ISBN: &str = "SELECT COUNT(*) FROM record WHERE isbn = ?1";

/// Params: isbn
pub const COUNT_AVAILABLE_FOR_ISBN: &str =
    "SELECT COUNT(*) FROM record WHERE isbn = ?1 AND loaned = 0";

pub const DISTINCT_ISBNS: &str = "SELECT DISTINCT isbn FROM record";

pub const SELECT_ALL: &str = "SELECT uuid, isbn, title, author, loaned FROM record";

/// Params: uuid
pub const SELECT_BY_UUID: &str =
    "SELECT uuid, isbn, title, author, loaned FROM record WHERE uuid = ?1";

/// Params: isbn
pub const SELECT_BY_ISBN: &str =
    "SELECT uuid, isbn, title, author, loaned FROM record WHERE isbn = ?1";

/// Params: LIKE pattern from [`like_pattern`]
pub const TITLE_LIKE: &str =
    r"SELECT uuid, isbn, title, author, loaned FROM record WHERE title LIKE ?1 ESCAPE '\'";

/// Params: LIKE pattern from [`like_pattern`]
pub const AUTHOR_LIKE: &str =
    r"SELECT uuid, isbn, title, author, loaned FROM record WHERE author LIKE ?1 ESCAPE '\'";

/// Available -> Loaned. Params: uuid
pub const ACQUIRE: &str = "UPDATE record SET loaned = 1 WHERE uuid = ?1 AND loaned = 0";

/// Loaned -> Available. Params: uuid
pub const RELEASE: &str = "UPDATE record SET loaned = 0 WHERE uuid = ?1 AND loaned = 1";

/// Build a LIKE pattern matching any value that contains `needle` literally.
///
/// `%`, `_` and the escape character itself are escaped with `\`.
pub fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// A `record` row as the engine hands it back, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub uuid: String,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub loaned: i64,
}

impl RawRecord {
    /// Read the five record columns by name
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            uuid: row.get("uuid")?,
            isbn: row.get("isbn")?,
            title: row.get("title")?,
            author: row.get("author")?,
            loaned: row.get("loaned")?,
        })
    }

    /// Validate every column
    pub fn decode(self) -> Result<Record> {
        let uuid = Uuid::parse(&self.uuid).ok_or_else(|| StorageError::Decode {
            column: "uuid",
            value: self.uuid.clone(),
        })?;

        let isbn = Isbn::parse(&self.isbn).map_err(|_| StorageError::Decode {
            column: "isbn",
            value: self.isbn.clone(),
        })?;

        let loaned = match self.loaned {
            0 => false,
            1 => true,
            other => {
                return Err(StorageError::Decode {
                    column: "loaned",
                    value: other.to_string(),
                })
            }
        };

        Ok(Record {
            uuid,
            isbn,
            title: self.title,
            author: self.author,
            loaned,
        })
    }
}

/// Decode a whole result set; the first bad row fails the query
pub fn decode_all(rows: Vec<RawRecord>) -> Result<Vec<Record>> {
    rows.into_iter().map(RawRecord::decode).collect()
}
