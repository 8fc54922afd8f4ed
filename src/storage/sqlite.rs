//! SQLite-backed catalog with one row per physical copy.
//!
//! A single connection is shared behind a mutex. The lock is held for exactly
//! one statement, which makes every public operation atomic with respect to
//! the others on the same instance.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension, Params};
use tracing::{debug, error, info};

use super::sql::{self, RawRecord};
use super::{CatalogStore, Result, StorageError};
use crate::domain::{Book, EntropySource, Isbn, OsEntropy, Record, Uuid};

/// Persistent catalog backed by a SQLite database
pub struct SqliteLibrary {
    conn: Mutex<Connection>,
    entropy: Box<dyn EntropySource>,
}

impl std::fmt::Debug for SqliteLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLibrary").finish_non_exhaustive()
    }
}

impl SqliteLibrary {
    /// Open (or create) the database at `path` and ensure the schema exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to open database");
            StorageError::Database(e)
        })?;

        info!(path = %path.display(), "Opened catalog database");
        Self::from_connection(conn)
    }

    /// Open a private in-memory database (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    /// Wrap an existing connection and ensure the schema exists
    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(sql::INIT_SCHEMA).map_err(|e| {
            error!(error = %e, "Failed to initialise schema");
            StorageError::Database(e)
        })?;

        Ok(Self {
            conn: Mutex::new(conn),
            entropy: Box::new(OsEntropy),
        })
    }

    /// Replace the source of random bytes used to mint copy identifiers
    pub fn with_entropy(mut self, entropy: impl EntropySource + 'static) -> Self {
        self.entropy = Box::new(entropy);
        self
    }

    /// Run `f` while holding the connection lock
    fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| {
            error!("Connection lock poisoned");
            StorageError::LockPoisoned
        })?;

        f(&conn).map_err(|e| {
            error!(error = %e, "Statement failed");
            StorageError::Database(e)
        })
    }

    /// Execute a statement and return the affected-row count
    pub(super) fn execute<P: Params>(&self, statement: &str, params: P) -> Result<usize> {
        let affected = self.with_conn(|conn| conn.prepare_cached(statement)?.execute(params))?;
        debug!(statement, affected, "Executed statement");
        Ok(affected)
    }

    /// Run a single-value `COUNT` query
    fn count<P: Params>(&self, statement: &str, params: P) -> Result<usize> {
        let count: i64 = self.with_conn(|conn| {
            conn.prepare_cached(statement)?
                .query_row(params, |row| row.get(0))
        })?;

        usize::try_from(count).map_err(|_| StorageError::Decode {
            column: "COUNT(*)",
            value: count.to_string(),
        })
    }

    /// Run a query returning record rows; any undecodable row fails the whole query
    fn query_records<P: Params>(&self, statement: &str, params: P) -> Result<Vec<Record>> {
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(statement)?;
            let rows = stmt
                .query_map(params, RawRecord::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        debug!(statement, rows = rows.len(), "Fetched records");
        sql::decode_all(rows).map_err(|e| {
            error!(error = %e, "Failed to decode record row");
            e
        })
    }

    /// Shelve a new copy of `book`, returning its fresh identifier
    pub fn insert(&self, book: &Book) -> Result<Uuid> {
        let uuid = Uuid::generate_from(self.entropy.as_ref());
        self.execute(
            sql::INSERT,
            params![
                uuid.serialize().as_str(),
                book.isbn.as_str(),
                book.title,
                book.author
            ],
        )?;

        info!(%uuid, isbn = %book.isbn, "Inserted record");
        Ok(uuid)
    }

    /// Delete the copy with `uuid`.
    ///
    /// Deleting an unknown identifier succeeds without effect.
    pub fn erase(&self, uuid: &Uuid) -> Result<()> {
        let affected = self.execute(sql::ERASE, [uuid.serialize().as_str()])?;
        if affected == 0 {
            debug!(%uuid, "Erase matched no record");
        }
        Ok(())
    }

    /// Delete the copy with `uuid`, returning it if it existed.
    ///
    /// The lookup and the delete are a single statement, so two concurrent
    /// callers never both see the same record.
    pub fn take(&self, uuid: &Uuid) -> Result<Option<Record>> {
        let raw = self.with_conn(|conn| {
            conn.prepare_cached(sql::TAKE)?
                .query_row([uuid.serialize().as_str()], RawRecord::from_row)
                .optional()
        })?;

        match raw {
            Some(raw) => {
                info!(%uuid, "Removed record");
                raw.decode().map(Some)
            }
            None => {
                debug!(%uuid, "Take matched no record");
                Ok(None)
            }
        }
    }

    /// Total number of copies
    pub fn size(&self) -> Result<usize> {
        self.count(sql::COUNT, [])
    }

    /// Number of distinct ISBNs among all copies
    pub fn distinct_count(&self) -> Result<usize> {
        self.count(sql::COUNT_DISTINCT_ISBN, [])
    }

    /// Number of copies of `isbn`
    pub fn copies(&self, isbn: &Isbn) -> Result<usize> {
        self.count(sql::COUNT_FOR_ISBN, [isbn.as_str()])
    }

    /// Number of copies of `isbn` that are not on loan
    pub fn available(&self, isbn: &Isbn) -> Result<usize> {
        self.count(sql::COUNT_AVAILABLE_FOR_ISBN, [isbn.as_str()])
    }

    pub fn isbns(&self) -> Result<Vec<Isbn>> {
        let values: Vec<String> = self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(sql::DISTINCT_ISBNS)?;
            let values = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(values)
        })?;

        values
            .into_iter()
            .map(|value| {
                Isbn::parse(&value).map_err(|_| StorageError::Decode {
                    column: "isbn",
                    value,
                })
            })
            .collect()
    }

    /// Snapshot of every copy, unordered
    pub fn records(&self) -> Result<Vec<Record>> {
        self.query_records(sql::SELECT_ALL, [])
    }

    /// Every copy of `isbn`
    pub fn records_for(&self, isbn: &Isbn) -> Result<Vec<Record>> {
        self.query_records(sql::SELECT_BY_ISBN, [isbn.as_str()])
    }

    /// Look up a single copy
    pub fn get(&self, uuid: &Uuid) -> Result<Option<Record>> {
        let raw = self.with_conn(|conn| {
            conn.prepare_cached(sql::SELECT_BY_UUID)?
                .query_row([uuid.serialize().as_str()], RawRecord::from_row)
                .optional()
        })?;

        raw.map(RawRecord::decode).transpose()
    }

    /// Copies whose title contains `needle` (ASCII case-insensitive)
    pub fn title_like(&self, needle: &str) -> Result<Vec<Record>> {
        self.query_records(sql::TITLE_LIKE, [sql::like_pattern(needle)])
    }

    /// Copies whose author contains `needle` (ASCII case-insensitive)
    pub fn author_like(&self, needle: &str) -> Result<Vec<Record>> {
        self.query_records(sql::AUTHOR_LIKE, [sql::like_pattern(needle)])
    }
}

impl CatalogStore for SqliteLibrary {
    type Key = Uuid;
    type Receipt = Uuid;
    type Item = Record;

    fn insert(&self, book: &Book) -> Result<Uuid> {
        SqliteLibrary::insert(self, book)
    }

    fn erase(&self, uuid: &Uuid) -> Result<()> {
        SqliteLibrary::erase(self, uuid)
    }

    fn size(&self) -> Result<usize> {
        SqliteLibrary::size(self)
    }

    fn copies(&self, isbn: &Isbn) -> Result<usize> {
        SqliteLibrary::copies(self, isbn)
    }

    fn distinct_count(&self) -> Result<usize> {
        SqliteLibrary::distinct_count(self)
    }

    fn isbns(&self) -> Result<Vec<Isbn>> {
        SqliteLibrary::isbns(self)
    }

    fn title_like(&self, needle: &str) -> Result<Vec<Record>> {
        SqliteLibrary::title_like(self, needle)
    }

    fn author_like(&self, needle: &str) -> Result<Vec<Record>> {
        SqliteLibrary::author_like(self, needle)
    }
}
