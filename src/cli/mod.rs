//! Command-line interface for bookshelf.
//!
//! Provides commands for shelving and removing copies, listing and searching
//! the catalog, and checking copies out and back in.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::domain::{Book, Isbn, Record, Uuid};
use crate::storage::{SqliteLibrary, StorageError};

/// bookshelf - Book catalog with per-copy loan tracking
#[derive(Parser, Debug)]
#[command(name = "bookshelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Catalog database (defaults to the configured path)
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Shelve one or more copies of a book
    Add {
        /// 10- or 13-digit ISBN
        isbn: String,

        /// Book title
        title: String,

        /// Book author
        author: String,

        /// Number of copies to shelve
        #[arg(short, long, default_value = "1")]
        copies: usize,
    },

    /// Remove a copy from the catalog
    Remove {
        /// Copy UUID
        uuid: String,
    },

    /// List every copy
    List {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Search copies by title or author substring
    Search {
        /// Substring of the title
        #[arg(long, conflicts_with = "author", required_unless_present = "author")]
        title: Option<String>,

        /// Substring of the author
        #[arg(long)]
        author: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Check a copy out
    Loan {
        /// Copy UUID
        uuid: String,
    },

    /// Check a copy back in
    Return {
        /// Copy UUID
        uuid: String,
    },

    /// Show catalog totals
    Stats,

    /// Show resolved configuration (debug)
    Config,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct OutputArgs {
    /// Print records as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let database = match self.database {
            Some(path) => path,
            None => crate::config::database_path()?,
        };

        match self.command {
            Commands::Add {
                isbn,
                title,
                author,
                copies,
            } => add_book(database, &isbn, title, author, copies).await,
            Commands::Remove { uuid } => remove_copy(database, &uuid).await,
            Commands::List { output } => {
                let records = with_library(database, |library| library.records()).await?;
                print_records(records, output)
            }
            Commands::Search {
                title,
                author,
                output,
            } => {
                let records = search_records(database, title, author).await?;
                print_records(records, output)
            }
            Commands::Loan { uuid } => {
                let uuid = parse_uuid(&uuid)?;
                with_library(database, move |library| library.acquire(&uuid))
                    .await
                    .with_context(|| format!("Cannot loan {}", uuid))?;
                println!("Loaned {}", uuid);
                Ok(())
            }
            Commands::Return { uuid } => {
                let uuid = parse_uuid(&uuid)?;
                with_library(database, move |library| library.release(&uuid))
                    .await
                    .with_context(|| format!("Cannot return {}", uuid))?;
                println!("Returned {}", uuid);
                Ok(())
            }
            Commands::Stats => show_stats(database).await,
            Commands::Config => show_config(database),
        }
    }
}

/// Open the library and run `op` on a blocking thread
async fn with_library<T, F>(database: PathBuf, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&SqliteLibrary) -> Result<T, StorageError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || -> Result<T> {
        if let Some(parent) = database.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
        }

        let library = SqliteLibrary::open(&database)
            .with_context(|| format!("Failed to open catalog: {}", database.display()))?;
        Ok(op(&library)?)
    })
    .await
    .context("Storage task panicked")?
}

fn parse_isbn(text: &str) -> Result<Isbn> {
    Isbn::parse(text).with_context(|| format!("Invalid ISBN '{}'", text))
}

fn parse_uuid(text: &str) -> Result<Uuid> {
    text.parse::<Uuid>()
        .with_context(|| format!("Invalid UUID '{}'", text))
}

async fn add_book(
    database: PathBuf,
    isbn: &str,
    title: String,
    author: String,
    copies: usize,
) -> Result<()> {
    let book = Book::new(parse_isbn(isbn)?, title, author);

    let uuids: Vec<Uuid> = with_library(database, move |library| {
        (0..copies).map(|_| library.insert(&book)).collect()
    })
    .await?;

    for uuid in &uuids {
        println!("{}", uuid);
    }
    eprintln!("[Shelved {} cop{}]", uuids.len(), if uuids.len() == 1 { "y" } else { "ies" });

    Ok(())
}

/// Search by title, or by author when no title is given.
///
/// clap guarantees exactly one of the two is present.
async fn search_records(
    database: PathBuf,
    title: Option<String>,
    author: Option<String>,
) -> Result<Vec<Record>> {
    with_library(database, move |library| match title {
        Some(title) => library.title_like(&title),
        None => library.author_like(author.as_deref().unwrap_or_default()),
    })
    .await
}

async fn remove_copy(database: PathBuf, uuid: &str) -> Result<()> {
    let uuid = parse_uuid(uuid)?;

    let removed = with_library(database, move |library| library.take(&uuid)).await?;

    match removed {
        Some(record) => println!("Removed {} ({})", uuid, record.title),
        None => eprintln!("[No copy with id {}]", uuid),
    }

    Ok(())
}

async fn show_stats(database: PathBuf) -> Result<()> {
    let (size, distinct, per_isbn) = with_library(database, |library| {
        let size = library.size()?;
        let distinct = library.distinct_count()?;

        let mut per_isbn = library
            .isbns()?
            .into_iter()
            .map(|isbn| Ok((isbn, library.copies(&isbn)?, library.available(&isbn)?)))
            .collect::<Result<Vec<_>, StorageError>>()?;
        per_isbn.sort_by_key(|(isbn, _, _)| *isbn);

        Ok((size, distinct, per_isbn))
    })
    .await?;

    println!("Copies:        {}", size);
    println!("Distinct ISBN: {}", distinct);

    if !per_isbn.is_empty() {
        println!();
        println!("{:<13}  {:>6}  {:>9}", "ISBN", "COPIES", "AVAILABLE");
        for (isbn, copies, available) in per_isbn {
            println!("{:<13}  {:>6}  {:>9}", isbn, copies, available);
        }
    }

    Ok(())
}

fn show_config(database: PathBuf) -> Result<()> {
    let config = crate::config::config()?;

    println!("Home:        {}", config.home.display());
    println!("Database:    {}", database.display());
    println!("Log filter:  {}", config.log_filter);
    match &config.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none, using defaults)"),
    }

    Ok(())
}

fn print_records(mut records: Vec<Record>, output: OutputArgs) -> Result<()> {
    records.sort_by(|a, b| (&a.title, &a.isbn, a.uuid).cmp(&(&b.title, &b.isbn, b.uuid)));

    if output.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        eprintln!("[No records]");
        return Ok(());
    }

    for record in &records {
        println!(
            "{}  {:<13}  {:<9}  {} by {}",
            record.uuid,
            record.isbn,
            record.state().as_str(),
            record.title,
            record.author
        );
    }

    Ok(())
}
