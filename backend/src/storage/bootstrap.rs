//! # Seed data import
//!
//! Loads the initial catalog and borrower list from CSV files into an empty
//! store. Each table is filled at most once: a table that already has rows is
//! left alone, so running the import again is harmless.
//!
//! ## Files
//!
//! ```text
//! seed_dir/
//! ├── book.csv           Isbn,Title
//! ├── authors.csv        Author_id,Name
//! ├── book_authors.csv   Isbn,Author_id
//! └── borrower.csv       Card_id,Ssn,Bname,Address,Phone[,Password]
//! ```

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

use super::connection::{DbConnection, Table};
use super::repositories::{BookRepository, BorrowerRepository};
use crate::domain::models::{normalize_isbn, Author, Book, Borrower};

#[derive(Debug, Deserialize)]
struct BookRecord {
    #[serde(rename = "Isbn")]
    isbn: String,
    #[serde(rename = "Title")]
    title: String,
}

#[derive(Debug, Deserialize)]
struct AuthorRecord {
    #[serde(rename = "Author_id")]
    author_id: i64,
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct BookAuthorRecord {
    #[serde(rename = "Isbn")]
    isbn: String,
    #[serde(rename = "Author_id")]
    author_id: i64,
}

#[derive(Debug, Deserialize)]
struct BorrowerRecord {
    #[serde(rename = "Card_id")]
    card_id: String,
    #[serde(rename = "Ssn")]
    ssn: String,
    #[serde(rename = "Bname")]
    name: String,
    #[serde(rename = "Address")]
    address: String,
    #[serde(rename = "Phone")]
    phone: String,
    #[serde(rename = "Password", default)]
    password: Option<String>,
}

/// What happened to one table during the import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported(usize),
    /// The table already had rows
    AlreadyPopulated,
    /// The seed file does not exist
    MissingFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub tables: Vec<(Table, ImportOutcome)>,
}

impl BootstrapReport {
    pub fn outcome(&self, table: Table) -> Option<ImportOutcome> {
        self.tables
            .iter()
            .find(|(t, _)| *t == table)
            .map(|(_, outcome)| *outcome)
    }

    pub fn total_imported(&self) -> usize {
        self.tables
            .iter()
            .map(|(_, outcome)| match outcome {
                ImportOutcome::Imported(n) => *n,
                _ => 0,
            })
            .sum()
    }
}

impl fmt::Display for BootstrapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (table, outcome) in &self.tables {
            match outcome {
                ImportOutcome::Imported(n) => writeln!(f, "{:<13} {} rows imported", table.name(), n)?,
                ImportOutcome::AlreadyPopulated => writeln!(f, "{:<13} already populated", table.name())?,
                ImportOutcome::MissingFile => writeln!(f, "{:<13} no seed file", table.name())?,
            }
        }
        Ok(())
    }
}

/// Import every seed file found in `dir`, in foreign-key order
pub async fn import_seed_data(db: &DbConnection, dir: &Path) -> Result<BootstrapReport> {
    info!("Importing seed data from {:?}", dir);
    let tables = vec![
        (Table::Books, import_books(db, dir).await?),
        (Table::Authors, import_authors(db, dir).await?),
        (Table::BookAuthors, import_book_authors(db, dir).await?),
        (Table::Borrowers, import_borrowers(db, dir).await?),
    ];
    Ok(BootstrapReport { tables })
}

/// Records of the seed file, or the outcome to report when the table is skipped
async fn load_records<T: DeserializeOwned>(
    db: &DbConnection,
    table: Table,
    path: &Path,
) -> Result<std::result::Result<Vec<T>, ImportOutcome>> {
    if db.count_rows(table).await? > 0 {
        info!("Table {} already has rows, skipping seed import", table.name());
        return Ok(Err(ImportOutcome::AlreadyPopulated));
    }
    if !path.exists() {
        warn!("Seed file {:?} not found, leaving {} empty", path, table.name());
        return Ok(Err(ImportOutcome::MissingFile));
    }

    let file = File::open(path).with_context(|| format!("opening seed file {:?}", path))?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));
    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: T = result.with_context(|| format!("reading {:?}", path))?;
        records.push(record);
    }
    Ok(Ok(records))
}

async fn import_books(db: &DbConnection, dir: &Path) -> Result<ImportOutcome> {
    let records: Vec<BookRecord> = match load_records(db, Table::Books, &dir.join("book.csv")).await? {
        Ok(records) => records,
        Err(outcome) => return Ok(outcome),
    };

    let repo = BookRepository::new();
    let mut tx = db.pool().begin().await?;
    for record in &records {
        let book = Book {
            isbn: normalize_isbn(&record.isbn),
            title: record.title.trim().to_string(),
        };
        repo.insert_book(&mut tx, &book)
            .await
            .with_context(|| format!("inserting book {}", book.isbn))?;
    }
    tx.commit().await?;

    info!("Imported {} books", records.len());
    Ok(ImportOutcome::Imported(records.len()))
}

async fn import_authors(db: &DbConnection, dir: &Path) -> Result<ImportOutcome> {
    let records: Vec<AuthorRecord> = match load_records(db, Table::Authors, &dir.join("authors.csv")).await? {
        Ok(records) => records,
        Err(outcome) => return Ok(outcome),
    };

    let repo = BookRepository::new();
    let mut tx = db.pool().begin().await?;
    for record in &records {
        let author = Author {
            author_id: record.author_id,
            name: record.name.trim().to_string(),
        };
        repo.insert_author(&mut tx, &author)
            .await
            .with_context(|| format!("inserting author {}", author.author_id))?;
    }
    tx.commit().await?;

    info!("Imported {} authors", records.len());
    Ok(ImportOutcome::Imported(records.len()))
}

async fn import_book_authors(db: &DbConnection, dir: &Path) -> Result<ImportOutcome> {
    let path = dir.join("book_authors.csv");
    let records: Vec<BookAuthorRecord> = match load_records(db, Table::BookAuthors, &path).await? {
        Ok(records) => records,
        Err(outcome) => return Ok(outcome),
    };

    let repo = BookRepository::new();
    let mut tx = db.pool().begin().await?;
    for record in &records {
        let isbn = normalize_isbn(&record.isbn);
        repo.link_author(&mut tx, &isbn, record.author_id)
            .await
            .with_context(|| format!("linking book {} to author {}", isbn, record.author_id))?;
    }
    tx.commit().await?;

    info!("Imported {} book/author links", records.len());
    Ok(ImportOutcome::Imported(records.len()))
}

async fn import_borrowers(db: &DbConnection, dir: &Path) -> Result<ImportOutcome> {
    let records: Vec<BorrowerRecord> = match load_records(db, Table::Borrowers, &dir.join("borrower.csv")).await? {
        Ok(records) => records,
        Err(outcome) => return Ok(outcome),
    };

    let repo = BorrowerRepository::new();
    let mut tx = db.pool().begin().await?;
    for record in records.iter() {
        let ssn = record.ssn.trim().to_string();
        let password = match record.password.as_deref().map(str::trim) {
            Some(password) if !password.is_empty() => password.to_string(),
            _ => default_password(&ssn),
        };
        let borrower = Borrower {
            card_id: record.card_id.trim().to_string(),
            ssn,
            name: record.name.trim().to_string(),
            address: record.address.trim().to_string(),
            phone: record.phone.trim().to_string(),
            password,
        };
        repo.insert_borrower(&mut tx, &borrower)
            .await
            .with_context(|| format!("inserting borrower {}", borrower.card_id))?;
    }
    tx.commit().await?;

    info!("Imported {} borrowers", records.len());
    Ok(ImportOutcome::Imported(records.len()))
}

/// Last four digits of the SSN, "0000" when it has fewer
fn default_password(ssn: &str) -> String {
    let digits: Vec<char> = ssn.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return "0000".to_string();
    }
    digits[digits.len() - 4..].iter().collect()
}
