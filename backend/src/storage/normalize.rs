//! # Source data normalization
//!
//! Turns the library's raw export files into the seed CSVs read by
//! [`super::bootstrap::import_seed_data`]:
//!
//! ```text
//! books.csv (tab separated)        book.csv, authors.csv, book_authors.csv
//!   ISBN10  ISBN13  Title  Authors  ...
//! borrowers.csv                    borrower.csv
//!   ID, SSN, First, Last, Email, Address, City, State, Phone
//! ```
//!
//! The header line of both inputs is skipped and rows with too few columns
//! are dropped. The first title seen for an ISBN wins. Author lists are split
//! on commas and each distinct name gets the next author id, in order of
//! first appearance.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Writer};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::domain::models::normalize_isbn;

const BOOK_COLUMNS: usize = 4;
const BORROWER_COLUMNS: usize = 9;

/// Rows written per output file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub books: usize,
    pub authors: usize,
    pub book_authors: usize,
    pub borrowers: usize,
}

#[derive(Debug, Default)]
struct Catalog {
    books: Vec<(String, String)>,
    seen_isbns: HashSet<String>,
    authors: Vec<String>,
    author_ids: HashMap<String, i64>,
    links: Vec<(String, i64)>,
    seen_links: HashSet<(String, i64)>,
}

impl Catalog {
    fn add_row(&mut self, record: &StringRecord) {
        let isbn = normalize_isbn(&record[0]);
        let title = record[2].trim();
        if self.seen_isbns.insert(isbn.clone()) {
            self.books.push((isbn.clone(), title.to_string()));
        }

        for name in record[3].split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let author_id = match self.author_ids.get(name) {
                Some(id) => *id,
                None => {
                    self.authors.push(name.to_string());
                    let id = self.authors.len() as i64;
                    self.author_ids.insert(name.to_string(), id);
                    id
                }
            };
            if self.seen_links.insert((isbn.clone(), author_id)) {
                self.links.push((isbn.clone(), author_id));
            }
        }
    }
}

#[derive(Debug)]
struct RawBorrower {
    card_id: String,
    ssn: String,
    name: String,
    address: String,
    phone: String,
}

impl RawBorrower {
    fn from_record(record: &StringRecord) -> Self {
        Self {
            card_id: field(record, 0).to_string(),
            ssn: field(record, 1).to_string(),
            name: format!("{} {}", field(record, 2), field(record, 3)),
            address: format!("{}, {}, {}", field(record, 5), field(record, 6), field(record, 7)),
            phone: field(record, 8).to_string(),
        }
    }
}

fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).map(str::trim).unwrap_or_default()
}

/// Normalize the raw books (tab separated) and borrowers (comma separated)
/// exports into seed CSVs under `out_dir`
pub fn normalize_source_files(books_file: &Path, borrowers_file: &Path, out_dir: &Path) -> Result<NormalizeReport> {
    info!("Normalizing {:?} and {:?} into {:?}", books_file, borrowers_file, out_dir);

    let catalog = read_books(books_file)?;
    let borrowers = read_borrowers(borrowers_file)?;

    fs::create_dir_all(out_dir).with_context(|| format!("creating output directory {:?}", out_dir))?;

    write_rows(
        &out_dir.join("book.csv"),
        ["Isbn", "Title"],
        catalog.books.iter().map(|(isbn, title)| [isbn.clone(), title.clone()]),
    )?;
    write_rows(
        &out_dir.join("authors.csv"),
        ["Author_id", "Name"],
        catalog
            .authors
            .iter()
            .enumerate()
            .map(|(index, name)| [(index + 1).to_string(), name.clone()]),
    )?;
    write_rows(
        &out_dir.join("book_authors.csv"),
        ["Isbn", "Author_id"],
        catalog.links.iter().map(|(isbn, id)| [isbn.clone(), id.to_string()]),
    )?;
    write_rows(
        &out_dir.join("borrower.csv"),
        ["Card_id", "Ssn", "Bname", "Address", "Phone"],
        borrowers.iter().map(|b| {
            [
                b.card_id.clone(),
                b.ssn.clone(),
                b.name.clone(),
                b.address.clone(),
                b.phone.clone(),
            ]
        }),
    )?;

    let report = NormalizeReport {
        books: catalog.books.len(),
        authors: catalog.authors.len(),
        book_authors: catalog.links.len(),
        borrowers: borrowers.len(),
    };
    info!(
        "Normalized {} books, {} authors, {} links, {} borrowers",
        report.books, report.authors, report.book_authors, report.borrowers
    );
    Ok(report)
}

fn read_books(path: &Path) -> Result<Catalog> {
    // Titles contain stray quotes, so fields are split on tabs only
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening books file {:?}", path))?;

    let mut catalog = Catalog::default();
    for result in reader.records() {
        let record = result.with_context(|| format!("reading {:?}", path))?;
        if record.len() < BOOK_COLUMNS {
            debug!("Skipping short books row at {:?}", record.position());
            continue;
        }
        catalog.add_row(&record);
    }
    Ok(catalog)
}

fn read_borrowers(path: &Path) -> Result<Vec<RawBorrower>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening borrowers file {:?}", path))?;

    let mut seen = HashSet::new();
    let mut borrowers = Vec::new();
    for result in reader.records() {
        let record = result.with_context(|| format!("reading {:?}", path))?;
        if record.len() < BORROWER_COLUMNS {
            debug!("Skipping short borrowers row at {:?}", record.position());
            continue;
        }
        let borrower = RawBorrower::from_record(&record);
        if seen.insert(borrower.card_id.clone()) {
            borrowers.push(borrower);
        }
    }
    Ok(borrowers)
}

/// Write a header and rows; fields with commas or quotes are quoted
fn write_rows<const N: usize>(
    path: &Path,
    header: [&str; N],
    rows: impl Iterator<Item = [String; N]>,
) -> Result<()> {
    let mut writer = Writer::from_path(path).with_context(|| format!("creating {:?}", path))?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
