//! Domain model for catalog entries.
use shared::BookStatus;

#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub isbn: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub author_id: i64,
    pub name: String,
}

/// A book as seen by catalog search, with its authors and availability
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub isbn: String,
    pub title: String,
    /// Author names in the order their links were recorded
    pub authors: Vec<String>,
    pub status: BookStatus,
    /// Card id of the borrower who has the book out
    pub holder: Option<String>,
}

impl CatalogEntry {
    pub fn authors_joined(&self) -> String {
        join_authors(&self.authors)
    }
}

/// Join author names for display; no authors gives an empty string
pub fn join_authors(authors: &[String]) -> String {
    authors.join(", ")
}

/// Normalize an ISBN the way the catalog stores it
pub fn normalize_isbn(isbn: &str) -> String {
    isbn.trim().to_uppercase()
}
