//! SQLite repositories.
//!
//! Repositories hold no connection of their own: every method borrows the
//! connection of the transaction the calling service opened, so reads and
//! writes of one operation commit or roll back together.

pub mod book_repository;
pub mod borrower_repository;
pub mod fine_repository;
pub mod loan_repository;

pub use book_repository::BookRepository;
pub use borrower_repository::BorrowerRepository;
pub use fine_repository::FineRepository;
pub use loan_repository::LoanRepository;

/// Largest number of bound parameters used in one `IN (...)` list
pub(crate) const MAX_IN_PARAMS: usize = 500;

/// Build a case-insensitive `LIKE` pattern matching `query` as a literal substring.
///
/// The result must be used with `ESCAPE '\'` and compared against `LOWER(column)`.
/// SQLite's `LOWER` folds ASCII letters only, so the query is folded the same way.
pub fn like_pattern(query: &str) -> String {
    format!("%{}%", escape_like(query))
}

/// Like [`like_pattern`], but anchored at the start of the value
pub fn prefix_pattern(prefix: &str) -> String {
    format!("{}%", escape_like(prefix))
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.to_ascii_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `?, ?, ?` for an `IN` list of `n` parameters
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
