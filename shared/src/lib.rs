use serde::{Deserialize, Serialize};
use std::fmt;

/// Availability of a catalog entry, derived from its loans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookStatus {
    /// No outstanding loan exists for the book
    #[serde(rename = "IN")]
    In,
    /// Some loan for the book has no check-in date yet
    #[serde(rename = "OUT")]
    Out,
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookStatus::In => write!(f, "IN"),
            BookStatus::Out => write!(f, "OUT"),
        }
    }
}

/// One row of a catalog search, grouped per ISBN
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSearchResult {
    pub isbn: String,
    pub title: String,
    /// Author names joined with ", " (empty when the book has no authors)
    pub authors: String,
    pub status: BookStatus,
    /// Card id of the current borrower while the book is out
    pub holder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSearchResponse {
    pub query: String,
    pub results: Vec<BookSearchResult>,
}

/// Public view of a borrower. Never carries the SSN or password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowerProfile {
    pub card_id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBorrowerRequest {
    pub ssn: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBorrowerResponse {
    pub card_id: String,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub card_id: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub isbn: String,
    pub card_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub loan_id: i64,
    pub isbn: String,
    pub card_id: String,
    /// ISO date (YYYY-MM-DD)
    pub date_out: String,
    /// ISO date (YYYY-MM-DD)
    pub due_date: String,
    pub success_message: String,
}

/// An outstanding loan offered for check-in, in search order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinCandidate {
    /// 1-based position the caller passes back as a selection
    pub position: usize,
    pub loan_id: i64,
    pub isbn: String,
    pub title: String,
    pub authors: String,
    pub card_id: String,
    pub borrower_name: String,
    pub date_out: String,
    pub due_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinSearchResponse {
    pub query: String,
    pub candidates: Vec<CheckinCandidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinRequest {
    pub query: String,
    /// 1-based positions into the check-in search result
    pub selections: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinResponse {
    pub checked_in_loan_ids: Vec<i64>,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateFinesResponse {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayFinesResponse {
    pub card_id: String,
    pub amount_paid: f64,
    pub success_message: String,
}

/// A single fine with the loan it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FineRecord {
    pub loan_id: i64,
    pub isbn: String,
    pub title: String,
    pub due_date: String,
    /// `None` while the book is still out
    pub date_in: Option<String>,
    pub fine_amount: f64,
    pub paid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FineStatementResponse {
    pub card_id: String,
    pub fines: Vec<FineRecord>,
    /// Unpaid fines on returned loans
    pub payable: f64,
    /// Unpaid fines on loans that are still out
    pub accruing: f64,
    pub paid: f64,
}

/// Format a dollar amount for display
pub fn format_amount(amount: f64) -> String {
    format!("${:.2}", amount)
}
