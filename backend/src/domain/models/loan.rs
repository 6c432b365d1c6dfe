//! Domain model for loans.
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Loan {
    pub loan_id: i64,
    pub isbn: String,
    pub card_id: String,
    pub date_out: NaiveDate,
    pub due_date: NaiveDate,
    /// `None` while the book is still out
    pub date_in: Option<NaiveDate>,
}

impl Loan {
    pub fn is_outstanding(&self) -> bool {
        self.date_in.is_none()
    }
}

/// An outstanding loan joined with its book and borrower, as listed for check-in
#[derive(Debug, Clone, PartialEq)]
pub struct CheckinCandidate {
    pub loan_id: i64,
    pub isbn: String,
    pub title: String,
    pub authors: Vec<String>,
    pub card_id: String,
    pub borrower_name: String,
    pub date_out: NaiveDate,
    pub due_date: NaiveDate,
}
