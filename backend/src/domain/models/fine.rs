//! Domain model for overdue fines.
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Fine {
    pub loan_id: i64,
    pub fine_amount: f64,
    /// Once set, recomputation never touches the row again
    pub paid: bool,
}

/// A fine with the loan and book it was charged on
#[derive(Debug, Clone, PartialEq)]
pub struct FineDetail {
    pub loan_id: i64,
    pub isbn: String,
    pub title: String,
    pub due_date: NaiveDate,
    pub date_in: Option<NaiveDate>,
    pub fine_amount: f64,
    pub paid: bool,
}

impl FineDetail {
    /// Unpaid and the book has been returned
    pub fn is_payable(&self) -> bool {
        !self.paid && self.date_in.is_some()
    }

    /// Unpaid and the book is still out
    pub fn is_accruing(&self) -> bool {
        !self.paid && self.date_in.is_none()
    }
}

/// All fines of one borrower with running totals
#[derive(Debug, Clone, PartialEq)]
pub struct FineStatement {
    pub card_id: String,
    pub fines: Vec<FineDetail>,
    pub payable: f64,
    pub accruing: f64,
    pub paid: f64,
}

impl FineStatement {
    pub fn new(card_id: String, fines: Vec<FineDetail>) -> Self {
        let total = |keep: fn(&FineDetail) -> bool| {
            round_cents(fines.iter().filter(|f| keep(f)).map(|f| f.fine_amount).sum())
        };
        let payable = total(FineDetail::is_payable);
        let accruing = total(FineDetail::is_accruing);
        let paid = total(|f| f.paid);

        Self {
            card_id,
            fines,
            payable,
            accruing,
            paid,
        }
    }
}

/// Fine owed for a loan due on `due_date` and returned (or assessed) on `end`.
///
/// Whole days late times the daily rate, rounded to cents. `None` when the
/// loan is not late, so no fine row is produced.
pub fn overdue_fine(due_date: NaiveDate, end: NaiveDate, daily_rate: f64) -> Option<f64> {
    let days_late = (end - due_date).num_days();
    if days_late <= 0 {
        return None;
    }

    let amount = round_cents(days_late as f64 * daily_rate);
    (amount > 0.0).then_some(amount)
}

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Whole cents, for comparing stored and recomputed amounts
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}
