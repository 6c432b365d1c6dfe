use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::domain::models::{CheckinCandidate, Loan};

/// Loan records
#[derive(Clone, Debug, Default)]
pub struct LoanRepository;

fn loan_from_row(row: &SqliteRow) -> Loan {
    Loan {
        loan_id: row.get("loan_id"),
        isbn: row.get("isbn"),
        card_id: row.get("card_id"),
        date_out: row.get("date_out"),
        due_date: row.get("due_date"),
        date_in: row.get("date_in"),
    }
}

impl LoanRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn get_loan(&self, conn: &mut SqliteConnection, loan_id: i64) -> sqlx::Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT loan_id, isbn, card_id, date_out, due_date, date_in
            FROM book_loans
            WHERE loan_id = ?
            "#,
        )
        .bind(loan_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.as_ref().map(loan_from_row))
    }

    pub async fn count_outstanding_for_borrower(&self, conn: &mut SqliteConnection, card_id: &str) -> sqlx::Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM book_loans WHERE card_id = ? AND date_in IS NULL",
        )
        .bind(card_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row.get("n"))
    }

    pub async fn has_outstanding_loan(&self, conn: &mut SqliteConnection, isbn: &str) -> sqlx::Result<bool> {
        let row = sqlx::query("SELECT 1 FROM book_loans WHERE isbn = ? AND date_in IS NULL")
            .bind(isbn)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    /// Card id of whoever holds the book right now
    pub async fn current_holder(&self, conn: &mut SqliteConnection, isbn: &str) -> sqlx::Result<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT card_id
            FROM book_loans
            WHERE isbn = ? AND date_in IS NULL
            ORDER BY date_out DESC, loan_id DESC
            LIMIT 1
            "#,
        )
        .bind(isbn)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row.map(|r| r.get("card_id")))
    }

    /// Insert an outstanding loan and return it with its new id
    pub async fn insert_loan(
        &self,
        conn: &mut SqliteConnection,
        isbn: &str,
        card_id: &str,
        date_out: NaiveDate,
        due_date: NaiveDate,
    ) -> sqlx::Result<Loan> {
        let result = sqlx::query(
            r#"
            INSERT INTO book_loans (isbn, card_id, date_out, due_date, date_in)
            VALUES (?, ?, ?, ?, NULL)
            "#,
        )
        .bind(isbn)
        .bind(card_id)
        .bind(date_out)
        .bind(due_date)
        .execute(&mut *conn)
        .await?;

        Ok(Loan {
            loan_id: result.last_insert_rowid(),
            isbn: isbn.to_string(),
            card_id: card_id.to_string(),
            date_out,
            due_date,
            date_in: None,
        })
    }

    /// Outstanding loans whose ISBN, card id or borrower name contains the
    /// pattern, oldest checkout first (ties broken by loan id).
    ///
    /// Authors are left empty; the caller attaches them.
    pub async fn find_outstanding(&self, conn: &mut SqliteConnection, pattern: &str) -> sqlx::Result<Vec<CheckinCandidate>> {
        let rows = sqlx::query(
            r#"
            SELECT
                bl.loan_id,
                bl.isbn,
                b.title,
                bl.card_id,
                br.name AS borrower_name,
                bl.date_out,
                bl.due_date
            FROM book_loans bl
            JOIN books b ON b.isbn = bl.isbn
            JOIN borrowers br ON br.card_id = bl.card_id
            WHERE bl.date_in IS NULL
              AND (
                    LOWER(bl.isbn) LIKE ? ESCAPE '\'
                 OR LOWER(bl.card_id) LIKE ? ESCAPE '\'
                 OR LOWER(br.name) LIKE ? ESCAPE '\'
              )
            ORDER BY bl.date_out ASC, bl.loan_id ASC
            "#,
        )
        .bind(pattern)
        .bind(pattern)
        .bind(pattern)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows
            .iter()
            .map(|row| CheckinCandidate {
                loan_id: row.get("loan_id"),
                isbn: row.get("isbn"),
                title: row.get("title"),
                authors: Vec::new(),
                card_id: row.get("card_id"),
                borrower_name: row.get("borrower_name"),
                date_out: row.get("date_out"),
                due_date: row.get("due_date"),
            })
            .collect())
    }

    /// Set the check-in date of an outstanding loan.
    /// Returns false if the loan was already returned or does not exist.
    pub async fn mark_returned(&self, conn: &mut SqliteConnection, loan_id: i64, date_in: NaiveDate) -> sqlx::Result<bool> {
        let result = sqlx::query(
            "UPDATE book_loans SET date_in = ? WHERE loan_id = ? AND date_in IS NULL",
        )
        .bind(date_in)
        .bind(loan_id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Loans that are late as of `today`: returned after their due date, or
    /// still out past it
    pub async fn list_overdue(&self, conn: &mut SqliteConnection, today: NaiveDate) -> sqlx::Result<Vec<Loan>> {
        // ISO dates compare correctly as text
        let rows = sqlx::query(
            r#"
            SELECT loan_id, isbn, card_id, date_out, due_date, date_in
            FROM book_loans
            WHERE (date_in IS NOT NULL AND date_in > due_date)
               OR (date_in IS NULL AND due_date < ?)
            ORDER BY loan_id
            "#,
        )
        .bind(today)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.iter().map(loan_from_row).collect())
    }
}
