use sqlx::{Row, SqliteConnection};

use crate::domain::models::{Fine, FineDetail};

/// Fine records, one per late loan
#[derive(Clone, Debug, Default)]
pub struct FineRepository;

impl FineRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn get_fine(&self, conn: &mut SqliteConnection, loan_id: i64) -> sqlx::Result<Option<Fine>> {
        let row = sqlx::query("SELECT loan_id, fine_amt, paid FROM fines WHERE loan_id = ?")
            .bind(loan_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row.map(|r| Fine {
            loan_id: r.get("loan_id"),
            fine_amount: r.get("fine_amt"),
            paid: r.get::<i64, _>("paid") != 0,
        }))
    }

    pub async fn insert_unpaid(&self, conn: &mut SqliteConnection, loan_id: i64, amount: f64) -> sqlx::Result<()> {
        sqlx::query("INSERT INTO fines (loan_id, fine_amt, paid) VALUES (?, ?, 0)")
            .bind(loan_id)
            .bind(amount)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Change the amount of an unpaid fine; paid fines are never touched
    pub async fn update_unpaid_amount(&self, conn: &mut SqliteConnection, loan_id: i64, amount: f64) -> sqlx::Result<bool> {
        let result = sqlx::query("UPDATE fines SET fine_amt = ? WHERE loan_id = ? AND paid = 0")
            .bind(amount)
            .bind(loan_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Unpaid fines across all of the borrower's loans, returned or not
    pub async fn unpaid_total(&self, conn: &mut SqliteConnection, card_id: &str) -> sqlx::Result<f64> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(f.fine_amt), 0.0) AS total
            FROM fines f
            JOIN book_loans bl ON bl.loan_id = f.loan_id
            WHERE bl.card_id = ? AND f.paid = 0
            "#,
        )
        .bind(card_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row.get("total"))
    }

    /// Unpaid fines on loans the borrower has already returned
    pub async fn payable_total(&self, conn: &mut SqliteConnection, card_id: &str) -> sqlx::Result<f64> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(f.fine_amt), 0.0) AS total
            FROM fines f
            JOIN book_loans bl ON bl.loan_id = f.loan_id
            WHERE bl.card_id = ? AND f.paid = 0 AND bl.date_in IS NOT NULL
            "#,
        )
        .bind(card_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row.get("total"))
    }

    /// Latch every payable fine of the borrower as paid; returns rows changed
    pub async fn mark_payable_paid(&self, conn: &mut SqliteConnection, card_id: &str) -> sqlx::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE fines
            SET paid = 1
            WHERE paid = 0
              AND loan_id IN (
                    SELECT loan_id FROM book_loans
                    WHERE card_id = ? AND date_in IS NOT NULL
              )
            "#,
        )
        .bind(card_id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Every fine of the borrower with its loan and book, oldest loan first
    pub async fn details_for_borrower(&self, conn: &mut SqliteConnection, card_id: &str) -> sqlx::Result<Vec<FineDetail>> {
        let rows = sqlx::query(
            r#"
            SELECT f.loan_id, bl.isbn, b.title, bl.due_date, bl.date_in, f.fine_amt, f.paid
            FROM fines f
            JOIN book_loans bl ON bl.loan_id = f.loan_id
            JOIN books b ON b.isbn = bl.isbn
            WHERE bl.card_id = ?
            ORDER BY bl.loan_id
            "#,
        )
        .bind(card_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows
            .iter()
            .map(|row| FineDetail {
                loan_id: row.get("loan_id"),
                isbn: row.get("isbn"),
                title: row.get("title"),
                due_date: row.get("due_date"),
                date_in: row.get("date_in"),
                fine_amount: row.get("fine_amt"),
                paid: row.get::<i64, _>("paid") != 0,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::repositories::LoanRepository;
    use crate::test_utils::{date, TestLibrary};

    #[tokio::test]
    async fn test_paid_fines_are_latched() {
        let env = TestLibrary::seeded().await;
        let loans = LoanRepository::new();
        let fines = FineRepository::new();
        let mut conn = env.db.pool().acquire().await.unwrap();

        let loan = loans
            .insert_loan(&mut conn, "0441013597", "ID000001", date("2025-01-01"), date("2025-01-15"))
            .await
            .unwrap();
        loans.mark_returned(&mut conn, loan.loan_id, date("2025-01-19")).await.unwrap();
        fines.insert_unpaid(&mut conn, loan.loan_id, 1.0).await.unwrap();

        assert_eq!(fines.payable_total(&mut conn, "ID000001").await.unwrap(), 1.0);
        assert_eq!(fines.mark_payable_paid(&mut conn, "ID000001").await.unwrap(), 1);
        assert!(!fines.update_unpaid_amount(&mut conn, loan.loan_id, 9.0).await.unwrap());

        let stored = fines.get_fine(&mut conn, loan.loan_id).await.unwrap().unwrap();
        assert!(stored.paid);
        assert_eq!(stored.fine_amount, 1.0);
        assert_eq!(fines.unpaid_total(&mut conn, "ID000001").await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_outstanding_loan_fines_count_as_unpaid_but_not_payable() {
        let env = TestLibrary::seeded().await;
        let loans = LoanRepository::new();
        let fines = FineRepository::new();
        let mut conn = env.db.pool().acquire().await.unwrap();

        let loan = loans
            .insert_loan(&mut conn, "0441013597", "ID000002", date("2025-01-01"), date("2025-01-15"))
            .await
            .unwrap();
        fines.insert_unpaid(&mut conn, loan.loan_id, 0.5).await.unwrap();

        assert_eq!(fines.unpaid_total(&mut conn, "ID000002").await.unwrap(), 0.5);
        assert_eq!(fines.payable_total(&mut conn, "ID000002").await.unwrap(), 0.0);
        assert_eq!(fines.mark_payable_paid(&mut conn, "ID000002").await.unwrap(), 0);

        let details = fines.details_for_borrower(&mut conn, "ID000002").await.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].title, "Dune");
        assert!(details[0].is_accruing());
    }
}
