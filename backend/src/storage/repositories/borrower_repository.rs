use sqlx::{Row, SqliteConnection};

use super::prefix_pattern;
use crate::domain::models::{Borrower, CardIdFormat};

/// Borrower records
#[derive(Clone, Debug, Default)]
pub struct BorrowerRepository;

impl BorrowerRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn get_borrower(&self, conn: &mut SqliteConnection, card_id: &str) -> sqlx::Result<Option<Borrower>> {
        let row = sqlx::query(
            r#"
            SELECT card_id, ssn, name, address, phone, password
            FROM borrowers
            WHERE card_id = ?
            "#,
        )
        .bind(card_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(|r| Borrower {
            card_id: r.get("card_id"),
            ssn: r.get("ssn"),
            name: r.get("name"),
            address: r.get("address"),
            phone: r.get("phone"),
            password: r.get("password"),
        }))
    }

    pub async fn ssn_exists(&self, conn: &mut SqliteConnection, ssn: &str) -> sqlx::Result<bool> {
        let row = sqlx::query("SELECT 1 FROM borrowers WHERE ssn = ?")
            .bind(ssn)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    /// Highest number among card ids issued in `format`, if any
    pub async fn max_card_number(&self, conn: &mut SqliteConnection, format: &CardIdFormat) -> sqlx::Result<Option<i64>> {
        let rows = sqlx::query("SELECT card_id FROM borrowers WHERE LOWER(card_id) LIKE ? ESCAPE '\\'")
            .bind(prefix_pattern(&format.prefix))
            .fetch_all(&mut *conn)
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| format.parse(row.get::<&str, _>("card_id")))
            .max())
    }

    pub async fn insert_borrower(&self, conn: &mut SqliteConnection, borrower: &Borrower) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO borrowers (card_id, ssn, name, address, phone, password)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&borrower.card_id)
        .bind(&borrower.ssn)
        .bind(&borrower.name)
        .bind(&borrower.address)
        .bind(&borrower.phone)
        .bind(&borrower.password)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
