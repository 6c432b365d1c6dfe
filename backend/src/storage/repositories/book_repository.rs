use sqlx::{Row, SqliteConnection};
use std::collections::HashMap;

use super::{placeholders, MAX_IN_PARAMS};
use crate::domain::models::{Author, Book};

/// Books, authors and the links between them
#[derive(Clone, Debug, Default)]
pub struct BookRepository;

/// A book matched by catalog search, before authors are attached
#[derive(Debug, Clone, PartialEq)]
pub struct BookMatch {
    pub isbn: String,
    pub title: String,
    /// Card id on the book's outstanding loan; `None` while it is in
    pub holder: Option<String>,
}

impl BookRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn get_book(&self, conn: &mut SqliteConnection, isbn: &str) -> sqlx::Result<Option<Book>> {
        let row = sqlx::query("SELECT isbn, title FROM books WHERE isbn = ?")
            .bind(isbn)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row.map(|r| Book {
            isbn: r.get("isbn"),
            title: r.get("title"),
        }))
    }

    /// Books whose ISBN, title or any author name contains the pattern.
    ///
    /// One row per ISBN, ordered by ISBN. `pattern` comes from
    /// [`super::like_pattern`].
    pub async fn search(&self, conn: &mut SqliteConnection, pattern: &str) -> sqlx::Result<Vec<BookMatch>> {
        let rows = sqlx::query(
            r#"
            SELECT
                b.isbn,
                b.title,
                (
                    SELECT bl.card_id FROM book_loans bl
                    WHERE bl.isbn = b.isbn AND bl.date_in IS NULL
                    ORDER BY bl.date_out DESC, bl.loan_id DESC
                    LIMIT 1
                ) AS holder
            FROM books b
            WHERE LOWER(b.isbn) LIKE ? ESCAPE '\'
               OR LOWER(b.title) LIKE ? ESCAPE '\'
               OR EXISTS (
                    SELECT 1
                    FROM book_authors ba
                    JOIN authors a ON a.author_id = ba.author_id
                    WHERE ba.isbn = b.isbn
                      AND LOWER(a.name) LIKE ? ESCAPE '\'
               )
            ORDER BY b.isbn
            "#,
        )
        .bind(pattern)
        .bind(pattern)
        .bind(pattern)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows
            .iter()
            .map(|row| BookMatch {
                isbn: row.get("isbn"),
                title: row.get("title"),
                holder: row.get("holder"),
            })
            .collect())
    }

    /// Author names per ISBN, in the order the links were recorded
    pub async fn authors_for_isbns(
        &self,
        conn: &mut SqliteConnection,
        isbns: &[String],
    ) -> sqlx::Result<HashMap<String, Vec<String>>> {
        let mut authors: HashMap<String, Vec<String>> = HashMap::new();

        for chunk in isbns.chunks(MAX_IN_PARAMS) {
            let sql = format!(
                r#"
                SELECT ba.isbn, a.name
                FROM book_authors ba
                JOIN authors a ON a.author_id = ba.author_id
                WHERE ba.isbn IN ({})
                ORDER BY ba.rowid
                "#,
                placeholders(chunk.len())
            );

            let mut query = sqlx::query(&sql);
            for isbn in chunk {
                query = query.bind(isbn);
            }

            for row in query.fetch_all(&mut *conn).await? {
                authors
                    .entry(row.get("isbn"))
                    .or_default()
                    .push(row.get("name"));
            }
        }

        Ok(authors)
    }

    pub async fn insert_book(&self, conn: &mut SqliteConnection, book: &Book) -> sqlx::Result<()> {
        sqlx::query("INSERT INTO books (isbn, title) VALUES (?, ?)")
            .bind(&book.isbn)
            .bind(&book.title)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn insert_author(&self, conn: &mut SqliteConnection, author: &Author) -> sqlx::Result<()> {
        sqlx::query("INSERT INTO authors (author_id, name) VALUES (?, ?)")
            .bind(author.author_id)
            .bind(&author.name)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn link_author(&self, conn: &mut SqliteConnection, isbn: &str, author_id: i64) -> sqlx::Result<()> {
        sqlx::query("INSERT INTO book_authors (isbn, author_id) VALUES (?, ?)")
            .bind(isbn)
            .bind(author_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
