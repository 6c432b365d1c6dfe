use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// DbConnection owns the single-writer handle to the relational store.
///
/// The pool is capped at one connection, so every transaction opened through
/// it is serialized with respect to every other operation.
#[derive(Clone, Debug)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Open (creating if missing) the database file at `path`
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating database directory {:?}", parent))?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        info!("Opening library database at {:?}", path);
        Self::connect(options).await
    }

    /// Open a private in-memory database (used by tests and dry runs)
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        Self::connect(options).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self> {
        // One connection that never expires: the in-memory store lives exactly
        // as long as this connection does.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("connecting to library database")?;

        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Row count of one of the library tables
    pub async fn count_rows(&self, table: Table) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) AS n FROM {}", table.name());
        let row = sqlx::query(&sql).fetch_one(self.pool()).await?;
        Ok(row.get("n"))
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS books (
                isbn TEXT PRIMARY KEY,
                title TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS authors (
                author_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Rowid order of this table is the insertion order used when joining
        // author names for display.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS book_authors (
                isbn TEXT NOT NULL,
                author_id INTEGER NOT NULL,
                PRIMARY KEY (isbn, author_id),
                FOREIGN KEY (isbn) REFERENCES books (isbn),
                FOREIGN KEY (author_id) REFERENCES authors (author_id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS borrowers (
                card_id TEXT PRIMARY KEY,
                ssn TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                address TEXT NOT NULL,
                phone TEXT NOT NULL,
                password TEXT NOT NULL DEFAULT ''
            );
            "#,
        )
        .execute(pool)
        .await?;

        Self::ensure_password_column(pool).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS book_loans (
                loan_id INTEGER PRIMARY KEY AUTOINCREMENT,
                isbn TEXT NOT NULL,
                card_id TEXT NOT NULL,
                date_out TEXT NOT NULL,
                due_date TEXT NOT NULL,
                date_in TEXT,
                FOREIGN KEY (isbn) REFERENCES books (isbn),
                FOREIGN KEY (card_id) REFERENCES borrowers (card_id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        // A book can have at most one loan without a check-in date
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_book_loans_outstanding
            ON book_loans(isbn) WHERE date_in IS NULL;
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_book_loans_card_id
            ON book_loans(card_id);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS fines (
                loan_id INTEGER PRIMARY KEY,
                fine_amt REAL NOT NULL,
                paid INTEGER NOT NULL DEFAULT 0 CHECK (paid IN (0, 1)),
                FOREIGN KEY (loan_id) REFERENCES book_loans (loan_id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        debug!("Library schema is up to date");
        Ok(())
    }

    /// Stores created before borrower logins existed lack the password column
    async fn ensure_password_column(pool: &SqlitePool) -> Result<()> {
        let columns = sqlx::query("PRAGMA table_info(borrowers)")
            .fetch_all(pool)
            .await?;

        let has_password = columns
            .iter()
            .any(|row| row.get::<String, _>("name") == "password");

        if !has_password {
            info!("Adding password column to borrowers table");
            sqlx::query("ALTER TABLE borrowers ADD COLUMN password TEXT NOT NULL DEFAULT ''")
                .execute(pool)
                .await?;
        }

        Ok(())
    }
}

/// Tables owned by the library schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Books,
    Authors,
    BookAuthors,
    Borrowers,
    BookLoans,
    Fines,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Books => "books",
            Table::Authors => "authors",
            Table::BookAuthors => "book_authors",
            Table::Borrowers => "borrowers",
            Table::BookLoans => "book_loans",
            Table::Fines => "fines",
        }
    }
}
