//! Shared fixture for unit tests: a fresh in-memory library with a manual
//! clock and a small catalog.

use chrono::{Duration, NaiveDate};
use std::sync::Arc;

use crate::domain::models::{Author, Book, Borrower, CardIdFormat, Fine, Loan};
use crate::domain::{CirculationPolicy, ManualClock};
use crate::storage::repositories::{BookRepository, BorrowerRepository, FineRepository, LoanRepository};
use crate::storage::DbConnection;
use crate::AppState;

pub fn date(iso: &str) -> NaiveDate {
    NaiveDate::parse_from_str(iso, "%Y-%m-%d").expect("valid ISO date in test")
}

const BOOKS: &[(&str, &str, &[&str])] = &[
    ("0441013597", "Dune", &["Frank Herbert"]),
    ("0261103571", "The Fellowship of the Ring", &["J.R.R. Tolkien"]),
    ("0618640150", "The Lord of the Rings", &["J.R.R. Tolkien"]),
    (
        "0201633612",
        "Design Patterns",
        &["Erich Gamma", "Richard Helm", "Ralph Johnson", "John Vlissides"],
    ),
    ("0000000001", "Untitled Pamphlet", &[]),
    ("0307474275", "The Road", &["Cormac McCarthy"]),
];

const BORROWERS: &[(&str, &str, &str)] = &[
    ("ID000001", "111-22-3333", "Ann Smith"),
    ("ID000002", "222-33-4444", "Bob Jones"),
    ("ID000003", "333-44-5555", "Carol Smithers"),
];

pub struct TestLibrary {
    pub db: DbConnection,
    pub clock: Arc<ManualClock>,
    pub state: AppState,
}

impl TestLibrary {
    /// Empty store, today is 2025-01-01
    pub async fn new() -> Self {
        let db = DbConnection::in_memory().await.expect("Failed to create test database");
        let clock = Arc::new(ManualClock::new(date("2025-01-01")));
        let state = AppState::new(
            db.clone(),
            clock.clone(),
            CirculationPolicy::default(),
            CardIdFormat::default(),
        );
        Self { db, clock, state }
    }

    /// Six books (one without authors) and three borrowers, no loans
    pub async fn seeded() -> Self {
        let env = Self::new().await;
        let books = BookRepository::new();
        let borrowers = BorrowerRepository::new();
        let mut conn = env.db.pool().acquire().await.unwrap();

        let mut next_author_id = 1;
        let mut author_ids: Vec<(&str, i64)> = Vec::new();
        for (isbn, title, authors) in BOOKS {
            let book = Book {
                isbn: isbn.to_string(),
                title: title.to_string(),
            };
            books.insert_book(&mut conn, &book).await.unwrap();

            for name in authors.iter() {
                let author_id = match author_ids.iter().find(|(n, _)| n == name) {
                    Some((_, id)) => *id,
                    None => {
                        let id = next_author_id;
                        next_author_id += 1;
                        let author = Author {
                            author_id: id,
                            name: name.to_string(),
                        };
                        books.insert_author(&mut conn, &author).await.unwrap();
                        author_ids.push((*name, id));
                        id
                    }
                };
                books.link_author(&mut conn, isbn, author_id).await.unwrap();
            }
        }

        for (card_id, ssn, name) in BORROWERS {
            let borrower = Borrower {
                card_id: card_id.to_string(),
                ssn: ssn.to_string(),
                name: name.to_string(),
                address: "1 Library Way".to_string(),
                phone: "555-0000".to_string(),
                password: ssn[ssn.len() - 4..].to_string(),
            };
            borrowers.insert_borrower(&mut conn, &borrower).await.unwrap();
        }

        drop(conn);
        env
    }

    /// Insert an outstanding loan directly, due 14 days after `date_out`
    pub async fn insert_loan(&self, isbn: &str, card_id: &str, date_out: &str) -> i64 {
        let date_out = date(date_out);
        let mut conn = self.db.pool().acquire().await.unwrap();
        LoanRepository::new()
            .insert_loan(&mut conn, isbn, card_id, date_out, date_out + Duration::days(14))
            .await
            .unwrap()
            .loan_id
    }

    pub async fn return_loan(&self, loan_id: i64, date_in: &str) {
        let mut conn = self.db.pool().acquire().await.unwrap();
        let returned = LoanRepository::new()
            .mark_returned(&mut conn, loan_id, date(date_in))
            .await
            .unwrap();
        assert!(returned, "loan {} was not outstanding", loan_id);
    }

    pub async fn loan(&self, loan_id: i64) -> Loan {
        let mut conn = self.db.pool().acquire().await.unwrap();
        LoanRepository::new().get_loan(&mut conn, loan_id).await.unwrap().unwrap()
    }

    pub async fn fine(&self, loan_id: i64) -> Option<Fine> {
        let mut conn = self.db.pool().acquire().await.unwrap();
        FineRepository::new().get_fine(&mut conn, loan_id).await.unwrap()
    }
}
