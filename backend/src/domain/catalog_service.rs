//! Catalog search over books, their authors and availability.

use shared::BookStatus;
use tracing::debug;

use crate::domain::errors::LibraryResult;
use crate::domain::models::{normalize_isbn, CatalogEntry};
use crate::storage::repositories::{like_pattern, BookRepository, LoanRepository};
use crate::storage::DbConnection;

#[derive(Clone, Debug)]
pub struct CatalogService {
    db: DbConnection,
    books: BookRepository,
    loans: LoanRepository,
}

impl CatalogService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            db,
            books: BookRepository::new(),
            loans: LoanRepository::new(),
        }
    }

    /// Books whose ISBN, title or any author name contains `query`
    /// (case-insensitive, taken literally), one entry per ISBN.
    ///
    /// Each entry lists all of the book's authors, even when only one of them
    /// matched.
    pub async fn search_books(&self, query: &str) -> LibraryResult<Vec<CatalogEntry>> {
        let mut conn = self.db.pool().acquire().await?;

        let matches = self.books.search(&mut conn, &like_pattern(query)).await?;
        let isbns: Vec<String> = matches.iter().map(|m| m.isbn.clone()).collect();
        let mut authors = self.books.authors_for_isbns(&mut conn, &isbns).await?;

        let entries: Vec<CatalogEntry> = matches
            .into_iter()
            .map(|m| CatalogEntry {
                authors: authors.remove(&m.isbn).unwrap_or_default(),
                status: if m.holder.is_some() { BookStatus::Out } else { BookStatus::In },
                holder: m.holder,
                isbn: m.isbn,
                title: m.title,
            })
            .collect();

        debug!("Catalog search {:?} matched {} books", query, entries.len());
        Ok(entries)
    }

    /// Card id of whoever has the book out, if anyone
    pub async fn current_holder(&self, isbn: &str) -> LibraryResult<Option<String>> {
        let mut conn = self.db.pool().acquire().await?;
        Ok(self.loans.current_holder(&mut conn, &normalize_isbn(isbn)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestLibrary;

    #[tokio::test]
    async fn test_search_by_title_is_case_insensitive() {
        let env = TestLibrary::seeded().await;
        let results = env.state.catalog_service.search_books("the LORD").await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].isbn, "0618640150");
        assert_eq!(results[0].authors_joined(), "J.R.R. Tolkien");
        assert_eq!(results[0].status, BookStatus::In);
    }

    #[tokio::test]
    async fn test_author_match_lists_every_author() {
        let env = TestLibrary::seeded().await;
        let results = env.state.catalog_service.search_books("helm").await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].authors_joined(),
            "Erich Gamma, Richard Helm, Ralph Johnson, John Vlissides"
        );
    }

    #[tokio::test]
    async fn test_book_matching_several_ways_appears_once() {
        let env = TestLibrary::seeded().await;
        // "tolkien" matches two books by author only
        let results = env.state.catalog_service.search_books("tolkien").await.unwrap();
        let isbns: Vec<&str> = results.iter().map(|r| r.isbn.as_str()).collect();
        assert_eq!(isbns, vec!["0261103571", "0618640150"]);

        // "the" matches titles of three books; Fellowship also via "The"
        let results = env.state.catalog_service.search_books("the").await.unwrap();
        let mut isbns: Vec<&str> = results.iter().map(|r| r.isbn.as_str()).collect();
        isbns.dedup();
        assert_eq!(isbns.len(), results.len());
    }

    #[tokio::test]
    async fn test_empty_query_lists_every_book() {
        let env = TestLibrary::seeded().await;
        let results = env.state.catalog_service.search_books("").await.unwrap();

        let isbns: Vec<&str> = results.iter().map(|r| r.isbn.as_str()).collect();
        assert_eq!(
            isbns,
            vec!["0000000001", "0201633612", "0261103571", "0307474275", "0441013597", "0618640150"]
        );
        let pamphlet = &results[0];
        assert_eq!(pamphlet.title, "Untitled Pamphlet");
        assert_eq!(pamphlet.authors_joined(), "");
        assert!(results.iter().all(|r| r.status == BookStatus::In));
    }

    #[tokio::test]
    async fn test_non_ascii_title_matches_as_substring() {
        let env = TestLibrary::seeded().await;
        sqlx::query("INSERT INTO books (isbn, title) VALUES ('2080701282', 'Émile, ou De l''éducation')")
            .execute(env.db.pool())
            .await
            .unwrap();

        for query in ["Émile", "ÉMILE", "l'éducation", "DE L'éducation"] {
            let results = env.state.catalog_service.search_books(query).await.unwrap();
            let isbns: Vec<&str> = results.iter().map(|r| r.isbn.as_str()).collect();
            assert_eq!(isbns, vec!["2080701282"], "query {:?}", query);
        }
    }

    #[tokio::test]
    async fn test_wildcards_in_query_are_literal() {
        let env = TestLibrary::seeded().await;
        assert!(env.state.catalog_service.search_books("%").await.unwrap().is_empty());
        assert!(env.state.catalog_service.search_books("_").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_book_without_authors_and_status() {
        let env = TestLibrary::seeded().await;
        env.insert_loan("0000000001", "ID000002", "2025-01-01").await;

        let results = env.state.catalog_service.search_books("pamphlet").await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].authors.is_empty());
        assert_eq!(results[0].authors_joined(), "");
        assert_eq!(results[0].status, BookStatus::Out);
        assert_eq!(results[0].holder.as_deref(), Some("ID000002"));

        let holder = env.state.catalog_service.current_holder(" 0000000001 ").await.unwrap();
        assert_eq!(holder.as_deref(), Some("ID000002"));
        let nobody = env.state.catalog_service.current_holder("0441013597").await.unwrap();
        assert!(nobody.is_none());
    }
}
