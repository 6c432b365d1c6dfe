//! Circulation engine: checkout and check-in of books.
//!
//! Every operation runs inside one store transaction. A rejected request
//! returns before anything is written, and the transaction rolls back when
//! dropped.

use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::clock::Clock;
use crate::domain::commands::circulation::CheckinCommand;
use crate::domain::errors::{LibraryError, LibraryResult};
use crate::domain::fine_service::FineService;
use crate::domain::models::{normalize_isbn, round_cents, to_cents, CheckinCandidate, Loan};
use crate::domain::policy::CirculationPolicy;
use crate::storage::repositories::{
    like_pattern, BookRepository, BorrowerRepository, FineRepository, LoanRepository,
};
use crate::storage::DbConnection;

#[derive(Clone, Debug)]
pub struct CirculationService {
    db: DbConnection,
    books: BookRepository,
    borrowers: BorrowerRepository,
    loans: LoanRepository,
    fines: FineRepository,
    fine_service: FineService,
    clock: Arc<dyn Clock>,
    policy: CirculationPolicy,
}

impl CirculationService {
    pub fn new(
        db: DbConnection,
        fine_service: FineService,
        clock: Arc<dyn Clock>,
        policy: CirculationPolicy,
    ) -> Self {
        Self {
            db,
            books: BookRepository::new(),
            borrowers: BorrowerRepository::new(),
            loans: LoanRepository::new(),
            fines: FineRepository::new(),
            fine_service,
            clock,
            policy,
        }
    }

    /// Lend a book to a borrower, due `loan_period_days` from today.
    ///
    /// Checks run in a fixed order and the first failure wins: borrower
    /// exists, no unpaid fines, under the loan limit, book exists, book is in.
    pub async fn checkout_book(&self, isbn: &str, card_id: &str) -> LibraryResult<Loan> {
        let isbn = normalize_isbn(isbn);
        let card_id = card_id.trim();
        info!("Checkout requested: isbn={}, card_id={}", isbn, card_id);

        let mut tx = self.db.pool().begin().await?;

        if self.borrowers.get_borrower(&mut tx, card_id).await?.is_none() {
            warn!("Checkout rejected: borrower {} does not exist", card_id);
            return Err(LibraryError::BorrowerNotFound);
        }

        // Counts fines on loans still out as well, even though those cannot
        // be paid until the book comes back.
        let owed = self.fines.unpaid_total(&mut tx, card_id).await?;
        if to_cents(owed) > 0 {
            warn!("Checkout rejected: borrower {} owes ${:.2}", card_id, owed);
            return Err(LibraryError::UnpaidFines {
                amount: round_cents(owed),
            });
        }

        let outstanding = self.loans.count_outstanding_for_borrower(&mut tx, card_id).await?;
        if outstanding >= i64::from(self.policy.max_outstanding_loans) {
            warn!("Checkout rejected: borrower {} already has {} loans", card_id, outstanding);
            return Err(LibraryError::LoanLimitReached {
                limit: self.policy.max_outstanding_loans,
            });
        }

        if self.books.get_book(&mut tx, &isbn).await?.is_none() {
            warn!("Checkout rejected: book {} does not exist", isbn);
            return Err(LibraryError::BookNotFound);
        }

        if self.loans.has_outstanding_loan(&mut tx, &isbn).await? {
            warn!("Checkout rejected: book {} is already out", isbn);
            return Err(LibraryError::BookUnavailable);
        }

        let date_out = self.clock.today();
        let due_date = date_out + Duration::days(self.policy.loan_period_days);
        let loan = self
            .loans
            .insert_loan(&mut tx, &isbn, card_id, date_out, due_date)
            .await?;

        tx.commit().await?;
        info!(
            "Loan {} created: {} to {}, due {}",
            loan.loan_id, loan.isbn, loan.card_id, loan.due_date
        );
        Ok(loan)
    }

    /// Outstanding loans whose ISBN, card id or borrower name contains
    /// `query`, oldest checkout first. Positions in this list are what
    /// [`checkin_book`](Self::checkin_book) selects by.
    pub async fn find_loans_for_checkin(&self, query: &str) -> LibraryResult<Vec<CheckinCandidate>> {
        let mut conn = self.db.pool().acquire().await?;

        let mut candidates = self.loans.find_outstanding(&mut conn, &like_pattern(query)).await?;
        let isbns: Vec<String> = candidates.iter().map(|c| c.isbn.clone()).collect();
        let authors = self.books.authors_for_isbns(&mut conn, &isbns).await?;
        for candidate in &mut candidates {
            candidate.authors = authors.get(&candidate.isbn).cloned().unwrap_or_default();
        }

        debug!("Check-in search {:?} matched {} loans", query, candidates.len());
        Ok(candidates)
    }

    /// Return the loans at the given 1-based positions of the check-in search
    /// for `command.query`, then refresh fines as of today.
    ///
    /// Returns the ids of the loans checked in. Repeated positions are applied
    /// once but still count against the per-call limit.
    pub async fn checkin_book(&self, command: CheckinCommand) -> LibraryResult<Vec<i64>> {
        let today = self.clock.today();
        let mut tx = self.db.pool().begin().await?;

        let candidates = self
            .loans
            .find_outstanding(&mut tx, &like_pattern(&command.query))
            .await?;
        let loan_ids = self.select_loans(&candidates, &command.selections)?;

        let mut returned = Vec::with_capacity(loan_ids.len());
        for loan_id in loan_ids {
            if self.loans.mark_returned(&mut tx, loan_id, today).await? {
                returned.push(loan_id);
            }
        }

        let summary = self.fine_service.recompute_fines(&mut tx, today).await?;
        tx.commit().await?;

        info!(
            "Checked in {} loans on {} ({} fines created, {} updated)",
            returned.len(),
            today,
            summary.created,
            summary.updated
        );
        Ok(returned)
    }

    /// Resolve 1-based selections to loan ids, validating in order: results
    /// exist, something was selected, not too many, every position in range.
    fn select_loans(&self, candidates: &[CheckinCandidate], selections: &[usize]) -> LibraryResult<Vec<i64>> {
        if candidates.is_empty() {
            return Err(LibraryError::NoMatch);
        }
        if selections.is_empty() {
            return Err(LibraryError::NoSelections);
        }
        let max = self.policy.max_checkin_selections;
        if selections.len() > max {
            return Err(LibraryError::TooManySelections { max });
        }

        let mut loan_ids = Vec::with_capacity(selections.len());
        for &position in selections {
            let candidate = position
                .checked_sub(1)
                .and_then(|index| candidates.get(index))
                .ok_or(LibraryError::SelectionOutOfRange {
                    position,
                    available: candidates.len(),
                })?;
            if !loan_ids.contains(&candidate.loan_id) {
                loan_ids.push(candidate.loan_id);
            }
        }
        Ok(loan_ids)
    }
}
