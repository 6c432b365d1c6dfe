//! Fines engine.
//!
//! Recomputes overdue fines for every late loan and settles a borrower's
//! payable fines. A fine row is created the first time a loan is found late,
//! follows the loan's lateness while unpaid, and is frozen forever once paid.
//! Rows are never deleted.

use chrono::NaiveDate;
use sqlx::SqliteConnection;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::clock::Clock;
use crate::domain::commands::fines::FineUpdateSummary;
use crate::domain::errors::LibraryResult;
use crate::domain::models::{overdue_fine, round_cents, to_cents, FineStatement};
use crate::domain::policy::CirculationPolicy;
use crate::storage::repositories::{FineRepository, LoanRepository};
use crate::storage::DbConnection;

#[derive(Clone, Debug)]
pub struct FineService {
    db: DbConnection,
    loans: LoanRepository,
    fines: FineRepository,
    clock: Arc<dyn Clock>,
    policy: CirculationPolicy,
}

impl FineService {
    pub fn new(db: DbConnection, clock: Arc<dyn Clock>, policy: CirculationPolicy) -> Self {
        Self {
            db,
            loans: LoanRepository::new(),
            fines: FineRepository::new(),
            clock,
            policy,
        }
    }

    /// Recalculate fines for all overdue loans. Safe to call repeatedly.
    pub async fn update_fines(&self) -> LibraryResult<FineUpdateSummary> {
        let today = self.clock.today();
        let mut tx = self.db.pool().begin().await?;

        let summary = self.recompute_fines(&mut tx, today).await?;

        tx.commit().await?;
        info!(
            "Fines updated as of {}: {} created, {} updated, {} unchanged",
            today, summary.created, summary.updated, summary.unchanged
        );
        Ok(summary)
    }

    /// Recompute pass on a connection owned by the caller's transaction.
    ///
    /// Returned loans are charged up to their check-in date, outstanding ones
    /// up to `today`.
    pub(crate) async fn recompute_fines(
        &self,
        conn: &mut SqliteConnection,
        today: NaiveDate,
    ) -> sqlx::Result<FineUpdateSummary> {
        let mut summary = FineUpdateSummary::default();

        for loan in self.loans.list_overdue(conn, today).await? {
            let end = loan.date_in.unwrap_or(today);
            let Some(amount) = overdue_fine(loan.due_date, end, self.policy.daily_fine_rate) else {
                continue;
            };

            match self.fines.get_fine(conn, loan.loan_id).await? {
                None => {
                    self.fines.insert_unpaid(conn, loan.loan_id, amount).await?;
                    debug!("Loan {}: new fine {:.2}", loan.loan_id, amount);
                    summary.created += 1;
                }
                Some(fine) if fine.paid => {
                    summary.unchanged += 1;
                }
                Some(fine) if to_cents(fine.fine_amount) != to_cents(amount) => {
                    self.fines.update_unpaid_amount(conn, loan.loan_id, amount).await?;
                    debug!(
                        "Loan {}: fine {:.2} -> {:.2}",
                        loan.loan_id, fine.fine_amount, amount
                    );
                    summary.updated += 1;
                }
                Some(_) => {
                    summary.unchanged += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Pay every unpaid fine on the borrower's returned loans at once.
    ///
    /// Returns the amount paid; 0.0 (and no change) when nothing is payable.
    /// Fines on books still out are not payable yet.
    pub async fn pay_fines(&self, card_id: &str) -> LibraryResult<f64> {
        let card_id = card_id.trim();
        let mut tx = self.db.pool().begin().await?;

        let total = self.fines.payable_total(&mut tx, card_id).await?;
        if to_cents(total) <= 0 {
            info!("No fines to pay for borrower {}", card_id);
            return Ok(0.0);
        }

        let settled = self.fines.mark_payable_paid(&mut tx, card_id).await?;
        tx.commit().await?;

        let paid = round_cents(total);
        info!("Paid ${:.2} across {} fines for borrower {}", paid, settled, card_id);
        Ok(paid)
    }

    /// All fines of a borrower with payable/accruing/paid totals
    pub async fn fines_for_borrower(&self, card_id: &str) -> LibraryResult<FineStatement> {
        let card_id = card_id.trim();
        let mut conn = self.db.pool().acquire().await?;

        let fines = self.fines.details_for_borrower(&mut conn, card_id).await?;
        debug!("Borrower {} has {} fine records", card_id, fines.len());

        Ok(FineStatement::new(card_id.to_string(), fines))
    }
}
