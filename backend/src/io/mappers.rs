//! Mappers between domain models and the `shared` DTOs.

use chrono::NaiveDate;
use shared::{
    BookSearchResponse, BookSearchResult, BorrowerProfile, CheckinCandidate as SharedCheckinCandidate,
    CheckinRequest, CheckinSearchResponse, CheckoutResponse, CreateBorrowerRequest, FineRecord,
    FineStatementResponse, UpdateFinesResponse,
};

use crate::domain::commands::borrower::CreateBorrowerCommand;
use crate::domain::commands::circulation::CheckinCommand;
use crate::domain::commands::fines::FineUpdateSummary;
use crate::domain::models::{
    join_authors, Borrower, CatalogEntry, CheckinCandidate as DomainCheckinCandidate, FineDetail,
    FineStatement, Loan,
};

/// Dates cross the boundary as `YYYY-MM-DD`
fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub struct BorrowerMapper;

impl BorrowerMapper {
    /// Public profile; the SSN and password stay behind
    pub fn to_dto(domain: Borrower) -> BorrowerProfile {
        BorrowerProfile {
            card_id: domain.card_id,
            name: domain.name,
            address: domain.address,
            phone: domain.phone,
        }
    }

    pub fn to_command(dto: CreateBorrowerRequest) -> CreateBorrowerCommand {
        CreateBorrowerCommand {
            ssn: dto.ssn,
            name: dto.name,
            address: dto.address,
            phone: dto.phone,
            password: dto.password,
        }
    }
}

pub struct CatalogMapper;

impl CatalogMapper {
    pub fn to_dto(domain: CatalogEntry) -> BookSearchResult {
        BookSearchResult {
            authors: domain.authors_joined(),
            isbn: domain.isbn,
            title: domain.title,
            status: domain.status,
            holder: domain.holder,
        }
    }

    pub fn to_response(query: &str, entries: Vec<CatalogEntry>) -> BookSearchResponse {
        BookSearchResponse {
            query: query.to_string(),
            results: entries.into_iter().map(Self::to_dto).collect(),
        }
    }
}

pub struct LoanMapper;

impl LoanMapper {
    pub fn to_checkout_response(loan: Loan) -> CheckoutResponse {
        let success_message = format!(
            "Book {} checked out to {}, due {}",
            loan.isbn,
            loan.card_id,
            iso(loan.due_date)
        );
        CheckoutResponse {
            loan_id: loan.loan_id,
            isbn: loan.isbn,
            card_id: loan.card_id,
            date_out: iso(loan.date_out),
            due_date: iso(loan.due_date),
            success_message,
        }
    }

    /// Number candidates from 1 in search order
    pub fn to_checkin_search_response(query: &str, candidates: Vec<DomainCheckinCandidate>) -> CheckinSearchResponse {
        CheckinSearchResponse {
            query: query.to_string(),
            candidates: candidates
                .into_iter()
                .enumerate()
                .map(|(index, c)| SharedCheckinCandidate {
                    position: index + 1,
                    loan_id: c.loan_id,
                    authors: join_authors(&c.authors),
                    isbn: c.isbn,
                    title: c.title,
                    card_id: c.card_id,
                    borrower_name: c.borrower_name,
                    date_out: iso(c.date_out),
                    due_date: iso(c.due_date),
                })
                .collect(),
        }
    }

    pub fn to_checkin_command(dto: CheckinRequest) -> CheckinCommand {
        CheckinCommand {
            query: dto.query,
            selections: dto.selections,
        }
    }
}

pub struct FineMapper;

impl FineMapper {
    pub fn to_dto(domain: FineDetail) -> FineRecord {
        FineRecord {
            loan_id: domain.loan_id,
            isbn: domain.isbn,
            title: domain.title,
            due_date: iso(domain.due_date),
            date_in: domain.date_in.map(iso),
            fine_amount: domain.fine_amount,
            paid: domain.paid,
        }
    }

    pub fn to_statement_response(statement: FineStatement) -> FineStatementResponse {
        FineStatementResponse {
            card_id: statement.card_id,
            fines: statement.fines.into_iter().map(Self::to_dto).collect(),
            payable: statement.payable,
            accruing: statement.accruing,
            paid: statement.paid,
        }
    }

    pub fn to_update_response(summary: FineUpdateSummary) -> UpdateFinesResponse {
        UpdateFinesResponse {
            created: summary.created,
            updated: summary.updated,
            unchanged: summary.unchanged,
            success_message: format!(
                "Fines updated: {} new, {} changed, {} unchanged",
                summary.created, summary.updated, summary.unchanged
            ),
        }
    }
}
