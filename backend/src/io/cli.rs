//! Command-line front end.
//!
//! Each subcommand calls exactly one service operation and renders the
//! resulting DTO either as plain text or, with `--json`, as JSON on stdout.
//! Rejected operations print their reason and exit with status 2.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use shared::{
    format_amount, BookStatus, CheckinRequest, CheckinResponse, CheckoutRequest,
    CreateBorrowerRequest, CreateBorrowerResponse, LoginRequest, PayFinesResponse,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

use crate::config::LibraryConfig;
use crate::domain::LibraryError;
use crate::io::mappers::{BorrowerMapper, CatalogMapper, FineMapper, LoanMapper};
use crate::storage::{bootstrap, normalize};
use crate::{initialize_backend, AppState};

#[derive(Parser, Debug)]
#[command(name = "library-circulation")]
#[command(about = "Circulation desk for a small library: search, loans and fines")]
#[command(version)]
pub struct Cli {
    /// YAML config file (defaults to $LIBRARY_CIRCULATION_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the database and import the seed CSV files into empty tables
    Init {
        /// Directory with book.csv, authors.csv, book_authors.csv and borrower.csv
        #[arg(long)]
        seed_dir: Option<PathBuf>,
    },
    /// Convert the raw books (tab separated) and borrowers exports into seed CSV files
    Normalize {
        /// Raw books export: ISBN10, ISBN13, Title, Authors, ...
        #[arg(long)]
        books: PathBuf,
        /// Raw borrowers export: ID, SSN, first, last, email, address, city, state, phone
        #[arg(long)]
        borrowers: PathBuf,
        /// Where to write the seed files (defaults to the configured seed directory)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Search books by ISBN, title or author
    Search { query: String },
    /// Register a new borrower
    Register {
        #[arg(long)]
        ssn: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        password: String,
    },
    /// Check a borrower's card id and password
    Login {
        card_id: String,
        #[arg(long)]
        password: String,
    },
    /// Lend a book to a borrower
    Checkout { isbn: String, card_id: String },
    /// List outstanding loans matching an ISBN, card id or borrower name
    CheckinSearch { query: String },
    /// Check in loans by their 1-based position in `checkin-search` for the same query
    Checkin { query: String, selections: Vec<usize> },
    /// Recalculate fines for all overdue loans
    UpdateFines,
    /// Pay all fines on a borrower's returned books
    PayFines { card_id: String },
    /// Show a borrower's fines
    Fines { card_id: String },
}

/// Rendered result of one command
struct Output {
    text: String,
    json: serde_json::Value,
    success: bool,
}

impl Output {
    fn new<T: Serialize>(dto: &T, text: String) -> Result<Self> {
        Ok(Self {
            text,
            json: serde_json::to_value(dto)?,
            success: true,
        })
    }

    fn refused(message: &str, kind: &str) -> Self {
        Self {
            text: message.to_string(),
            json: json!({ "error": kind, "message": message }),
            success: false,
        }
    }

    fn print(&self, as_json: bool) -> Result<()> {
        if as_json {
            println!("{}", serde_json::to_string_pretty(&self.json)?);
        } else if self.success {
            println!("{}", self.text);
        } else {
            eprintln!("{}", self.text);
        }
        Ok(())
    }
}

/// Exit status for a rejected operation
const EXIT_REJECTED: u8 = 2;

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = LibraryConfig::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }
    debug!("Using config {:?}", config);

    if let Command::Normalize { books, borrowers, out_dir } = cli.command {
        let out_dir = out_dir.unwrap_or_else(|| config.seed_data_dir.clone());
        let output = normalize_sources(&books, &borrowers, &out_dir)?;
        output.print(cli.json)?;
        return Ok(ExitCode::SUCCESS);
    }

    let state = initialize_backend(&config).await?;

    let output = match execute(&state, &config, cli.command).await {
        Ok(output) => output,
        Err(err) => match err.downcast_ref::<LibraryError>() {
            Some(rejection) if rejection.is_business_rule() => {
                Output::refused(&rejection.to_string(), &format!("{:?}", rejection.kind()))
            }
            _ => return Err(err),
        },
    };

    output.print(cli.json)?;
    Ok(if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_REJECTED)
    })
}

fn normalize_sources(books: &Path, borrowers: &Path, out_dir: &Path) -> Result<Output> {
    let report = normalize::normalize_source_files(books, borrowers, out_dir)?;
    let text = format!(
        "Wrote seed files to {}\n  books: {}\n  authors: {}\n  book_authors: {}\n  borrowers: {}",
        out_dir.display(),
        report.books,
        report.authors,
        report.book_authors,
        report.borrowers
    );
    Output::new(&report, text)
}

async fn execute(state: &AppState, config: &LibraryConfig, command: Command) -> Result<Output> {
    match command {
        Command::Init { seed_dir } => {
            let dir = seed_dir.unwrap_or_else(|| config.seed_data_dir.clone());
            let report = bootstrap::import_seed_data(&state.db, &dir).await?;
            let text = format!(
                "Database ready at {}\n{}",
                config.database_path.display(),
                report.to_string().trim_end()
            );
            Ok(Output {
                json: json!({
                    "database": config.database_path,
                    "imported": report.total_imported(),
                }),
                text,
                success: true,
            })
        }

        Command::Normalize { books, borrowers, out_dir } => {
            let out_dir = out_dir.unwrap_or_else(|| config.seed_data_dir.clone());
            normalize_sources(&books, &borrowers, &out_dir)
        }

        Command::Search { query } => {
            let entries = state.catalog_service.search_books(&query).await?;
            let response = CatalogMapper::to_response(&query, entries);

            let mut lines = Vec::with_capacity(response.results.len() + 1);
            lines.push(format!("{} result(s) for {:?}", response.results.len(), query));
            for book in &response.results {
                let status = match (&book.status, &book.holder) {
                    (BookStatus::Out, Some(card_id)) => format!("OUT ({})", card_id),
                    _ => book.status.to_string(),
                };
                lines.push(format!("{:<12} {:<40} {:<40} {}", book.isbn, book.title, book.authors, status));
            }
            Output::new(&response, lines.join("\n"))
        }

        Command::Register { ssn, name, address, phone, password } => {
            let request = CreateBorrowerRequest { ssn, name, address, phone, password };
            let card_id = state
                .borrower_service
                .create_borrower(BorrowerMapper::to_command(request))
                .await?;
            let response = CreateBorrowerResponse {
                success_message: format!("Borrower created with card ID {}", card_id),
                card_id,
            };
            Output::new(&response, response.success_message.clone())
        }

        Command::Login { card_id, password } => {
            let request = LoginRequest { card_id, password };
            match state
                .borrower_service
                .authenticate(&request.card_id, &request.password)
                .await?
            {
                Some(borrower) => {
                    let profile = BorrowerMapper::to_dto(borrower);
                    let text = format!("Welcome, {} ({})", profile.name, profile.card_id);
                    Output::new(&profile, text)
                }
                None => Ok(Output::refused("Invalid card ID or password", "InvalidLogin")),
            }
        }

        Command::Checkout { isbn, card_id } => {
            let request = CheckoutRequest { isbn, card_id };
            let loan = state
                .circulation_service
                .checkout_book(&request.isbn, &request.card_id)
                .await?;
            let response = LoanMapper::to_checkout_response(loan);
            Output::new(&response, response.success_message.clone())
        }

        Command::CheckinSearch { query } => {
            let candidates = state.circulation_service.find_loans_for_checkin(&query).await?;
            let response = LoanMapper::to_checkin_search_response(&query, candidates);

            let mut lines = Vec::with_capacity(response.candidates.len() + 1);
            lines.push(format!("{} outstanding loan(s) for {:?}", response.candidates.len(), query));
            for c in &response.candidates {
                lines.push(format!(
                    "{:>2}. {:<12} {:<32} {:<24} {} {:<20} out {} due {}",
                    c.position, c.isbn, c.title, c.authors, c.card_id, c.borrower_name, c.date_out, c.due_date
                ));
            }
            Output::new(&response, lines.join("\n"))
        }

        Command::Checkin { query, selections } => {
            let request = CheckinRequest { query, selections };
            let loan_ids = state
                .circulation_service
                .checkin_book(LoanMapper::to_checkin_command(request))
                .await?;
            let response = CheckinResponse {
                success_message: format!("{} book(s) checked in", loan_ids.len()),
                checked_in_loan_ids: loan_ids,
            };
            Output::new(&response, response.success_message.clone())
        }

        Command::UpdateFines => {
            let summary = state.fine_service.update_fines().await?;
            let response = FineMapper::to_update_response(summary);
            Output::new(&response, response.success_message.clone())
        }

        Command::PayFines { card_id } => {
            let amount_paid = state.fine_service.pay_fines(&card_id).await?;
            let success_message = if amount_paid > 0.0 {
                format!("Paid {} for {}", format_amount(amount_paid), card_id.trim())
            } else {
                format!("No payable fines for {}", card_id.trim())
            };
            let response = PayFinesResponse {
                card_id: card_id.trim().to_string(),
                amount_paid,
                success_message,
            };
            Output::new(&response, response.success_message.clone())
        }

        Command::Fines { card_id } => {
            let statement = state.fine_service.fines_for_borrower(&card_id).await?;
            let response = FineMapper::to_statement_response(statement);

            let mut lines = Vec::with_capacity(response.fines.len() + 2);
            for fine in &response.fines {
                let standing = if fine.paid {
                    "paid"
                } else if fine.date_in.is_some() {
                    "payable"
                } else {
                    "accruing"
                };
                lines.push(format!(
                    "loan {:<5} {:<12} {:<32} due {} {:>8} {}",
                    fine.loan_id,
                    fine.isbn,
                    fine.title,
                    fine.due_date,
                    format_amount(fine.fine_amount),
                    standing
                ));
            }
            lines.push(format!(
                "Payable {}  Accruing {}  Paid {}",
                format_amount(response.payable),
                format_amount(response.accruing),
                format_amount(response.paid)
            ));
            Output::new(&response, lines.join("\n"))
        }
    }
}
