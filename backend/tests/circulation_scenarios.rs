//! End-to-end circulation scenarios against a file-backed store seeded from CSV.

use chrono::NaiveDate;
use shared::BookStatus;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use library_circulation::domain::commands::borrower::CreateBorrowerCommand;
use library_circulation::domain::commands::circulation::CheckinCommand;
use library_circulation::domain::models::CardIdFormat;
use library_circulation::domain::{CirculationPolicy, ErrorKind, LibraryError, ManualClock};
use library_circulation::storage::bootstrap::{self, ImportOutcome};
use library_circulation::storage::connection::Table;
use library_circulation::storage::DbConnection;
use library_circulation::AppState;

fn date(iso: &str) -> NaiveDate {
    NaiveDate::parse_from_str(iso, "%Y-%m-%d").unwrap()
}

struct Library {
    temp_dir: TempDir,
    clock: Arc<ManualClock>,
    state: AppState,
}

impl Library {
    async fn open() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let seed_dir = temp_dir.path().join("data");
        fs::create_dir(&seed_dir).unwrap();
        fs::write(
            seed_dir.join("book.csv"),
            "Isbn,Title\n\
             0441013597,Dune\n\
             0261103571,The Fellowship of the Ring\n\
             0618640150,The Lord of the Rings\n\
             0201633612,Design Patterns\n\
             0307474275,The Road\n",
        )
        .unwrap();
        fs::write(
            seed_dir.join("authors.csv"),
            "Author_id,Name\n1,Frank Herbert\n2,J.R.R. Tolkien\n3,Erich Gamma\n4,Richard Helm\n5,Cormac McCarthy\n",
        )
        .unwrap();
        fs::write(
            seed_dir.join("book_authors.csv"),
            "Isbn,Author_id\n0441013597,1\n0261103571,2\n0618640150,2\n0201633612,3\n0201633612,4\n0307474275,5\n",
        )
        .unwrap();
        fs::write(
            seed_dir.join("borrower.csv"),
            "Card_id,Ssn,Bname,Address,Phone\n\
             ID000001,111-22-3333,Ann Smith,1 Library Way,555-0001\n\
             ID000002,222-33-4444,Bob Jones,2 Library Way,555-0002\n",
        )
        .unwrap();

        let db = DbConnection::open(&temp_dir.path().join("library.db")).await.unwrap();
        let report = bootstrap::import_seed_data(&db, &seed_dir).await.unwrap();
        assert_eq!(report.outcome(Table::Books), Some(ImportOutcome::Imported(5)));

        let clock = Arc::new(ManualClock::new(date("2024-12-27")));
        let state = AppState::new(db, clock.clone(), CirculationPolicy::default(), CardIdFormat::default());

        Self {
            temp_dir,
            clock,
            state,
        }
    }

    async fn status(&self, isbn: &str) -> BookStatus {
        let results = self.state.catalog_service.search_books(isbn).await.unwrap();
        results.into_iter().find(|b| b.isbn == isbn).unwrap().status
    }

    async fn checkout(&self, isbn: &str, card_id: &str) -> Result<i64, LibraryError> {
        self.state
            .circulation_service
            .checkout_book(isbn, card_id)
            .await
            .map(|loan| loan.loan_id)
    }

    async fn checkin(&self, query: &str, selections: &[usize]) -> Result<Vec<i64>, LibraryError> {
        self.state
            .circulation_service
            .checkin_book(CheckinCommand {
                query: query.to_string(),
                selections: selections.to_vec(),
            })
            .await
    }
}

#[tokio::test]
async fn checkout_flips_status_and_blocks_second_checkout() {
    let lib = Library::open().await;
    assert_eq!(lib.status("0441013597").await, BookStatus::In);

    lib.checkout("0441013597", "ID000001").await.unwrap();
    assert_eq!(lib.status("0441013597").await, BookStatus::Out);

    let err = lib.checkout("0441013597", "ID000002").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BookUnavailable);
}

#[tokio::test]
async fn fourth_loan_allowed_after_one_is_returned() {
    let lib = Library::open().await;
    for isbn in ["0441013597", "0261103571", "0618640150"] {
        lib.checkout(isbn, "ID000001").await.unwrap();
    }

    let err = lib.checkout("0201633612", "ID000001").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LoanLimitReached);

    lib.checkin("0261103571", &[1]).await.unwrap();
    lib.checkout("0201633612", "ID000001").await.unwrap();
}

#[tokio::test]
async fn fine_on_returned_loan_blocks_checkout_until_paid() {
    let lib = Library::open().await;
    lib.checkout("0441013597", "ID000001").await.unwrap();

    // Due 2025-01-10, back five days late
    lib.clock.set(date("2025-01-15"));
    lib.checkin("ID000001", &[1]).await.unwrap();

    for isbn in ["0441013597", "0307474275"] {
        let err = lib.checkout(isbn, "ID000001").await.unwrap_err();
        assert!(matches!(err, LibraryError::UnpaidFines { amount } if amount == 1.25));
    }

    assert_eq!(lib.state.fine_service.pay_fines("ID000001").await.unwrap(), 1.25);
    lib.checkout("0307474275", "ID000001").await.unwrap();
}

#[tokio::test]
async fn update_fines_twice_gives_identical_rows() {
    let lib = Library::open().await;
    lib.checkout("0441013597", "ID000001").await.unwrap();
    lib.checkout("0261103571", "ID000002").await.unwrap();
    lib.clock.set(date("2025-01-13"));
    lib.checkin("0441013597", &[1]).await.unwrap();
    lib.clock.set(date("2025-01-20"));

    lib.state.fine_service.update_fines().await.unwrap();
    let ann = lib.state.fine_service.fines_for_borrower("ID000001").await.unwrap();
    let bob = lib.state.fine_service.fines_for_borrower("ID000002").await.unwrap();

    let summary = lib.state.fine_service.update_fines().await.unwrap();
    assert_eq!(summary.created + summary.updated, 0);
    assert_eq!(lib.state.fine_service.fines_for_borrower("ID000001").await.unwrap(), ann);
    assert_eq!(lib.state.fine_service.fines_for_borrower("ID000002").await.unwrap(), bob);

    // Returned 3 days late; still out 10 days past due
    assert_eq!(ann.payable, 0.75);
    assert_eq!(bob.accruing, 2.5);
}

#[tokio::test]
async fn pay_fines_ignores_outstanding_loans_and_paid_fines() {
    let lib = Library::open().await;
    lib.checkout("0441013597", "ID000001").await.unwrap();
    lib.checkout("0261103571", "ID000001").await.unwrap();
    lib.clock.set(date("2025-01-12"));
    lib.checkin("0441013597", &[1]).await.unwrap();

    // 2 days late on the returned loan, 2 days accruing on the other
    assert_eq!(lib.state.fine_service.pay_fines("ID000001").await.unwrap(), 0.5);
    assert_eq!(lib.state.fine_service.pay_fines("ID000001").await.unwrap(), 0.0);

    let statement = lib.state.fine_service.fines_for_borrower("ID000001").await.unwrap();
    assert_eq!(statement.paid, 0.5);
    assert_eq!(statement.accruing, 0.5);
    assert_eq!(statement.payable, 0.0);
}

#[tokio::test]
async fn fine_example_due_jan_10_returned_jan_15() {
    let lib = Library::open().await;
    let loan_id = lib.checkout("0201633612", "ID000002").await.unwrap();

    lib.clock.set(date("2025-01-15"));
    assert_eq!(lib.checkin("ID000002", &[1]).await.unwrap(), vec![loan_id]);

    let statement = lib.state.fine_service.fines_for_borrower("ID000002").await.unwrap();
    assert_eq!(statement.fines.len(), 1);
    assert_eq!(statement.fines[0].due_date, date("2025-01-10"));
    assert_eq!(statement.fines[0].date_in, Some(date("2025-01-15")));
    assert_eq!(statement.fines[0].fine_amount, 1.25);
}

#[tokio::test]
async fn too_many_selections_changes_nothing() {
    let lib = Library::open().await;
    for isbn in ["0441013597", "0261103571", "0618640150"] {
        lib.checkout(isbn, "ID000001").await.unwrap();
    }

    let err = lib.checkin("ID000001", &[1, 2, 3, 4]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TooManySelections);

    let still_out = lib.state.circulation_service.find_loans_for_checkin("ID000001").await.unwrap();
    assert_eq!(still_out.len(), 3);
}

#[tokio::test]
async fn duplicate_ssn_keeps_first_card_id() {
    let lib = Library::open().await;
    let command = CreateBorrowerCommand {
        ssn: "999-88-7777".to_string(),
        name: "Dana Reyes".to_string(),
        address: "3 Library Way".to_string(),
        phone: "555-0003".to_string(),
        password: "pw".to_string(),
    };

    let card_id = lib.state.borrower_service.create_borrower(command.clone()).await.unwrap();
    assert_eq!(card_id, "ID000003");

    let err = lib.state.borrower_service.create_borrower(command).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateSsn);

    let borrower = lib.state.borrower_service.get_borrower(&card_id).await.unwrap().unwrap();
    assert_eq!(borrower.name, "Dana Reyes");
    lib.checkout("0441013597", &card_id).await.unwrap();
}

/// A fine on a book that is still out blocks checkout, yet cannot be paid
/// until the book is returned.
#[tokio::test]
async fn unpaid_fine_on_outstanding_loan_blocks_but_is_not_payable() {
    let lib = Library::open().await;
    lib.checkout("0441013597", "ID000001").await.unwrap();

    lib.clock.set(date("2025-01-14"));
    lib.state.fine_service.update_fines().await.unwrap();

    let err = lib.checkout("0307474275", "ID000001").await.unwrap_err();
    assert!(matches!(err, LibraryError::UnpaidFines { amount } if amount == 1.0));
    assert_eq!(lib.state.fine_service.pay_fines("ID000001").await.unwrap(), 0.0);

    let err = lib.checkout("0307474275", "ID000001").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnpaidFines);

    // Returning the book makes the fine payable and lifts the hold once paid
    lib.checkin("0441013597", &[1]).await.unwrap();
    assert_eq!(lib.state.fine_service.pay_fines("ID000001").await.unwrap(), 1.0);
    lib.checkout("0307474275", "ID000001").await.unwrap();
}

#[tokio::test]
async fn login_with_seeded_password() {
    let lib = Library::open().await;
    let borrower = lib.state.borrower_service.authenticate("ID000002", "4444").await.unwrap();
    assert_eq!(borrower.map(|b| b.card_id), Some("ID000002".to_string()));
    assert!(lib
        .state
        .borrower_service
        .authenticate("ID000002", "3333")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn rerunning_bootstrap_imports_nothing() {
    let lib = Library::open().await;
    let seed_dir = lib.temp_dir.path().join("data");
    let report = bootstrap::import_seed_data(&lib.state.db, &seed_dir).await.unwrap();
    assert_eq!(report.total_imported(), 0);
    assert_eq!(lib.state.db.count_rows(Table::Borrowers).await.unwrap(), 2);
}
