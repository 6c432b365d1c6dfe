//! Failure values returned by the circulation operations.
//!
//! Every rejected operation reports exactly one of these and leaves the store
//! untouched; the caller decides how to present it.

/// Coarse category of a [`LibraryError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingField,
    DuplicateSsn,
    CardIdsExhausted,
    BorrowerNotFound,
    UnpaidFines,
    LoanLimitReached,
    BookNotFound,
    BookUnavailable,
    NoMatch,
    NoSelections,
    TooManySelections,
    SelectionOutOfRange,
    Storage,
}

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("A borrower with this SSN already exists")]
    DuplicateSsn,
    #[error("No further card IDs can be issued")]
    CardIdsExhausted,
    #[error("Borrower does not exist")]
    BorrowerNotFound,
    #[error("Borrower has fines due (${amount:.2})")]
    UnpaidFines { amount: f64 },
    #[error("Borrower has reached the maximum of {limit} outstanding loans")]
    LoanLimitReached { limit: u32 },
    #[error("Book does not exist")]
    BookNotFound,
    #[error("Book has been checked out")]
    BookUnavailable,
    #[error("No active loans match this search")]
    NoMatch,
    #[error("No selections provided")]
    NoSelections,
    #[error("Cannot check in more than {max} books at once")]
    TooManySelections { max: usize },
    #[error("Selection {position} is out of range (1..={available})")]
    SelectionOutOfRange { position: usize, available: usize },
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl LibraryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LibraryError::MissingField(_) => ErrorKind::MissingField,
            LibraryError::DuplicateSsn => ErrorKind::DuplicateSsn,
            LibraryError::CardIdsExhausted => ErrorKind::CardIdsExhausted,
            LibraryError::BorrowerNotFound => ErrorKind::BorrowerNotFound,
            LibraryError::UnpaidFines { .. } => ErrorKind::UnpaidFines,
            LibraryError::LoanLimitReached { .. } => ErrorKind::LoanLimitReached,
            LibraryError::BookNotFound => ErrorKind::BookNotFound,
            LibraryError::BookUnavailable => ErrorKind::BookUnavailable,
            LibraryError::NoMatch => ErrorKind::NoMatch,
            LibraryError::NoSelections => ErrorKind::NoSelections,
            LibraryError::TooManySelections { .. } => ErrorKind::TooManySelections,
            LibraryError::SelectionOutOfRange { .. } => ErrorKind::SelectionOutOfRange,
            LibraryError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Rejections the caller can fix by changing its input or paying up
    pub fn is_business_rule(&self) -> bool {
        !matches!(self, LibraryError::Storage(_))
    }
}

pub type LibraryResult<T> = Result<T, LibraryError>;
