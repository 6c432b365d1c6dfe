//! Domain-level command and result types.
//! These structs are used by services inside the domain layer and are **not**
//! exposed to callers directly. The io layer maps the public DTOs defined in
//! the `shared` crate to these internal types.

pub mod borrower {
    /// Input for registering a new borrower. Fields are trimmed by the service.
    #[derive(Debug, Clone, Default)]
    pub struct CreateBorrowerCommand {
        pub ssn: String,
        pub name: String,
        pub address: String,
        pub phone: String,
        pub password: String,
    }
}

pub mod circulation {
    /// Input for checking in loans picked from a check-in search.
    #[derive(Debug, Clone)]
    pub struct CheckinCommand {
        pub query: String,
        /// 1-based positions into the search result
        pub selections: Vec<usize>,
    }
}

pub mod fines {
    /// What one fine recomputation pass did.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct FineUpdateSummary {
        /// New unpaid fine rows
        pub created: usize,
        /// Unpaid fines whose amount changed
        pub updated: usize,
        /// Late loans whose fine was already current or already paid
        pub unchanged: usize,
    }
}
