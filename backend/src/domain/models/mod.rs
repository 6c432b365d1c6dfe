//! Domain models for the circulation manager.
//!
//! These types are internal to the backend. The io layer maps them to the
//! DTOs defined in the `shared` crate.

pub mod book;
pub mod borrower;
pub mod fine;
pub mod loan;

pub use book::*;
pub use borrower::*;
pub use fine::*;
pub use loan::*;
