//! # Domain Module
//!
//! Business rules of the circulation manager: borrower registration, catalog
//! search, checkout and check-in, and overdue fines. Services own one store
//! transaction per operation and report failures as [`LibraryError`].

pub mod borrower_service;
pub mod catalog_service;
pub mod circulation_service;
pub mod clock;
pub mod commands;
pub mod errors;
pub mod fine_service;
pub mod models;
pub mod policy;

pub use borrower_service::BorrowerService;
pub use catalog_service::CatalogService;
pub use circulation_service::CirculationService;
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{ErrorKind, LibraryError, LibraryResult};
pub use fine_service::FineService;
pub use policy::CirculationPolicy;
