//! Persistence for the circulation manager: the SQLite handle, the
//! repositories that run inside service transactions, the CSV seed import and
//! the normalizer that produces its input files.

pub mod bootstrap;
pub mod connection;
pub mod normalize;
pub mod repositories;

pub use connection::DbConnection;
