//! # IO Module
//!
//! Edge of the backend: converts domain results into the `shared` DTOs and
//! exposes the operations on the command line. No business rule lives here.

pub mod cli;
pub mod mappers;
