//! # Library circulation backend
//!
//! Core of a small library's circulation desk:
//! - **Domain**: borrower registry, catalog search, circulation and fines rules
//! - **Storage**: SQLite persistence and the CSV seed import
//! - **IO**: mapping to the `shared` DTOs and the command-line front end
//!
//! ```text
//! IO Layer (CLI, mappers)
//!     ↓
//! Domain Layer (services, rules)
//!     ↓
//! Storage Layer (SQLite)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_utils;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::LibraryConfig;
use crate::domain::models::CardIdFormat;
use crate::domain::{
    BorrowerService, CatalogService, CirculationPolicy, CirculationService, Clock, FineService,
    SystemClock,
};
use crate::storage::DbConnection;

/// Main application state that holds all services
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: DbConnection,
    pub borrower_service: BorrowerService,
    pub catalog_service: CatalogService,
    pub circulation_service: CirculationService,
    pub fine_service: FineService,
}

impl AppState {
    /// Wire every service onto one store, clock and policy
    pub fn new(
        db: DbConnection,
        clock: Arc<dyn Clock>,
        policy: CirculationPolicy,
        card_format: CardIdFormat,
    ) -> Self {
        let fine_service = FineService::new(db.clone(), clock.clone(), policy.clone());
        let circulation_service =
            CirculationService::new(db.clone(), fine_service.clone(), clock, policy);

        Self {
            borrower_service: BorrowerService::new(db.clone(), card_format),
            catalog_service: CatalogService::new(db.clone()),
            circulation_service,
            fine_service,
            db,
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &LibraryConfig) -> Result<AppState> {
    info!("Setting up database");
    let db = DbConnection::open(&config.database_path).await?;

    info!("Setting up domain model");
    let state = AppState::new(
        db,
        Arc::new(SystemClock),
        config.policy.clone(),
        config.card_id_format(),
    );

    Ok(state)
}
