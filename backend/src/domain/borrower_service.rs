//! Borrower registry: registration, login and lookup of card holders.

use tracing::{info, warn};

use crate::domain::commands::borrower::CreateBorrowerCommand;
use crate::domain::errors::{LibraryError, LibraryResult};
use crate::domain::models::{Borrower, CardIdFormat};
use crate::storage::repositories::BorrowerRepository;
use crate::storage::DbConnection;

#[derive(Clone, Debug)]
pub struct BorrowerService {
    db: DbConnection,
    borrowers: BorrowerRepository,
    card_format: CardIdFormat,
}

impl BorrowerService {
    pub fn new(db: DbConnection, card_format: CardIdFormat) -> Self {
        Self {
            db,
            borrowers: BorrowerRepository::new(),
            card_format,
        }
    }

    /// Register a new borrower and return the card id issued to them
    pub async fn create_borrower(&self, command: CreateBorrowerCommand) -> LibraryResult<String> {
        let ssn = required("ssn", &command.ssn)?;
        let name = required("name", &command.name)?;
        let address = required("address", &command.address)?;
        let phone = required("phone", &command.phone)?;
        let password = required("password", &command.password)?;

        let mut tx = self.db.pool().begin().await?;

        if self.borrowers.ssn_exists(&mut tx, &ssn).await? {
            warn!("Rejected registration for {}: SSN already on file", name);
            return Err(LibraryError::DuplicateSsn);
        }

        let max_issued = self.borrowers.max_card_number(&mut tx, &self.card_format).await?;
        let card_id = match self.card_format.next_after(max_issued) {
            Some(card_id) => card_id,
            None => {
                warn!("Rejected registration for {}: card numbers exhausted", name);
                return Err(LibraryError::CardIdsExhausted);
            }
        };

        let borrower = Borrower {
            card_id: card_id.clone(),
            ssn,
            name,
            address,
            phone,
            password,
        };
        self.borrowers.insert_borrower(&mut tx, &borrower).await?;
        tx.commit().await?;

        info!("Registered borrower {} with card {}", borrower.name, card_id);
        Ok(card_id)
    }

    /// Check a card id / password pair. `None` means the login is refused.
    pub async fn authenticate(&self, card_id: &str, password: &str) -> LibraryResult<Option<Borrower>> {
        let card_id = card_id.trim();
        let password = password.trim();
        if card_id.is_empty() || password.is_empty() {
            return Ok(None);
        }

        let borrower = self.get_borrower(card_id).await?;
        match borrower {
            Some(borrower) if borrower.password == password => {
                info!("Borrower {} logged in", card_id);
                Ok(Some(borrower))
            }
            _ => {
                warn!("Failed login for card {}", card_id);
                Ok(None)
            }
        }
    }

    pub async fn get_borrower(&self, card_id: &str) -> LibraryResult<Option<Borrower>> {
        let mut conn = self.db.pool().acquire().await?;
        Ok(self.borrowers.get_borrower(&mut conn, card_id.trim()).await?)
    }
}

fn required(field: &'static str, value: &str) -> LibraryResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LibraryError::MissingField(field));
    }
    Ok(value.to_string())
}
