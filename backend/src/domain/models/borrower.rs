//! Domain model for library card holders.

#[derive(Debug, Clone, PartialEq)]
pub struct Borrower {
    pub card_id: String,
    pub ssn: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub password: String,
}

/// Issues card ids of the form `<prefix><zero-padded number>`, e.g. `ID000042`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardIdFormat {
    pub prefix: String,
    pub width: usize,
}

impl Default for CardIdFormat {
    fn default() -> Self {
        Self {
            prefix: "ID".to_string(),
            width: 6,
        }
    }
}

impl CardIdFormat {
    pub fn format(&self, number: i64) -> String {
        format!("{}{:0width$}", self.prefix, number, width = self.width)
    }

    /// Numeric part of a card id issued in this format
    pub fn parse(&self, card_id: &str) -> Option<i64> {
        card_id
            .strip_prefix(&self.prefix)
            .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
            .and_then(|digits| digits.parse().ok())
    }

    /// The id following the highest number issued so far (1 when none).
    /// `None` once the numeric part cannot grow any further.
    pub fn next_after(&self, max_issued: Option<i64>) -> Option<String> {
        let next = max_issued.unwrap_or(0).checked_add(1)?;
        Some(self.format(next))
    }
}
