//! Circulation limits and rates.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CirculationPolicy {
    /// Days between checkout and due date
    pub loan_period_days: i64,
    /// Outstanding loans a borrower may hold at once
    pub max_outstanding_loans: u32,
    /// Loans that can be handed in by one check-in
    pub max_checkin_selections: usize,
    /// Dollars charged per whole day late
    pub daily_fine_rate: f64,
}

impl Default for CirculationPolicy {
    fn default() -> Self {
        Self {
            loan_period_days: 14,
            max_outstanding_loans: 3,
            max_checkin_selections: 3,
            daily_fine_rate: 0.25,
        }
    }
}
