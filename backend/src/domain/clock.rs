//! Source of "today" for loan and fine dates.

use chrono::{Duration, Local, NaiveDate};
use std::fmt::Debug;
use std::sync::Mutex;

pub trait Clock: Send + Sync + Debug {
    fn today(&self) -> NaiveDate;
}

/// The local calendar date of the machine
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    today: Mutex<NaiveDate>,
}

impl ManualClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        *self.today.lock().unwrap_or_else(|e| e.into_inner()) = date;
    }

    pub fn advance_days(&self, days: i64) {
        let mut today = self.today.lock().unwrap_or_else(|e| e.into_inner());
        *today += Duration::days(days);
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_moves_only_when_told() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.today(), start);

        clock.advance_days(14);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());

        clock.set(start);
        assert_eq!(clock.today(), start);
    }
}
