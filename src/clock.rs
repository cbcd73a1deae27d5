//! Source of "today" for date-sensitive rules

use chrono::{Local, NaiveDate};

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the server
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to one date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
