//! Renewal date validation
//!
//! A proposed due-back date is accepted when it lies in
//! `[today, today + max_weeks]`, both ends included.

use chrono::{Duration, NaiveDate};
use config::ConfigError;
use thiserror::Error;

use crate::config::LoansConfig;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalError {
    #[error("renewal date cannot be in the past")]
    PastDate,

    #[error("renewal date cannot exceed {weeks} weeks from today")]
    TooFarAhead { weeks: u32 },
}

/// Longest renewal window accepted from configuration
pub const MAX_RENEWAL_WEEKS: u32 = 52;

/// Window a librarian may extend a loan into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewalPolicy {
    max_weeks: u32,
    default_weeks: u32,
}

impl Default for RenewalPolicy {
    fn default() -> Self {
        Self {
            max_weeks: 4,
            default_weeks: 3,
        }
    }
}

impl RenewalPolicy {
    pub fn new(max_weeks: u32, default_weeks: u32) -> Result<Self, ConfigError> {
        if max_weeks > MAX_RENEWAL_WEEKS {
            return Err(ConfigError::Message(format!(
                "loans.renewal_max_weeks ({}) exceeds {} weeks",
                max_weeks, MAX_RENEWAL_WEEKS
            )));
        }
        if default_weeks > max_weeks {
            return Err(ConfigError::Message(format!(
                "loans.renewal_default_weeks ({}) exceeds loans.renewal_max_weeks ({})",
                default_weeks, max_weeks
            )));
        }
        Ok(Self {
            max_weeks,
            default_weeks,
        })
    }

    pub fn max_weeks(&self) -> u32 {
        self.max_weeks
    }

    /// Latest date a renewal may set
    pub fn latest_due_back(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_add_signed(Duration::weeks(self.max_weeks as i64))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Value pre-filled in the renewal form; any date in the window is accepted
    pub fn suggested_due_back(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_add_signed(Duration::weeks(self.default_weeks as i64))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Returns `proposed` unchanged when it lies in the window
    pub fn validate_due_back(
        &self,
        proposed: NaiveDate,
        today: NaiveDate,
    ) -> Result<NaiveDate, RenewalError> {
        if proposed < today {
            return Err(RenewalError::PastDate);
        }
        if proposed > self.latest_due_back(today) {
            return Err(RenewalError::TooFarAhead {
                weeks: self.max_weeks,
            });
        }
        Ok(proposed)
    }
}

impl TryFrom<&LoansConfig> for RenewalPolicy {
    type Error = ConfigError;

    fn try_from(config: &LoansConfig) -> Result<Self, Self::Error> {
        Self::new(config.renewal_max_weeks, config.renewal_default_weeks)
    }
}

/// Validate against the default four week window
pub fn validate_due_back(proposed: NaiveDate, today: NaiveDate) -> Result<NaiveDate, RenewalError> {
    RenewalPolicy::default().validate_due_back(proposed, today)
}
