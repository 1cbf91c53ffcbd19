//! Clock abstraction and calendar helpers
//!
//! Days-remaining and trend math depend on "now"; injecting the clock
//! keeps evaluations reproducible under test.

use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use ledgerpulse_store::DateRange;

/// Clock reference type
pub type ClockRef = Arc<dyn Clock>;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Frozen clock for deterministic evaluation
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Frozen at midnight UTC of the given date
    pub fn at(date: NaiveDate) -> Self {
        Self {
            now: date.and_hms_opt(0, 0, 0).expect("valid midnight").and_utc(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

// ==================== Calendar helpers ====================

/// Month key in YYYY-MM form
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Every calendar month touched by the range, in order, as YYYY-MM keys.
/// Empty for an inverted range.
pub fn months_in_range(range: &DateRange) -> Vec<String> {
    if range.is_empty() {
        return Vec::new();
    }
    let mut months = Vec::new();
    let mut year = range.start.year();
    let mut month = range.start.month();
    loop {
        months.push(format!("{:04}-{:02}", year, month));
        if year == range.end.year() && month == range.end.month() {
            break;
        }
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }
    months
}
