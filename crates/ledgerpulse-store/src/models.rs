//! Source record types owned by the ledger and budget stores
//!
//! The engine only reads these; mutation happens behind the store
//! contracts in `lib.rs`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==================== Transactions ====================

/// Transaction type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in (salary, dividends)
    Income,
    /// Money going out (purchases, bills)
    Expense,
    /// Movement between own accounts
    Transfer,
}

impl std::str::FromStr for TransactionType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            "transfer" => Ok(TransactionType::Transfer),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Income => write!(f, "income"),
            TransactionType::Expense => write!(f, "expense"),
            TransactionType::Transfer => write!(f, "transfer"),
        }
    }
}

/// Transaction status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Not yet settled
    Pending,
    /// Settled; immutable from here on
    Completed,
    /// Reversed or voided
    Cancelled,
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            _ => Err(format!("Invalid transaction status: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Completed => write!(f, "completed"),
            TransactionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A single ledger record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique transaction identifier
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Absolute amount, always non-negative; direction comes from the type
    pub amount: Decimal,
    /// Income, expense, or transfer
    pub transaction_type: TransactionType,
    /// Category the record is filed under
    pub category_id: String,
    /// Transaction date
    pub date: NaiveDate,
    /// Settlement status
    pub status: TransactionStatus,
    /// Currency code; absent records fall back to the configured default
    pub currency: Option<String>,
}

impl TransactionRecord {
    /// Check if this record counts toward spending totals
    pub fn is_spending(&self) -> bool {
        self.transaction_type == TransactionType::Expense
    }

    /// Check if this record has settled
    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }

    /// Currency code with fallback to a default
    pub fn currency_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.currency.as_deref().unwrap_or(default)
    }
}

// ==================== Reference data ====================

/// Category reference data used to label aggregates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Ordered ancestry, root first
    pub path: Vec<String>,
    pub color: Option<String>,
}

impl Category {
    /// Full path including this category's own name
    pub fn full_path(&self) -> String {
        if self.path.is_empty() {
            self.name.clone()
        } else {
            format!("{}:{}", self.path.join(":"), self.name)
        }
    }
}

// ==================== Budgets ====================

/// Per-category slice of a budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryAllocation {
    pub category_id: String,
    pub allocated_amount: Decimal,
}

/// A spending policy over a date range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Denominator for utilization math
    pub total_amount: Decimal,
    pub currency: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Percent boundary overriding the default alert trigger; 0 means unset
    #[serde(default)]
    pub alert_threshold: f64,
    /// Sum of allocations <= total_amount is a soft expectation, not enforced
    #[serde(default)]
    pub category_allocations: Vec<CategoryAllocation>,
    /// Archived budgets are excluded from live tracking
    #[serde(default)]
    pub archived: bool,
}

impl Budget {
    /// The budget's own date range
    pub fn period(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Allocation for a specific category, if any
    pub fn allocation_for(&self, category_id: &str) -> Option<&CategoryAllocation> {
        self.category_allocations
            .iter()
            .find(|a| a.category_id == category_id)
    }

    /// Check if a category participates in this budget
    pub fn covers_category(&self, category_id: &str) -> bool {
        self.allocation_for(category_id).is_some()
    }
}

// ==================== Query vocabulary ====================

/// Inclusive date range for store queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Check if a date falls inside the range
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days covered; 0 for an inverted range
    pub fn days(&self) -> i64 {
        if self.end < self.start {
            return 0;
        }
        (self.end - self.start).num_days() + 1
    }

    /// An inverted range matches nothing and yields empty results
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Filter criteria accepted by the ledger store query contract
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Restrict to these categories (None = all)
    pub category_ids: Option<Vec<String>>,
    /// Restrict to these transaction types (None = all)
    pub transaction_types: Option<Vec<TransactionType>>,
    /// Restrict to these statuses (None = all)
    pub statuses: Option<Vec<TransactionStatus>>,
    /// Minimum amount, inclusive
    pub min_amount: Option<Decimal>,
    /// Maximum amount, inclusive
    pub max_amount: Option<Decimal>,
    /// Include pending records; on top of any explicit status filter
    #[serde(default)]
    pub include_pending: bool,
    /// Cap on the number of returned records
    pub limit: Option<usize>,
}

impl TransactionFilter {
    /// Check a record against every criterion except the limit
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        if let Some(ref ids) = self.category_ids {
            if !ids.iter().any(|id| id == &record.category_id) {
                return false;
            }
        }
        if let Some(ref types) = self.transaction_types {
            if !types.contains(&record.transaction_type) {
                return false;
            }
        }
        if let Some(ref statuses) = self.statuses {
            if !statuses.contains(&record.status) {
                return false;
            }
        } else if !self.include_pending && record.status == TransactionStatus::Pending {
            return false;
        }
        if let Some(min) = self.min_amount {
            if record.amount < min {
                return false;
            }
        }
        if let Some(max) = self.max_amount {
            if record.amount > max {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, amount: i64, category: &str) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            user_id: "u-1".to_string(),
            amount: Decimal::from(amount),
            transaction_type: TransactionType::Expense,
            category_id: category.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            status: TransactionStatus::Completed,
            currency: Some("USD".to_string()),
        }
    }

    #[test]
    fn test_transaction_type_from_str() {
        assert_eq!("income".parse::<TransactionType>().unwrap(), TransactionType::Income);
        assert_eq!("expense".parse::<TransactionType>().unwrap(), TransactionType::Expense);
        assert_eq!("transfer".parse::<TransactionType>().unwrap(), TransactionType::Transfer);
        assert!("loan".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_transaction_status_from_str() {
        assert_eq!("pending".parse::<TransactionStatus>().unwrap(), TransactionStatus::Pending);
        assert_eq!("completed".parse::<TransactionStatus>().unwrap(), TransactionStatus::Completed);
        assert_eq!("cancelled".parse::<TransactionStatus>().unwrap(), TransactionStatus::Cancelled);
    }

    #[test]
    fn test_record_currency_fallback() {
        let mut r = record("t-1", 100, "groceries");
        assert_eq!(r.currency_or("EUR"), "USD");
        r.currency = None;
        assert_eq!(r.currency_or("EUR"), "EUR");
    }

    #[test]
    fn test_date_range_days() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        );
        assert_eq!(range.days(), 30);
        assert!(!range.is_empty());
        assert!(range.contains(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()));
    }

    #[test]
    fn test_date_range_inverted_is_empty() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        );
        assert!(range.is_empty());
        assert_eq!(range.days(), 0);
    }

    #[test]
    fn test_filter_category_and_amount() {
        let filter = TransactionFilter {
            category_ids: Some(vec!["groceries".to_string()]),
            min_amount: Some(Decimal::from(50)),
            max_amount: Some(Decimal::from(150)),
            ..Default::default()
        };
        assert!(filter.matches(&record("t-1", 100, "groceries")));
        assert!(!filter.matches(&record("t-2", 100, "rent")));
        assert!(!filter.matches(&record("t-3", 10, "groceries")));
        assert!(!filter.matches(&record("t-4", 200, "groceries")));
    }

    #[test]
    fn test_filter_excludes_pending_by_default() {
        let filter = TransactionFilter::default();
        let mut r = record("t-1", 100, "groceries");
        assert!(filter.matches(&r));
        r.status = TransactionStatus::Pending;
        assert!(!filter.matches(&r));

        let include = TransactionFilter {
            include_pending: true,
            ..Default::default()
        };
        assert!(include.matches(&r));
    }

    #[test]
    fn test_filter_contradictory_bounds_match_nothing() {
        let filter = TransactionFilter {
            min_amount: Some(Decimal::from(500)),
            max_amount: Some(Decimal::from(100)),
            ..Default::default()
        };
        assert!(!filter.matches(&record("t-1", 300, "groceries")));
    }

    #[test]
    fn test_budget_allocation_lookup() {
        let budget = Budget {
            id: "b-1".to_string(),
            user_id: "u-1".to_string(),
            name: "Monthly".to_string(),
            total_amount: Decimal::from(1000),
            currency: "USD".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            alert_threshold: 0.0,
            category_allocations: vec![CategoryAllocation {
                category_id: "groceries".to_string(),
                allocated_amount: Decimal::from(400),
            }],
            archived: false,
        };
        assert!(budget.covers_category("groceries"));
        assert!(!budget.covers_category("rent"));
        assert_eq!(budget.period().days(), 30);
    }

    #[test]
    fn test_category_full_path() {
        let cat = Category {
            id: "c-1".to_string(),
            name: "Coffee".to_string(),
            path: vec!["Expenses".to_string(), "Food".to_string()],
            color: Some("#aa5500".to_string()),
        };
        assert_eq!(cat.full_path(), "Expenses:Food:Coffee");
    }
}
