//! Derived report structures
//!
//! Value objects produced by the analyzer and evaluator. Never
//! persisted; lifetime is one query, or until cache eviction.

use chrono::NaiveDate;
use ledgerpulse_store::DateRange;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::{BudgetStatus, PeriodDelta};

// ==================== Spending analysis ====================

/// Per-category spending rollup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpending {
    pub category_id: String,
    /// Resolved label; falls back to the raw id for unknown categories
    pub category_name: String,
    pub total_amount: Decimal,
    pub transaction_count: usize,
    pub average_amount: Decimal,
    pub percentage_of_total: f64,
}

/// Spending on a single calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySpending {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub transaction_count: usize,
}

/// Spending and income in a single calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySpending {
    /// YYYY-MM key
    pub month: String,
    pub amount: Decimal,
    pub income: Decimal,
    pub transaction_count: usize,
}

/// Month-over-month trend delta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendDelta {
    /// The later of the two compared months, YYYY-MM
    pub month: String,
    pub change: Decimal,
    pub percentage_change: f64,
}

impl TrendDelta {
    pub fn from_delta(month: String, delta: PeriodDelta) -> Self {
        Self {
            month,
            change: delta.change,
            percentage_change: delta.percentage_change,
        }
    }
}

/// Full spending-analysis report over a filtered record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingAnalysis {
    pub period: DateRange,
    pub total_spent: Decimal,
    pub total_income: Decimal,
    pub net_amount: Decimal,
    pub transaction_count: usize,
    /// Normalized by calendar days in the period, not days with records
    pub average_daily_spending: Decimal,
    /// Normalized by calendar months in the period
    pub average_monthly_spending: Decimal,
    pub spending_by_category: Vec<CategorySpending>,
    pub spending_by_day: Vec<DailySpending>,
    pub spending_by_month: Vec<MonthlySpending>,
    pub top_spending_days: Vec<DailySpending>,
    pub monthly_trends: Vec<TrendDelta>,
}

impl SpendingAnalysis {
    /// All-zero analysis for an empty record set or inverted range
    pub fn empty(period: DateRange) -> Self {
        Self {
            period,
            total_spent: Decimal::ZERO,
            total_income: Decimal::ZERO,
            net_amount: Decimal::ZERO,
            transaction_count: 0,
            average_daily_spending: Decimal::ZERO,
            average_monthly_spending: Decimal::ZERO,
            spending_by_category: Vec::new(),
            spending_by_day: Vec::new(),
            spending_by_month: Vec::new(),
            top_spending_days: Vec::new(),
            monthly_trends: Vec::new(),
        }
    }
}

// ==================== Budget analytics ====================

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Warning,
    Critical,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::Warning => write!(f, "warning"),
            AlertKind::Critical => write!(f, "critical"),
        }
    }
}

/// Threshold alert raised by a budget evaluation.
///
/// Generation is stateless per evaluation; the id is the deterministic
/// composite `kind:budget_id[:category_id]` so the tracker can
/// deduplicate across refresh cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAlert {
    pub id: String,
    pub kind: AlertKind,
    pub budget_id: String,
    /// None for the budget-level alert
    pub category_id: Option<String>,
    pub message: String,
    /// Utilization percentage that triggered the alert
    pub current_value: f64,
    /// Boundary that was crossed
    pub threshold_value: f64,
}

impl BudgetAlert {
    /// Stable identity from kind and the entity concerned
    pub fn compose_id(kind: AlertKind, budget_id: &str, category_id: Option<&str>) -> String {
        match category_id {
            Some(category) => format!("{}:{}:{}", kind, budget_id, category),
            None => format!("{}:{}", kind, budget_id),
        }
    }
}

/// Per-category utilization within a budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBudgetBreakdown {
    pub category_id: String,
    pub allocated_amount: Decimal,
    pub spent_amount: Decimal,
    pub remaining_amount: Decimal,
    pub utilization_percent: f64,
    pub status: BudgetStatus,
}

/// One point of the cumulative daily progress curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyProgressPoint {
    pub date: NaiveDate,
    pub cumulative_spent: Decimal,
    /// Linear share of the budget through this day
    pub allocated_to_date: Decimal,
}

/// Per-budget utilization snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAnalytics {
    pub budget_id: String,
    pub budget_name: String,
    pub currency: String,
    pub period: DateRange,
    pub total_allocated: Decimal,
    pub total_spent: Decimal,
    pub remaining_amount: Decimal,
    pub utilization_percent: f64,
    pub status: BudgetStatus,
    pub categories: Vec<CategoryBudgetBreakdown>,
    pub daily_progress: Vec<DailyProgressPoint>,
    pub days_elapsed: i64,
    pub days_remaining: i64,
    /// Straight-line projection of total spend at the current pace
    pub projected_spend: Decimal,
    pub alerts: Vec<BudgetAlert>,
}
