//! Core analytics computation for ledgerpulse
//!
//! Aggregation primitives, the spending analyzer, and the budget
//! evaluator: synchronous, side-effect-free functions over immutable
//! inputs. No shared mutable state, no locking, no I/O; stores and
//! caching live in the surrounding crates.

pub mod aggregate;
pub mod analysis;
pub mod budget;
pub mod error;
pub mod reports;
pub mod time;

pub use error::{CoreError, CoreErrorCode, CoreResult};

// Re-export commonly used types
pub use aggregate::{
    bucket_status, group_sum, percentage_of, period_delta, progress_state, BudgetStatus,
    GroupAggregate, PeriodDelta, ProgressState,
};
pub use analysis::SpendingAnalyzer;
pub use budget::{AllocationCurve, BudgetEvaluator, LinearAllocation};
pub use reports::{
    AlertKind, BudgetAlert, BudgetAnalytics, CategoryBudgetBreakdown, CategorySpending,
    DailyProgressPoint, DailySpending, MonthlySpending, SpendingAnalysis, TrendDelta,
};
pub use time::{Clock, ClockRef, FixedClock, SystemClock};
