//! Store contracts for ledgerpulse
//!
//! The engine consumes two read interfaces: a ledger store answering
//! filtered transaction queries and a budget store returning budget
//! definitions. Source records are owned and mutated exclusively by
//! the stores; the engine only reads them.

use async_trait::async_trait;
use std::sync::Arc;

pub mod error;
pub mod memory;
pub mod models;

pub use error::{StoreError, StoreErrorCode, StoreResult};
pub use memory::{MemoryBudgetStore, MemoryLedgerStore};

// Re-export commonly used types
pub use models::{
    Budget, Category, CategoryAllocation, DateRange, TransactionFilter, TransactionRecord,
    TransactionStatus, TransactionType,
};

/// Ledger store reference type
pub type LedgerStoreRef = Arc<dyn LedgerStore>;

/// Budget store reference type
pub type BudgetStoreRef = Arc<dyn BudgetStore>;

/// Read contract over transaction records
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Query transactions for a user within a date range, filtered.
    ///
    /// Results are sorted by date ascending. An inverted range yields an
    /// empty result, not an error. A failed backend call must surface as
    /// `StoreError::Unavailable`, never as an empty result.
    async fn query_transactions(
        &self,
        user_id: &str,
        range: &DateRange,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<TransactionRecord>>;
}

/// Read contract over budget definitions
#[async_trait]
pub trait BudgetStore: Send + Sync {
    /// Fetch a single budget; absent budgets are an error, not a default
    async fn get_budget(&self, user_id: &str, budget_id: &str) -> StoreResult<Budget>;

    /// All non-archived budgets for a user
    async fn list_active_budgets(&self, user_id: &str) -> StoreResult<Vec<Budget>>;
}
