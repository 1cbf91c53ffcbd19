//! In-memory store implementations
//!
//! Reference backends for tests and the bundled binary. Production
//! deployments substitute their own `LedgerStore`/`BudgetStore`.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::models::{Budget, DateRange, TransactionFilter, TransactionRecord};
use crate::{BudgetStore, LedgerStore};

/// Ledger store backed by an in-memory vector
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    records: RwLock<Vec<TransactionRecord>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with records
    pub fn with_records(records: Vec<TransactionRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Append a record
    pub fn insert(&self, record: TransactionRecord) {
        self.records.write().unwrap().push(record);
    }

    /// Replace all records at once
    pub fn replace_all(&self, records: Vec<TransactionRecord>) {
        *self.records.write().unwrap() = records;
    }

    /// Total record count, unfiltered
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn query_transactions(
        &self,
        user_id: &str,
        range: &DateRange,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<TransactionRecord>> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let records = self.records.read().unwrap();
        let mut matched: Vec<TransactionRecord> = records
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter(|r| range.contains(r.date))
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();

        // Sorted by date ascending, as the query contract promises
        matched.sort_by(|a, b| a.date.cmp(&b.date));

        if let Some(limit) = filter.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }
}

/// Budget store backed by an in-memory vector
#[derive(Debug, Default)]
pub struct MemoryBudgetStore {
    budgets: RwLock<Vec<Budget>>,
}

impl MemoryBudgetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with budgets
    pub fn with_budgets(budgets: Vec<Budget>) -> Self {
        Self {
            budgets: RwLock::new(budgets),
        }
    }

    /// Insert or replace a budget by id
    pub fn upsert(&self, budget: Budget) {
        let mut budgets = self.budgets.write().unwrap();
        if let Some(existing) = budgets.iter_mut().find(|b| b.id == budget.id) {
            *existing = budget;
        } else {
            budgets.push(budget);
        }
    }

    /// Mark a budget archived so live tracking skips it
    pub fn archive(&self, budget_id: &str) -> bool {
        let mut budgets = self.budgets.write().unwrap();
        match budgets.iter_mut().find(|b| b.id == budget_id) {
            Some(budget) => {
                budget.archived = true;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl BudgetStore for MemoryBudgetStore {
    async fn get_budget(&self, user_id: &str, budget_id: &str) -> StoreResult<Budget> {
        let budgets = self.budgets.read().unwrap();
        budgets
            .iter()
            .find(|b| b.user_id == user_id && b.id == budget_id)
            .cloned()
            .ok_or_else(|| StoreError::BudgetNotFound {
                id: budget_id.to_string(),
            })
    }

    async fn list_active_budgets(&self, user_id: &str) -> StoreResult<Vec<Budget>> {
        let budgets = self.budgets.read().unwrap();
        Ok(budgets
            .iter()
            .filter(|b| b.user_id == user_id && !b.archived)
            .cloned()
            .collect())
    }
}
