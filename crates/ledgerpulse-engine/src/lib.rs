//! Analytics engine for ledgerpulse
//!
//! The stateful layer over the pure core: a derived-result cache, the
//! real-time progress tracker, and the `AnalyticsEngine` facade that
//! consumers call. The cache wraps analyzer and evaluator calls
//! transparently; a data-changed signal bumps the cache generation and
//! forces an out-of-band tracker refresh.

pub mod cache;
pub mod error;
pub mod tracker;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ledgerpulse_config::Config;
use ledgerpulse_core::{
    BudgetAnalytics, BudgetEvaluator, ClockRef, SpendingAnalysis, SpendingAnalyzer,
};
use ledgerpulse_store::{
    BudgetStoreRef, Category, DateRange, LedgerStoreRef, TransactionFilter,
};
use serde::{Deserialize, Serialize};

pub use cache::{short_hash, CacheStats, DerivedCache};
pub use error::{EngineError, EngineErrorCode, EngineResult};
pub use tracker::{
    ActiveAlert, BudgetProgress, BudgetProgressSnapshot, CategoryTrend, CurrencyRollup,
    GlobalTotals, ProgressTracker, TrendDirection,
};

/// A spending-analysis request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendingQuery {
    pub range: DateRange,
    pub filter: TransactionFilter,
}

/// Consumer-facing engine: wires stores, analyzer, evaluator, cache,
/// and tracker for one user context.
///
/// Constructed fully at startup; there is no lazy self-healing
/// initialization. Misconfiguration fails fast in `Config::validate`.
pub struct AnalyticsEngine {
    config: Config,
    user_id: String,
    ledger: LedgerStoreRef,
    budget_store: BudgetStoreRef,
    categories: Vec<Category>,
    analyzer: SpendingAnalyzer,
    evaluator: BudgetEvaluator,
    cache: Arc<DerivedCache>,
    tracker: Arc<ProgressTracker>,
    /// Cache generation; bumped on every data-changed signal
    data_version: AtomicU64,
}

impl AnalyticsEngine {
    pub fn new(
        config: Config,
        user_id: impl Into<String>,
        ledger: LedgerStoreRef,
        budget_store: BudgetStoreRef,
        categories: Vec<Category>,
        clock: ClockRef,
    ) -> Self {
        let user_id = user_id.into();
        let tracker = Arc::new(ProgressTracker::new(
            &config,
            user_id.clone(),
            Arc::clone(&ledger),
            Arc::clone(&budget_store),
            Arc::clone(&clock),
        ));
        Self {
            analyzer: SpendingAnalyzer::new(&config),
            evaluator: BudgetEvaluator::new(&config, clock),
            cache: Arc::new(DerivedCache::new(&config.cache)),
            tracker,
            user_id,
            ledger,
            budget_store,
            categories,
            config,
            data_version: AtomicU64::new(1),
        }
    }

    /// Spawn the tracker loop and the cache sweeper
    pub fn start(self: &Arc<Self>) {
        let tracker = Arc::clone(&self.tracker);
        tokio::spawn(tracker.run());

        let cache = Arc::clone(&self.cache);
        let sweep_interval = Duration::from_secs(self.config.cache.sweep_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            loop {
                ticker.tick().await;
                let removed = cache.sweep();
                if removed > 0 {
                    log::debug!(
                        target: "ledgerpulse::cache",
                        "Sweep reclaimed {} expired entries",
                        removed
                    );
                }
            }
        });
    }

    /// Spending analysis for a query, cache-aside.
    ///
    /// An inverted range returns an empty analysis rather than an
    /// error.
    pub async fn get_spending_analysis(&self, query: &SpendingQuery) -> EngineResult<SpendingAnalysis> {
        let range = query.range;
        if range.is_empty() {
            return Ok(SpendingAnalysis::empty(range));
        }

        let version = self.data_version.load(Ordering::Relaxed);
        let fingerprint = short_hash(&serde_json::to_string(&query.filter).unwrap_or_default());
        let key = format!("spending:{}:{}:{}", self.user_id, range, fingerprint);

        self.cache
            .get_or_set(&key, version, None, || async {
                let records = self
                    .ledger
                    .query_transactions(&self.user_id, &range, &query.filter)
                    .await?;
                Ok(self.analyzer.analyze(&records, &range, &self.categories))
            })
            .await
    }

    /// Budget analytics for one budget, cache-aside. A missing budget
    /// is `NotFound`; evaluation never substitutes a default budget.
    pub async fn get_budget_analytics(
        &self,
        budget_id: &str,
        period: Option<DateRange>,
    ) -> EngineResult<BudgetAnalytics> {
        let budget = self.budget_store.get_budget(&self.user_id, budget_id).await?;
        let period = period.unwrap_or_else(|| budget.period());
        if period.is_empty() {
            // Permissive inverted-range policy: zero result, not error
            return Ok(self.evaluator.evaluate(&budget, &[], &period)?);
        }

        let version = self.data_version.load(Ordering::Relaxed);
        let key = format!("budget:{}:{}:{}", self.user_id, budget_id, period);

        self.cache
            .get_or_set(&key, version, None, || async {
                let filter = TransactionFilter::default();
                let records = self
                    .ledger
                    .query_transactions(&self.user_id, &period, &filter)
                    .await?;
                Ok(self.evaluator.evaluate(&budget, &records, &period)?)
            })
            .await
    }

    /// Signal that the underlying record set changed: invalidates the
    /// current cache generation by bumping the version and forces an
    /// out-of-band tracker refresh.
    pub fn record_data_changed(&self) {
        self.data_version.fetch_add(1, Ordering::Relaxed);
        self.tracker.notify_data_changed();
    }

    /// Current cache generation
    pub fn data_version(&self) -> u64 {
        self.data_version.load(Ordering::Relaxed)
    }

    /// Cache telemetry
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // ==================== Tracker delegation ====================

    pub fn subscribe_snapshots(&self) -> tokio::sync::broadcast::Receiver<Arc<BudgetProgressSnapshot>> {
        self.tracker.subscribe_snapshots()
    }

    pub fn subscribe_alerts(&self) -> tokio::sync::broadcast::Receiver<ActiveAlert> {
        self.tracker.subscribe_alerts()
    }

    pub fn latest_snapshot(&self) -> Option<Arc<BudgetProgressSnapshot>> {
        self.tracker.latest_snapshot()
    }

    pub fn alerts(&self) -> Vec<ActiveAlert> {
        self.tracker.alerts()
    }

    pub fn acknowledge_alert(&self, alert_id: &str) -> bool {
        self.tracker.acknowledge_alert(alert_id)
    }

    pub fn clear_alert(&self, alert_id: &str) -> bool {
        self.tracker.clear_alert(alert_id)
    }

    pub fn is_connected(&self) -> bool {
        self.tracker.is_connected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ledgerpulse_core::FixedClock;
    use ledgerpulse_store::{
        Budget, CategoryAllocation, MemoryBudgetStore, MemoryLedgerStore, TransactionRecord,
        TransactionStatus, TransactionType,
    };
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn june() -> DateRange {
        DateRange::new(date(2024, 6, 1), date(2024, 6, 30))
    }

    fn expense(id: &str, amount: i64, category: &str, day: NaiveDate) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            user_id: "u-1".to_string(),
            amount: Decimal::from(amount),
            transaction_type: TransactionType::Expense,
            category_id: category.to_string(),
            date: day,
            status: TransactionStatus::Completed,
            currency: Some("USD".to_string()),
        }
    }

    fn engine(
        ledger: Arc<MemoryLedgerStore>,
        budgets: Arc<MemoryBudgetStore>,
    ) -> AnalyticsEngine {
        AnalyticsEngine::new(
            Config::default(),
            "u-1",
            ledger,
            budgets,
            Vec::new(),
            Arc::new(FixedClock::at(date(2024, 6, 15))),
        )
    }

    #[tokio::test]
    async fn test_spending_analysis_cached_until_data_changed() {
        let ledger = Arc::new(MemoryLedgerStore::with_records(vec![expense(
            "t-1",
            100,
            "cat-a",
            date(2024, 6, 5),
        )]));
        let engine = engine(Arc::clone(&ledger), Arc::new(MemoryBudgetStore::new()));
        let query = SpendingQuery {
            range: june(),
            filter: TransactionFilter::default(),
        };

        let first = engine.get_spending_analysis(&query).await.unwrap();
        assert_eq!(first.total_spent, Decimal::from(100));

        // New record, no signal: the cached generation still serves
        ledger.insert(expense("t-2", 50, "cat-a", date(2024, 6, 6)));
        let cached = engine.get_spending_analysis(&query).await.unwrap();
        assert_eq!(cached.total_spent, Decimal::from(100));

        // Version bump invalidates the whole generation
        engine.record_data_changed();
        let fresh = engine.get_spending_analysis(&query).await.unwrap();
        assert_eq!(fresh.total_spent, Decimal::from(150));
    }

    #[tokio::test]
    async fn test_cached_budget_analytics_identical_to_recompute() {
        let ledger = Arc::new(MemoryLedgerStore::with_records(vec![expense(
            "t-1",
            950,
            "cat-a",
            date(2024, 6, 10),
        )]));
        let budgets = Arc::new(MemoryBudgetStore::with_budgets(vec![Budget {
            id: "b-1".to_string(),
            user_id: "u-1".to_string(),
            name: "Monthly".to_string(),
            total_amount: Decimal::from(1000),
            currency: "USD".to_string(),
            start_date: date(2024, 6, 1),
            end_date: date(2024, 6, 30),
            alert_threshold: 0.0,
            category_allocations: vec![CategoryAllocation {
                category_id: "cat-a".to_string(),
                allocated_amount: Decimal::from(1000),
            }],
            archived: false,
        }]));
        let engine = engine(ledger, budgets);

        let computed = engine.get_budget_analytics("b-1", None).await.unwrap();
        let cached = engine.get_budget_analytics("b-1", None).await.unwrap();
        assert_eq!(computed, cached);
        assert_eq!(cached.utilization_percent, 95.0);

        let stats = engine.cache_stats();
        assert!(stats.hits >= 1);
    }

    #[tokio::test]
    async fn test_missing_budget_is_not_found() {
        let engine = engine(
            Arc::new(MemoryLedgerStore::new()),
            Arc::new(MemoryBudgetStore::new()),
        );
        let result = engine.get_budget_analytics("b-404", None).await;
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_inverted_range_returns_empty_analysis() {
        let ledger = Arc::new(MemoryLedgerStore::with_records(vec![expense(
            "t-1",
            100,
            "cat-a",
            date(2024, 6, 5),
        )]));
        let engine = engine(ledger, Arc::new(MemoryBudgetStore::new()));
        let query = SpendingQuery {
            range: DateRange::new(date(2024, 6, 30), date(2024, 6, 1)),
            filter: TransactionFilter::default(),
        };
        let analysis = engine.get_spending_analysis(&query).await.unwrap();
        assert_eq!(analysis.total_spent, Decimal::ZERO);
        assert!(analysis.spending_by_day.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_filters_do_not_share_cache_entries() {
        let ledger = Arc::new(MemoryLedgerStore::with_records(vec![
            expense("t-1", 100, "cat-a", date(2024, 6, 5)),
            expense("t-2", 40, "cat-b", date(2024, 6, 6)),
        ]));
        let engine = engine(ledger, Arc::new(MemoryBudgetStore::new()));

        let all = SpendingQuery {
            range: june(),
            filter: TransactionFilter::default(),
        };
        let only_a = SpendingQuery {
            range: june(),
            filter: TransactionFilter {
                category_ids: Some(vec!["cat-a".to_string()]),
                ..Default::default()
            },
        };

        assert_eq!(
            engine.get_spending_analysis(&all).await.unwrap().total_spent,
            Decimal::from(140)
        );
        assert_eq!(
            engine.get_spending_analysis(&only_a).await.unwrap().total_spent,
            Decimal::from(100)
        );
    }
}
