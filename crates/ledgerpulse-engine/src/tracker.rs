//! Real-time budget progress tracker
//!
//! Re-runs the budget evaluator across all active budgets on a timer
//! and on explicit data-changed signals, maintains alert identity
//! state, and publishes live snapshots over broadcast channels.
//!
//! All refresh cycles execute sequentially inside one task; a signal
//! arriving mid-cycle is coalesced into "run again after this cycle"
//! by `Notify`'s stored permit, so at least one full refresh follows
//! the most recent signal. Snapshots are swapped in atomically after a
//! cycle finishes; readers never observe a partially updated view.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use ledgerpulse_config::{Config, ProgressThresholds, TrendConfig};
use ledgerpulse_core::{
    percentage_of, period_delta, progress_state, BudgetAlert, BudgetEvaluator, ClockRef,
    ProgressState,
};
use ledgerpulse_store::{
    BudgetStoreRef, DateRange, LedgerStoreRef, TransactionFilter, TransactionStatus,
    TransactionType,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Notify};
use tokio::time::MissedTickBehavior;

use crate::error::EngineResult;

// ==================== Snapshot types ====================

/// Live progress of one budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetProgress {
    pub budget_id: String,
    pub budget_name: String,
    pub currency: String,
    pub total_allocated: Decimal,
    pub total_spent: Decimal,
    pub utilization_percent: f64,
    pub state: ProgressState,
}

/// Global totals across every tracked budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalTotals {
    pub total_allocated: Decimal,
    pub total_spent: Decimal,
    pub utilization_percent: f64,
    pub budgets_tracked: usize,
}

/// Per-currency rollup of tracked budgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRollup {
    pub currency: String,
    pub total_allocated: Decimal,
    pub total_spent: Decimal,
    pub utilization_percent: f64,
    pub budget_count: usize,
}

/// Spending trend direction for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Increasing => write!(f, "increasing"),
            TrendDirection::Decreasing => write!(f, "decreasing"),
            TrendDirection::Stable => write!(f, "stable"),
        }
    }
}

/// Recent-window vs prior-window average-amount comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTrend {
    pub category_id: String,
    pub direction: TrendDirection,
    pub recent_average: Decimal,
    pub prior_average: Decimal,
    pub change_percent: f64,
}

/// Immutable, fully-computed view of all tracked budgets at one point
/// in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetProgressSnapshot {
    /// Monotonic refresh-cycle counter
    pub cycle: u64,
    pub generated_at: DateTime<Utc>,
    pub budgets: Vec<BudgetProgress>,
    pub totals: GlobalTotals,
    pub by_currency: Vec<CurrencyRollup>,
    pub category_trends: Vec<CategoryTrend>,
    /// Budgets skipped this cycle because their evaluation failed
    pub failed_budgets: Vec<String>,
}

/// Tracker-side alert with stable identity and lifecycle state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveAlert {
    pub alert: BudgetAlert,
    pub created_at: DateTime<Utc>,
    pub acknowledged: bool,
}

#[derive(Default)]
struct TrackerState {
    snapshot: Option<Arc<BudgetProgressSnapshot>>,
    alerts: Vec<ActiveAlert>,
}

// ==================== Tracker ====================

/// Owns the live snapshot and alert list; single-writer refresh
/// discipline
pub struct ProgressTracker {
    user_id: String,
    ledger: LedgerStoreRef,
    budget_store: BudgetStoreRef,
    evaluator: BudgetEvaluator,
    clock: ClockRef,
    default_currency: String,
    refresh_interval: Duration,
    thresholds: ProgressThresholds,
    trend: TrendConfig,
    state: RwLock<TrackerState>,
    snapshot_tx: broadcast::Sender<Arc<BudgetProgressSnapshot>>,
    alert_tx: broadcast::Sender<ActiveAlert>,
    refresh_notify: Notify,
    connected: AtomicBool,
    cycle: AtomicU64,
}

impl ProgressTracker {
    pub fn new(
        config: &Config,
        user_id: impl Into<String>,
        ledger: LedgerStoreRef,
        budget_store: BudgetStoreRef,
        clock: ClockRef,
    ) -> Self {
        let (snapshot_tx, _) = broadcast::channel(64);
        let (alert_tx, _) = broadcast::channel(64);
        Self {
            user_id: user_id.into(),
            ledger,
            budget_store,
            evaluator: BudgetEvaluator::new(config, Arc::clone(&clock)),
            clock,
            default_currency: config.currency.default_currency.clone(),
            refresh_interval: Duration::from_secs(config.tracker.refresh_interval_secs),
            thresholds: config.tracker.thresholds,
            trend: config.tracker.trend.clone(),
            state: RwLock::new(TrackerState::default()),
            snapshot_tx,
            alert_tx,
            refresh_notify: Notify::new(),
            connected: AtomicBool::new(false),
            cycle: AtomicU64::new(0),
        }
    }

    /// Drive refresh cycles until the task is dropped. The first tick
    /// fires immediately so consumers get an initial snapshot.
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.refresh_notify.notified() => {}
            }
            if let Err(err) = self.refresh_cycle().await {
                log::error!(
                    target: "ledgerpulse::tracker",
                    "Refresh cycle failed: [{}] {}",
                    err.code(),
                    err
                );
            }
        }
    }

    /// Force an out-of-band refresh after underlying data changed
    pub fn notify_data_changed(&self) {
        self.refresh_notify.notify_one();
    }

    /// Subscribe to published snapshots
    pub fn subscribe_snapshots(&self) -> broadcast::Receiver<Arc<BudgetProgressSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Subscribe to newly created alerts
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<ActiveAlert> {
        self.alert_tx.subscribe()
    }

    /// Latest fully published snapshot
    pub fn latest_snapshot(&self) -> Option<Arc<BudgetProgressSnapshot>> {
        self.state.read().unwrap().snapshot.clone()
    }

    /// Current alert list
    pub fn alerts(&self) -> Vec<ActiveAlert> {
        self.state.read().unwrap().alerts.clone()
    }

    /// Mark an alert acknowledged by its stable id
    pub fn acknowledge_alert(&self, alert_id: &str) -> bool {
        let mut state = self.state.write().unwrap();
        match state.alerts.iter_mut().find(|a| a.alert.id == alert_id) {
            Some(alert) => {
                alert.acknowledged = true;
                true
            }
            None => false,
        }
    }

    /// Remove an alert by its stable id
    pub fn clear_alert(&self, alert_id: &str) -> bool {
        let mut state = self.state.write().unwrap();
        let before = state.alerts.len();
        state.alerts.retain(|a| a.alert.id != alert_id);
        state.alerts.len() != before
    }

    /// Store connectivity as of the last cycle; false means consumers
    /// should show a staleness indicator
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// One full refresh: evaluate every active budget, merge alerts,
    /// publish the snapshot atomically.
    pub(crate) async fn refresh_cycle(&self) -> EngineResult<()> {
        let budgets = match self.budget_store.list_active_budgets(&self.user_id).await {
            Ok(budgets) => budgets,
            Err(err) => {
                // Degraded connectivity is surfaced, then the failure
                // re-raised at cycle level
                self.connected.store(false, Ordering::Relaxed);
                return Err(err.into());
            }
        };
        self.connected.store(true, Ordering::Relaxed);

        let filter = TransactionFilter {
            transaction_types: Some(vec![TransactionType::Expense]),
            statuses: Some(vec![TransactionStatus::Completed]),
            ..Default::default()
        };

        let mut rows: Vec<BudgetProgress> = Vec::new();
        let mut failed: Vec<String> = Vec::new();
        let mut fresh_alerts: Vec<BudgetAlert> = Vec::new();

        for budget in &budgets {
            let period = budget.period();
            let records = match self
                .ledger
                .query_transactions(&self.user_id, &period, &filter)
                .await
            {
                Ok(records) => records,
                Err(err) => {
                    log::warn!(
                        target: "ledgerpulse::tracker",
                        "Skipping budget {}: ledger query failed: {}",
                        budget.id,
                        err
                    );
                    failed.push(budget.id.clone());
                    continue;
                }
            };

            // One budget's failure never blocks the others' visibility
            match self.evaluator.evaluate(budget, &records, &period) {
                Ok(analytics) => {
                    rows.push(BudgetProgress {
                        budget_id: analytics.budget_id.clone(),
                        budget_name: analytics.budget_name.clone(),
                        currency: self.currency_or_default(&analytics.currency),
                        total_allocated: analytics.total_allocated,
                        total_spent: analytics.total_spent,
                        utilization_percent: analytics.utilization_percent,
                        state: progress_state(analytics.utilization_percent, &self.thresholds),
                    });
                    fresh_alerts.extend(analytics.alerts);
                }
                Err(err) => {
                    log::warn!(
                        target: "ledgerpulse::tracker",
                        "Skipping budget {}: evaluation failed: {}",
                        budget.id,
                        err
                    );
                    failed.push(budget.id.clone());
                }
            }
        }

        let category_trends = match self.category_trends().await {
            Ok(trends) => trends,
            Err(err) => {
                log::warn!(
                    target: "ledgerpulse::tracker",
                    "Trend computation failed, keeping empty trend list: {}",
                    err
                );
                Vec::new()
            }
        };

        let totals = Self::global_totals(&rows);
        let by_currency = Self::currency_rollups(&rows);
        let snapshot = Arc::new(BudgetProgressSnapshot {
            cycle: self.cycle.fetch_add(1, Ordering::Relaxed) + 1,
            generated_at: self.clock.now(),
            budgets: rows,
            totals,
            by_currency,
            category_trends,
            failed_budgets: failed,
        });

        // Merge alerts and publish under one write lock so readers see
        // either the prior cycle or this one, never a mix
        {
            let mut state = self.state.write().unwrap();
            for alert in fresh_alerts {
                if state.alerts.iter().any(|a| a.alert.id == alert.id) {
                    continue;
                }
                let active = ActiveAlert {
                    alert,
                    created_at: self.clock.now(),
                    acknowledged: false,
                };
                state.alerts.push(active.clone());
                let _ = self.alert_tx.send(active);
            }
            state.snapshot = Some(Arc::clone(&snapshot));
        }
        let _ = self.snapshot_tx.send(snapshot);

        Ok(())
    }

    fn currency_or_default(&self, currency: &str) -> String {
        if currency.is_empty() {
            self.default_currency.clone()
        } else {
            currency.to_string()
        }
    }

    fn global_totals(rows: &[BudgetProgress]) -> GlobalTotals {
        let total_allocated: Decimal = rows.iter().map(|r| r.total_allocated).sum();
        let total_spent: Decimal = rows.iter().map(|r| r.total_spent).sum();
        GlobalTotals {
            total_allocated,
            total_spent,
            utilization_percent: percentage_of(total_spent, total_allocated),
            budgets_tracked: rows.len(),
        }
    }

    fn currency_rollups(rows: &[BudgetProgress]) -> Vec<CurrencyRollup> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut rollups: Vec<CurrencyRollup> = Vec::new();
        for row in rows {
            match index.get(&row.currency) {
                Some(&slot) => {
                    let rollup = &mut rollups[slot];
                    rollup.total_allocated += row.total_allocated;
                    rollup.total_spent += row.total_spent;
                    rollup.budget_count += 1;
                }
                None => {
                    index.insert(row.currency.clone(), rollups.len());
                    rollups.push(CurrencyRollup {
                        currency: row.currency.clone(),
                        total_allocated: row.total_allocated,
                        total_spent: row.total_spent,
                        utilization_percent: 0.0,
                        budget_count: 1,
                    });
                }
            }
        }
        for rollup in rollups.iter_mut() {
            rollup.utilization_percent = percentage_of(rollup.total_spent, rollup.total_allocated);
        }
        rollups
    }

    /// Per-category direction from a recent-window vs prior-window
    /// average-amount comparison
    async fn category_trends(&self) -> EngineResult<Vec<CategoryTrend>> {
        let window = self.trend.window_days as i64;
        let today = self.clock.today();
        let recent_start = today - chrono::Duration::days(window - 1);
        let prior_start = today - chrono::Duration::days(2 * window - 1);

        let filter = TransactionFilter {
            transaction_types: Some(vec![TransactionType::Expense]),
            ..Default::default()
        };
        let records = self
            .ledger
            .query_transactions(&self.user_id, &DateRange::new(prior_start, today), &filter)
            .await?;

        let mut sums: HashMap<String, (Decimal, u64, Decimal, u64)> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        for record in &records {
            let entry = sums.entry(record.category_id.clone()).or_insert_with(|| {
                order.push(record.category_id.clone());
                (Decimal::ZERO, 0, Decimal::ZERO, 0)
            });
            if record.date >= recent_start {
                entry.0 += record.amount;
                entry.1 += 1;
            } else {
                entry.2 += record.amount;
                entry.3 += 1;
            }
        }

        let threshold = self.trend.threshold_percent;
        let trends = order
            .into_iter()
            .map(|category_id| {
                let (recent_sum, recent_count, prior_sum, prior_count) = sums[&category_id];
                let recent_average = if recent_count > 0 {
                    recent_sum / Decimal::from(recent_count)
                } else {
                    Decimal::ZERO
                };
                let prior_average = if prior_count > 0 {
                    prior_sum / Decimal::from(prior_count)
                } else {
                    Decimal::ZERO
                };
                let change_percent = period_delta(recent_average, prior_average).percentage_change;
                let direction = if change_percent > threshold {
                    TrendDirection::Increasing
                } else if change_percent < -threshold {
                    TrendDirection::Decreasing
                } else {
                    TrendDirection::Stable
                };
                CategoryTrend {
                    category_id,
                    direction,
                    recent_average,
                    prior_average,
                    change_percent,
                }
            })
            .collect();

        Ok(trends)
    }
}
