//! Budget evaluator
//!
//! Computes utilization, status classification, category breakdown,
//! daily progress, and threshold alerts for one budget over a period.
//! Pure except for the injected clock, which only feeds days-remaining
//! and the spend projection.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use ledgerpulse_config::{Config, StatusLadder};
use ledgerpulse_store::{Budget, DateRange, TransactionRecord};
use rust_decimal::Decimal;

use crate::aggregate::{bucket_status, group_sum, percentage_of, BudgetStatus};
use crate::error::{CoreError, CoreResult};
use crate::reports::{
    AlertKind, BudgetAlert, BudgetAnalytics, CategoryBudgetBreakdown, DailyProgressPoint,
};
use crate::time::ClockRef;

/// Allocation curve deciding how much of a budget should have been
/// consumed through day `day_index` of a `total_days` period.
/// Seasonal or front-loaded curves plug in here.
pub trait AllocationCurve: Send + Sync {
    fn allocated_to_date(&self, total_amount: Decimal, total_days: i64, day_index: i64) -> Decimal;
}

/// Straight-line allocation: an equal share of the budget per day
#[derive(Debug, Default)]
pub struct LinearAllocation;

impl AllocationCurve for LinearAllocation {
    fn allocated_to_date(&self, total_amount: Decimal, total_days: i64, day_index: i64) -> Decimal {
        if total_days == 0 {
            return Decimal::ZERO;
        }
        total_amount / Decimal::from(total_days) * Decimal::from(day_index)
    }
}

/// Computes per-budget analytics
#[derive(Clone)]
pub struct BudgetEvaluator {
    ladder: StatusLadder,
    alert_trigger_percent: f64,
    decimal_places: u32,
    allocation: Arc<dyn AllocationCurve>,
    clock: ClockRef,
}

impl BudgetEvaluator {
    pub fn new(config: &Config, clock: ClockRef) -> Self {
        Self {
            ladder: config.evaluator.ladder,
            alert_trigger_percent: config.evaluator.alert_trigger_percent,
            decimal_places: config.currency.decimal_places,
            allocation: Arc::new(LinearAllocation),
            clock,
        }
    }

    /// Swap the daily allocation curve
    pub fn with_allocation_curve(mut self, curve: Arc<dyn AllocationCurve>) -> Self {
        self.allocation = curve;
        self
    }

    /// Evaluate one budget against a record set.
    ///
    /// Spending counts completed expense records inside the period
    /// whose category has an allocation in this budget; unallocated
    /// categories are excluded from the total. Alert generation is
    /// stateless per call; deduplication is the tracker's job.
    pub fn evaluate(
        &self,
        budget: &Budget,
        records: &[TransactionRecord],
        period: &DateRange,
    ) -> CoreResult<BudgetAnalytics> {
        if budget.total_amount < Decimal::ZERO {
            return Err(CoreError::compute(format!(
                "budget {} has negative total amount",
                budget.id
            )));
        }
        for allocation in &budget.category_allocations {
            if allocation.allocated_amount < Decimal::ZERO {
                return Err(CoreError::compute(format!(
                    "budget {} has negative allocation for category {}",
                    budget.id, allocation.category_id
                )));
            }
        }

        let relevant: Vec<&TransactionRecord> = records
            .iter()
            .filter(|r| r.is_spending() && r.is_completed())
            .filter(|r| period.contains(r.date))
            .filter(|r| budget.covers_category(&r.category_id))
            .collect();

        let spent_by_category: HashMap<String, Decimal> =
            group_sum(&relevant, |r| r.category_id.clone(), |r| r.amount)
                .into_iter()
                .map(|(category, aggregate)| (category, aggregate.sum))
                .collect();

        let total_spent: Decimal = spent_by_category.values().copied().sum();
        let utilization_percent = percentage_of(total_spent, budget.total_amount);
        let status = bucket_status(utilization_percent, &self.ladder);

        // Per-category breakdown in allocation order; zero-spend
        // categories still appear
        let categories: Vec<CategoryBudgetBreakdown> = budget
            .category_allocations
            .iter()
            .map(|allocation| {
                let spent = spent_by_category
                    .get(&allocation.category_id)
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                let utilization = percentage_of(spent, allocation.allocated_amount);
                CategoryBudgetBreakdown {
                    category_id: allocation.category_id.clone(),
                    allocated_amount: allocation.allocated_amount,
                    spent_amount: spent,
                    remaining_amount: allocation.allocated_amount - spent,
                    utilization_percent: utilization,
                    status: bucket_status(utilization, &self.ladder),
                }
            })
            .collect();

        let daily_progress = self.daily_progress(budget, period, &relevant);

        let total_days = period.days();
        let today = self.clock.today();
        let days_elapsed = if today < period.start {
            0
        } else {
            ((today - period.start).num_days() + 1).min(total_days)
        };
        let days_remaining = total_days - days_elapsed;

        let projected_spend = if days_elapsed > 0 {
            (total_spent / Decimal::from(days_elapsed) * Decimal::from(total_days))
                .round_dp(self.decimal_places)
        } else {
            total_spent
        };

        let alerts = self.build_alerts(budget, utilization_percent, &categories);

        Ok(BudgetAnalytics {
            budget_id: budget.id.clone(),
            budget_name: budget.name.clone(),
            currency: budget.currency.clone(),
            period: *period,
            total_allocated: budget.total_amount,
            total_spent,
            remaining_amount: budget.total_amount - total_spent,
            utilization_percent,
            status,
            categories,
            daily_progress,
            days_elapsed,
            days_remaining,
            projected_spend,
            alerts,
        })
    }

    /// Cumulative-spend curve against the allocation curve's
    /// allocated-to-date. The default curve is straight-line
    /// (total / days per day), pinned by an explicit linearity test.
    fn daily_progress(
        &self,
        budget: &Budget,
        period: &DateRange,
        relevant: &[&TransactionRecord],
    ) -> Vec<DailyProgressPoint> {
        let total_days = period.days();
        if total_days == 0 {
            return Vec::new();
        }

        let mut by_date: HashMap<chrono::NaiveDate, Decimal> = HashMap::new();
        for record in relevant {
            *by_date.entry(record.date).or_insert(Decimal::ZERO) += record.amount;
        }

        let mut points = Vec::with_capacity(total_days as usize);
        let mut cumulative = Decimal::ZERO;
        for offset in 0..total_days {
            let date = period.start + Duration::days(offset);
            cumulative += by_date.get(&date).copied().unwrap_or(Decimal::ZERO);
            points.push(DailyProgressPoint {
                date,
                cumulative_spent: cumulative,
                allocated_to_date: self.allocation.allocated_to_date(
                    budget.total_amount,
                    total_days,
                    offset + 1,
                ),
            });
        }
        points
    }

    /// One alert for the budget overall plus one per category, each
    /// when utilization crosses the trigger. A budget-level
    /// alert_threshold overrides the configured trigger.
    fn build_alerts(
        &self,
        budget: &Budget,
        utilization_percent: f64,
        categories: &[CategoryBudgetBreakdown],
    ) -> Vec<BudgetAlert> {
        let trigger = if budget.alert_threshold > 0.0 {
            budget.alert_threshold
        } else {
            self.alert_trigger_percent
        };

        let mut alerts = Vec::new();

        if utilization_percent > trigger {
            let kind = if utilization_percent > 100.0 {
                AlertKind::Critical
            } else {
                AlertKind::Warning
            };
            alerts.push(BudgetAlert {
                id: BudgetAlert::compose_id(kind, &budget.id, None),
                kind,
                budget_id: budget.id.clone(),
                category_id: None,
                message: format!(
                    "Budget '{}' has used {:.1}% of its allocation",
                    budget.name, utilization_percent
                ),
                current_value: utilization_percent,
                threshold_value: if kind == AlertKind::Critical { 100.0 } else { trigger },
            });
        }

        for category in categories {
            if category.utilization_percent > trigger {
                let kind = if category.utilization_percent > 100.0 {
                    AlertKind::Critical
                } else {
                    AlertKind::Warning
                };
                alerts.push(BudgetAlert {
                    id: BudgetAlert::compose_id(kind, &budget.id, Some(&category.category_id)),
                    kind,
                    budget_id: budget.id.clone(),
                    category_id: Some(category.category_id.clone()),
                    message: format!(
                        "Category '{}' in budget '{}' has used {:.1}% of its allocation",
                        category.category_id, budget.name, category.utilization_percent
                    ),
                    current_value: category.utilization_percent,
                    threshold_value: if kind == AlertKind::Critical { 100.0 } else { trigger },
                });
            }
        }

        alerts
    }
}
