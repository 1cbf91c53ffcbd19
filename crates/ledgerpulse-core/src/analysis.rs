//! Spending analyzer
//!
//! Builds a full spending-analysis report from a record set that has
//! already been filtered by the ledger store. Pure and side-effect
//! free; safe to call concurrently.

use std::collections::HashMap;

use ledgerpulse_config::Config;
use ledgerpulse_store::{Category, DateRange, TransactionRecord, TransactionType};
use rust_decimal::Decimal;

use crate::aggregate::{group_sum, percentage_of, period_delta};
use crate::reports::{
    CategorySpending, DailySpending, MonthlySpending, SpendingAnalysis, TrendDelta,
};
use crate::time::{month_key, months_in_range};

/// Computes spending-analysis reports
#[derive(Debug, Clone)]
pub struct SpendingAnalyzer {
    top_days_count: usize,
    decimal_places: u32,
}

impl SpendingAnalyzer {
    pub fn new(config: &Config) -> Self {
        Self {
            top_days_count: config.analysis.top_days_count,
            decimal_places: config.currency.decimal_places,
        }
    }

    /// Analyze a filtered record set over a period.
    ///
    /// Filter application belongs to the ledger store; this assumes it
    /// is already done. Records are sorted defensively by date. An
    /// empty record set or inverted period yields an all-zero report.
    pub fn analyze(
        &self,
        records: &[TransactionRecord],
        period: &DateRange,
        categories: &[Category],
    ) -> SpendingAnalysis {
        if records.is_empty() || period.is_empty() {
            return SpendingAnalysis::empty(*period);
        }

        let mut sorted: Vec<&TransactionRecord> = records.iter().collect();
        sorted.sort_by_key(|r| r.date);

        let expenses: Vec<&TransactionRecord> = sorted
            .iter()
            .copied()
            .filter(|r| r.transaction_type == TransactionType::Expense)
            .collect();

        let total_spent: Decimal = expenses.iter().map(|r| r.amount).sum();
        let total_income: Decimal = sorted
            .iter()
            .filter(|r| r.transaction_type == TransactionType::Income)
            .map(|r| r.amount)
            .sum();
        let net_amount = total_income - total_spent;

        let labels: HashMap<&str, &str> = categories
            .iter()
            .map(|c| (c.id.as_str(), c.name.as_str()))
            .collect();

        // Category rollup over expenses, percentage of total spend
        let spending_by_category: Vec<CategorySpending> = {
            let mut rollup: Vec<CategorySpending> =
                group_sum(&expenses, |r| r.category_id.clone(), |r| r.amount)
                    .into_iter()
                    .map(|(category_id, aggregate)| CategorySpending {
                        category_name: labels
                            .get(category_id.as_str())
                            .map(|name| name.to_string())
                            .unwrap_or_else(|| category_id.clone()),
                        category_id,
                        total_amount: aggregate.sum,
                        transaction_count: aggregate.count,
                        average_amount: aggregate.avg.round_dp(self.decimal_places),
                        percentage_of_total: percentage_of(aggregate.sum, total_spent),
                    })
                    .collect();
            rollup.sort_by(|a, b| b.total_amount.cmp(&a.total_amount));
            rollup
        };

        // Daily rollup; groups arrive in chronological order because
        // the input is sorted
        let spending_by_day: Vec<DailySpending> = group_sum(&expenses, |r| r.date, |r| r.amount)
            .into_iter()
            .map(|(date, aggregate)| DailySpending {
                date,
                amount: aggregate.sum,
                transaction_count: aggregate.count,
            })
            .collect();

        // Monthly rollup over every calendar month in the period; a
        // month without records counts as zero spend, not missing data
        let mut monthly: HashMap<String, MonthlySpending> = HashMap::new();
        for record in &sorted {
            let entry = monthly
                .entry(month_key(record.date))
                .or_insert_with(|| MonthlySpending {
                    month: month_key(record.date),
                    amount: Decimal::ZERO,
                    income: Decimal::ZERO,
                    transaction_count: 0,
                });
            entry.transaction_count += 1;
            match record.transaction_type {
                TransactionType::Expense => entry.amount += record.amount,
                TransactionType::Income => entry.income += record.amount,
                TransactionType::Transfer => {}
            }
        }
        let spending_by_month: Vec<MonthlySpending> = months_in_range(period)
            .into_iter()
            .map(|month| {
                monthly.remove(&month).unwrap_or(MonthlySpending {
                    month,
                    amount: Decimal::ZERO,
                    income: Decimal::ZERO,
                    transaction_count: 0,
                })
            })
            .collect();

        // Pairwise deltas across consecutive months
        let monthly_trends: Vec<TrendDelta> = spending_by_month
            .windows(2)
            .map(|pair| {
                TrendDelta::from_delta(
                    pair[1].month.clone(),
                    period_delta(pair[1].amount, pair[0].amount),
                )
            })
            .collect();

        // Highest-spending days; stable sort keeps earlier days first
        // on equal amounts
        let top_spending_days: Vec<DailySpending> = {
            let mut days = spending_by_day.clone();
            days.sort_by(|a, b| b.amount.cmp(&a.amount));
            days.truncate(self.top_days_count);
            days
        };

        // Averages normalized by the calendar, not by active days
        let days = Decimal::from(period.days());
        let months = Decimal::from(spending_by_month.len() as u64);
        let average_daily_spending = (total_spent / days).round_dp(self.decimal_places);
        let average_monthly_spending = (total_spent / months).round_dp(self.decimal_places);

        SpendingAnalysis {
            period: *period,
            total_spent,
            total_income,
            net_amount,
            transaction_count: sorted.len(),
            average_daily_spending,
            average_monthly_spending,
            spending_by_category,
            spending_by_day,
            spending_by_month,
            top_spending_days,
            monthly_trends,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ledgerpulse_store::TransactionStatus;

    fn analyzer() -> SpendingAnalyzer {
        SpendingAnalyzer::new(&Config::default())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(
        id: &str,
        amount: i64,
        transaction_type: TransactionType,
        category: &str,
        day: NaiveDate,
    ) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            user_id: "u-1".to_string(),
            amount: Decimal::from(amount),
            transaction_type,
            category_id: category.to_string(),
            date: day,
            status: TransactionStatus::Completed,
            currency: Some("USD".to_string()),
        }
    }

    #[test]
    fn test_empty_record_set_is_all_zero() {
        let period = DateRange::new(date(2024, 1, 1), date(2024, 12, 31));
        let analysis = analyzer().analyze(&[], &period, &[]);
        assert_eq!(analysis.total_spent, Decimal::ZERO);
        assert_eq!(analysis.total_income, Decimal::ZERO);
        assert_eq!(analysis.net_amount, Decimal::ZERO);
        assert!(analysis.spending_by_category.is_empty());
        assert!(analysis.spending_by_day.is_empty());
        assert!(analysis.spending_by_month.is_empty());
        assert!(analysis.monthly_trends.is_empty());
    }

    #[test]
    fn test_totals_and_net() {
        let period = DateRange::new(date(2024, 6, 1), date(2024, 6, 30));
        let records = vec![
            record("t-1", 300, TransactionType::Expense, "groceries", date(2024, 6, 5)),
            record("t-2", 200, TransactionType::Expense, "rent", date(2024, 6, 10)),
            record("t-3", 1000, TransactionType::Income, "salary", date(2024, 6, 1)),
            record("t-4", 400, TransactionType::Transfer, "savings", date(2024, 6, 2)),
        ];
        let analysis = analyzer().analyze(&records, &period, &[]);
        assert_eq!(analysis.total_spent, Decimal::from(500));
        assert_eq!(analysis.total_income, Decimal::from(1000));
        assert_eq!(analysis.net_amount, Decimal::from(500));
        assert_eq!(analysis.transaction_count, 4);
    }

    #[test]
    fn test_category_percentages_sum_to_100() {
        let period = DateRange::new(date(2024, 6, 1), date(2024, 6, 30));
        let records = vec![
            record("t-1", 100, TransactionType::Expense, "a", date(2024, 6, 1)),
            record("t-2", 250, TransactionType::Expense, "b", date(2024, 6, 2)),
            record("t-3", 333, TransactionType::Expense, "c", date(2024, 6, 3)),
            record("t-4", 17, TransactionType::Expense, "d", date(2024, 6, 4)),
        ];
        let analysis = analyzer().analyze(&records, &period, &[]);
        let sum: f64 = analysis
            .spending_by_category
            .iter()
            .map(|c| c.percentage_of_total)
            .sum();
        assert!((sum - 100.0).abs() < 0.001, "got {}", sum);
    }

    #[test]
    fn test_category_labels_resolved() {
        let period = DateRange::new(date(2024, 6, 1), date(2024, 6, 30));
        let categories = vec![Category {
            id: "groceries".to_string(),
            name: "Groceries".to_string(),
            path: vec![],
            color: None,
        }];
        let records = vec![
            record("t-1", 50, TransactionType::Expense, "groceries", date(2024, 6, 1)),
            record("t-2", 50, TransactionType::Expense, "unknown-cat", date(2024, 6, 2)),
        ];
        let analysis = analyzer().analyze(&records, &period, &categories);
        let labels: Vec<&str> = analysis
            .spending_by_category
            .iter()
            .map(|c| c.category_name.as_str())
            .collect();
        assert!(labels.contains(&"Groceries"));
        assert!(labels.contains(&"unknown-cat"));
    }

    #[test]
    fn test_average_daily_uses_calendar_days() {
        // 300 over a 30-day period with only 2 active days: an empty
        // day counts as zero spend, not missing data
        let period = DateRange::new(date(2024, 6, 1), date(2024, 6, 30));
        let records = vec![
            record("t-1", 200, TransactionType::Expense, "a", date(2024, 6, 3)),
            record("t-2", 100, TransactionType::Expense, "a", date(2024, 6, 20)),
        ];
        let analysis = analyzer().analyze(&records, &period, &[]);
        assert_eq!(analysis.average_daily_spending, Decimal::from(10));
    }

    #[test]
    fn test_monthly_trend_scenario() {
        // Monthly spend sequence [1000, 1200, 800]
        let period = DateRange::new(date(2024, 1, 1), date(2024, 3, 31));
        let records = vec![
            record("t-1", 1000, TransactionType::Expense, "a", date(2024, 1, 15)),
            record("t-2", 1200, TransactionType::Expense, "a", date(2024, 2, 15)),
            record("t-3", 800, TransactionType::Expense, "a", date(2024, 3, 15)),
        ];
        let analysis = analyzer().analyze(&records, &period, &[]);

        assert_eq!(analysis.monthly_trends.len(), 2);
        assert_eq!(analysis.monthly_trends[0].change, Decimal::from(200));
        assert_eq!(analysis.monthly_trends[0].percentage_change, 20.0);
        assert_eq!(analysis.monthly_trends[1].change, Decimal::from(-400));
        assert!((analysis.monthly_trends[1].percentage_change + 33.33).abs() < 0.01);
    }

    #[test]
    fn test_empty_months_count_as_zero_in_trends() {
        // February has no records; March's delta is measured against 0
        let period = DateRange::new(date(2024, 1, 1), date(2024, 3, 31));
        let records = vec![
            record("t-1", 500, TransactionType::Expense, "a", date(2024, 1, 10)),
            record("t-2", 300, TransactionType::Expense, "a", date(2024, 3, 10)),
        ];
        let analysis = analyzer().analyze(&records, &period, &[]);

        assert_eq!(analysis.spending_by_month.len(), 3);
        assert_eq!(analysis.spending_by_month[1].amount, Decimal::ZERO);
        assert_eq!(analysis.monthly_trends[0].change, Decimal::from(-500));
        // Zero baseline: change reported, percentage clamped to 0
        assert_eq!(analysis.monthly_trends[1].change, Decimal::from(300));
        assert_eq!(analysis.monthly_trends[1].percentage_change, 0.0);
    }

    #[test]
    fn test_top_spending_days_ordering() {
        let period = DateRange::new(date(2024, 6, 1), date(2024, 6, 30));
        let mut records = Vec::new();
        for day in 1..=12 {
            records.push(record(
                &format!("t-{}", day),
                (day as i64) * 10,
                TransactionType::Expense,
                "a",
                date(2024, 6, day),
            ));
        }
        let analysis = analyzer().analyze(&records, &period, &[]);
        assert_eq!(analysis.top_spending_days.len(), 10);
        assert_eq!(analysis.top_spending_days[0].amount, Decimal::from(120));
        assert_eq!(analysis.top_spending_days[9].amount, Decimal::from(30));
    }

    #[test]
    fn test_inverted_period_yields_empty_report() {
        let period = DateRange::new(date(2024, 6, 30), date(2024, 6, 1));
        let records = vec![record(
            "t-1",
            100,
            TransactionType::Expense,
            "a",
            date(2024, 6, 10),
        )];
        let analysis = analyzer().analyze(&records, &period, &[]);
        assert_eq!(analysis.total_spent, Decimal::ZERO);
        assert!(analysis.spending_by_day.is_empty());
    }
}
