//! Aggregation primitives
//!
//! Grouping, percentage, trend-delta, and status-bucket functions over
//! in-memory collections. All pure; callers may invoke them
//! concurrently without locking.

use std::collections::HashMap;
use std::hash::Hash;

use ledgerpulse_config::{ProgressThresholds, StatusLadder};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==================== Grouping ====================

/// Sum, count, and average for one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAggregate {
    pub sum: Decimal,
    pub count: usize,
    pub avg: Decimal,
}

/// Group records by a key and aggregate a value per group.
///
/// Output order is first-seen key order, so listings derived from it
/// ("top N" after a stable sort) stay deterministic.
pub fn group_sum<T, K, KF, VF>(records: &[T], key_fn: KF, value_fn: VF) -> Vec<(K, GroupAggregate)>
where
    K: Eq + Hash + Clone,
    KF: Fn(&T) -> K,
    VF: Fn(&T) -> Decimal,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, GroupAggregate)> = Vec::new();

    for record in records {
        let key = key_fn(record);
        let value = value_fn(record);
        match index.get(&key) {
            Some(&slot) => {
                let aggregate = &mut groups[slot].1;
                aggregate.sum += value;
                aggregate.count += 1;
            }
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((
                    key,
                    GroupAggregate {
                        sum: value,
                        count: 1,
                        avg: Decimal::ZERO,
                    },
                ));
            }
        }
    }

    for (_, aggregate) in groups.iter_mut() {
        aggregate.avg = aggregate.sum / Decimal::from(aggregate.count as u64);
    }

    groups
}

// ==================== Percentage math ====================

/// Percentage of `part` in `whole`; 0 when the whole is zero.
/// The zero-denominator case is a documented policy, not an error.
pub fn percentage_of(part: Decimal, whole: Decimal) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    (part / whole * Decimal::from(100)).to_f64().unwrap_or(0.0)
}

/// Change between two consecutive period totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodDelta {
    pub change: Decimal,
    pub percentage_change: f64,
}

/// Delta between a period total and its predecessor.
///
/// percentage_change is 0 when the previous total is zero, even if the
/// change is not; the policy trades a masked new-spending signal for
/// never producing infinite or NaN results.
pub fn period_delta(current: Decimal, previous: Decimal) -> PeriodDelta {
    let change = current - previous;
    let percentage_change = if previous.is_zero() {
        0.0
    } else {
        (change / previous * Decimal::from(100)).to_f64().unwrap_or(0.0)
    };
    PeriodDelta {
        change,
        percentage_change,
    }
}

// ==================== Status ladders ====================

/// Historical budget status: the four-bucket ladder used by reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BudgetStatus {
    Under,
    OnTrack,
    Over,
    Critical,
}

impl BudgetStatus {
    /// Ordinal for monotonicity checks
    pub fn rank(&self) -> u8 {
        match self {
            BudgetStatus::Under => 0,
            BudgetStatus::OnTrack => 1,
            BudgetStatus::Over => 2,
            BudgetStatus::Critical => 3,
        }
    }
}

impl std::str::FromStr for BudgetStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "under" => Ok(BudgetStatus::Under),
            "on-track" => Ok(BudgetStatus::OnTrack),
            "over" => Ok(BudgetStatus::Over),
            "critical" => Ok(BudgetStatus::Critical),
            _ => Err(format!("Invalid budget status: {}", s)),
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BudgetStatus::Under => write!(f, "under"),
            BudgetStatus::OnTrack => write!(f, "on-track"),
            BudgetStatus::Over => write!(f, "over"),
            BudgetStatus::Critical => write!(f, "critical"),
        }
    }
}

/// Classify a utilization percentage on the historical ladder.
///
/// The on-track boundary is inclusive: exactly on_track_below percent
/// still reads on-track.
pub fn bucket_status(utilization_percent: f64, ladder: &StatusLadder) -> BudgetStatus {
    if utilization_percent < ladder.under_below {
        BudgetStatus::Under
    } else if utilization_percent <= ladder.on_track_below {
        BudgetStatus::OnTrack
    } else if utilization_percent < ladder.over_below {
        BudgetStatus::Over
    } else {
        BudgetStatus::Critical
    }
}

/// Live-dashboard progress state: the tracker's two-threshold ladder.
/// Kept distinct from `BudgetStatus`; the two policies are configured
/// independently and intentionally not unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressState {
    Under,
    At,
    Over,
    Critical,
}

impl ProgressState {
    /// Ordinal for monotonicity checks
    pub fn rank(&self) -> u8 {
        match self {
            ProgressState::Under => 0,
            ProgressState::At => 1,
            ProgressState::Over => 2,
            ProgressState::Critical => 3,
        }
    }
}

impl std::str::FromStr for ProgressState {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "under" => Ok(ProgressState::Under),
            "at" => Ok(ProgressState::At),
            "over" => Ok(ProgressState::Over),
            "critical" => Ok(ProgressState::Critical),
            _ => Err(format!("Invalid progress state: {}", s)),
        }
    }
}

impl std::fmt::Display for ProgressState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressState::Under => write!(f, "under"),
            ProgressState::At => write!(f, "at"),
            ProgressState::Over => write!(f, "over"),
            ProgressState::Critical => write!(f, "critical"),
        }
    }
}

/// Classify a utilization percentage on the live ladder:
/// at from warning_percent, over from 100, critical from
/// critical_percent.
pub fn progress_state(utilization_percent: f64, thresholds: &ProgressThresholds) -> ProgressState {
    if utilization_percent >= thresholds.critical_percent {
        ProgressState::Critical
    } else if utilization_percent >= 100.0 {
        ProgressState::Over
    } else if utilization_percent >= thresholds.warning_percent {
        ProgressState::At
    } else {
        ProgressState::Under
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_sum_first_seen_order() {
        let records = vec![("b", 10i64), ("a", 20), ("b", 30), ("c", 5), ("a", 40)];
        let groups = group_sum(&records, |r| r.0, |r| Decimal::from(r.1));

        let keys: Vec<&str> = groups.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);

        assert_eq!(groups[0].1.sum, Decimal::from(40));
        assert_eq!(groups[0].1.count, 2);
        assert_eq!(groups[0].1.avg, Decimal::from(20));
        assert_eq!(groups[2].1.sum, Decimal::from(5));
        assert_eq!(groups[2].1.avg, Decimal::from(5));
    }

    #[test]
    fn test_group_sum_empty() {
        let records: Vec<(&str, i64)> = Vec::new();
        let groups = group_sum(&records, |r| r.0, |r| Decimal::from(r.1));
        assert!(groups.is_empty());
    }

    #[test]
    fn test_percentage_of_zero_whole() {
        assert_eq!(percentage_of(Decimal::from(50), Decimal::ZERO), 0.0);
        assert_eq!(percentage_of(Decimal::ZERO, Decimal::ZERO), 0.0);
    }

    #[test]
    fn test_percentage_of() {
        assert_eq!(percentage_of(Decimal::from(50), Decimal::from(200)), 25.0);
        assert_eq!(percentage_of(Decimal::from(950), Decimal::from(1000)), 95.0);
    }

    #[test]
    fn test_period_delta() {
        let delta = period_delta(Decimal::from(1200), Decimal::from(1000));
        assert_eq!(delta.change, Decimal::from(200));
        assert_eq!(delta.percentage_change, 20.0);

        let delta = period_delta(Decimal::from(800), Decimal::from(1200));
        assert_eq!(delta.change, Decimal::from(-400));
        assert!((delta.percentage_change + 33.33).abs() < 0.01);
    }

    #[test]
    fn test_period_delta_zero_baseline() {
        let delta = period_delta(Decimal::from(500), Decimal::ZERO);
        assert_eq!(delta.change, Decimal::from(500));
        assert_eq!(delta.percentage_change, 0.0);
    }

    #[test]
    fn test_bucket_status_boundaries() {
        let ladder = StatusLadder::default();
        assert_eq!(bucket_status(0.0, &ladder), BudgetStatus::Under);
        assert_eq!(bucket_status(79.9, &ladder), BudgetStatus::Under);
        assert_eq!(bucket_status(80.0, &ladder), BudgetStatus::OnTrack);
        assert_eq!(bucket_status(95.0, &ladder), BudgetStatus::OnTrack);
        assert_eq!(bucket_status(95.1, &ladder), BudgetStatus::Over);
        assert_eq!(bucket_status(109.9, &ladder), BudgetStatus::Over);
        assert_eq!(bucket_status(110.0, &ladder), BudgetStatus::Critical);
        assert_eq!(bucket_status(250.0, &ladder), BudgetStatus::Critical);
    }

    #[test]
    fn test_bucket_status_monotonic() {
        let ladder = StatusLadder::default();
        let samples = [0.0, 40.0, 79.9, 80.0, 90.0, 95.0, 96.0, 100.0, 109.9, 110.0, 300.0];
        for pair in samples.windows(2) {
            let lower = bucket_status(pair[0], &ladder);
            let upper = bucket_status(pair[1], &ladder);
            assert!(
                lower.rank() <= upper.rank(),
                "rank regressed between {} and {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_progress_state_boundaries() {
        let thresholds = ProgressThresholds::default();
        assert_eq!(progress_state(0.0, &thresholds), ProgressState::Under);
        assert_eq!(progress_state(79.9, &thresholds), ProgressState::Under);
        assert_eq!(progress_state(80.0, &thresholds), ProgressState::At);
        assert_eq!(progress_state(99.9, &thresholds), ProgressState::At);
        assert_eq!(progress_state(100.0, &thresholds), ProgressState::Over);
        assert_eq!(progress_state(110.0, &thresholds), ProgressState::Critical);
    }

    #[test]
    fn test_progress_state_monotonic() {
        let thresholds = ProgressThresholds::default();
        let samples = [0.0, 50.0, 80.0, 95.0, 100.0, 105.0, 110.0, 200.0];
        for pair in samples.windows(2) {
            assert!(
                progress_state(pair[0], &thresholds).rank()
                    <= progress_state(pair[1], &thresholds).rank()
            );
        }
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!("on-track".parse::<BudgetStatus>().unwrap(), BudgetStatus::OnTrack);
        assert_eq!(BudgetStatus::OnTrack.to_string(), "on-track");
        assert_eq!("at".parse::<ProgressState>().unwrap(), ProgressState::At);
        assert_eq!(ProgressState::Critical.to_string(), "critical");
    }
}
