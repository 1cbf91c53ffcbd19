//! Configuration management for ledgerpulse
//!
//! This module handles loading, validation, and management of
//! ledgerpulse configuration from YAML files. Threshold ladders are
//! configuration rather than hard-coded constants so budget-level
//! overrides and deployment tuning stay possible without code changes.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use error::ConfigError;

// ==================== Status ladders ====================

/// Boundaries of the historical four-bucket budget status ladder.
///
/// A utilization percentage below `under_below` classifies as under,
/// below `on_track_below` as on-track, below `over_below` as over, and
/// anything at or above `over_below` as critical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusLadder {
    #[serde(default = "default_under_below")]
    pub under_below: f64,
    #[serde(default = "default_on_track_below")]
    pub on_track_below: f64,
    #[serde(default = "default_over_below")]
    pub over_below: f64,
}

impl Default for StatusLadder {
    fn default() -> Self {
        Self {
            under_below: default_under_below(),
            on_track_below: default_on_track_below(),
            over_below: default_over_below(),
        }
    }
}

fn default_under_below() -> f64 {
    80.0
}

fn default_on_track_below() -> f64 {
    95.0
}

fn default_over_below() -> f64 {
    110.0
}

/// Boundaries of the live-dashboard progress ladder.
///
/// Distinct from `StatusLadder` on purpose: the historical and live
/// views classify the same utilization differently and the two
/// policies are configured independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressThresholds {
    /// At or above this percentage the budget reads "at"
    #[serde(default = "default_warning_percent")]
    pub warning_percent: f64,
    /// At or above this percentage the budget reads "critical";
    /// "over" starts at 100 regardless
    #[serde(default = "default_critical_percent")]
    pub critical_percent: f64,
}

impl Default for ProgressThresholds {
    fn default() -> Self {
        Self {
            warning_percent: default_warning_percent(),
            critical_percent: default_critical_percent(),
        }
    }
}

fn default_warning_percent() -> f64 {
    80.0
}

fn default_critical_percent() -> f64 {
    110.0
}

// ==================== Section types ====================

/// Currency and amount formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// Fallback currency for records without one
    #[serde(default = "default_currency")]
    pub default_currency: String,
    /// Number of decimal places for rounding reported amounts
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            default_currency: default_currency(),
            decimal_places: default_decimal_places(),
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_decimal_places() -> u32 {
    2
}

/// Spending analysis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Number of highest-spending days to report
    #[serde(default = "default_top_days")]
    pub top_days_count: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_days_count: default_top_days(),
        }
    }
}

fn default_top_days() -> usize {
    10
}

/// Budget evaluator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Historical four-bucket status ladder
    #[serde(default)]
    pub ladder: StatusLadder,
    /// Utilization percentage above which alerts fire; budgets may
    /// override this with their own alert_threshold
    #[serde(default = "default_alert_trigger")]
    pub alert_trigger_percent: f64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            ladder: StatusLadder::default(),
            alert_trigger_percent: default_alert_trigger(),
        }
    }
}

fn default_alert_trigger() -> f64 {
    90.0
}

/// Trend detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Length of the recent and prior comparison windows, in days
    #[serde(default = "default_trend_window")]
    pub window_days: u32,
    /// Average-amount change (percent) required to declare a trend
    #[serde(default = "default_trend_threshold")]
    pub threshold_percent: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window_days: default_trend_window(),
            threshold_percent: default_trend_threshold(),
        }
    }
}

fn default_trend_window() -> u32 {
    7
}

fn default_trend_threshold() -> f64 {
    10.0
}

/// Real-time tracker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Periodic refresh interval, independent of request volume
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Live progress ladder
    #[serde(default)]
    pub thresholds: ProgressThresholds,
    /// Per-category trend detection
    #[serde(default)]
    pub trend: TrendConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            thresholds: ProgressThresholds::default(),
            trend: TrendConfig::default(),
        }
    }
}

fn default_refresh_interval() -> u64 {
    30
}

/// Derived-result cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default entry lifetime in seconds
    #[serde(default = "default_cache_ttl")]
    pub default_ttl_secs: u64,
    /// Interval between expiry sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_cache_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_sweep_interval() -> u64 {
    60
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

// ==================== Main configuration ====================

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Currency settings
    #[serde(default)]
    pub currency: CurrencyConfig,
    /// Spending analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Budget evaluator settings
    #[serde(default)]
    pub evaluator: EvaluatorConfig,
    /// Real-time tracker settings
    #[serde(default)]
    pub tracker: TrackerConfig,
    /// Cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
            path: path.to_string_lossy().to_string(),
        })?;

        let config: Config = serde_yaml::from_str(&content).map_err(|_| ConfigError::InvalidYaml)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ladder = &self.evaluator.ladder;
        if !(ladder.under_below < ladder.on_track_below && ladder.on_track_below < ladder.over_below)
        {
            return Err(ConfigError::InvalidValue {
                field: "evaluator.ladder".to_string(),
                reason: "Ladder boundaries must be strictly ascending".to_string(),
            });
        }

        if self.tracker.thresholds.warning_percent >= self.tracker.thresholds.critical_percent {
            return Err(ConfigError::InvalidValue {
                field: "tracker.thresholds".to_string(),
                reason: "warning_percent must be below critical_percent".to_string(),
            });
        }

        if self.tracker.refresh_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tracker.refresh_interval_secs".to_string(),
                reason: "Refresh interval must be greater than 0".to_string(),
            });
        }

        if self.tracker.trend.window_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tracker.trend.window_days".to_string(),
                reason: "Trend window must be greater than 0".to_string(),
            });
        }

        if self.cache.default_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.default_ttl_secs".to_string(),
                reason: "Cache TTL must be greater than 0".to_string(),
            });
        }

        if self.currency.default_currency.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "currency.default_currency".to_string(),
                reason: "Default currency must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }
}
