//! Weekly spending projection and budget optimization.
//!
//! The forecaster pulls a user's trailing week of transactions from a
//! [`TransactionStore`], projects a monthly figure per category, and compares
//! the projected total against the user's stated monthly budget. When the two
//! diverge by more than the configured threshold it suggests a smoothed budget
//! and a proportional per-category allocation.
//!
//! [`BudgetForecaster::optimize`] never returns an error: invalid input and
//! retrieval failures degrade to a "no optimization" result.

use chrono::{DateTime, Utc};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{BudgetError, Result};
use crate::fmt::round_to;
use crate::models::Category;
use crate::store::{window_start, TransactionStore};

/// What to do with transactions whose category is outside the fixed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategoryPolicy {
    /// Sum them under their own name.
    #[default]
    Keep,
    FoldIntoOther,
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Relative budget deviation above which optimization is suggested.
    pub threshold: f64,
    /// Weight of the projected total in the suggested budget (0.5 = midpoint).
    pub smoothing: f64,
    pub weeks_per_month: f64,
    pub lookback_days: i64,
    /// A category alert fires when spending exceeds its allocation times this factor.
    pub overspend_factor: f64,
    pub unknown_categories: UnknownCategoryPolicy,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            threshold: 0.15,
            smoothing: 0.5,
            weeks_per_month: 4.0,
            lookback_days: 7,
            overspend_factor: 1.2,
            unknown_categories: UnknownCategoryPolicy::Keep,
        }
    }
}

impl ForecastConfig {
    /// Reject settings that would make the projection meaningless.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(BudgetError::Settings(msg)) };
        if self.lookback_days <= 0 {
            return invalid(format!("lookback_days must be positive, got {}", self.lookback_days));
        }
        if !self.weeks_per_month.is_finite() || self.weeks_per_month <= 0.0 {
            return invalid(format!("weeks_per_month must be positive, got {}", self.weeks_per_month));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return invalid(format!("threshold must not be negative, got {}", self.threshold));
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return invalid(format!("smoothing must be between 0 and 1, got {}", self.smoothing));
        }
        if !self.overspend_factor.is_finite() || self.overspend_factor <= 0.0 {
            return invalid(format!("overspend_factor must be positive, got {}", self.overspend_factor));
        }
        Ok(())
    }
}

/// Category totals in a stable order: the eight fixed categories first, then
/// any ad hoc categories sorted by name.
#[derive(Debug, Clone, PartialEq)]
pub struct SpendingMap {
    entries: Vec<(String, f64)>,
}

impl SpendingMap {
    pub fn zeroed() -> Self {
        Self {
            entries: Category::ALL
                .iter()
                .map(|c| (c.as_str().to_string(), 0.0))
                .collect(),
        }
    }

    pub fn add(&mut self, category: &str, amount: f64) {
        match self.entries.iter_mut().find(|(name, _)| name == category) {
            Some((_, total)) => *total += amount,
            None => self.entries.push((category.to_string(), amount)),
        }
    }

    pub fn get(&self, category: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, total)| *total)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, total)| (name.as_str(), *total))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, total)| total).sum()
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|(name, total)| (name.clone(), total * factor))
                .collect(),
        }
    }

    pub(crate) fn sort_extras(&mut self) {
        let fixed = Category::ALL.len();
        if self.entries.len() > fixed {
            self.entries[fixed..].sort_by(|a, b| a.0.cmp(&b.0));
        }
    }
}

impl Default for SpendingMap {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl Serialize for SpendingMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(name, total)| (name, total)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub category: String,
    pub current_spending: f64,
    pub suggested_allocation: f64,
    /// Share of projected spending, rounded to one decimal place.
    pub percentage_of_budget: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub current_budget: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_budget: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<Recommendation>>,
    pub needs_optimization: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OptimizationResult {
    pub fn unchanged(current_budget: f64) -> Self {
        Self {
            current_budget,
            suggested_budget: None,
            recommendations: None,
            needs_optimization: false,
            error: None,
        }
    }

    pub fn failed(current_budget: f64, message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::unchanged(current_budget)
        }
    }
}

/// The weekly figures an optimization result was computed from. `weekly` is
/// `None` when no retrieval happened or it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub weekly: Option<SpendingMap>,
    pub result: OptimizationResult,
}

pub struct BudgetForecaster<S> {
    store: S,
    config: ForecastConfig,
}

impl<S: TransactionStore> BudgetForecaster<S> {
    pub fn new(store: S, config: ForecastConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Sum the user's spending per category over the lookback window ending at `now`.
    pub fn weekly_spending_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<SpendingMap> {
        self.config.validate()?;
        let since = window_start(now, self.config.lookback_days)?;
        let transactions = self.store.transactions_since(user_id, since)?;
        debug!(user_id, count = transactions.len(), %since, "fetched transactions");

        let mut spending = SpendingMap::zeroed();
        for txn in &transactions {
            if !txn.amount.is_finite() || txn.amount <= 0.0 {
                debug!(id = ?txn.id, amount = txn.amount, "skipping non-positive amount");
                continue;
            }
            let raw = match txn.category.as_deref().map(str::trim) {
                Some(raw) if !raw.is_empty() => raw,
                _ => {
                    debug!(id = ?txn.id, "skipping transaction without category");
                    continue;
                }
            };
            match Category::parse(raw) {
                Some(category) => spending.add(category.as_str(), txn.amount),
                None => match self.config.unknown_categories {
                    UnknownCategoryPolicy::Keep => spending.add(raw, txn.amount),
                    UnknownCategoryPolicy::FoldIntoOther => {
                        spending.add(Category::Other.as_str(), txn.amount)
                    }
                    UnknownCategoryPolicy::Ignore => {
                        debug!(id = ?txn.id, category = raw, "ignoring unknown category");
                    }
                },
            }
        }
        spending.sort_extras();

        debug!(user_id, categories = spending.len(), total = spending.total(), "weekly spending calculated");
        Ok(spending)
    }

    pub fn project(&self, weekly: &SpendingMap) -> SpendingMap {
        weekly.scaled(self.config.weeks_per_month)
    }

    pub fn optimize(&self, user_id: &str, current_budget: f64) -> OptimizationResult {
        self.optimize_at(user_id, current_budget, Utc::now())
    }

    pub fn optimize_at(
        &self,
        user_id: &str,
        current_budget: f64,
        now: DateTime<Utc>,
    ) -> OptimizationResult {
        self.forecast_at(user_id, current_budget, now).result
    }

    /// Like [`optimize_at`](Self::optimize_at), but also hands back the weekly
    /// totals the result was based on, fetched once.
    pub fn forecast_at(&self, user_id: &str, current_budget: f64, now: DateTime<Utc>) -> Forecast {
        let unchanged = |budget| Forecast {
            weekly: None,
            result: OptimizationResult::unchanged(budget),
        };
        if !current_budget.is_finite() {
            warn!(user_id, current_budget, "invalid current budget");
            return unchanged(0.0);
        }
        if user_id.trim().is_empty() {
            warn!("missing user id for budget optimization");
            return unchanged(current_budget);
        }

        match self.weekly_spending_at(user_id, now) {
            Ok(weekly) => Forecast {
                result: self.evaluate(current_budget, &weekly),
                weekly: Some(weekly),
            },
            Err(e) => {
                error!(user_id, error = %e, "budget optimization failed");
                Forecast {
                    weekly: None,
                    result: OptimizationResult::failed(current_budget, e.to_string()),
                }
            }
        }
    }

    /// Compare the projection of `weekly` against `current_budget`. Pure.
    pub fn evaluate(&self, current_budget: f64, weekly: &SpendingMap) -> OptimizationResult {
        if !current_budget.is_finite() {
            return OptimizationResult::unchanged(0.0);
        }
        if current_budget <= 0.0 {
            debug!(current_budget, "budget is not positive, nothing to compare against");
            return OptimizationResult::unchanged(current_budget);
        }

        let monthly = self.project(weekly);
        let total = monthly.total();
        let difference = (current_budget - total).abs() / current_budget;
        debug!(total, difference, threshold = self.config.threshold, "projected monthly spending");

        if difference <= self.config.threshold {
            info!(current_budget, total, "budget is within threshold");
            return OptimizationResult::unchanged(current_budget);
        }

        let smoothing = self.config.smoothing;
        let suggested = (1.0 - smoothing) * current_budget + smoothing * total;
        let recommendations = monthly
            .iter()
            .map(|(category, amount)| {
                let share = if total > 0.0 { amount / total } else { 0.0 };
                Recommendation {
                    category: category.to_string(),
                    current_spending: amount,
                    suggested_allocation: suggested * share,
                    percentage_of_budget: round_to(share * 100.0, 1),
                }
            })
            .collect();

        info!(current_budget, suggested, total, "budget optimization suggested");
        OptimizationResult {
            current_budget,
            suggested_budget: Some(suggested),
            recommendations: Some(recommendations),
            needs_optimization: true,
            error: None,
        }
    }
}
