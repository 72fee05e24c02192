use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::forecaster::SpendingMap;
use crate::models::{Category, Transaction, User};
use crate::store::TransactionStore;

fn counts(txn: &Transaction) -> bool {
    txn.amount.is_finite() && txn.amount > 0.0
}

/// Fixed category of a transaction for cross-user reports. A missing category
/// counts as Other; names outside the fixed set yield `None`.
fn fixed_category(txn: &Transaction) -> Option<Category> {
    match txn.category.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Category::parse(raw),
        _ => Some(Category::Other),
    }
}

/// Per-user totals for each fixed category.
fn spend_by_user(transactions: Vec<Transaction>) -> HashMap<String, HashMap<Category, f64>> {
    let mut per_user: HashMap<String, HashMap<Category, f64>> = HashMap::new();
    for txn in transactions {
        if !counts(&txn) {
            continue;
        }
        if let Some(category) = fixed_category(&txn) {
            *per_user
                .entry(txn.user_id)
                .or_default()
                .entry(category)
                .or_default() += txn.amount;
        }
    }
    per_user
}

// ---------------------------------------------------------------------------
// Category breakdown
// ---------------------------------------------------------------------------

pub struct BreakdownItem {
    pub category: String,
    pub total: f64,
    pub pct: f64,
}

pub struct Breakdown {
    pub items: Vec<BreakdownItem>,
    pub total: f64,
}

/// Spending per category for one user since `since`. Every fixed category is
/// listed; categories outside the fixed set follow under their own names.
pub fn category_breakdown<S: TransactionStore>(
    store: &S,
    user_id: &str,
    since: DateTime<Utc>,
) -> Result<Breakdown> {
    let mut totals = SpendingMap::zeroed();
    for txn in store.transactions_since(user_id, since)? {
        if !counts(&txn) {
            continue;
        }
        match txn.category.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => match Category::parse(raw) {
                Some(category) => totals.add(category.as_str(), txn.amount),
                None => totals.add(raw, txn.amount),
            },
            _ => totals.add(Category::Other.as_str(), txn.amount),
        }
    }
    totals.sort_extras();

    let total = totals.total();
    let items = totals
        .iter()
        .map(|(name, t)| BreakdownItem {
            category: name.to_string(),
            total: t,
            pct: if total != 0.0 { t / total * 100.0 } else { 0.0 },
        })
        .collect();

    Ok(Breakdown { items, total })
}

// ---------------------------------------------------------------------------
// Comparison against other users
// ---------------------------------------------------------------------------

pub struct ComparisonItem {
    pub category: Category,
    pub user_total: f64,
    /// Mean spend of the other users who spent anything in this category.
    pub others_average: f64,
    pub others_count: usize,
}

pub fn compare_with_others<S: TransactionStore>(
    store: &S,
    user_id: &str,
    since: DateTime<Utc>,
) -> Result<Vec<ComparisonItem>> {
    let per_user = spend_by_user(store.all_transactions_since(since)?);

    let items = Category::ALL
        .into_iter()
        .map(|category| {
            let user_total = per_user
                .get(user_id)
                .and_then(|spend| spend.get(&category))
                .copied()
                .unwrap_or(0.0);
            let others: Vec<f64> = per_user
                .iter()
                .filter(|(id, _)| id.as_str() != user_id)
                .filter_map(|(_, spend)| spend.get(&category).copied())
                .collect();
            let others_average = if others.is_empty() {
                0.0
            } else {
                others.iter().sum::<f64>() / others.len() as f64
            };
            ComparisonItem {
                category,
                user_total,
                others_average,
                others_count: others.len(),
            }
        })
        .collect();

    Ok(items)
}

// ---------------------------------------------------------------------------
// Leaderboards
// ---------------------------------------------------------------------------

pub struct EfficiencyEntry {
    pub user_id: String,
    pub username: String,
    pub spending: f64,
    pub allocation: f64,
    /// Spending as a percentage of the allocation. Lower is better.
    pub score: f64,
    pub under_budget: bool,
}

/// Rank users by how much of their default allocation for `category` they
/// used. Users within their allocation come first, then lowest score. Users
/// who spent nothing in the category are left out.
pub fn efficiency_leaderboard<S: TransactionStore>(
    store: &S,
    users: &[User],
    category: Category,
    since: DateTime<Utc>,
) -> Result<Vec<EfficiencyEntry>> {
    let per_user = spend_by_user(store.all_transactions_since(since)?);

    let mut entries: Vec<EfficiencyEntry> = users
        .iter()
        .filter_map(|user| {
            let spending = per_user.get(&user.id)?.get(&category).copied()?;
            let allocation = user.budget * category.default_share();
            let score = if allocation > 0.0 { spending / allocation * 100.0 } else { 100.0 };
            Some(EfficiencyEntry {
                user_id: user.id.clone(),
                username: user.username.clone().unwrap_or_else(|| "Anonymous".to_string()),
                spending,
                allocation,
                score,
                under_budget: spending <= allocation,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        b.under_budget
            .cmp(&a.under_budget)
            .then(a.score.total_cmp(&b.score))
    });
    Ok(entries)
}

pub struct SpenderEntry {
    pub user_id: String,
    /// A currency amount for overall rankings, a percentage for category rankings.
    pub value: f64,
}

/// Rank users by total spending, highest first.
pub fn top_spenders<S: TransactionStore>(store: &S, since: DateTime<Utc>) -> Result<Vec<SpenderEntry>> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for txn in store.all_transactions_since(since)? {
        if counts(&txn) {
            *totals.entry(txn.user_id).or_default() += txn.amount;
        }
    }
    Ok(ranked(totals))
}

/// Rank users by the share of their own spending that went to `category`,
/// highest first. Users who spent nothing there are left out.
pub fn category_share_ranking<S: TransactionStore>(
    store: &S,
    category: Category,
    since: DateTime<Utc>,
) -> Result<Vec<SpenderEntry>> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    let mut in_category: HashMap<String, f64> = HashMap::new();
    for txn in store.all_transactions_since(since)? {
        if !counts(&txn) {
            continue;
        }
        if fixed_category(&txn) == Some(category) {
            *in_category.entry(txn.user_id.clone()).or_default() += txn.amount;
        }
        *totals.entry(txn.user_id).or_default() += txn.amount;
    }

    let shares = in_category
        .into_iter()
        .map(|(user_id, amount)| {
            let total = totals.get(&user_id).copied().unwrap_or(amount);
            (user_id, amount / total * 100.0)
        })
        .collect();
    Ok(ranked(shares))
}

fn ranked(values: HashMap<String, f64>) -> Vec<SpenderEntry> {
    let mut entries: Vec<SpenderEntry> = values
        .into_iter()
        .map(|(user_id, value)| SpenderEntry { user_id, value })
        .collect();
    entries.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.user_id.cmp(&b.user_id)));
    entries
}

// ---------------------------------------------------------------------------
// Recent transactions
// ---------------------------------------------------------------------------

/// The user's transactions since `since`, newest first.
pub fn recent_transactions<S: TransactionStore>(
    store: &S,
    user_id: &str,
    since: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<Transaction>> {
    let mut txns = store.transactions_since(user_id, since)?;
    txns.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
    txns.truncate(limit);
    Ok(txns)
}
