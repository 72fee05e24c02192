use std::collections::HashMap;

use chrono::Utc;
use colored::Colorize;
use comfy_table::{Cell, Table};

use super::open_db;
use crate::db::list_users;
use crate::error::{BudgetError, Result};
use crate::fmt::money;
use crate::models::Category;
use crate::reports;
use crate::settings::load_settings;
use crate::store::{window_start, SqliteStore};

const TOP_SPENDERS: usize = 10;
const TOP_EFFICIENT: usize = 5;

pub fn breakdown(user: &str, days: u32) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let since = window_start(Utc::now(), i64::from(days))?;
    let data = reports::category_breakdown(&SqliteStore::new(&conn), user, since)?;
    let currency = settings.currency_symbol.as_str();

    let mut table = Table::new();
    table.set_header(vec!["Category", "Amount", "%"]);
    for item in &data.items {
        table.add_row(vec![
            Cell::new(&item.category),
            Cell::new(money(item.total, currency)),
            Cell::new(format!("{:.1}%", item.pct)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(data.total, currency)),
        Cell::new(""),
    ]);
    println!("Spending Breakdown for {user} (last {days} days)\n{table}");
    Ok(())
}

pub fn compare(user: &str, days: u32) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let since = window_start(Utc::now(), i64::from(days))?;
    let items = reports::compare_with_others(&SqliteStore::new(&conn), user, since)?;
    let currency = settings.currency_symbol.as_str();

    let mut table = Table::new();
    table.set_header(vec!["Category", "You", "Others (avg)", "Others", ""]);
    for item in &items {
        let verdict = if item.others_count == 0 {
            "".normal()
        } else if item.user_total > item.others_average {
            "above".red()
        } else {
            "below".green()
        };
        table.add_row(vec![
            Cell::new(item.category),
            Cell::new(money(item.user_total, currency)),
            Cell::new(money(item.others_average, currency)),
            Cell::new(item.others_count),
            Cell::new(verdict),
        ]);
    }
    println!("Spending vs Other Users (last {days} days)\n{table}");
    Ok(())
}

pub fn leaderboard(category: Option<&str>, days: u32) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let since = window_start(Utc::now(), i64::from(days))?;
    let store = SqliteStore::new(&conn);
    let currency = settings.currency_symbol.as_str();
    let users = list_users(&conn)?;
    let names: HashMap<&str, &str> = users
        .iter()
        .filter_map(|u| u.username.as_deref().map(|name| (u.id.as_str(), name)))
        .collect();
    let display = |id: &str| names.get(id).copied().unwrap_or(id).to_string();

    let category = match category {
        Some(raw) => Some(Category::parse(raw).ok_or_else(|| BudgetError::UnknownCategory(raw.to_string()))?),
        None => None,
    };

    let Some(category) = category else {
        let mut table = Table::new();
        table.set_header(vec!["#", "User", "Spent"]);
        for (rank, entry) in reports::top_spenders(&store, since)?.iter().take(TOP_SPENDERS).enumerate() {
            table.add_row(vec![
                Cell::new(rank + 1),
                Cell::new(display(&entry.user_id)),
                Cell::new(money(entry.value, currency)),
            ]);
        }
        println!("Top Spenders (last {days} days)\n{table}");
        return Ok(());
    };

    let mut table = Table::new();
    table.set_header(vec!["#", "User", "Share of Spending"]);
    for (rank, entry) in reports::category_share_ranking(&store, category, since)?
        .iter()
        .take(TOP_SPENDERS)
        .enumerate()
    {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(display(&entry.user_id)),
            Cell::new(format!("{:.2}%", entry.value)),
        ]);
    }
    println!("Top Spenders: {category} (last {days} days)\n{table}\n");

    let mut table = Table::new();
    table.set_header(vec!["#", "User", "Spent", "Allocation", "Used", ""]);
    for (rank, entry) in reports::efficiency_leaderboard(&store, &users, category, since)?
        .iter()
        .take(TOP_EFFICIENT)
        .enumerate()
    {
        let status = if entry.under_budget {
            "under".green()
        } else {
            "over".red()
        };
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&entry.username),
            Cell::new(money(entry.spending, currency)),
            Cell::new(money(entry.allocation, currency)),
            Cell::new(format!("{:.1}%", entry.score)),
            Cell::new(status),
        ]);
    }
    println!("Budget Efficiency: {category}\n{table}");
    Ok(())
}

pub fn recent(user: &str, days: u32, limit: usize) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let since = window_start(Utc::now(), i64::from(days))?;
    let txns = reports::recent_transactions(&SqliteStore::new(&conn), user, since, limit)?;

    if txns.is_empty() {
        println!("No transactions for {user} in the last {days} days.");
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Category", "Amount", "Description"]);
    for txn in &txns {
        table.add_row(vec![
            Cell::new(txn.id.map(|id| id.to_string()).unwrap_or_default()),
            Cell::new(txn.timestamp.format("%Y-%m-%d %H:%M")),
            Cell::new(txn.category.as_deref().unwrap_or("")),
            Cell::new(money(txn.amount, &settings.currency_symbol)),
            Cell::new(txn.description.as_deref().unwrap_or("")),
        ]);
    }
    println!("Recent Transactions for {user}\n{table}");
    Ok(())
}
