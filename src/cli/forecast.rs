use chrono::Utc;
use colored::Colorize;
use comfy_table::{Cell, Table};
use rusqlite::Connection;

use super::open_db;
use crate::alerts::{derive_alerts, Alert, AlertKind};
use crate::db::{apply_suggestion, require_user};
use crate::error::{BudgetError, Result};
use crate::fmt::money;
use crate::forecaster::{BudgetForecaster, Forecast};
use crate::settings::load_settings;
use crate::store::SqliteStore;

fn resolve_budget(conn: &Connection, user: &str, budget: Option<f64>) -> Result<f64> {
    match budget {
        Some(b) => Ok(b),
        None => Ok(require_user(conn, user)?.budget),
    }
}

fn print_alerts(alerts: &[Alert]) {
    for alert in alerts {
        let label = match alert.kind {
            AlertKind::Warning => "warning".yellow().bold(),
            AlertKind::Info => "info".cyan().bold(),
        };
        println!("[{label}] {}", alert.message);
    }
}

pub fn run(user: &str, budget: Option<f64>, json: bool) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let current = resolve_budget(&conn, user, budget)?;
    let forecaster = BudgetForecaster::new(SqliteStore::new(&conn), settings.forecast.clone());
    let Forecast { weekly, result } = forecaster.forecast_at(user, current, Utc::now());
    let currency = settings.currency_symbol.as_str();

    if json {
        let out = serde_json::to_string_pretty(&result).map_err(|e| BudgetError::Other(e.to_string()))?;
        println!("{out}");
        return Ok(());
    }

    if let Some(err) = &result.error {
        println!("{} {err}", "Forecast unavailable:".yellow().bold());
        return Ok(());
    }

    if let Some(weekly) = &weekly {
        let monthly = forecaster.project(weekly);
        let mut table = Table::new();
        table.set_header(vec![
            "Category".to_string(),
            format!("Last {} Days", forecaster.config().lookback_days),
            "Projected Month".to_string(),
        ]);
        for (category, week) in weekly.iter() {
            table.add_row(vec![
                Cell::new(category),
                Cell::new(money(week, currency)),
                Cell::new(money(monthly.get(category).unwrap_or(0.0), currency)),
            ]);
        }
        table.add_row(vec![
            Cell::new("Total".bold()),
            Cell::new(money(weekly.total(), currency)),
            Cell::new(money(monthly.total(), currency)),
        ]);
        println!("Spending Forecast for {user}\n{table}");
    }
    println!("Current budget:   {}", money(result.current_budget, currency));

    match (&result.recommendations, result.suggested_budget) {
        (Some(recommendations), Some(suggested)) if result.needs_optimization => {
            println!("Suggested budget: {}", money(suggested, currency).as_str().bold());
            let mut rtable = Table::new();
            rtable.set_header(vec!["Category", "Projected", "Suggested", "%"]);
            for rec in recommendations {
                rtable.add_row(vec![
                    Cell::new(&rec.category),
                    Cell::new(money(rec.current_spending, currency)),
                    Cell::new(money(rec.suggested_allocation, currency)),
                    Cell::new(format!("{:.1}%", rec.percentage_of_budget)),
                ]);
            }
            println!("\nRecommendations\n{rtable}\n");
            print_alerts(&derive_alerts(&result, forecaster.config().overspend_factor, currency));
        }
        _ => println!("{}", "Budget is on track.".green()),
    }
    Ok(())
}

pub fn alerts(user: &str, budget: Option<f64>) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let current = resolve_budget(&conn, user, budget)?;
    let forecaster = BudgetForecaster::new(SqliteStore::new(&conn), settings.forecast.clone());
    let result = forecaster.optimize(user, current);

    if let Some(err) = &result.error {
        println!("{} {err}", "Forecast unavailable:".yellow().bold());
        return Ok(());
    }
    let alerts = derive_alerts(
        &result,
        settings.forecast.overspend_factor,
        &settings.currency_symbol,
    );
    if alerts.is_empty() {
        println!("No alerts.");
    } else {
        print_alerts(&alerts);
    }
    Ok(())
}

pub fn optimize(user: &str) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let current = require_user(&conn, user)?.budget;
    let result = BudgetForecaster::new(SqliteStore::new(&conn), settings.forecast.clone())
        .optimize(user, current);

    if let Some(err) = &result.error {
        return Err(BudgetError::Other(err.clone()));
    }
    match apply_suggestion(&conn, user, &result)? {
        Some(applied) => println!(
            "Budget optimized! New budget: {}",
            money(applied, &settings.currency_symbol)
        ),
        None => println!(
            "Budget of {} is already in line with your spending.",
            money(current, &settings.currency_symbol)
        ),
    }
    Ok(())
}
