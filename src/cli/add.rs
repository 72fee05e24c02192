use chrono::Utc;

use super::open_db;
use crate::db::add_transaction;
use crate::error::Result;
use crate::fmt::money;
use crate::settings::load_settings;
use crate::store::window_start;

pub fn run(user: &str, category: &str, amount: f64, description: Option<&str>, days_ago: u32) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let timestamp = window_start(Utc::now(), i64::from(days_ago))?;
    add_transaction(
        &conn,
        user,
        category,
        amount,
        timestamp,
        description,
        settings.default_budget,
    )?;
    println!(
        "Recorded {} for {user} on {}",
        money(amount, &settings.currency_symbol),
        timestamp.format("%Y-%m-%d")
    );
    Ok(())
}
