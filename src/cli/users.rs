use comfy_table::{Cell, Table};

use super::open_db;
use crate::db;
use crate::error::Result;
use crate::fmt::money;
use crate::settings::load_settings;

pub fn add(id: &str, username: Option<&str>, budget: Option<f64>) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let user = db::add_user(&conn, id, username, budget.unwrap_or(settings.default_budget))?;
    println!(
        "Added user: {} (budget {})",
        user.id,
        money(user.budget, &settings.currency_symbol)
    );
    Ok(())
}

pub fn list() -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let users = db::list_users(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Username", "Monthly Budget"]);
    for user in users {
        table.add_row(vec![
            Cell::new(user.id),
            Cell::new(user.username.unwrap_or_default()),
            Cell::new(money(user.budget, &settings.currency_symbol)),
        ]);
    }
    println!("Users\n{table}");
    Ok(())
}

pub fn budget(id: &str, amount: f64) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    db::set_budget(&conn, id, amount)?;
    println!("Budget for {id} set to {}", money(amount, &settings.currency_symbol));
    Ok(())
}
