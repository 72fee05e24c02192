use crate::db::get_connection;
use crate::error::Result;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    println!("Currency:   {}", settings.currency_symbol);

    if db_path.exists() {
        let conn = get_connection(&db_path)?;
        let users: i64 = conn.query_row("SELECT count(*) FROM users", [], |r| r.get(0))?;
        let transactions: i64 = conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))?;

        println!();
        println!("Users:         {users}");
        println!("Transactions:  {transactions}");
    } else {
        println!();
        println!("Database not found. Run `budgetbattles init` to set up.");
    }

    Ok(())
}
