pub mod add;
pub mod forecast;
pub mod init;
pub mod report;
pub mod status;
pub mod users;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::get_connection;
use crate::error::{BudgetError, Result};
use crate::settings::Settings;

/// Longest trailing window, in days, a command accepts.
const MAX_DAYS: i64 = 36_500;

/// Open the configured database, refusing to create one implicitly.
pub(crate) fn open_db(settings: &Settings) -> Result<Connection> {
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(BudgetError::Settings(format!(
            "No database found at {}\nRun `budgetbattles init` to create one.",
            db_path.display()
        )));
    }
    get_connection(&db_path)
}

#[derive(Parser)]
#[command(
    name = "budgetbattles",
    version,
    about = "Track spending, forecast your monthly budget, and see how you compare."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for data (default: ~/Documents/budgetbattles)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage users and their monthly budgets.
    Users {
        #[command(subcommand)]
        command: UsersCommands,
    },
    /// Record a spending transaction.
    Add {
        /// User ID
        user: String,
        /// Housing, Transportation, Food, Utilities, Entertainment, Savings, Personal or Other
        category: String,
        /// Amount spent (must be greater than zero)
        amount: f64,
        /// Free-form description (default: "<Category> expense")
        #[arg(long)]
        description: Option<String>,
        /// Backdate the transaction by this many days
        #[arg(long = "days-ago", default_value = "0", value_parser = clap::value_parser!(u32).range(0..=MAX_DAYS))]
        days_ago: u32,
    },
    /// Project monthly spending from the last week and compare it to the budget.
    Forecast {
        /// User ID
        user: String,
        /// Monthly budget to compare against (default: the user's stored budget)
        #[arg(long, allow_negative_numbers = true)]
        budget: Option<f64>,
        /// Print the optimization result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show budget alerts derived from the forecast.
    Alerts {
        /// User ID
        user: String,
        /// Monthly budget to compare against (default: the user's stored budget)
        #[arg(long, allow_negative_numbers = true)]
        budget: Option<f64>,
    },
    /// Replace the user's stored budget with the suggested one, if any.
    Optimize {
        /// User ID
        user: String,
    },
    /// Spending reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Show current database and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum UsersCommands {
    /// Add a user.
    Add {
        /// User ID
        id: String,
        /// Display name
        #[arg(long)]
        username: Option<String>,
        /// Monthly budget (default from settings)
        #[arg(long)]
        budget: Option<f64>,
    },
    /// List all users.
    List,
    /// Set a user's monthly budget.
    Budget {
        /// User ID
        id: String,
        /// New monthly budget
        amount: f64,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Spending per category.
    Breakdown {
        /// User ID
        user: String,
        /// Number of trailing days to include
        #[arg(long, default_value = "30", value_parser = clap::value_parser!(u32).range(1..=MAX_DAYS))]
        days: u32,
    },
    /// Spending per category compared with the average of other users.
    Compare {
        /// User ID
        user: String,
        /// Number of trailing days to include
        #[arg(long, default_value = "30", value_parser = clap::value_parser!(u32).range(1..=MAX_DAYS))]
        days: u32,
    },
    /// Rank users by spending, or by share and budget efficiency in one category.
    Leaderboard {
        /// Category to rank (default: total spending across all categories)
        #[arg(long)]
        category: Option<String>,
        /// Number of trailing days to include
        #[arg(long, default_value = "30", value_parser = clap::value_parser!(u32).range(1..=MAX_DAYS))]
        days: u32,
    },
    /// A user's most recent transactions.
    Recent {
        /// User ID
        user: String,
        /// Number of trailing days to include
        #[arg(long, default_value = "30", value_parser = clap::value_parser!(u32).range(1..=MAX_DAYS))]
        days: u32,
        /// Maximum number of transactions to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}
