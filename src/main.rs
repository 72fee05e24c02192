mod alerts;
mod cli;
mod db;
mod error;
mod fmt;
mod forecaster;
mod models;
mod reports;
mod settings;
mod store;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ReportCommands, UsersCommands};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("budgetbattles=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Users { command } => match command {
            UsersCommands::Add {
                id,
                username,
                budget,
            } => cli::users::add(&id, username.as_deref(), budget),
            UsersCommands::List => cli::users::list(),
            UsersCommands::Budget { id, amount } => cli::users::budget(&id, amount),
        },
        Commands::Add {
            user,
            category,
            amount,
            description,
            days_ago,
        } => cli::add::run(&user, &category, amount, description.as_deref(), days_ago),
        Commands::Forecast { user, budget, json } => cli::forecast::run(&user, budget, json),
        Commands::Alerts { user, budget } => cli::forecast::alerts(&user, budget),
        Commands::Optimize { user } => cli::forecast::optimize(&user),
        Commands::Report { command } => match command {
            ReportCommands::Breakdown { user, days } => cli::report::breakdown(&user, days),
            ReportCommands::Compare { user, days } => cli::report::compare(&user, days),
            ReportCommands::Leaderboard { category, days } => {
                cli::report::leaderboard(category.as_deref(), days)
            }
            ReportCommands::Recent { user, days, limit } => cli::report::recent(&user, days, limit),
        },
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
