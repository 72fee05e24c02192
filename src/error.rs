use thiserror::Error;

#[derive(Error, Debug)]
pub enum BudgetError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to retrieve transactions: {0}")]
    Retrieval(String),

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BudgetError>;
