use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;

use crate::db::{format_timestamp, parse_timestamp};
use crate::error::{BudgetError, Result};
use crate::models::Transaction;

/// Read access to recorded transactions. The forecaster and reports only
/// ever see this trait, never a concrete database.
pub trait TransactionStore {
    /// Transactions belonging to `user_id` with `timestamp >= since`.
    fn transactions_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<Transaction>>;

    /// Transactions of every user with `timestamp >= since`.
    fn all_transactions_since(&self, since: DateTime<Utc>) -> Result<Vec<Transaction>>;
}

/// Start of the trailing window of `days` days that ends at `now`.
pub fn window_start(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    Duration::try_days(days)
        .and_then(|d| now.checked_sub_signed(d))
        .ok_or_else(|| BudgetError::Other(format!("a window of {days} days is out of range")))
}

pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn query(&self, sql: &str, params: &[&dyn rusqlite::types::ToSql]) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(sql).map_err(retrieval)?;
        let raw: Vec<(i64, String, Option<String>, f64, String, Option<String>)> = stmt
            .query_map(params, |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })
            .map_err(retrieval)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(retrieval)?;

        raw.into_iter()
            .map(|(id, user_id, category, amount, stamp, description)| {
                let timestamp = parse_timestamp(&stamp).ok_or_else(|| {
                    BudgetError::Retrieval(format!("transaction {id} has invalid timestamp '{stamp}'"))
                })?;
                Ok(Transaction {
                    id: Some(id),
                    user_id,
                    category,
                    amount,
                    timestamp,
                    description,
                })
            })
            .collect()
    }
}

fn retrieval(e: rusqlite::Error) -> BudgetError {
    BudgetError::Retrieval(e.to_string())
}

impl TransactionStore for SqliteStore<'_> {
    fn transactions_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<Transaction>> {
        let since = format_timestamp(since);
        self.query(
            "SELECT id, user_id, category, amount, timestamp, description FROM transactions \
             WHERE user_id = ?1 AND timestamp >= ?2 ORDER BY timestamp, id",
            rusqlite::params![user_id, since],
        )
    }

    fn all_transactions_since(&self, since: DateTime<Utc>) -> Result<Vec<Transaction>> {
        let since = format_timestamp(since);
        self.query(
            "SELECT id, user_id, category, amount, timestamp, description FROM transactions \
             WHERE timestamp >= ?1 ORDER BY timestamp, id",
            rusqlite::params![since],
        )
    }
}
