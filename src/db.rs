use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{BudgetError, Result};
use crate::forecaster::OptimizationResult;
use crate::models::{Category, User};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT,
    budget REAL NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    user_id TEXT NOT NULL,
    category TEXT,
    amount REAL NOT NULL,
    timestamp TEXT NOT NULL,
    description TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_transactions_user_time ON transactions (user_id, timestamp);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Timestamps are stored as second-precision RFC 3339 UTC so that text
/// comparison in SQL matches chronological order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn get_user(conn: &Connection, user_id: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, username, budget FROM users WHERE id = ?1",
            [user_id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    budget: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

pub fn require_user(conn: &Connection, user_id: &str) -> Result<User> {
    get_user(conn, user_id)?.ok_or_else(|| BudgetError::UnknownUser(user_id.to_string()))
}

/// Return the user, creating it with `default_budget` when it does not exist yet.
pub fn ensure_user(conn: &Connection, user_id: &str, default_budget: f64) -> Result<User> {
    if let Some(user) = get_user(conn, user_id)? {
        return Ok(user);
    }
    info!(user_id, budget = default_budget, "creating default budget for user");
    conn.execute(
        "INSERT INTO users (id, budget) VALUES (?1, ?2)",
        rusqlite::params![user_id, default_budget],
    )?;
    require_user(conn, user_id)
}

pub fn add_user(conn: &Connection, user_id: &str, username: Option<&str>, budget: f64) -> Result<User> {
    validate_budget(budget)?;
    if user_id.trim().is_empty() {
        return Err(BudgetError::Other("user id must not be empty".to_string()));
    }
    conn.execute(
        "INSERT INTO users (id, username, budget) VALUES (?1, ?2, ?3)",
        rusqlite::params![user_id, username, budget],
    )?;
    require_user(conn, user_id)
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare("SELECT id, username, budget FROM users ORDER BY id")?;
    let users = stmt
        .query_map([], |row| {
            Ok(User {
                id: row.get(0)?,
                username: row.get(1)?,
                budget: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(users)
}

pub fn set_budget(conn: &Connection, user_id: &str, budget: f64) -> Result<()> {
    validate_budget(budget)?;
    let updated = conn.execute(
        "UPDATE users SET budget = ?1 WHERE id = ?2",
        rusqlite::params![budget, user_id],
    )?;
    if updated == 0 {
        return Err(BudgetError::UnknownUser(user_id.to_string()));
    }
    debug!(user_id, budget, "budget updated");
    Ok(())
}

fn validate_budget(budget: f64) -> Result<()> {
    if !budget.is_finite() || budget < 0.0 {
        return Err(BudgetError::InvalidAmount(format!(
            "budget must be a non-negative number, got {budget}"
        )));
    }
    Ok(())
}

/// Record a spending transaction for `user_id`, creating the user first if needed.
/// Returns the new row id.
pub fn add_transaction(
    conn: &Connection,
    user_id: &str,
    category: &str,
    amount: f64,
    timestamp: DateTime<Utc>,
    description: Option<&str>,
    default_budget: f64,
) -> Result<i64> {
    let category =
        Category::parse(category).ok_or_else(|| BudgetError::UnknownCategory(category.to_string()))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(BudgetError::InvalidAmount(format!(
            "transaction amount must be greater than zero, got {amount}"
        )));
    }
    let description = description
        .map(str::to_string)
        .unwrap_or_else(|| format!("{category} expense"));

    let tx = conn.unchecked_transaction()?;
    ensure_user(&tx, user_id, default_budget)?;
    tx.execute(
        "INSERT INTO transactions (user_id, category, amount, timestamp, description) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            user_id,
            category.as_str(),
            amount,
            format_timestamp(timestamp),
            description
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;
    debug!(user_id, %category, amount, id, "transaction recorded");
    Ok(id)
}

/// Persist the suggested budget of an optimization result as the user's new
/// budget. Returns the applied amount, or `None` when there was nothing to apply.
pub fn apply_suggestion(conn: &Connection, user_id: &str, result: &OptimizationResult) -> Result<Option<f64>> {
    let suggested = match (result.needs_optimization, result.suggested_budget) {
        (true, Some(suggested)) => suggested,
        _ => return Ok(None),
    };
    set_budget(conn, user_id, suggested)?;
    info!(user_id, budget = suggested, "applied suggested budget");
    Ok(Some(suggested))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["users", "transactions"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_ensure_user_creates_once() {
        let (_dir, conn) = test_db();
        let user = ensure_user(&conn, "alice", 2000.0).unwrap();
        assert_eq!(user.budget, 2000.0);
        set_budget(&conn, "alice", 1500.0).unwrap();
        let again = ensure_user(&conn, "alice", 2000.0).unwrap();
        assert_eq!(again.budget, 1500.0);
    }

    #[test]
    fn test_set_budget_unknown_user() {
        let (_dir, conn) = test_db();
        let err = set_budget(&conn, "ghost", 100.0).unwrap_err();
        assert!(matches!(err, BudgetError::UnknownUser(_)));
    }

    #[test]
    fn test_set_budget_rejects_nan_and_negative() {
        let (_dir, conn) = test_db();
        ensure_user(&conn, "alice", 2000.0).unwrap();
        assert!(matches!(set_budget(&conn, "alice", f64::NAN), Err(BudgetError::InvalidAmount(_))));
        assert!(matches!(set_budget(&conn, "alice", -1.0), Err(BudgetError::InvalidAmount(_))));
    }

    #[test]
    fn test_add_transaction_stores_canonical_category() {
        let (_dir, conn) = test_db();
        let ts = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        add_transaction(&conn, "alice", "food", 12.5, ts, None, 2000.0).unwrap();
        let (category, stamp, description): (String, String, String) = conn
            .query_row(
                "SELECT category, timestamp, description FROM transactions",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(category, "Food");
        assert_eq!(stamp, "2026-10-18T09:30:00Z");
        assert_eq!(description, "Food expense");
        assert!(get_user(&conn, "alice").unwrap().is_some());
    }

    #[test]
    fn test_add_transaction_rejects_bad_input() {
        let (_dir, conn) = test_db();
        let ts = Utc::now();
        assert!(matches!(
            add_transaction(&conn, "alice", "Gadgets", 10.0, ts, None, 2000.0),
            Err(BudgetError::UnknownCategory(_))
        ));
        assert!(matches!(
            add_transaction(&conn, "alice", "Food", 0.0, ts, None, 2000.0),
            Err(BudgetError::InvalidAmount(_))
        ));
        let count: i64 = conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_apply_suggestion() {
        let (_dir, conn) = test_db();
        ensure_user(&conn, "alice", 2000.0).unwrap();

        let nothing = apply_suggestion(&conn, "alice", &OptimizationResult::unchanged(2000.0)).unwrap();
        assert_eq!(nothing, None);
        assert_eq!(require_user(&conn, "alice").unwrap().budget, 2000.0);

        let result = OptimizationResult {
            suggested_budget: Some(1100.0),
            recommendations: Some(vec![]),
            needs_optimization: true,
            ..OptimizationResult::unchanged(2000.0)
        };
        assert_eq!(apply_suggestion(&conn, "alice", &result).unwrap(), Some(1100.0));
        assert_eq!(require_user(&conn, "alice").unwrap().budget, 1100.0);
    }

    #[test]
    fn test_timestamp_roundtrip_is_sortable() {
        let early = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 11, 2, 3, 4, 5).unwrap();
        assert!(format_timestamp(early) < format_timestamp(late));
        assert_eq!(parse_timestamp(&format_timestamp(early)), Some(early));
    }
}
