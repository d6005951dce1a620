//! Database layer: SQLite document store for layouts, reports and history.

mod schema;
mod blobs;
mod history;
mod layouts;
mod reports;
mod users;

pub use schema::*;
pub use blobs::*;
#[allow(unused_imports)]
pub use history::*;
#[allow(unused_imports)]
pub use layouts::*;
pub use reports::*;
#[allow(unused_imports)]
pub use users::*;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Handle to the valuation document store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the store at `path` and apply the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// In-memory store, used by tests and previews.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Underlying connection, for queries the store does not wrap.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a write transaction that takes the write lock up front.
    ///
    /// Every `Database` method called while the returned transaction is alive
    /// runs inside it; dropping it without `commit()` rolls everything back.
    pub fn immediate_transaction(&self) -> DbResult<Transaction<'_>> {
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_open_file_reopens_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("valuation.db");

        {
            let db = Database::open(&path).unwrap();
            db.conn()
                .execute(
                    "INSERT INTO authorized_users (email_key, email, branch) VALUES ('a_b_c', 'a@b.c', 'CDH')",
                    [],
                )
                .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM authorized_users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        // Check that tables exist
        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"layouts".to_string()));
        assert!(tables.contains(&"layout_config".to_string()));
        assert!(tables.contains(&"reports".to_string()));
        assert!(tables.contains(&"report_history".to_string()));
        assert!(tables.contains(&"authorized_users".to_string()));
        assert!(tables.contains(&"blobs".to_string()));
    }

    #[test]
    fn test_uncommitted_transaction_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        {
            let _tx = db.immediate_transaction().unwrap();
            db.conn()
                .execute(
                    "INSERT INTO authorized_users (email_key, email, branch) VALUES ('x', 'x', 'CDH')",
                    [],
                )
                .unwrap();
        }

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM authorized_users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
