//! Database layer for physio-ledger.

mod schema;
mod invoices;
mod patients;
mod references;
mod sessions;
mod settings;
mod therapy_types;

pub use schema::*;
#[allow(unused_imports)]
pub use invoices::*;
#[allow(unused_imports)]
pub use sessions::*;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::config::LedgerConfig;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Invalid stored value: {0}")]
    InvalidValue(String),

    #[error("Concurrent modification: {0}")]
    Conflict(String),
}

impl From<rust_decimal::Error> for DbError {
    fn from(e: rust_decimal::Error) -> Self {
        DbError::InvalidValue(e.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize(LedgerConfig::default().busy_timeout())?;
        Ok(db)
    }

    /// Open the database named by a [`LedgerConfig`], applying its busy timeout.
    pub fn open_with_config(config: &LedgerConfig) -> DbResult<Self> {
        let conn = Connection::open(&config.database_path)?;
        let db = Self { conn };
        db.initialize(config.busy_timeout())?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize(LedgerConfig::default().busy_timeout())?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self, busy_timeout: Duration) -> DbResult<()> {
        self.conn.busy_timeout(busy_timeout)?;
        let current = self.schema_version().unwrap_or(0);
        if current < SCHEMA_VERSION {
            tracing::info!(from = current, to = SCHEMA_VERSION, "applying schema");
        }
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Highest applied schema version.
    pub fn schema_version(&self) -> DbResult<i64> {
        let version: Option<i64> =
            self.conn
                .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
        Ok(version.unwrap_or(0))
    }

    /// Raw connection, for ad-hoc reporting queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside an IMMEDIATE transaction.
    ///
    /// The write lock is taken before `f` reads anything, so a read-check-write
    /// sequence cannot interleave with another writer. Any error rolls back.
    pub fn with_write_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<DbError>,
    {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(DbError::from)?;
        let value = f(self)?;
        tx.commit().map_err(DbError::from)?;
        Ok(value)
    }
}
