//! Therapy package balance engine.
//!
//! Four parts share one [`Ledger`] handle:
//!
//! - [`totals`]: invoice aggregation and payment recording
//! - [`entitlement`]: remaining therapy days per (patient, therapy type)
//! - [`dues`]: due-amount roll-ups for dashboards
//! - [`sessions`]: scheduling that consumes entitlement
//!
//! Balances are always derived from invoices and session records on demand;
//! nothing here stores a balance.

pub mod dues;
pub mod entitlement;
pub mod sessions;
pub mod totals;

pub use dues::*;
pub use entitlement::*;
pub use totals::*;

use thiserror::Error;

use crate::config::LedgerConfig;
use crate::db::{Database, DbError};

/// Ledger errors. Every variant carries a message fit for the end user.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid payment: {0}")]
    InvalidPayment(String),

    #[error("No remaining entitlement: {0}")]
    NoEntitlement(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    #[error("Data access error: {0}")]
    DataAccess(#[source] DbError),
}

impl From<DbError> for LedgerError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Conflict(message) => LedgerError::ConcurrentModification(message),
            other => LedgerError::DataAccess(other),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Entry point for all ledger operations over one database.
pub struct Ledger<'a> {
    db: &'a Database,
    top_due_limit: usize,
}

impl<'a> Ledger<'a> {
    /// Create a ledger with default settings.
    pub fn new(db: &'a Database) -> Self {
        Self::with_config(db, &LedgerConfig::default())
    }

    /// Create a ledger using values from a [`LedgerConfig`].
    pub fn with_config(db: &'a Database, config: &LedgerConfig) -> Self {
        Self {
            db,
            top_due_limit: config.top_due_limit,
        }
    }

    /// Underlying database.
    pub fn db(&self) -> &'a Database {
        self.db
    }
}
