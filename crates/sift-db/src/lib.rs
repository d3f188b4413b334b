//! # sift-db
//!
//! libSQL storage for the Sift screening workflow.
//!
//! Holds projects, criteria, articles, the append-only screening decision log
//! and the audit trail. Every workflow mutation (recording a decision, opening
//! screening, attaching full text, stamping an AI check) runs as one
//! transaction on [`service::SiftService`], so a decision and the article
//! transition it causes commit or roll back together.
//!
//! Uses the `libsql` crate (C `SQLite` fork) in local mode.

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod retry;
pub mod service;
pub mod updates;

#[cfg(test)]
pub(crate) mod test_support;

use error::DatabaseError;
use libsql::params::IntoParams;
use libsql::{Builder, TransactionBehavior};
use retry::{RetryConfig, is_busy_error};

/// Central database handle for all Sift state operations.
///
/// Wraps a libSQL database with a write connection and a read connection.
/// Write units run on the former; [`Self::query_with`] runs on the latter, so
/// reads only ever see committed state. A `:memory:` database cannot be shared
/// between connections, so there both roles use the same one.
///
/// Statement helpers retry busy/locked errors according to the configured
/// [`RetryConfig`].
pub struct SiftDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    reader: libsql::Connection,
    retry: RetryConfig,
}

impl SiftDb {
    /// Open a local database at the given path (`":memory:"` for tests).
    ///
    /// Runs migrations automatically on first open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let in_memory = path == ":memory:";
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;
        set_busy_timeout(&conn).await?;
        if !in_memory {
            // WAL lets the read connection keep reading while a unit is open.
            conn.query("PRAGMA journal_mode = WAL", ())
                .await
                .map_err(|e| DatabaseError::Migration(format!("PRAGMA journal_mode: {e}")))?;
        }

        let mut sift_db = Self {
            db,
            reader: conn.clone(),
            conn,
            retry: RetryConfig::default(),
        };
        sift_db.run_migrations().await?;
        if !in_memory {
            let reader = sift_db.db.connect()?;
            set_busy_timeout(&reader).await?;
            sift_db.reader = reader;
        }
        tracing::debug!(path, in_memory, "opened sift database");
        Ok(sift_db)
    }

    /// Replace the busy/locked retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Access the underlying write connection for direct statements.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Connection for reads outside a write unit. Never sees uncommitted
    /// writes of a file-backed database.
    #[must_use]
    pub const fn reader(&self) -> &libsql::Connection {
        &self.reader
    }

    /// Execute a statement, retrying while the database is busy.
    ///
    /// `params` is called once per attempt so parameter values can be rebuilt.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::ConcurrencyConflict` once the retry budget is
    /// spent, or the underlying error for anything that is not lock contention.
    pub async fn execute_with<P, F>(&self, sql: &str, params: F) -> Result<u64, DatabaseError>
    where
        P: IntoParams,
        F: Fn() -> P,
    {
        let mut attempt = 0;
        loop {
            match self.conn.execute(sql, params()).await {
                Ok(changed) => return Ok(changed),
                Err(error) if is_busy_error(&error) => {
                    attempt += 1;
                    self.backoff_or_fail(attempt, &error).await?;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Run a query on the read connection, retrying while the database is
    /// busy.
    ///
    /// # Errors
    ///
    /// Same as [`Self::execute_with`].
    pub async fn query_with<P, F>(&self, sql: &str, params: F) -> Result<libsql::Rows, DatabaseError>
    where
        P: IntoParams,
        F: Fn() -> P,
    {
        let mut attempt = 0;
        loop {
            match self.reader.query(sql, params()).await {
                Ok(rows) => return Ok(rows),
                Err(error) if is_busy_error(&error) => {
                    attempt += 1;
                    self.backoff_or_fail(attempt, &error).await?;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Begin an `IMMEDIATE` transaction, so the write lock is taken up front
    /// and contention shows up here rather than halfway through the unit.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::ConcurrencyConflict` when the lock cannot be
    /// acquired within the retry budget.
    pub async fn begin_write(&self) -> Result<libsql::Transaction, DatabaseError> {
        let mut attempt = 0;
        loop {
            match self
                .conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .await
            {
                Ok(tx) => return Ok(tx),
                Err(error) if is_busy_error(&error) => {
                    attempt += 1;
                    self.backoff_or_fail(attempt, &error).await?;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    async fn backoff_or_fail(&self, attempt: u32, error: &libsql::Error) -> Result<(), DatabaseError> {
        if attempt >= self.retry.max_attempts {
            return Err(DatabaseError::ConcurrencyConflict(format!(
                "database busy after {attempt} attempts: {error}"
            )));
        }
        let delay = self.retry.delay_for(attempt - 1);
        tracing::warn!(attempt, ?delay, %error, "database busy, retrying");
        tokio::time::sleep(delay).await;
        Ok(())
    }
}

async fn set_busy_timeout(conn: &libsql::Connection) -> Result<(), DatabaseError> {
    conn.query("PRAGMA busy_timeout = 250", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("PRAGMA busy_timeout: {e}")))?;
    Ok(())
}
