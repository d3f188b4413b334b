//! Service layer orchestrating workflow mutations with the audit trail.
//!
//! `SiftService` wraps `SiftDb` and serializes write units. All repo methods
//! are implemented as `impl SiftService` in [`crate::repos`].

use std::ops::Deref;

use sift_core::enums::UncertainPolicy;
use tokio::sync::{Mutex, MutexGuard};

use crate::SiftDb;
use crate::error::DatabaseError;
use crate::retry::RetryConfig;

/// Orchestrates database mutations with audit trail.
///
/// Every mutation method follows this protocol:
/// 1. Take the write gate and begin an `IMMEDIATE` transaction
/// 2. Re-read the rows being changed inside the transaction
/// 3. Execute SQL
/// 4. Append audit entries (inside transaction)
/// 5. Commit, or roll back on any error
///
/// The gate serializes write units issued through this service; the
/// `IMMEDIATE` transaction serializes them against other processes.
pub struct SiftService {
    db: SiftDb,
    write_gate: Mutex<()>,
    uncertain_policy: UncertainPolicy,
}

impl SiftService {
    /// Create a new service wrapping a local database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(
        db_path: &str,
        uncertain_policy: UncertainPolicy,
        busy_retries: u32,
    ) -> Result<Self, DatabaseError> {
        let db = SiftDb::open_local(db_path)
            .await?
            .with_retry(RetryConfig::default().with_max_attempts(busy_retries));
        Ok(Self::from_db(db, uncertain_policy))
    }

    /// Create from an existing `SiftDb` (for testing).
    #[must_use]
    pub fn from_db(db: SiftDb, uncertain_policy: UncertainPolicy) -> Self {
        Self {
            db,
            write_gate: Mutex::new(()),
            uncertain_policy,
        }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &SiftDb {
        &self.db
    }

    /// Policy applied by next-article selection to uncertain-only articles.
    #[must_use]
    pub const fn uncertain_policy(&self) -> UncertainPolicy {
        self.uncertain_policy
    }

    /// Start a serialized write unit.
    pub(crate) async fn begin_unit(&self) -> Result<WriteUnit<'_>, DatabaseError> {
        let gate = self.write_gate.lock().await;
        let tx = self.db.begin_write().await?;
        Ok(WriteUnit { _gate: gate, tx })
    }
}

/// An open transaction holding the service's write gate.
///
/// Derefs to the transaction's connection so the `*_in` repo helpers can run
/// statements inside it.
pub(crate) struct WriteUnit<'a> {
    _gate: MutexGuard<'a, ()>,
    tx: libsql::Transaction,
}

impl WriteUnit<'_> {
    /// Commit on `Ok`, roll back on `Err`, and hand the result through.
    pub(crate) async fn finish<T>(
        self,
        result: Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        match result {
            Ok(value) => {
                self.tx.commit().await?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback_error) = self.tx.rollback().await {
                    tracing::warn!(%rollback_error, "rollback failed after {error}");
                }
                Err(error)
            }
        }
    }
}

impl Deref for WriteUnit<'_> {
    type Target = libsql::Connection;

    fn deref(&self) -> &Self::Target {
        &self.tx
    }
}
