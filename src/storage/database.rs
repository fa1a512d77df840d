//! Database connection and the migration gate.
//!
//! A `Database` value only exists once its schema has been migrated to the
//! target version, so repository calls can never observe a store that is
//! unmigrated or mid-migration.

use crate::storage::config::StorageSettings;
use crate::storage::migrator::{MigrationError, MigrationReport, Migrator, CURRENT_VERSION};
use crate::storage::review_store::ReviewStore;
use crate::storage::trail_store::TrailStore;
use crate::storage::user_store::UserStore;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Database wrapper for SQLite operations.
pub struct Database {
    conn: Connection,
    migrator: Migrator,
    /// Set when an explicit `migrate` call fails on an open store
    migration_failed: Option<MigrationError>,
}

impl Database {
    /// Open or create a database at the given path and migrate it.
    pub fn open(path: &Path, settings: &StorageSettings) -> Result<Self, StoreError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            }
        }

        let conn = Connection::open(path).map_err(|e| StoreError::Unavailable(e.to_string()))?;

        conn.busy_timeout(Duration::from_millis(settings.busy_timeout_ms))
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if settings.wal {
            let mode: String = conn
                .pragma_update_and_check(None, "journal_mode", "wal", |row| row.get(0))
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            tracing::debug!("Journal mode: {}", mode);
        }

        tracing::info!("Opening trail database at {}", path.display());
        Self::open_with_migrator(conn, Migrator::bundled(), CURRENT_VERSION)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Self::open_with_migrator(conn, Migrator::bundled(), CURRENT_VERSION)
    }

    /// Wrap a connection, migrating it to `target` with `migrator`.
    ///
    /// Any migration failure is returned and the connection is dropped.
    pub fn open_with_migrator(
        mut conn: Connection,
        migrator: Migrator,
        target: u32,
    ) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        match migrator.migrate(&mut conn, target) {
            Ok(report) if !report.is_noop() => {
                tracing::info!("Applied schema versions {:?}", report.applied);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Database migration failed: {}", e);
                return Err(StoreError::Migration(e));
            }
        }

        Ok(Self {
            conn,
            migrator,
            migration_failed: None,
        })
    }

    /// Get the persisted schema version.
    pub fn current_version(&self) -> Result<u32, StoreError> {
        Ok(Migrator::current_version(&self.conn)?)
    }

    /// Migrate to `target` again. A satisfied target writes nothing.
    ///
    /// On failure the store is closed to repository access until a later
    /// call succeeds.
    pub fn migrate(&mut self, target: u32) -> Result<MigrationReport, StoreError> {
        match self.migrator.migrate(&mut self.conn, target) {
            Ok(report) => {
                self.migration_failed = None;
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Database migration failed: {}", e);
                self.migration_failed = Some(e.clone());
                Err(StoreError::Migration(e))
            }
        }
    }

    /// Get a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Fail if the store is not fully migrated.
    fn ensure_ready(&self) -> Result<(), StoreError> {
        if let Some(e) = &self.migration_failed {
            return Err(StoreError::Migration(e.clone()));
        }
        Ok(())
    }

    /// Trail repository.
    pub fn trails(&self) -> Result<TrailStore<'_>, StoreError> {
        self.ensure_ready()?;
        Ok(TrailStore::new(&self.conn))
    }

    /// Review and completion repository.
    pub fn reviews(&self) -> Result<ReviewStore<'_>, StoreError> {
        self.ensure_ready()?;
        Ok(ReviewStore::new(&self.conn))
    }

    /// User lookups.
    pub fn users(&self) -> Result<UserStore<'_>, StoreError> {
        self.ensure_ready()?;
        Ok(UserStore::new(&self.conn))
    }
}

/// Errors returned by the trail store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Schema migration failed; the store must not be used
    #[error("Migration failed: {0}")]
    Migration(#[from] MigrationError),

    /// Storage I/O failure; the caller may retry
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored field could not be decoded
    #[error("Malformed {field}: {reason}")]
    MalformedData { field: String, reason: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A referenced user or trail does not exist
    #[error("Missing reference: {0}")]
    Reference(String),
}

impl StoreError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Map a SQLite error, recognising foreign key violations.
pub(crate) fn map_sqlite(e: rusqlite::Error, context: &str) -> StoreError {
    if let rusqlite::Error::SqliteFailure(err, _) = &e {
        if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
            return StoreError::Reference(context.to_string());
        }
    }
    StoreError::Unavailable(e.to_string())
}
