//! Versioned schema migrations.
//!
//! The schema version is SQLite's `PRAGMA user_version`: a single integer in
//! the database header, 0 on a fresh file. Every step runs in its own
//! `IMMEDIATE` transaction together with the version bump, so a step is
//! either fully applied or not visible at all.

use crate::storage::schema::{DROP_CORE_TABLES, SCHEMA_V1, SEED_V1};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use thiserror::Error;

/// Applies one migration step inside an open transaction.
pub type MigrationFn = fn(&Transaction<'_>) -> rusqlite::Result<()>;

/// One schema step, identified by the version it produces.
#[derive(Clone, Copy)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub apply: MigrationFn,
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("version", &self.version)
            .field("description", &self.description)
            .finish()
    }
}

/// Migration failures. Always fatal for the store being opened.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MigrationError {
    #[error("Invalid migration list: {0}")]
    InvalidSteps(String),

    #[error("Unknown target version {target} (latest known is {latest})")]
    UnknownTarget { target: u32, latest: u32 },

    #[error("Could not read schema version: {0}")]
    VersionUnreadable(String),

    #[error("Migration to version {version} failed: {reason}")]
    StepFailed { version: u32, reason: String },

    #[error("Store is at version {current}, expected {expected}")]
    Incomplete { current: u32, expected: u32 },
}

/// What a `migrate` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Version before the call
    pub from: u32,
    /// Version after the call
    pub to: u32,
    /// Versions applied by this call, ascending
    pub applied: Vec<u32>,
}

impl MigrationReport {
    /// True when nothing was written.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Version produced by the latest bundled step.
pub const CURRENT_VERSION: u32 = 1;

/// Steps shipped with this build, ascending.
const BUNDLED: &[Migration] = &[Migration {
    version: 1,
    description: "bootstrap trail, review, completion and user tables with demo data",
    apply: bootstrap_v1,
}];

/// Step 0 -> 1: full reset, then create and seed.
fn bootstrap_v1(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(DROP_CORE_TABLES)?;
    tx.execute_batch(SCHEMA_V1)?;
    tx.execute_batch(SEED_V1)?;
    Ok(())
}

/// Runs an ordered list of migration steps against a connection.
#[derive(Debug, Clone)]
pub struct Migrator {
    steps: Vec<Migration>,
}

impl Migrator {
    /// Build a migrator from explicit steps.
    ///
    /// Versions must start above 0 and be strictly ascending.
    pub fn new(steps: Vec<Migration>) -> Result<Self, MigrationError> {
        let mut previous = 0;
        for step in &steps {
            if step.version <= previous {
                return Err(MigrationError::InvalidSteps(format!(
                    "version {} follows {}",
                    step.version, previous
                )));
            }
            previous = step.version;
        }
        Ok(Self { steps })
    }

    /// The steps shipped with this build.
    pub fn bundled() -> Self {
        Self {
            steps: BUNDLED.to_vec(),
        }
    }

    /// Highest version any step produces (0 without steps).
    pub fn latest_version(&self) -> u32 {
        self.steps.last().map(|s| s.version).unwrap_or(0)
    }

    pub fn steps(&self) -> &[Migration] {
        &self.steps
    }

    /// Read the persisted schema version. 0 means fresh.
    pub fn current_version(conn: &Connection) -> Result<u32, MigrationError> {
        let version: i64 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .map_err(|e| MigrationError::VersionUnreadable(e.to_string()))?;

        u32::try_from(version)
            .map_err(|_| MigrationError::VersionUnreadable(format!("negative version {}", version)))
    }

    /// Apply every step with `current < version <= target`, ascending.
    ///
    /// A satisfied target is a no-op that writes nothing. The exclusive
    /// borrow serializes passes on this connection; the immediate
    /// transaction and the version re-check inside it serialize passes
    /// across connections to the same file.
    pub fn migrate(
        &self,
        conn: &mut Connection,
        target: u32,
    ) -> Result<MigrationReport, MigrationError> {
        let from = Self::current_version(conn)?;

        if from >= target {
            tracing::debug!("Schema at version {}, target {} already satisfied", from, target);
            return Ok(MigrationReport {
                from,
                to: from,
                applied: Vec::new(),
            });
        }

        let latest = self.latest_version();
        if target > latest {
            return Err(MigrationError::UnknownTarget { target, latest });
        }

        let mut applied = Vec::new();
        for step in self
            .steps
            .iter()
            .filter(|s| s.version > from && s.version <= target)
        {
            if self.apply_step(conn, step)? {
                applied.push(step.version);
            }
        }

        let to = Self::current_version(conn)?;
        if to < target {
            return Err(MigrationError::Incomplete {
                current: to,
                expected: target,
            });
        }
        tracing::info!("Database migrated from version {} to {}", from, to);

        Ok(MigrationReport { from, to, applied })
    }

    /// Apply one step atomically. Returns false if another connection got there first.
    fn apply_step(&self, conn: &mut Connection, step: &Migration) -> Result<bool, MigrationError> {
        let failed = |e: rusqlite::Error| MigrationError::StepFailed {
            version: step.version,
            reason: e.to_string(),
        };

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(failed)?;

        let version = Self::current_version(&tx)?;
        if version >= step.version {
            tracing::debug!("Step {} already applied by another connection", step.version);
            return Ok(false);
        }

        tracing::info!("Migrating to version {}: {}", step.version, step.description);

        // Dropping the transaction on error rolls the whole step back
        (step.apply)(&tx).map_err(failed)?;
        tx.pragma_update(None, "user_version", step.version)
            .map_err(failed)?;
        tx.commit().map_err(failed)?;

        Ok(true)
    }
}

impl Default for Migrator {
    fn default() -> Self {
        Self::bundled()
    }
}
