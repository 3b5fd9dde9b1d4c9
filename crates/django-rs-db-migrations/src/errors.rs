//! Error types for the migration engine.
//!
//! [`MigrationError`] replaces the generic [`DjangoError`](django_rs_core::DjangoError)
//! for every fallible operation in this crate. The workspace-wide error enum has
//! no variants shaped for migration-graph failures (unknown units, circular
//! dependencies, inconsistent history); this crate needs its own.

use std::fmt;

use django_rs_core::DjangoError;
use thiserror::Error;

/// One step of a problem report: a planned migration and the prerequisite
/// it conflicts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryProblem {
    /// The migration whose history state triggered the problem.
    pub migration: (String, String),
    /// The conflicting prerequisite/descendant migration.
    pub conflicting: (String, String),
}

impl fmt::Display for HistoryProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} / {}.{}",
            self.migration.0, self.migration.1, self.conflicting.0, self.conflicting.1
        )
    }
}

/// The error type for every fallible operation in the migration engine.
///
/// Each variant corresponds to one of the error kinds named in the
/// migration graph, runner, and DDL layer's design. [`MigrationError::is_user_correctable`]
/// partitions them the way a command-line front-end would map them to exit
/// codes, without this crate itself touching a process boundary.
#[derive(Error, Debug)]
pub enum MigrationError {
    /// An application has no migrations container; callers may skip it.
    #[error("no migrations found for application '{0}'")]
    NoMigrations(String),

    /// A migration reference could not be resolved to a known unit.
    #[error("unknown migration '{0}'")]
    UnknownMigration(String),

    /// A migration unit failed to load for reasons other than being unknown.
    #[error("migration '{unit}' is broken: {cause}")]
    BrokenMigration {
        /// The `app_label.unit_name` that failed to load.
        unit: String,
        /// The underlying cause.
        cause: String,
    },

    /// A target prefix matched more than one migration unit.
    #[error("prefix '{prefix}' matches multiple migrations: {matches:?}")]
    MultiplePrefixMatches {
        /// The ambiguous prefix.
        prefix: String,
        /// Every unit name it matched.
        matches: Vec<String>,
    },

    /// Resolving dependencies revisited a node already on the current path.
    #[error("circular dependency: {}", trace.join(" -> "))]
    CircularDependency {
        /// The dependency chain, in traversal order, ending at the repeated node.
        trace: Vec<String>,
    },

    /// An explicit `depends_on` edge points at a lexicographically later
    /// unit within the same application.
    #[error("migration '{unit}' depends on later migration '{target}' in the same application")]
    DependsOnHigherMigration {
        /// The dependent unit.
        unit: String,
        /// The invalid dependency target.
        target: String,
    },

    /// An explicit `depends_on` edge points at a unit that does not exist.
    #[error("migration '{unit}' depends on unknown migration '{target}'")]
    DependsOnUnknownMigration {
        /// The dependent unit.
        unit: String,
        /// The missing dependency target.
        target: String,
    },

    /// An explicit `depends_on` edge points at an application with no sequence.
    #[error("migration '{unit}' depends on unmigrated application '{app}'")]
    DependsOnUnmigratedApplication {
        /// The dependent unit.
        unit: String,
        /// The application with no migrations.
        app: String,
    },

    /// History contains a record with no corresponding unit on disk.
    #[error("ghost migrations found in history: {0:?}")]
    GhostMigrations(Vec<(String, String)>),

    /// The planned set conflicts with recorded history.
    #[error("inconsistent migration history: {problems:?}")]
    InconsistentMigrationHistory {
        /// Every detected conflict.
        problems: Vec<HistoryProblem>,
    },

    /// The pre-flight dry-run of a migration procedure failed.
    #[error("dry run failed: {0}")]
    FailedDryRun(String),

    /// A data migration tried to read or write through a stub model: one
    /// reduced to its primary key to terminate a cross-application foreign
    /// key, with no data of its own in this snapshot.
    #[error("'{0}' is a stub model in this migration's frozen state and has no query manager")]
    StubModelAccess(String),

    /// An added column is `NOT NULL` with no default, and the engine has
    /// no value to backfill existing rows with.
    #[error("column '{table}.{column}' is NOT NULL with no default; supply one or make it nullable")]
    ColumnRequiresDefault {
        /// The table the column is being added to.
        table: String,
        /// The column name.
        column: String,
    },

    /// A lower-level database operation failed.
    #[error("database error: {0}")]
    Database(#[from] DjangoError),

    /// Reading or writing a migration file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A migration file's JSON body did not parse or did not serialize.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MigrationError {
    /// Returns `true` for error kinds a caller can plausibly correct
    /// themselves (the exit-code-1 family in the design's taxonomy), as
    /// opposed to infrastructure failures (exit-code-2).
    pub const fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::NoMigrations(_)
                | Self::UnknownMigration(_)
                | Self::MultiplePrefixMatches { .. }
                | Self::CircularDependency { .. }
                | Self::DependsOnHigherMigration { .. }
                | Self::DependsOnUnknownMigration { .. }
                | Self::DependsOnUnmigratedApplication { .. }
                | Self::GhostMigrations(_)
                | Self::InconsistentMigrationHistory { .. }
                | Self::StubModelAccess(_)
                | Self::ColumnRequiresDefault { .. }
        )
    }
}

/// A convenience alias for `Result<T, MigrationError>`.
pub type MigrationResult<T> = Result<T, MigrationError>;
