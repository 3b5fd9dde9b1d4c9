//! # django-rs-db-backends
//!
//! Database backend implementations for the django-rs framework. Provides connection
//! pooling, query execution, and schema introspection for multiple database engines.
//!
//! Supported backends:
//! - `PostgreSQL`
//! - `MySQL`
//! - `SQLite`

pub mod base;

#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgres")]
pub mod postgresql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use base::{DatabaseBackend, DatabaseConfig, Transaction};

#[cfg(feature = "mysql")]
pub use mysql::MySqlBackend;
#[cfg(feature = "postgres")]
pub use postgresql::PostgresBackend;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
