//! # django-rs-core
//!
//! Shared error types for the django-rs migration engine workspace. Every
//! other crate in the workspace (`django-rs-db`, `django-rs-db-backends`,
//! `django-rs-db-migrations`) depends on this crate solely for
//! [`DjangoError`]/[`DjangoResult`]; `django-rs-db-migrations` layers its own
//! `MigrationError` on top for migration-specific failure kinds (see that
//! crate's `errors` module).
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases

pub mod error;

// Re-export the most commonly used types at the crate root.
pub use error::{DjangoError, DjangoResult, ValidationError};
