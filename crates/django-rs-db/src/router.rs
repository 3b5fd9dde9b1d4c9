//! Multi-database routing for the ORM.
//!
//! This module provides the [`DatabaseRouter`] trait and [`RouterChain`] for
//! routing database operations to specific database connections. It mirrors
//! Django's `DATABASE_ROUTERS` setting and `DatabaseRouter` class.
//!
//! ## How routing works
//!
//! When a query is executed, the router chain is consulted to determine which
//! database to use. Routers are evaluated in order until one returns a definitive
//! answer (`Some`). If no router returns a value, the `"default"` database is used.
//!
//! ## Example
//!
//! ```
//! use django_rs_db::router::{DatabaseRouter, RouterChain};
//!
//! struct ReadReplicaRouter;
//!
//! impl DatabaseRouter for ReadReplicaRouter {
//!     fn db_for_read(&self, app_label: &str, model_name: &str) -> Option<String> {
//!         Some("replica".to_string())
//!     }
//!     fn db_for_write(&self, app_label: &str, model_name: &str) -> Option<String> {
//!         Some("default".to_string())
//!     }
//! }
//!
//! let mut chain = RouterChain::new();
//! chain.add_router(Box::new(ReadReplicaRouter));
//! assert_eq!(chain.db_for_read("blog", "article"), "replica");
//! assert_eq!(chain.db_for_write("blog", "article"), "default");
//! ```

use std::collections::HashMap;

/// Trait for database routers.
///
/// A database router provides hints about which database to use for different
/// operations. Each method returns `Some(db_alias)` to route to a specific
/// database, or `None` to defer to the next router in the chain.
///
/// This mirrors Django's `DatabaseRouter` class.
pub trait DatabaseRouter: Send + Sync {
    /// Suggests the database to use for read operations on the given model.
    ///
    /// Returns `None` to defer to the next router in the chain.
    fn db_for_read(&self, app_label: &str, model_name: &str) -> Option<String> {
        let _ = (app_label, model_name);
        None
    }

    /// Suggests the database to use for write operations on the given model.
    ///
    /// Returns `None` to defer to the next router in the chain.
    fn db_for_write(&self, app_label: &str, model_name: &str) -> Option<String> {
        let _ = (app_label, model_name);
        None
    }

    /// Determines whether a relation between two objects is allowed.
    ///
    /// Returns `Some(true)` to allow, `Some(false)` to deny, or `None`
    /// to defer to the next router.
    fn allow_relation(
        &self,
        obj1_app: &str,
        obj1_model: &str,
        obj2_app: &str,
        obj2_model: &str,
    ) -> Option<bool> {
        let _ = (obj1_app, obj1_model, obj2_app, obj2_model);
        None
    }

    /// Determines whether a migration operation is allowed on the given database.
    ///
    /// Returns `Some(true)` to allow, `Some(false)` to deny, or `None`
    /// to defer to the next router.
    fn allow_migrate(&self, db: &str, app_label: &str, model_name: &str) -> Option<bool> {
        let _ = (db, app_label, model_name);
        None
    }
}

/// A chain of database routers evaluated in order.
///
/// When a routing decision is needed, each router in the chain is consulted
/// in order until one returns `Some`. If no router provides a definitive
/// answer, the default database (`"default"`) is used.
///
/// This mirrors Django's `DATABASE_ROUTERS` setting behavior.
pub struct RouterChain {
    routers: Vec<Box<dyn DatabaseRouter>>,
}

impl Default for RouterChain {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterChain {
    /// Creates a new empty router chain.
    pub fn new() -> Self {
        Self {
            routers: Vec::new(),
        }
    }

    /// Adds a router to the chain. Routers are evaluated in insertion order.
    pub fn add_router(&mut self, router: Box<dyn DatabaseRouter>) {
        self.routers.push(router);
    }

    /// Returns the database alias to use for read operations.
    ///
    /// Evaluates each router in order. If none returns a value, uses `"default"`.
    pub fn db_for_read(&self, app_label: &str, model_name: &str) -> String {
        for router in &self.routers {
            if let Some(db) = router.db_for_read(app_label, model_name) {
                return db;
            }
        }
        "default".to_string()
    }

    /// Returns the database alias to use for write operations.
    ///
    /// Evaluates each router in order. If none returns a value, uses `"default"`.
    pub fn db_for_write(&self, app_label: &str, model_name: &str) -> String {
        for router in &self.routers {
            if let Some(db) = router.db_for_write(app_label, model_name) {
                return db;
            }
        }
        "default".to_string()
    }

    /// Determines whether a relation between two objects is allowed.
    ///
    /// Returns `true` by default if no router makes a decision.
    pub fn allow_relation(
        &self,
        obj1_app: &str,
        obj1_model: &str,
        obj2_app: &str,
        obj2_model: &str,
    ) -> bool {
        for router in &self.routers {
            if let Some(allowed) = router.allow_relation(obj1_app, obj1_model, obj2_app, obj2_model)
            {
                return allowed;
            }
        }
        true
    }

    /// Determines whether a migration is allowed on the given database.
    ///
    /// Returns `true` by default if no router makes a decision.
    pub fn allow_migrate(&self, db: &str, app_label: &str, model_name: &str) -> bool {
        for router in &self.routers {
            if let Some(allowed) = router.allow_migrate(db, app_label, model_name) {
                return allowed;
            }
        }
        true
    }
}

/// Configuration for multiple named database connections.
///
/// This is the Rust equivalent of Django's `DATABASES` setting. Each entry
/// maps a database alias (e.g., `"default"`, `"replica"`, `"analytics"`)
/// to its connection configuration.
#[derive(Debug, Clone)]
pub struct DatabasesConfig {
    /// Named database configurations.
    databases: HashMap<String, DatabaseEntry>,
}

/// A single database connection entry.
#[derive(Debug, Clone)]
pub struct DatabaseEntry {
    /// The database backend type (e.g., "postgresql", "sqlite", "mysql").
    pub engine: String,
    /// The database name or file path.
    pub name: String,
    /// The database host.
    pub host: Option<String>,
    /// The database port.
    pub port: Option<u16>,
    /// The database user.
    pub user: Option<String>,
    /// The database password.
    pub password: Option<String>,
    /// Additional options.
    pub options: HashMap<String, String>,
}

impl DatabasesConfig {
    /// Creates a new empty configuration.
    pub fn new() -> Self {
        Self {
            databases: HashMap::new(),
        }
    }

    /// Adds a database entry with the given alias.
    pub fn add(&mut self, alias: impl Into<String>, entry: DatabaseEntry) {
        self.databases.insert(alias.into(), entry);
    }

    /// Returns the database entry for the given alias.
    pub fn get(&self, alias: &str) -> Option<&DatabaseEntry> {
        self.databases.get(alias)
    }

    /// Returns all configured database aliases.
    pub fn aliases(&self) -> Vec<&str> {
        self.databases.keys().map(String::as_str).collect()
    }

    /// Returns the number of configured databases.
    pub fn len(&self) -> usize {
        self.databases.len()
    }

    /// Returns whether any databases are configured.
    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }
}

impl Default for DatabasesConfig {
    fn default() -> Self {
        Self::new()
    }
}
