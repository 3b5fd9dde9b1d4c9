//! Raw SQL query support.
//!
//! This module provides the ability to execute raw SQL queries and map results
//! to model instances or plain rows. It mirrors Django's `Manager.raw()` and
//! `cursor.execute()` functionality.
//!
//! All raw SQL queries use parameterized queries to prevent SQL injection.
//!
//! # Examples
//!
//! ```ignore
//! use django_rs_db::query::raw::{RawQuerySet, RawSql};
//! use django_rs_db::value::Value;
//!
//! // Create a raw query that maps to a model
//! let raw = RawQuerySet::<MyModel>::new(
//!     "SELECT * FROM users WHERE id = $1",
//!     vec![Value::Int(1)],
//! );
//! ```

use crate::executor::DbExecutor;
use crate::model::Model;
use crate::query::compiler::Row;
use crate::value::Value;
use django_rs_core::{DjangoError, DjangoResult};
use std::marker::PhantomData;

/// A raw SQL query that returns model instances.
///
/// `RawQuerySet` is the equivalent of Django's `RawQuerySet`, returned by
/// `Model.objects.raw()`. It executes a raw SQL query and maps the results
/// to model instances via `M::from_row()`.
///
/// The query MUST use parameterized placeholders (e.g., `$1` for PostgreSQL,
/// `?` for SQLite/MySQL) to prevent SQL injection.
pub struct RawQuerySet<M: Model> {
    /// The raw SQL query string.
    sql: String,
    /// Parameterized query values.
    params: Vec<Value>,
    /// Optional column-to-field mapping overrides.
    translations: Vec<(String, String)>,
    _phantom: PhantomData<M>,
}

impl<M: Model> RawQuerySet<M> {
    /// Creates a new raw query set.
    ///
    /// The SQL should be a SELECT query that returns columns matching
    /// the model's fields. Use parameterized placeholders for values.
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
            translations: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// Adds column-to-field name translations.
    ///
    /// Use this when the raw SQL column names don't match the model field names.
    /// Each pair is (sql_column_name, model_field_name).
    #[must_use]
    pub fn translate(mut self, translations: Vec<(String, String)>) -> Self {
        self.translations = translations;
        self
    }

    /// Returns a reference to the SQL query string.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns a reference to the query parameters.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Executes the raw query and returns model instances.
    ///
    /// Each row returned by the query is mapped to a model instance via
    /// `M::from_row()`. If translations are set, column names are remapped
    /// before constructing the model.
    pub async fn execute(&self, db: &dyn DbExecutor) -> DjangoResult<Vec<M>> {
        let rows = db.query(&self.sql, &self.params).await?;

        if self.translations.is_empty() {
            rows.iter().map(M::from_row).collect()
        } else {
            // Remap column names based on translations
            rows.iter()
                .map(|row| {
                    let translated = self.translate_row(row);
                    M::from_row(&translated)
                })
                .collect()
        }
    }

    /// Executes the raw query and returns the first model instance, or None.
    pub async fn first(&self, db: &dyn DbExecutor) -> DjangoResult<Option<M>> {
        let rows = db.query(&self.sql, &self.params).await?;
        match rows.into_iter().next() {
            Some(row) => {
                if self.translations.is_empty() {
                    Ok(Some(M::from_row(&row)?))
                } else {
                    let translated = self.translate_row(&row);
                    Ok(Some(M::from_row(&translated)?))
                }
            }
            None => Ok(None),
        }
    }

    /// Applies column name translations to a row.
    fn translate_row(&self, row: &Row) -> Row {
        let columns: Vec<String> = row
            .columns()
            .iter()
            .map(|col| {
                self.translations
                    .iter()
                    .find(|(from, _)| from == col)
                    .map_or_else(|| col.clone(), |(_, to)| to.clone())
            })
            .collect();

        // Extract values by index
        let values: Vec<Value> = (0..row.len())
            .map(|i| row.get_by_index::<Value>(i).unwrap_or(Value::Null))
            .collect();

        Row::new(columns, values)
    }
}

/// A direct SQL execution interface for queries that don't map to models.
///
/// `RawSql` is the equivalent of Django's `connection.cursor()` + `cursor.execute()`.
/// It provides direct SQL execution returning raw rows rather than model instances.
pub struct RawSql {
    /// The SQL statement to execute.
    sql: String,
    /// Parameterized values.
    params: Vec<Value>,
}

impl RawSql {
    /// Creates a new raw SQL statement.
    ///
    /// Use parameterized placeholders for all user-provided values.
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Returns a reference to the SQL string.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns a reference to the query parameters.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Executes the SQL as a query and returns all result rows.
    ///
    /// Use this for SELECT statements or any statement that returns rows.
    pub async fn fetch_all(&self, db: &dyn DbExecutor) -> DjangoResult<Vec<Row>> {
        db.query(&self.sql, &self.params).await
    }

    /// Executes the SQL as a query and returns the first row, or None.
    pub async fn fetch_one(&self, db: &dyn DbExecutor) -> DjangoResult<Option<Row>> {
        let rows = db.query(&self.sql, &self.params).await?;
        Ok(rows.into_iter().next())
    }

    /// Executes the SQL as a statement (INSERT, UPDATE, DELETE).
    ///
    /// Returns the number of affected rows.
    pub async fn execute(&self, db: &dyn DbExecutor) -> DjangoResult<u64> {
        db.execute_sql(&self.sql, &self.params).await
    }

    /// Executes multiple SQL statements in sequence.
    ///
    /// Each statement uses the same parameters. Returns the total number
    /// of affected rows across all statements.
    pub async fn execute_many(
        statements: &[RawSql],
        db: &dyn DbExecutor,
    ) -> DjangoResult<u64> {
        let mut total = 0u64;
        for stmt in statements {
            total += stmt.execute(db).await?;
        }
        Ok(total)
    }
}

/// Validates that a raw SQL string uses parameterized queries rather than
/// string interpolation for values. This is a best-effort check.
///
/// Returns `Ok(())` if the query appears safe, or an error if it contains
/// patterns that suggest string interpolation.
pub fn validate_raw_sql(sql: &str) -> DjangoResult<()> {
    // Check for common SQL injection patterns
    // This is a heuristic check, not a full SQL parser
    let lower = sql.to_lowercase();

    // Check for unparameterized string literals that might be user input
    // (This is intentionally conservative — we only warn about suspicious patterns)
    if lower.contains("'; ") || lower.contains("\"; ") {
        return Err(DjangoError::SuspiciousOperation(
            "Raw SQL query contains patterns that may indicate SQL injection. \
             Use parameterized queries instead of string interpolation."
                .to_string(),
        ));
    }

    Ok(())
}
