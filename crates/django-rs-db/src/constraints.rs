//! Database constraints for model-level integrity rules.
//!
//! This module provides [`CheckConstraint`], [`UniqueConstraint`], and [`ExclusionConstraint`] types that
//! correspond to Django's `CheckConstraint`, `UniqueConstraint`, and `ExclusionConstraint` from
//! `django.db.models.constraints`. They are declared in a model's `Meta.constraints`
//! list and generate SQL during migration/schema operations.
//!
//! # Examples
//!
//! ```
//! use django_rs_db::constraints::{CheckConstraint, UniqueConstraint, Constraint};
//! use django_rs_db::query::lookups::{Q, Lookup};
//! use django_rs_db::value::Value;
//!
//! // CHECK (age >= 0)
//! let check = CheckConstraint::new(
//!     "age_non_negative",
//!     Q::filter("age", Lookup::Gte(Value::from(0))),
//! );
//!
//! // UNIQUE (email) -- simple unique constraint
//! let unique = UniqueConstraint::new("unique_email", vec!["email".to_string()]);
//!
//! // Generate the SQL
//! assert!(check.to_sql("users").contains("CHECK"));
//! assert!(unique.to_sql("users").contains("UNIQUE"));
//! ```

use crate::query::compiler::{DatabaseBackendType, SqlCompiler, WhereNode};
use crate::query::lookups::Q;
use crate::value::Value;

/// Trait for all database constraint types.
///
/// Constraints generate SQL that can be used in CREATE TABLE statements
/// or ALTER TABLE ADD CONSTRAINT commands.
pub trait Constraint: std::fmt::Debug + Send + Sync {
    /// Returns the constraint name.
    fn name(&self) -> &str;

    /// Generates the SQL DDL for this constraint on the given table.
    fn to_sql(&self, table: &str) -> String;

    /// Generates the SQL DDL for adding this constraint to an existing table.
    fn create_sql(&self, table: &str) -> String {
        format!(
            "ALTER TABLE \"{}\" ADD CONSTRAINT {}",
            table,
            self.to_sql(table)
        )
    }

    /// Generates the SQL DDL for removing this constraint from a table.
    fn drop_sql(&self, table: &str) -> String {
        format!(
            "ALTER TABLE \"{}\" DROP CONSTRAINT \"{}\"",
            table,
            self.name()
        )
    }
}

/// A CHECK constraint that enforces an arbitrary condition on rows.
///
/// This is the equivalent of Django's `CheckConstraint`. It wraps a [`Q`] object
/// that defines the condition. The condition is compiled to SQL using the
/// standard SQL compiler.
///
/// # Examples
///
/// ```
/// use django_rs_db::constraints::{CheckConstraint, Constraint};
/// use django_rs_db::query::lookups::{Q, Lookup};
/// use django_rs_db::value::Value;
///
/// // Ensure price is always positive
/// let constraint = CheckConstraint::new(
///     "price_positive",
///     Q::filter("price", Lookup::Gt(Value::from(0))),
/// );
/// let sql = constraint.to_sql("products");
/// assert!(sql.contains("CHECK"));
/// assert!(sql.contains("price_positive"));
/// ```
#[derive(Debug, Clone)]
pub struct CheckConstraint {
    /// The constraint name.
    name: String,
    /// The condition that must be satisfied.
    condition: Q,
}

impl CheckConstraint {
    /// Creates a new check constraint.
    pub fn new(name: impl Into<String>, condition: Q) -> Self {
        Self {
            name: name.into(),
            condition,
        }
    }

    /// Returns the condition Q object.
    pub fn condition(&self) -> &Q {
        &self.condition
    }

    /// Compiles the condition to SQL for the given backend.
    pub fn condition_sql(&self, backend: DatabaseBackendType) -> (String, Vec<Value>) {
        let compiler = SqlCompiler::new(backend);
        let node = WhereNode::from_q(&self.condition);
        let mut sql = String::new();
        let mut params = Vec::new();
        compiler.compile_where_node_pub(&node, &mut sql, &mut params);
        (sql, params)
    }
}

impl Constraint for CheckConstraint {
    fn name(&self) -> &str {
        &self.name
    }

    fn to_sql(&self, _table: &str) -> String {
        let compiler = SqlCompiler::new(DatabaseBackendType::PostgreSQL);
        let node = WhereNode::from_q(&self.condition);
        let mut cond_sql = String::new();
        let mut params = Vec::new();
        compiler.compile_where_node_pub(&node, &mut cond_sql, &mut params);

        // For DDL, inline parameter values (constraints don't use placeholders).
        let final_cond = inline_params(&cond_sql, &params);

        format!("\"{}\" CHECK ({final_cond})", self.name)
    }
}

/// A UNIQUE constraint that enforces uniqueness across one or more columns.
///
/// This is the equivalent of Django's `UniqueConstraint`. It supports optional
/// conditions for partial unique indexes (PostgreSQL `WHERE` clause on index).
///
/// # Examples
///
/// ```
/// use django_rs_db::constraints::{UniqueConstraint, Constraint};
///
/// // Simple unique constraint
/// let constraint = UniqueConstraint::new(
///     "unique_email",
///     vec!["email".to_string()],
/// );
/// let sql = constraint.to_sql("users");
/// assert!(sql.contains("UNIQUE"));
///
/// // Multi-column unique constraint
/// let constraint = UniqueConstraint::new(
///     "unique_user_project",
///     vec!["user_id".to_string(), "project_id".to_string()],
/// );
/// ```
#[derive(Debug, Clone)]
pub struct UniqueConstraint {
    /// The constraint name.
    name: String,
    /// The columns that must be unique together.
    fields: Vec<String>,
    /// Optional condition for a partial unique index.
    condition: Option<Q>,
    /// Whether nulls should be considered distinct (default true in SQL standard).
    nulls_distinct: Option<bool>,
}

impl UniqueConstraint {
    /// Creates a new unique constraint on the given fields.
    pub fn new(name: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            fields,
            condition: None,
            nulls_distinct: None,
        }
    }

    /// Adds a condition for a partial unique index.
    ///
    /// This is only supported on PostgreSQL and SQLite (via partial indexes).
    /// The condition restricts which rows are considered for the uniqueness check.
    pub fn condition(mut self, q: Q) -> Self {
        self.condition = Some(q);
        self
    }

    /// Sets whether NULL values are considered distinct.
    ///
    /// When `true` (default SQL behavior), multiple NULL values are allowed.
    /// When `false`, at most one NULL is permitted. PostgreSQL 15+ supports
    /// `NULLS NOT DISTINCT`.
    pub fn nulls_distinct(mut self, distinct: bool) -> Self {
        self.nulls_distinct = Some(distinct);
        self
    }

    /// Returns the fields in this constraint.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns the optional condition.
    pub fn get_condition(&self) -> Option<&Q> {
        self.condition.as_ref()
    }

    /// Compiles the condition (if any) to SQL for the given backend.
    pub fn condition_sql(&self, backend: DatabaseBackendType) -> Option<(String, Vec<Value>)> {
        self.condition.as_ref().map(|q| {
            let compiler = SqlCompiler::new(backend);
            let node = WhereNode::from_q(q);
            let mut sql = String::new();
            let mut params = Vec::new();
            compiler.compile_where_node_pub(&node, &mut sql, &mut params);
            (sql, params)
        })
    }
}

impl Constraint for UniqueConstraint {
    fn name(&self) -> &str {
        &self.name
    }

    fn to_sql(&self, _table: &str) -> String {
        let cols: Vec<String> = self.fields.iter().map(|f| format!("\"{f}\"")).collect();
        let mut sql = format!("\"{}\" UNIQUE ({})", self.name, cols.join(", "));

        if self.nulls_distinct == Some(false) {
            sql.push_str(" NULLS NOT DISTINCT");
        }

        if let Some(ref q) = self.condition {
            let compiler = SqlCompiler::new(DatabaseBackendType::PostgreSQL);
            let node = WhereNode::from_q(q);
            let mut cond_sql = String::new();
            let mut params = Vec::new();
            compiler.compile_where_node_pub(&node, &mut cond_sql, &mut params);
            let final_cond = inline_params(&cond_sql, &params);
            sql.push_str(&format!(" WHERE {final_cond}"));
        }

        sql
    }
}

/// A PostgreSQL EXCLUDE constraint that prevents overlapping values.
///
/// Exclusion constraints are a generalization of unique constraints that allow
/// specifying an operator for each column pair. They are commonly used with
/// range types to prevent overlapping time ranges.
///
/// This is the equivalent of Django's `ExclusionConstraint` (PostgreSQL only).
///
/// # Examples
///
/// ```
/// use django_rs_db::constraints::{ExclusionConstraint, Constraint};
///
/// // Prevent overlapping reservations for the same room
/// let constraint = ExclusionConstraint::new(
///     "no_overlapping_reservations",
///     vec![
///         ("room_id".to_string(), "=".to_string()),
///         ("during".to_string(), "&&".to_string()),
///     ],
/// );
/// let sql = constraint.to_sql("reservations");
/// assert!(sql.contains("EXCLUDE"));
/// ```
#[derive(Debug, Clone)]
pub struct ExclusionConstraint {
    /// The constraint name.
    name: String,
    /// Pairs of (column, operator) that define the exclusion condition.
    expressions: Vec<(String, String)>,
    /// The index type to use (default: GiST).
    index_type: String,
    /// Optional WHERE condition for a partial exclusion constraint.
    condition: Option<Q>,
}

impl ExclusionConstraint {
    /// Creates a new exclusion constraint.
    ///
    /// Each expression is a `(column_name, operator)` pair. Common operators:
    /// - `"="` for equality
    /// - `"&&"` for range overlap
    /// - `"<>"` for inequality
    pub fn new(name: impl Into<String>, expressions: Vec<(String, String)>) -> Self {
        Self {
            name: name.into(),
            expressions,
            index_type: "gist".to_string(),
            condition: None,
        }
    }

    /// Sets the index type for the exclusion constraint (default: "gist").
    pub fn using(mut self, index_type: impl Into<String>) -> Self {
        self.index_type = index_type.into();
        self
    }

    /// Adds a condition for a partial exclusion constraint.
    pub fn condition(mut self, q: Q) -> Self {
        self.condition = Some(q);
        self
    }

    /// Returns the expressions.
    pub fn expressions(&self) -> &[(String, String)] {
        &self.expressions
    }

    /// Returns the index type.
    pub fn get_index_type(&self) -> &str {
        &self.index_type
    }

    /// Returns the optional condition.
    pub fn get_condition(&self) -> Option<&Q> {
        self.condition.as_ref()
    }
}

impl Constraint for ExclusionConstraint {
    fn name(&self) -> &str {
        &self.name
    }

    fn to_sql(&self, _table: &str) -> String {
        let expr_parts: Vec<String> = self
            .expressions
            .iter()
            .map(|(col, op)| format!("\"{}\" WITH {}", col, op))
            .collect();
        let mut sql = format!(
            "\"{}\" EXCLUDE USING {} ({})",
            self.name,
            self.index_type,
            expr_parts.join(", ")
        );

        if let Some(ref q) = self.condition {
            let compiler = SqlCompiler::new(DatabaseBackendType::PostgreSQL);
            let node = WhereNode::from_q(q);
            let mut cond_sql = String::new();
            let mut params = Vec::new();
            compiler.compile_where_node_pub(&node, &mut cond_sql, &mut params);
            let final_cond = inline_params(&cond_sql, &params);
            sql.push_str(&format!(" WHERE {final_cond}"));
        }

        sql
    }
}

/// Replaces parameter placeholders ($1, $2, ...) with inline values for DDL.
///
/// Constraints are defined in DDL (CREATE TABLE / ALTER TABLE) where
/// parameterized queries are not used. This function substitutes the
/// placeholders with properly quoted literal values.
fn inline_params(sql: &str, params: &[Value]) -> String {
    let mut result = sql.to_string();
    // Replace in reverse order so $10 doesn't match $1 first
    for (i, val) in params.iter().enumerate().rev() {
        let placeholder = format!("${}", i + 1);
        let literal = value_to_sql_literal(val);
        result = result.replace(&placeholder, &literal);
    }
    result
}

/// Converts a Value to an inline SQL literal for use in DDL.
fn value_to_sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => {
            if *b {
                "TRUE".to_string()
            } else {
                "FALSE".to_string()
            }
        }
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Date(d) => format!("'{d}'"),
        Value::DateTime(dt) => format!("'{dt}'"),
        Value::DateTimeTz(dt) => format!("'{dt}'"),
        Value::Time(t) => format!("'{t}'"),
        _ => format!("'{value}'"),
    }
}

/// A boxed constraint for use in collections.
pub type BoxedConstraint = Box<dyn Constraint>;
