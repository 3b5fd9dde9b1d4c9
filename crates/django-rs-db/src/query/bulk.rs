//! Bulk database operations.
//!
//! This module provides bulk create, bulk update, get_or_create, and
//! update_or_create operations. These are the equivalent of Django's
//! `QuerySet.bulk_create()`, `QuerySet.bulk_update()`,
//! `QuerySet.get_or_create()`, and `QuerySet.update_or_create()`.
//!
//! # Bulk Operations
//!
//! Bulk operations minimize round trips to the database by batching multiple
//! operations into a single (or few) SQL statements.

use crate::executor::DbExecutor;
use crate::model::Model;
use crate::query::compiler::{DatabaseBackendType, SqlCompiler, WhereNode};
use crate::query::lookups::Lookup;
use crate::value::Value;
use django_rs_core::{DjangoError, DjangoResult};

/// Options for `bulk_create` operations.
#[derive(Debug, Clone, Default)]
pub struct BulkCreateOptions {
    /// Number of objects to create per batch. None means all at once.
    pub batch_size: Option<usize>,
    /// If true, ignore rows that violate unique constraints.
    pub ignore_conflicts: bool,
    /// If true, update conflicting rows instead of ignoring them (upsert).
    /// Requires `update_fields` to be set.
    pub update_conflicts: bool,
    /// Fields to update on conflict (for upsert). Only used when
    /// `update_conflicts` is true.
    pub update_fields: Vec<&'static str>,
    /// Unique fields that define the conflict target. Required when
    /// `update_conflicts` or `ignore_conflicts` is true.
    pub unique_fields: Vec<&'static str>,
}

/// Options for `bulk_update` operations.
#[derive(Debug, Clone, Default)]
pub struct BulkUpdateOptions {
    /// Number of objects to update per batch. None means all at once.
    pub batch_size: Option<usize>,
}

/// Compiles a multi-row INSERT statement for bulk_create.
///
/// Generates SQL like:
/// ```sql
/// INSERT INTO "table" ("col1", "col2") VALUES ($1, $2), ($3, $4), ...
/// ```
///
/// With optional conflict handling:
/// ```sql
/// ... ON CONFLICT ("unique_col") DO NOTHING
/// ... ON CONFLICT ("unique_col") DO UPDATE SET "col1" = EXCLUDED."col1"
/// ```
pub fn compile_bulk_insert(
    table: &str,
    rows: &[Vec<(&str, Value)>],
    options: &BulkCreateOptions,
    backend: DatabaseBackendType,
) -> (String, Vec<Value>) {
    if rows.is_empty() {
        return (String::new(), Vec::new());
    }

    let mut params = Vec::new();

    // Get column names from the first row
    let columns: Vec<&str> = rows[0].iter().map(|(name, _)| *name).collect();
    let col_list: String = columns
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!("INSERT INTO \"{table}\" ({col_list}) VALUES ");

    // Build value rows
    let mut row_strings = Vec::new();
    for row in rows {
        let placeholders: Vec<String> = row
            .iter()
            .map(|(_, val)| {
                params.push(val.clone());
                match backend {
                    DatabaseBackendType::PostgreSQL => format!("${}", params.len()),
                    DatabaseBackendType::SQLite | DatabaseBackendType::MySQL => "?".to_string(),
                }
            })
            .collect();
        row_strings.push(format!("({})", placeholders.join(", ")));
    }
    sql.push_str(&row_strings.join(", "));

    // Add conflict handling
    if options.ignore_conflicts || options.update_conflicts {
        match backend {
            DatabaseBackendType::PostgreSQL | DatabaseBackendType::SQLite => {
                if options.unique_fields.is_empty() {
                    sql.push_str(" ON CONFLICT");
                } else {
                    let unique_cols: String = options
                        .unique_fields
                        .iter()
                        .map(|f| format!("\"{f}\""))
                        .collect::<Vec<_>>()
                        .join(", ");
                    sql.push_str(&format!(" ON CONFLICT ({unique_cols})"));
                }

                if options.update_conflicts && !options.update_fields.is_empty() {
                    let set_parts: String = options
                        .update_fields
                        .iter()
                        .map(|f| format!("\"{f}\" = EXCLUDED.\"{f}\""))
                        .collect::<Vec<_>>()
                        .join(", ");
                    sql.push_str(&format!(" DO UPDATE SET {set_parts}"));
                } else {
                    sql.push_str(" DO NOTHING");
                }
            }
            DatabaseBackendType::MySQL => {
                if options.update_conflicts && !options.update_fields.is_empty() {
                    let set_parts: String = options
                        .update_fields
                        .iter()
                        .map(|f| format!("\"{f}\" = VALUES(\"{f}\")"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    sql.push_str(&format!(" ON DUPLICATE KEY UPDATE {set_parts}"));
                } else if options.ignore_conflicts {
                    // For MySQL, use INSERT IGNORE
                    sql = sql.replacen("INSERT INTO", "INSERT IGNORE INTO", 1);
                }
            }
        }
    }

    (sql, params)
}

/// Compiles a batched UPDATE statement for bulk_update.
///
/// For each object, generates a separate UPDATE WHERE pk = value statement.
/// Returns a vector of (sql, params) pairs, one per batch.
pub fn compile_bulk_update(
    table: &str,
    pk_field: &str,
    objects: &[(Value, Vec<(&str, Value)>)],
    fields: &[&str],
    batch_size: Option<usize>,
    backend: DatabaseBackendType,
) -> Vec<(String, Vec<Value>)> {
    if objects.is_empty() || fields.is_empty() {
        return Vec::new();
    }

    let batch_size = batch_size.unwrap_or(objects.len());
    let compiler = SqlCompiler::new(backend);
    let mut results = Vec::new();

    for chunk in objects.chunks(batch_size) {
        for (pk_value, field_values) in chunk {
            let update_fields: Vec<(&str, Value)> = field_values
                .iter()
                .filter(|(name, _)| fields.contains(name))
                .cloned()
                .collect();

            if update_fields.is_empty() {
                continue;
            }

            let where_clause = WhereNode::Condition {
                column: pk_field.to_string(),
                lookup: Lookup::Exact(pk_value.clone()),
            };

            let (sql, params) = compiler.compile_update(table, &update_fields, &where_clause);
            results.push((sql, params));
        }
    }

    results
}

/// Executes a `bulk_create` operation.
///
/// Inserts multiple model instances in batched INSERT statements.
/// Returns the number of rows inserted.
pub async fn bulk_create<M: Model>(
    objects: &mut [M],
    options: &BulkCreateOptions,
    db: &dyn DbExecutor,
) -> DjangoResult<u64> {
    if objects.is_empty() {
        return Ok(0);
    }

    let batch_size = options.batch_size.unwrap_or(objects.len());
    let mut total_inserted = 0u64;

    for chunk in objects.chunks_mut(batch_size) {
        let rows: Vec<Vec<(&str, Value)>> = chunk.iter().map(Model::non_pk_field_values).collect();

        let (sql, params) = compile_bulk_insert(M::table_name(), &rows, options, db.backend_type());

        if sql.is_empty() {
            continue;
        }

        let affected = db.execute_sql(&sql, &params).await?;
        total_inserted += affected;
    }

    Ok(total_inserted)
}

/// Executes a `bulk_update` operation.
///
/// Updates specific fields on multiple model instances. Each object must
/// have a primary key set.
///
/// Returns the total number of rows affected.
pub async fn bulk_update<M: Model>(
    objects: &[M],
    fields: &[&str],
    options: &BulkUpdateOptions,
    db: &dyn DbExecutor,
) -> DjangoResult<u64> {
    if objects.is_empty() || fields.is_empty() {
        return Ok(0);
    }

    // Build (pk, field_values) pairs
    let pk_and_fields: Vec<(Value, Vec<(&str, Value)>)> = objects
        .iter()
        .map(|obj| {
            let pk = obj.pk().ok_or_else(|| {
                DjangoError::DatabaseError(
                    "bulk_update requires all objects to have a primary key set".to_string(),
                )
            })?;
            Ok((pk.clone(), obj.field_values()))
        })
        .collect::<DjangoResult<Vec<_>>>()?;

    let statements = compile_bulk_update(
        M::table_name(),
        M::pk_field_name(),
        &pk_and_fields,
        fields,
        options.batch_size,
        db.backend_type(),
    );

    let mut total = 0u64;
    for (sql, params) in &statements {
        total += db.execute_sql(sql, params).await?;
    }

    Ok(total)
}

/// Looks up an object with the given lookup criteria, creating one if it
/// doesn't exist.
///
/// Returns a tuple of `(object, created)` where `created` is `true` if a
/// new object was created.
///
/// This is equivalent to Django's `QuerySet.get_or_create()`.
///
/// # Arguments
///
/// * `lookup_fields` - Fields used for the lookup (WHERE clause)
/// * `defaults` - Additional fields to set when creating (not used for lookup)
/// * `db` - The database executor
pub async fn get_or_create<M: Model>(
    lookup_fields: &[(&'static str, Value)],
    defaults: &[(&'static str, Value)],
    db: &dyn DbExecutor,
) -> DjangoResult<(M, bool)> {
    let compiler = SqlCompiler::new(db.backend_type());

    // Build WHERE clause from lookup fields
    let where_nodes: Vec<WhereNode> = lookup_fields
        .iter()
        .map(|(name, val)| WhereNode::Condition {
            column: (*name).to_string(),
            lookup: Lookup::Exact(val.clone()),
        })
        .collect();

    let where_clause = if where_nodes.len() == 1 {
        where_nodes.into_iter().next().unwrap()
    } else {
        WhereNode::And(where_nodes)
    };

    // Try to SELECT first
    let mut query = crate::query::compiler::Query::new(M::table_name());
    query.where_clause = Some(where_clause.clone());
    query.limit = Some(1);

    let (select_sql, select_params) = compiler.compile_select(&query);
    let rows = db.query(&select_sql, &select_params).await?;

    if let Some(row) = rows.into_iter().next() {
        // Object exists
        let obj = M::from_row(&row)?;
        return Ok((obj, false));
    }

    // Object doesn't exist — create it
    let mut create_fields: Vec<(&str, Value)> = Vec::new();
    for (name, val) in lookup_fields {
        create_fields.push((name, val.clone()));
    }
    for (name, val) in defaults {
        create_fields.push((name, val.clone()));
    }

    let (insert_sql, insert_params) = compiler.compile_insert(M::table_name(), &create_fields);
    let pk = db.insert_returning_id(&insert_sql, &insert_params).await?;

    // Fetch the created object
    let pk_where = WhereNode::Condition {
        column: M::pk_field_name().to_string(),
        lookup: Lookup::Exact(pk),
    };
    let mut fetch_query = crate::query::compiler::Query::new(M::table_name());
    fetch_query.where_clause = Some(pk_where);
    fetch_query.limit = Some(1);

    let (fetch_sql, fetch_params) = compiler.compile_select(&fetch_query);
    let fetch_rows = db.query(&fetch_sql, &fetch_params).await?;

    if let Some(row) = fetch_rows.into_iter().next() {
        let obj = M::from_row(&row)?;
        Ok((obj, true))
    } else {
        Err(DjangoError::DatabaseError(
            "Failed to fetch newly created object".to_string(),
        ))
    }
}

/// Looks up an object with the given lookup criteria. If found, updates it
/// with the given defaults. If not found, creates it.
///
/// Returns a tuple of `(object, created)` where `created` is `true` if a
/// new object was created.
///
/// This is equivalent to Django's `QuerySet.update_or_create()`.
pub async fn update_or_create<M: Model>(
    lookup_fields: &[(&'static str, Value)],
    defaults: &[(&'static str, Value)],
    db: &dyn DbExecutor,
) -> DjangoResult<(M, bool)> {
    let compiler = SqlCompiler::new(db.backend_type());

    // Build WHERE clause from lookup fields
    let where_nodes: Vec<WhereNode> = lookup_fields
        .iter()
        .map(|(name, val)| WhereNode::Condition {
            column: (*name).to_string(),
            lookup: Lookup::Exact(val.clone()),
        })
        .collect();

    let where_clause = if where_nodes.len() == 1 {
        where_nodes.into_iter().next().unwrap()
    } else {
        WhereNode::And(where_nodes)
    };

    // Try to SELECT first
    let mut query = crate::query::compiler::Query::new(M::table_name());
    query.where_clause = Some(where_clause.clone());
    query.limit = Some(1);

    let (select_sql, select_params) = compiler.compile_select(&query);
    let rows = db.query(&select_sql, &select_params).await?;

    if let Some(row) = rows.into_iter().next() {
        // Object exists — update it with defaults
        let existing = M::from_row(&row)?;

        if !defaults.is_empty() {
            let update_fields: Vec<(&str, Value)> = defaults.to_vec();
            let (update_sql, update_params) =
                compiler.compile_update(M::table_name(), &update_fields, &where_clause);
            db.execute_sql(&update_sql, &update_params).await?;

            // Re-fetch to get updated values
            let pk_value = existing.pk().ok_or_else(|| {
                DjangoError::DatabaseError("Object has no primary key".to_string())
            })?;
            let pk_where = WhereNode::Condition {
                column: M::pk_field_name().to_string(),
                lookup: Lookup::Exact(pk_value.clone()),
            };
            let mut refetch_query = crate::query::compiler::Query::new(M::table_name());
            refetch_query.where_clause = Some(pk_where);
            refetch_query.limit = Some(1);

            let (refetch_sql, refetch_params) = compiler.compile_select(&refetch_query);
            let refetch_rows = db.query(&refetch_sql, &refetch_params).await?;

            if let Some(updated_row) = refetch_rows.into_iter().next() {
                return Ok((M::from_row(&updated_row)?, false));
            }
        }

        Ok((existing, false))
    } else {
        // Object doesn't exist — create it
        let mut create_fields: Vec<(&str, Value)> = Vec::new();
        for (name, val) in lookup_fields {
            create_fields.push((name, val.clone()));
        }
        for (name, val) in defaults {
            create_fields.push((name, val.clone()));
        }

        let (insert_sql, insert_params) = compiler.compile_insert(M::table_name(), &create_fields);
        let pk = db.insert_returning_id(&insert_sql, &insert_params).await?;

        // Fetch the created object
        let pk_where = WhereNode::Condition {
            column: M::pk_field_name().to_string(),
            lookup: Lookup::Exact(pk),
        };
        let mut fetch_query = crate::query::compiler::Query::new(M::table_name());
        fetch_query.where_clause = Some(pk_where);
        fetch_query.limit = Some(1);

        let (fetch_sql, fetch_params) = compiler.compile_select(&fetch_query);
        let fetch_rows = db.query(&fetch_sql, &fetch_params).await?;

        if let Some(row) = fetch_rows.into_iter().next() {
            Ok((M::from_row(&row)?, true))
        } else {
            Err(DjangoError::DatabaseError(
                "Failed to fetch newly created object".to_string(),
            ))
        }
    }
}
