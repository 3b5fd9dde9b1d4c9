//! Schema editor implementations for DDL generation.
//!
//! The [`SchemaEditor`] trait defines operations for creating, modifying, and
//! dropping database schema objects. Each database backend has its own
//! implementation that generates the correct SQL dialect.

use sha2::{Digest, Sha256};

use django_rs_db::fields::{FieldDef, FieldType, OnDelete};
use django_rs_db::model::Index;
use django_rs_db::query::compiler::DatabaseBackendType;
use django_rs_db::value::Value;

use crate::autodetect::ModelState;
use crate::errors::MigrationError;

/// Generates DDL SQL for schema operations.
///
/// Each database backend implements this trait to produce syntactically correct
/// DDL statements. The trait returns `Vec<String>` because some operations
/// (especially on SQLite) require multiple statements.
pub trait SchemaEditor: Send + Sync {
    /// Returns the backend type this editor targets.
    fn backend_type(&self) -> DatabaseBackendType;

    /// Generates `CREATE TABLE` DDL for a model. Foreign keys are not
    /// inlined into the statement; they are queued onto `session` as
    /// deferred `ALTER TABLE ... ADD CONSTRAINT` statements so a forward
    /// reference to a not-yet-created table never breaks table creation
    /// order, and the constraint is cached for later lookup.
    fn create_table(&self, session: &mut DdlSession, model: &ModelState) -> Vec<String>;

    /// Generates `DROP TABLE` DDL, invalidating `table_name`'s cached
    /// constraints. `cascade` drops dependent objects (foreign keys from
    /// other tables) along with it, the way `delete_table(name,
    /// cascade=True)` does.
    fn drop_table(&self, session: &mut DdlSession, table_name: &str, cascade: bool) -> Vec<String>;

    /// Generates `ALTER TABLE ... ADD COLUMN` DDL.
    ///
    /// Errors if `field` is `NOT NULL` with no default, since the engine
    /// has no value to backfill existing rows with. When `keep_default` is
    /// `false`, a default is applied for the `ADD COLUMN` itself and then
    /// dropped from the column afterwards (south's `keep_default=False`),
    /// so existing rows get the value but the column carries no default
    /// going forward.
    fn add_column(
        &self,
        session: &mut DdlSession,
        table_name: &str,
        field: &FieldDef,
        keep_default: bool,
    ) -> Result<Vec<String>, MigrationError>;

    /// Generates `ALTER TABLE ... DROP COLUMN` DDL, dropping a foreign key
    /// constraint anchored on `column_name` first if `session`'s cache
    /// knows of one.
    fn drop_column(&self, session: &mut DdlSession, table_name: &str, column_name: &str) -> Vec<String>;

    /// Generates DDL to alter a column's type, nullability, or default.
    fn alter_column(
        &self,
        table_name: &str,
        old_field: &FieldDef,
        new_field: &FieldDef,
    ) -> Vec<String>;

    /// Generates `ALTER TABLE ... RENAME COLUMN` DDL.
    fn rename_column(&self, table_name: &str, old_name: &str, new_name: &str) -> Vec<String>;

    /// Like [`alter_column`](Self::alter_column), but given the full column
    /// list the table will have once the alteration lands. Engines that
    /// cannot express a column alteration as a single `ALTER TABLE`
    /// statement (SQLite) use this to emit a real shadow-table rebuild
    /// (`CREATE ... AS SELECT`, drop, rename) instead of the narrower
    /// single-column form. Defaults to ignoring `all_columns` and
    /// delegating to [`alter_column`](Self::alter_column).
    fn alter_column_with_columns(
        &self,
        table_name: &str,
        old_field: &FieldDef,
        new_field: &FieldDef,
        all_columns: &[FieldDef],
    ) -> Vec<String> {
        let _ = all_columns;
        self.alter_column(table_name, old_field, new_field)
    }

    /// Like [`drop_column`](Self::drop_column), but given the full column
    /// list the table will have once the column is gone. See
    /// [`alter_column_with_columns`](Self::alter_column_with_columns).
    fn drop_column_with_columns(
        &self,
        session: &mut DdlSession,
        table_name: &str,
        column_name: &str,
        remaining_columns: &[FieldDef],
    ) -> Vec<String> {
        let _ = remaining_columns;
        self.drop_column(session, table_name, column_name)
    }

    /// Generates `CREATE INDEX` DDL.
    fn create_index(&self, table_name: &str, index: &Index) -> Vec<String>;

    /// Generates `DROP INDEX` DDL.
    fn drop_index(&self, index_name: &str) -> Vec<String>;

    /// Generates a `UNIQUE` constraint DDL.
    fn add_unique_constraint(&self, table_name: &str, columns: &[&str]) -> Vec<String>;

    /// Generates the SQL fragment for a column definition (type, constraints).
    fn column_sql(&self, field: &FieldDef) -> String;

    /// The character this dialect quotes identifiers with (`"` for
    /// Postgres/SQLite, `` ` `` for MySQL).
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// The deterministic name this dialect's [`add_unique_constraint`](Self::add_unique_constraint)
    /// gives a unique constraint over `columns`, so a later lookup does not
    /// have to introspect the database to find it by name.
    fn unique_constraint_name(&self, table_name: &str, columns: &[&str]) -> String {
        format!("{table_name}_{}_uniq", columns.join("_"))
    }

    /// The deterministic name this dialect's `CREATE INDEX` gives a plain
    /// index over `columns`.
    fn index_name_for_columns(&self, table_name: &str, columns: &[&str]) -> String {
        format!("{table_name}_{}_idx", columns.join("_"))
    }

    /// Creates a named `UNIQUE` constraint over `columns`, recording it in
    /// `session` under [`ConstraintKind::Unique`] so a later `delete_unique`
    /// can find it again without re-deriving or introspecting for the name.
    fn create_unique(&self, session: &mut DdlSession, table_name: &str, columns: &[&str]) -> Vec<String> {
        let name = self.unique_constraint_name(table_name, columns);
        session.cache_constraint(table_name, ConstraintKind::Unique, name);
        self.add_unique_constraint(table_name, columns)
    }

    /// Drops the `UNIQUE` constraint covering exactly `columns`, looked up
    /// by name via `session`'s cache (populated by a prior `create_unique`
    /// in the same session) rather than re-derived, the same way the
    /// History-backed cache this mirrors avoids a fresh introspection query
    /// per lookup. Falls back to the deterministic name if the cache has
    /// not seen this table yet (e.g. the constraint predates this session).
    fn delete_unique(&self, session: &mut DdlSession, table_name: &str, columns: &[&str]) -> Vec<String> {
        let name = session
            .known_constraints(table_name)
            .and_then(|set| {
                set.iter()
                    .find(|(kind, _)| *kind == ConstraintKind::Unique)
                    .map(|(_, name)| name.clone())
            })
            .unwrap_or_else(|| self.unique_constraint_name(table_name, columns));
        session.forget_constraint(table_name, ConstraintKind::Unique, &name);
        let q = self.identifier_quote();
        vec![format!("ALTER TABLE {q}{table_name}{q} DROP CONSTRAINT {q}{name}{q}")]
    }

    /// Creates a plain (non-unique) named index over `columns`, recording it
    /// under [`ConstraintKind::Index`].
    fn create_named_index(&self, session: &mut DdlSession, table_name: &str, columns: &[&str]) -> Vec<String> {
        let name = self.index_name_for_columns(table_name, columns);
        session.cache_constraint(table_name, ConstraintKind::Index, name.clone());
        let q = self.identifier_quote();
        let cols: Vec<String> = columns.iter().map(|c| format!("{q}{c}{q}")).collect();
        vec![format!(
            "CREATE INDEX {q}{name}{q} ON {q}{table_name}{q} ({})",
            cols.join(", ")
        )]
    }

    /// Drops the index covering exactly `columns`, looked up via `session`'s
    /// cache the same way [`delete_unique`](Self::delete_unique) looks up
    /// its constraint name.
    fn delete_index(&self, session: &mut DdlSession, table_name: &str, columns: &[&str]) -> Vec<String> {
        let name = session
            .known_constraints(table_name)
            .and_then(|set| {
                set.iter()
                    .find(|(kind, _)| *kind == ConstraintKind::Index)
                    .map(|(_, name)| name.clone())
            })
            .unwrap_or_else(|| self.index_name_for_columns(table_name, columns));
        session.forget_constraint(table_name, ConstraintKind::Index, &name);
        self.drop_index(&name)
    }

    /// Adds a `PRIMARY KEY` constraint over `columns`, recording it under
    /// [`ConstraintKind::PrimaryKey`]. Replaces any existing primary key;
    /// callers needing a clean replace should `drop_primary_key` first.
    fn add_primary_key(&self, session: &mut DdlSession, table_name: &str, columns: &[&str]) -> Vec<String> {
        let name = format!("{table_name}_pkey");
        session.cache_constraint(table_name, ConstraintKind::PrimaryKey, name);
        let q = self.identifier_quote();
        let cols: Vec<String> = columns.iter().map(|c| format!("{q}{c}{q}")).collect();
        vec![format!(
            "ALTER TABLE {q}{table_name}{q} ADD PRIMARY KEY ({})",
            cols.join(", ")
        )]
    }

    /// Drops `table_name`'s primary key, forgetting it from `session`'s
    /// cache.
    fn drop_primary_key(&self, session: &mut DdlSession, table_name: &str) -> Vec<String> {
        let name = format!("{table_name}_pkey");
        session.forget_constraint(table_name, ConstraintKind::PrimaryKey, &name);
        let q = self.identifier_quote();
        vec![format!(
            "ALTER TABLE {q}{table_name}{q} DROP CONSTRAINT {q}{name}{q}"
        )]
    }

    /// Whether `CREATE TABLE`/`ALTER TABLE` participate in the surrounding
    /// transaction and roll back cleanly with it.
    ///
    /// Engines that answer `false` here need the runner's dry-run pre-flight
    /// unconditionally, since a failed migration cannot simply be rolled back.
    fn has_ddl_transactions(&self) -> bool {
        true
    }

    /// Whether multiple column alterations (type, nullability, default) can
    /// be combined into a single `ALTER TABLE` statement.
    fn allows_combined_alters(&self) -> bool {
        true
    }

    /// The longest identifier (table, column, constraint) this dialect accepts.
    fn max_identifier_length(&self) -> usize {
        63
    }

    /// Generates a `RENAME TABLE`/`ALTER TABLE ... RENAME TO` statement,
    /// migrating `old_name`'s cached constraints to `new_name` in `session`.
    ///
    /// A no-op (empty statement list) when `old_name == new_name`.
    fn rename_table(&self, session: &mut DdlSession, old_name: &str, new_name: &str) -> Vec<String> {
        if old_name == new_name {
            return Vec::new();
        }
        session.rename(old_name, new_name);
        vec![format!("ALTER TABLE \"{old_name}\" RENAME TO \"{new_name}\"")]
    }

    /// Generates a deferrable foreign-key constraint definition fragment for
    /// use inside a `CREATE TABLE`/`ALTER TABLE ... ADD CONSTRAINT`.
    ///
    /// The constraint name is `{from_col}_refs_{to_col}_{hash}`, where `hash`
    /// is the first 8 hex digits of a SHA-256 of `"{from_table}.{from_col}
    /// -> {to_table}.{to_col}"`. The full name is truncated to
    /// [`max_identifier_length`](Self::max_identifier_length), preserving the
    /// hash suffix (the collision-breaking part) over the descriptive prefix.
    fn foreign_key_sql(&self, from_table: &str, from_col: &str, to_table: &str, to_col: &str) -> String {
        let constraint_name =
            foreign_key_constraint_name(from_col, to_col, from_table, to_table, self.max_identifier_length());
        format!(
            "CONSTRAINT \"{constraint_name}\" FOREIGN KEY (\"{from_col}\") REFERENCES \"{to_table}\" (\"{to_col}\") DEFERRABLE INITIALLY DEFERRED"
        )
    }

    /// Statement to disable foreign-key checks before a column rewrite that
    /// would otherwise fail the engine's own referential-integrity checks
    /// mid-migration. `None` for engines whose DDL is already safe to run
    /// without this (Postgres, SQLite's `PRAGMA` equivalent is handled by
    /// the caller separately since it is a connection pragma, not DDL).
    fn disable_foreign_key_checks(&self) -> Option<String> {
        None
    }

    /// The counterpart to [`disable_foreign_key_checks`](Self::disable_foreign_key_checks).
    /// Callers queue this onto a [`DdlSession`]'s deferred statements so it
    /// runs after the rest of the migration's DDL, not immediately.
    fn enable_foreign_key_checks(&self) -> Option<String> {
        None
    }
}

/// The kind of constraint a [`DdlSession`] has observed or created on a
/// table, used as the cache key alongside the constraint's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// A `UNIQUE` constraint.
    Unique,
    /// A `FOREIGN KEY` constraint.
    ForeignKey,
    /// A `CHECK` constraint.
    Check,
    /// A `PRIMARY KEY` constraint.
    PrimaryKey,
    /// A plain (non-unique) index.
    Index,
}

/// Per-connection state the DDL layer accumulates across one migration run.
///
/// Two concerns live here that a stateless [`SchemaEditor`] cannot track by
/// itself: SQL that must not run until the rest of the plan has been
/// emitted (an engine's foreign-key-checks re-enable, once disabled for a
/// column rewrite), and a cache of which constraints are already known to
/// exist on a table, so the schema editor does not have to introspect the
/// database again for every operation touching that table within the same
/// run.
#[derive(Debug, Default)]
pub struct DdlSession {
    deferred: Vec<String>,
    constraint_cache: std::collections::HashMap<String, std::collections::HashSet<(ConstraintKind, String)>>,
    pending_create_signals: Vec<PendingSignal>,
}

/// A table whose `CREATE TABLE` has run this session but whose post-create
/// hook has not yet been drained by the runner, mirroring south's
/// `db.send_pending_create_signals`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSignal {
    pub table_name: String,
}

impl DdlSession {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `table_name`'s post-create hook to fire the next time the
    /// runner drains signals.
    pub fn queue_create_signal(&mut self, table_name: &str) {
        self.pending_create_signals.push(PendingSignal {
            table_name: table_name.to_string(),
        });
    }

    /// Drains and returns every table queued since the last drain, in the
    /// order `create_table` queued them. Rust has no `try/finally`, so
    /// callers must drain on every exit path (success and failure) rather
    /// than relying on a single guaranteed call site.
    pub fn drain_pending_create_signals(&mut self) -> Vec<PendingSignal> {
        std::mem::take(&mut self.pending_create_signals)
    }

    /// Migrates `old_name`'s cached constraints to `new_name`, called after
    /// a table rename so a later lookup under the new name still finds
    /// them.
    pub fn rename(&mut self, old_name: &str, new_name: &str) {
        if let Some(set) = self.constraint_cache.remove(old_name) {
            self.constraint_cache.insert(new_name.to_string(), set);
        }
    }

    /// Queues a statement to run after the rest of the current migration's
    /// DDL, rather than immediately.
    pub fn defer(&mut self, sql: impl Into<String>) {
        self.deferred.push(sql.into());
    }

    /// Returns `true` if any statement is queued.
    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Drains and returns every queued statement, in the order it was
    /// queued. The caller is responsible for executing them.
    pub fn execute_deferred_sql(&mut self) -> Vec<String> {
        std::mem::take(&mut self.deferred)
    }

    /// Records that `table` is now known to carry a constraint of this
    /// kind and name, so a later lookup does not need to re-derive it.
    pub fn cache_constraint(&mut self, table: &str, kind: ConstraintKind, name: impl Into<String>) {
        self.constraint_cache
            .entry(table.to_string())
            .or_default()
            .insert((kind, name.into()));
    }

    /// Returns every constraint cached for `table`, if any DDL has touched
    /// it yet this session.
    pub fn known_constraints(
        &self,
        table: &str,
    ) -> Option<&std::collections::HashSet<(ConstraintKind, String)>> {
        self.constraint_cache.get(table)
    }

    /// Returns `true` if `table` is already known to carry a constraint of
    /// this kind and name.
    pub fn has_constraint(&self, table: &str, kind: ConstraintKind, name: &str) -> bool {
        self.constraint_cache
            .get(table)
            .is_some_and(|set| set.contains(&(kind, name.to_string())))
    }

    /// Drops every cached constraint for `table`. Called after any DDL
    /// (e.g. a table rename or rebuild) that could have changed its
    /// constraint set in a way this session did not itself record.
    pub fn invalidate(&mut self, table: &str) {
        self.constraint_cache.remove(table);
    }

    /// Forgets a single cached constraint, leaving the rest of `table`'s
    /// entries in place. Called after dropping one named constraint rather
    /// than rebuilding or dropping the whole table.
    pub fn forget_constraint(&mut self, table: &str, kind: ConstraintKind, name: &str) {
        if let Some(set) = self.constraint_cache.get_mut(table) {
            set.remove(&(kind, name.to_string()));
        }
    }
}

/// Computes the `{from_col}_refs_{to_col}_{hash}` foreign-key constraint name,
/// truncating from the front of the descriptive prefix so the trailing hash
/// (which disambiguates same-named constraints) always survives.
fn foreign_key_constraint_name(
    from_col: &str,
    to_col: &str,
    from_table: &str,
    to_table: &str,
    max_len: usize,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{from_table}.{from_col}->{to_table}.{to_col}"));
    let digest = hasher.finalize();
    let hash = digest.iter().take(4).map(|b| format!("{b:02x}")).collect::<String>();

    let suffix = format!("_refs_{to_col}_{hash}");
    let full = format!("{from_col}{suffix}");
    if full.len() <= max_len {
        return full;
    }
    let keep = max_len.saturating_sub(suffix.len());
    let prefix: String = from_col.chars().take(keep).collect();
    format!("{prefix}{suffix}")
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Generates the default value SQL fragment for a field.
fn default_sql(field: &FieldDef) -> String {
    match &field.default {
        Some(Value::Null) => " DEFAULT NULL".to_string(),
        Some(Value::Bool(b)) => format!(" DEFAULT {}", if *b { "TRUE" } else { "FALSE" }),
        Some(Value::Int(i)) => format!(" DEFAULT {i}"),
        Some(Value::Float(f)) => format!(" DEFAULT {f}"),
        Some(Value::String(s)) => format!(" DEFAULT '{}'", s.replace('\'', "''")),
        Some(_) => String::new(),
        None => String::new(),
    }
}

/// Generates ON DELETE clause SQL for foreign key fields.
fn on_delete_sql(on_delete: OnDelete) -> &'static str {
    match on_delete {
        OnDelete::Cascade => "CASCADE",
        OnDelete::Protect => "RESTRICT",
        OnDelete::SetNull => "SET NULL",
        OnDelete::SetDefault => "SET DEFAULT",
        OnDelete::DoNothing => "NO ACTION",
    }
}

/// Extracts the table part from a "app.Model" reference for FK targets.
fn fk_target_table(to: &str) -> String {
    // Format: "app_label.model_name" -> "app_label_model_name"
    to.replace('.', "_")
}

/// Builds the column-only `CREATE TABLE` statement for `model`, queuing a
/// deferred `ALTER TABLE ... ADD CONSTRAINT` for each foreign key instead
/// of inlining it. Shared by every dialect so a constraint's name, its
/// deferred SQL, and its cache entry are derived in exactly one place.
fn build_create_table(editor: &dyn SchemaEditor, session: &mut DdlSession, model: &ModelState) -> Vec<String> {
    let table_name = model.db_table();
    session.invalidate(&table_name);
    let q = editor.identifier_quote();
    let mut col_defs: Vec<String> = Vec::new();

    for field in &model.fields {
        let fd = field.to_field_def();
        col_defs.push(format!("{q}{}{q} {}", fd.column, editor.column_sql(&fd)));

        let fk_target = match &fd.field_type {
            FieldType::ForeignKey { to, on_delete, .. }
            | FieldType::OneToOneField { to, on_delete, .. } => Some((fk_target_table(to), *on_delete)),
            _ => None,
        };
        if let Some((target_table, on_delete)) = fk_target {
            let constraint_name = foreign_key_constraint_name(
                &fd.column,
                "id",
                &table_name,
                &target_table,
                editor.max_identifier_length(),
            );
            let fragment = editor.foreign_key_sql(&table_name, &fd.column, &target_table, "id");
            let fragment = fragment.replacen(
                "DEFERRABLE",
                &format!("ON DELETE {} DEFERRABLE", on_delete_sql(on_delete)),
                1,
            );
            session.defer(format!("ALTER TABLE {q}{table_name}{q} ADD {fragment}"));
            session.cache_constraint(&table_name, ConstraintKind::ForeignKey, constraint_name);
        }
    }

    session.queue_create_signal(&table_name);
    vec![format!("CREATE TABLE {q}{table_name}{q} ({})", col_defs.join(", "))]
}

/// Finds and forgets the foreign-key constraint anchored on `column_name`,
/// if `session`'s cache knows of one (named `{column_name}_refs_...` by
/// [`foreign_key_constraint_name`]). Used by `drop_column` so a dropped
/// column does not leave a dangling constraint reference behind.
fn take_column_fk_constraint(session: &mut DdlSession, table_name: &str, column_name: &str) -> Option<String> {
    let prefix = format!("{column_name}_refs_");
    let name = session
        .known_constraints(table_name)?
        .iter()
        .find(|(kind, name)| *kind == ConstraintKind::ForeignKey && name.starts_with(&prefix))
        .map(|(_, name)| name.clone())?;
    session.forget_constraint(table_name, ConstraintKind::ForeignKey, &name);
    Some(name)
}

// ── PostgreSQL ───────────────────────────────────────────────────────────

/// Schema editor for PostgreSQL databases.
///
/// Uses PostgreSQL-specific DDL syntax including `BIGSERIAL`, `JSONB`, native
/// `UUID`, `BOOLEAN`, and proper `ALTER COLUMN` support.
pub struct PostgresSchemaEditor;

impl SchemaEditor for PostgresSchemaEditor {
    fn backend_type(&self) -> DatabaseBackendType {
        DatabaseBackendType::PostgreSQL
    }

    fn create_table(&self, session: &mut DdlSession, model: &ModelState) -> Vec<String> {
        build_create_table(self, session, model)
    }

    fn drop_table(&self, session: &mut DdlSession, table_name: &str, cascade: bool) -> Vec<String> {
        session.invalidate(table_name);
        let cascade_sql = if cascade { " CASCADE" } else { "" };
        vec![format!("DROP TABLE IF EXISTS \"{table_name}\"{cascade_sql}")]
    }

    fn add_column(
        &self,
        _session: &mut DdlSession,
        table_name: &str,
        field: &FieldDef,
        keep_default: bool,
    ) -> Result<Vec<String>, MigrationError> {
        if !field.null && field.default.is_none() {
            return Err(MigrationError::ColumnRequiresDefault {
                table: table_name.to_string(),
                column: field.column.clone(),
            });
        }
        let col_sql = self.column_sql(field);
        let mut stmts = vec![format!(
            "ALTER TABLE \"{table_name}\" ADD COLUMN \"{}\" {col_sql}",
            field.column
        )];
        if !keep_default && field.default.is_some() {
            stmts.push(format!(
                "ALTER TABLE \"{table_name}\" ALTER COLUMN \"{}\" DROP DEFAULT",
                field.column
            ));
        }
        Ok(stmts)
    }

    fn drop_column(&self, session: &mut DdlSession, table_name: &str, column_name: &str) -> Vec<String> {
        let mut stmts = Vec::new();
        if let Some(name) = take_column_fk_constraint(session, table_name, column_name) {
            stmts.push(format!("ALTER TABLE \"{table_name}\" DROP CONSTRAINT \"{name}\""));
        }
        stmts.push(format!(
            "ALTER TABLE \"{table_name}\" DROP COLUMN \"{column_name}\""
        ));
        stmts
    }

    fn alter_column(
        &self,
        table_name: &str,
        _old_field: &FieldDef,
        new_field: &FieldDef,
    ) -> Vec<String> {
        let mut stmts = Vec::new();
        let col = &new_field.column;
        let type_sql = pg_type_sql(&new_field.field_type, new_field.max_length);

        stmts.push(format!(
            "ALTER TABLE \"{table_name}\" ALTER COLUMN \"{col}\" TYPE {type_sql}"
        ));

        if new_field.null {
            stmts.push(format!(
                "ALTER TABLE \"{table_name}\" ALTER COLUMN \"{col}\" DROP NOT NULL"
            ));
        } else {
            stmts.push(format!(
                "ALTER TABLE \"{table_name}\" ALTER COLUMN \"{col}\" SET NOT NULL"
            ));
        }

        if let Some(ref val) = new_field.default {
            let def = match val {
                Value::Null => "NULL".to_string(),
                Value::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
                Value::Int(i) => i.to_string(),
                Value::Float(f) => f.to_string(),
                Value::String(s) => format!("'{}'", s.replace('\'', "''")),
                _ => "NULL".to_string(),
            };
            stmts.push(format!(
                "ALTER TABLE \"{table_name}\" ALTER COLUMN \"{col}\" SET DEFAULT {def}"
            ));
        } else {
            stmts.push(format!(
                "ALTER TABLE \"{table_name}\" ALTER COLUMN \"{col}\" DROP DEFAULT"
            ));
        }

        stmts
    }

    fn rename_column(&self, table_name: &str, old_name: &str, new_name: &str) -> Vec<String> {
        vec![format!(
            "ALTER TABLE \"{table_name}\" RENAME COLUMN \"{old_name}\" TO \"{new_name}\""
        )]
    }

    fn create_index(&self, table_name: &str, index: &Index) -> Vec<String> {
        let idx_name = index.name.as_deref().unwrap_or("unnamed_index");
        let unique = if index.unique { "UNIQUE " } else { "" };
        let cols: Vec<String> = index.fields.iter().map(|f| format!("\"{f}\"")).collect();
        vec![format!(
            "CREATE {unique}INDEX \"{idx_name}\" ON \"{table_name}\" ({})",
            cols.join(", ")
        )]
    }

    fn drop_index(&self, index_name: &str) -> Vec<String> {
        vec![format!("DROP INDEX IF EXISTS \"{index_name}\"")]
    }

    fn add_unique_constraint(&self, table_name: &str, columns: &[&str]) -> Vec<String> {
        let cols: Vec<String> = columns.iter().map(|c| format!("\"{c}\"")).collect();
        let constraint_name = format!("{table_name}_{}_{}", columns.join("_"), "uniq");
        vec![format!(
            "ALTER TABLE \"{table_name}\" ADD CONSTRAINT \"{constraint_name}\" UNIQUE ({})",
            cols.join(", ")
        )]
    }

    fn column_sql(&self, field: &FieldDef) -> String {
        let type_str = pg_type_sql(&field.field_type, field.max_length);
        let null_str = if field.primary_key {
            " PRIMARY KEY"
        } else if field.null {
            " NULL"
        } else {
            " NOT NULL"
        };
        let unique_str = if field.unique && !field.primary_key {
            " UNIQUE"
        } else {
            ""
        };
        let default_str = default_sql(field);
        format!("{type_str}{null_str}{unique_str}{default_str}")
    }
}

/// Returns the PostgreSQL type name for a field type.
fn pg_type_sql(field_type: &FieldType, max_length: Option<usize>) -> String {
    match field_type {
        FieldType::AutoField => "SERIAL".to_string(),
        FieldType::BigAutoField => "BIGSERIAL".to_string(),
        FieldType::CharField
        | FieldType::EmailField
        | FieldType::UrlField
        | FieldType::SlugField => {
            let len = max_length.unwrap_or(255);
            format!("VARCHAR({len})")
        }
        FieldType::TextField => "TEXT".to_string(),
        FieldType::IntegerField => "INTEGER".to_string(),
        FieldType::BigIntegerField => "BIGINT".to_string(),
        FieldType::SmallIntegerField => "SMALLINT".to_string(),
        FieldType::FloatField => "DOUBLE PRECISION".to_string(),
        FieldType::DecimalField {
            max_digits,
            decimal_places,
        } => format!("NUMERIC({max_digits}, {decimal_places})"),
        FieldType::BooleanField => "BOOLEAN".to_string(),
        FieldType::DateField => "DATE".to_string(),
        FieldType::DateTimeField => "TIMESTAMP".to_string(),
        FieldType::TimeField => "TIME".to_string(),
        FieldType::DurationField => "INTERVAL".to_string(),
        FieldType::UuidField => "UUID".to_string(),
        FieldType::BinaryField => "BYTEA".to_string(),
        FieldType::JsonField => "JSONB".to_string(),
        FieldType::IpAddressField => "INET".to_string(),
        FieldType::FilePathField => "VARCHAR(255)".to_string(),
        FieldType::ForeignKey { .. } | FieldType::OneToOneField { .. } => "BIGINT".to_string(),
        FieldType::ManyToManyField { .. } => String::new(), // handled separately
        FieldType::ArrayField { base_field, .. } => {
            format!("{}[]", pg_type_sql(base_field, None))
        }
        FieldType::HStoreField => "HSTORE".to_string(),
        FieldType::IntegerRangeField => "INT4RANGE".to_string(),
        FieldType::BigIntegerRangeField => "INT8RANGE".to_string(),
        FieldType::FloatRangeField => "NUMRANGE".to_string(),
        FieldType::DateRangeField => "DATERANGE".to_string(),
        FieldType::DateTimeRangeField => "TSTZRANGE".to_string(),
        FieldType::GeneratedField {
            expression,
            output_field,
            db_persist,
        } => {
            let output_type = pg_type_sql(output_field, None);
            let persist = if *db_persist { "STORED" } else { "VIRTUAL" };
            format!("{output_type} GENERATED ALWAYS AS ({expression}) {persist}")
        }
    }
}

// ── SQLite ───────────────────────────────────────────────────────────────

/// Schema editor for SQLite databases.
///
/// SQLite has limited `ALTER TABLE` support -- it cannot alter or drop columns
/// in older versions. For `alter_column` and `drop_column`, this editor uses
/// the table recreation strategy (create new table, copy data, swap).
pub struct SqliteSchemaEditor;

impl SchemaEditor for SqliteSchemaEditor {
    fn backend_type(&self) -> DatabaseBackendType {
        DatabaseBackendType::SQLite
    }

    fn allows_combined_alters(&self) -> bool {
        false
    }

    fn max_identifier_length(&self) -> usize {
        // SQLite has no real identifier-length ceiling; this bound exists
        // only so generated constraint names stay comparable across dialects.
        128
    }

    fn create_table(&self, session: &mut DdlSession, model: &ModelState) -> Vec<String> {
        build_create_table(self, session, model)
    }

    fn drop_table(&self, session: &mut DdlSession, table_name: &str, cascade: bool) -> Vec<String> {
        session.invalidate(table_name);
        if cascade {
            vec![
                "PRAGMA foreign_keys=OFF".to_string(),
                format!("DROP TABLE IF EXISTS \"{table_name}\""),
                "PRAGMA foreign_keys=ON".to_string(),
            ]
        } else {
            vec![format!("DROP TABLE IF EXISTS \"{table_name}\"")]
        }
    }

    fn add_column(
        &self,
        _session: &mut DdlSession,
        table_name: &str,
        field: &FieldDef,
        keep_default: bool,
    ) -> Result<Vec<String>, MigrationError> {
        if !field.null && field.default.is_none() {
            return Err(MigrationError::ColumnRequiresDefault {
                table: table_name.to_string(),
                column: field.column.clone(),
            });
        }
        let col_sql = self.column_sql(field);
        let mut stmts = vec![format!(
            "ALTER TABLE \"{table_name}\" ADD COLUMN \"{}\" {col_sql}",
            field.column
        )];
        if !keep_default && field.default.is_some() {
            stmts.push(format!(
                "-- SQLite: cannot drop a column default once set; \"{table_name}\".\"{}\" keeps its literal default",
                field.column
            ));
        }
        Ok(stmts)
    }

    fn drop_column(&self, session: &mut DdlSession, table_name: &str, column_name: &str) -> Vec<String> {
        // SQLite 3.35+ supports DROP COLUMN directly; callers that know the
        // full post-drop column list should prefer `drop_column_with_columns`,
        // which rebuilds the table instead and works on every SQLite version.
        take_column_fk_constraint(session, table_name, column_name);
        vec![format!(
            "ALTER TABLE \"{table_name}\" DROP COLUMN \"{column_name}\""
        )]
    }

    fn alter_column(
        &self,
        table_name: &str,
        old_field: &FieldDef,
        new_field: &FieldDef,
    ) -> Vec<String> {
        // Without the full column list this can only rebuild a single-column
        // table; real callers go through `alter_column_with_columns` instead,
        // which `AlterField::database_forwards`/`database_backwards` use.
        let _ = old_field;
        sqlite_rebuild_table(self, table_name, std::slice::from_ref(new_field))
    }

    fn alter_column_with_columns(
        &self,
        table_name: &str,
        _old_field: &FieldDef,
        _new_field: &FieldDef,
        all_columns: &[FieldDef],
    ) -> Vec<String> {
        // `all_columns` is the table's post-alteration column list, already
        // reflecting the new field definition -- no splicing needed.
        sqlite_rebuild_table(self, table_name, all_columns)
    }

    fn drop_column_with_columns(
        &self,
        session: &mut DdlSession,
        table_name: &str,
        column_name: &str,
        remaining_columns: &[FieldDef],
    ) -> Vec<String> {
        take_column_fk_constraint(session, table_name, column_name);
        sqlite_rebuild_table(self, table_name, remaining_columns)
    }

    fn rename_column(&self, table_name: &str, old_name: &str, new_name: &str) -> Vec<String> {
        // SQLite 3.25.0+ supports RENAME COLUMN
        vec![format!(
            "ALTER TABLE \"{table_name}\" RENAME COLUMN \"{old_name}\" TO \"{new_name}\""
        )]
    }

    fn create_index(&self, table_name: &str, index: &Index) -> Vec<String> {
        let idx_name = index.name.as_deref().unwrap_or("unnamed_index");
        let unique = if index.unique { "UNIQUE " } else { "" };
        let cols: Vec<String> = index.fields.iter().map(|f| format!("\"{f}\"")).collect();
        vec![format!(
            "CREATE {unique}INDEX \"{idx_name}\" ON \"{table_name}\" ({})",
            cols.join(", ")
        )]
    }

    fn drop_index(&self, index_name: &str) -> Vec<String> {
        vec![format!("DROP INDEX IF EXISTS \"{index_name}\"")]
    }

    fn add_unique_constraint(&self, table_name: &str, columns: &[&str]) -> Vec<String> {
        // SQLite: create a unique index to enforce the constraint
        let cols: Vec<String> = columns.iter().map(|c| format!("\"{c}\"")).collect();
        let idx_name = self.unique_constraint_name(table_name, columns);
        vec![format!(
            "CREATE UNIQUE INDEX \"{idx_name}\" ON \"{table_name}\" ({})",
            cols.join(", ")
        )]
    }

    fn delete_unique(&self, session: &mut DdlSession, table_name: &str, columns: &[&str]) -> Vec<String> {
        // SQLite has no DROP CONSTRAINT; add_unique_constraint above enforces
        // uniqueness via a named index, so removing it is a DROP INDEX.
        let name = session
            .known_constraints(table_name)
            .and_then(|set| {
                set.iter()
                    .find(|(kind, _)| *kind == ConstraintKind::Unique)
                    .map(|(_, name)| name.clone())
            })
            .unwrap_or_else(|| self.unique_constraint_name(table_name, columns));
        session.forget_constraint(table_name, ConstraintKind::Unique, &name);
        vec![format!("DROP INDEX \"{name}\"")]
    }

    fn add_primary_key(&self, _session: &mut DdlSession, table_name: &str, _columns: &[&str]) -> Vec<String> {
        // SQLite's primary key is declared inline on the column, not added
        // via ALTER TABLE; changing it needs the shadow-table rebuild
        // `alter_column_with_columns` already performs when a field's
        // `primary_key` flag changes. Nothing to do standalone here.
        vec![format!(
            "-- SQLite: primary key on \"{table_name}\" is set via column definition; rebuild the table instead of ADD PRIMARY KEY"
        )]
    }

    fn drop_primary_key(&self, _session: &mut DdlSession, table_name: &str) -> Vec<String> {
        vec![format!(
            "-- SQLite: primary key on \"{table_name}\" is set via column definition; rebuild the table instead of DROP PRIMARY KEY"
        )]
    }

    fn column_sql(&self, field: &FieldDef) -> String {
        let type_str = sqlite_type_sql(&field.field_type);
        let null_str = if field.primary_key {
            " PRIMARY KEY"
        } else if field.null {
            ""
        } else {
            " NOT NULL"
        };
        let unique_str = if field.unique && !field.primary_key {
            " UNIQUE"
        } else {
            ""
        };
        // Auto-increment for SQLite primary keys
        let autoincrement = if field.primary_key
            && matches!(
                field.field_type,
                FieldType::AutoField | FieldType::BigAutoField
            ) {
            " AUTOINCREMENT"
        } else {
            ""
        };
        let default_str = default_sql(field);
        format!("{type_str}{null_str}{autoincrement}{unique_str}{default_str}")
    }
}

/// Returns the SQLite type name for a field type.
fn sqlite_type_sql(field_type: &FieldType) -> &'static str {
    match field_type {
        FieldType::AutoField | FieldType::BigAutoField => "INTEGER",
        FieldType::CharField
        | FieldType::TextField
        | FieldType::EmailField
        | FieldType::UrlField
        | FieldType::SlugField
        | FieldType::FilePathField
        | FieldType::IpAddressField => "TEXT",
        FieldType::IntegerField
        | FieldType::BigIntegerField
        | FieldType::SmallIntegerField
        | FieldType::BooleanField => "INTEGER",
        FieldType::FloatField | FieldType::DecimalField { .. } => "REAL",
        FieldType::DateField | FieldType::DateTimeField | FieldType::TimeField => "TEXT",
        FieldType::DurationField => "TEXT",
        FieldType::UuidField => "TEXT",
        FieldType::BinaryField => "BLOB",
        FieldType::JsonField => "TEXT",
        FieldType::ForeignKey { .. } | FieldType::OneToOneField { .. } => "INTEGER",
        FieldType::ManyToManyField { .. } => "",
        // PostgreSQL-specific types: use TEXT representation in SQLite
        FieldType::ArrayField { .. }
        | FieldType::HStoreField
        | FieldType::IntegerRangeField
        | FieldType::BigIntegerRangeField
        | FieldType::FloatRangeField
        | FieldType::DateRangeField
        | FieldType::DateTimeRangeField
        | FieldType::GeneratedField { .. } => "TEXT",
    }
}

/// Performs SQLite's shadow-table rebuild: create a table under a temporary
/// name with `columns` as its final shape, copy every row across matching
/// column names, drop the original, then rename the shadow into place. This
/// is the only way to express a column type/nullability/default change, or
/// certain column drops, on engines with no `ALTER COLUMN` support.
fn sqlite_rebuild_table(editor: &SqliteSchemaEditor, table_name: &str, columns: &[FieldDef]) -> Vec<String> {
    let shadow = format!("__{table_name}_new");
    let col_defs: Vec<String> = columns
        .iter()
        .map(|f| format!("\"{}\" {}", f.column, editor.column_sql(f)))
        .collect();
    let col_names: Vec<String> = columns.iter().map(|f| format!("\"{}\"", f.column)).collect();
    let names = col_names.join(", ");

    vec![
        format!(
            "-- SQLite: recreate table \"{table_name}\" ({} column(s))",
            columns.len()
        ),
        format!("CREATE TABLE \"{shadow}\" ({})", col_defs.join(", ")),
        format!("INSERT INTO \"{shadow}\" ({names}) SELECT {names} FROM \"{table_name}\""),
        format!("DROP TABLE \"{table_name}\""),
        format!("ALTER TABLE \"{shadow}\" RENAME TO \"{table_name}\""),
    ]
}

// ── MySQL ────────────────────────────────────────────────────────────────

/// Schema editor for MySQL databases.
///
/// Uses MySQL-specific DDL syntax including `AUTO_INCREMENT`, `TINYINT(1)` for
/// booleans, `JSON` type, and `MODIFY COLUMN` for alterations.
pub struct MySqlSchemaEditor;

impl SchemaEditor for MySqlSchemaEditor {
    fn backend_type(&self) -> DatabaseBackendType {
        DatabaseBackendType::MySQL
    }

    fn has_ddl_transactions(&self) -> bool {
        // MySQL DDL causes an implicit commit; a failed migration cannot be
        // rolled back, so the runner must dry-run first regardless of the
        // unit's `no_dry_run` flag.
        false
    }

    fn max_identifier_length(&self) -> usize {
        64
    }

    fn identifier_quote(&self) -> char {
        '`'
    }

    fn delete_unique(&self, session: &mut DdlSession, table_name: &str, columns: &[&str]) -> Vec<String> {
        // MySQL's ADD CONSTRAINT ... UNIQUE creates an index under the name;
        // DROP INDEX is the portable way to remove it (DROP CONSTRAINT only
        // works on MySQL 8.0.19+).
        let name = session
            .known_constraints(table_name)
            .and_then(|set| {
                set.iter()
                    .find(|(kind, _)| *kind == ConstraintKind::Unique)
                    .map(|(_, name)| name.clone())
            })
            .unwrap_or_else(|| self.unique_constraint_name(table_name, columns));
        session.forget_constraint(table_name, ConstraintKind::Unique, &name);
        vec![format!("ALTER TABLE `{table_name}` DROP INDEX `{name}`")]
    }

    fn drop_primary_key(&self, session: &mut DdlSession, table_name: &str) -> Vec<String> {
        session.forget_constraint(table_name, ConstraintKind::PrimaryKey, &format!("{table_name}_pkey"));
        vec![format!("ALTER TABLE `{table_name}` DROP PRIMARY KEY")]
    }

    fn rename_table(&self, session: &mut DdlSession, old_name: &str, new_name: &str) -> Vec<String> {
        if old_name == new_name {
            return Vec::new();
        }
        session.rename(old_name, new_name);
        vec![format!("RENAME TABLE `{old_name}` TO `{new_name}`")]
    }

    fn disable_foreign_key_checks(&self) -> Option<String> {
        Some("SET FOREIGN_KEY_CHECKS=0".to_string())
    }

    fn enable_foreign_key_checks(&self) -> Option<String> {
        Some("SET FOREIGN_KEY_CHECKS=1".to_string())
    }

    fn create_table(&self, session: &mut DdlSession, model: &ModelState) -> Vec<String> {
        build_create_table(self, session, model)
    }

    fn drop_table(&self, session: &mut DdlSession, table_name: &str, cascade: bool) -> Vec<String> {
        session.invalidate(table_name);
        let mut stmts = Vec::new();
        if cascade {
            if let Some(disable) = self.disable_foreign_key_checks() {
                stmts.push(disable);
            }
        }
        stmts.push(format!("DROP TABLE IF EXISTS `{table_name}`"));
        if cascade {
            if let Some(enable) = self.enable_foreign_key_checks() {
                stmts.push(enable);
            }
        }
        stmts
    }

    fn add_column(
        &self,
        _session: &mut DdlSession,
        table_name: &str,
        field: &FieldDef,
        keep_default: bool,
    ) -> Result<Vec<String>, MigrationError> {
        if !field.null && field.default.is_none() {
            return Err(MigrationError::ColumnRequiresDefault {
                table: table_name.to_string(),
                column: field.column.clone(),
            });
        }
        let col_sql = self.column_sql(field);
        let mut stmts = vec![format!(
            "ALTER TABLE `{table_name}` ADD COLUMN `{}` {col_sql}",
            field.column
        )];
        if !keep_default && field.default.is_some() {
            stmts.push(format!(
                "ALTER TABLE `{table_name}` ALTER COLUMN `{}` DROP DEFAULT",
                field.column
            ));
        }
        Ok(stmts)
    }

    fn drop_column(&self, session: &mut DdlSession, table_name: &str, column_name: &str) -> Vec<String> {
        let mut stmts = Vec::new();
        if let Some(name) = take_column_fk_constraint(session, table_name, column_name) {
            stmts.push(format!("ALTER TABLE `{table_name}` DROP FOREIGN KEY `{name}`"));
        }
        stmts.push(format!(
            "ALTER TABLE `{table_name}` DROP COLUMN `{column_name}`"
        ));
        stmts
    }

    fn alter_column(
        &self,
        table_name: &str,
        _old_field: &FieldDef,
        new_field: &FieldDef,
    ) -> Vec<String> {
        let col_sql = self.column_sql(new_field);
        vec![format!(
            "ALTER TABLE `{table_name}` MODIFY COLUMN `{}` {col_sql}",
            new_field.column
        )]
    }

    fn rename_column(&self, table_name: &str, old_name: &str, new_name: &str) -> Vec<String> {
        vec![format!(
            "ALTER TABLE `{table_name}` RENAME COLUMN `{old_name}` TO `{new_name}`"
        )]
    }

    fn create_index(&self, table_name: &str, index: &Index) -> Vec<String> {
        let idx_name = index.name.as_deref().unwrap_or("unnamed_index");
        let unique = if index.unique { "UNIQUE " } else { "" };
        let cols: Vec<String> = index.fields.iter().map(|f| format!("`{f}`")).collect();
        vec![format!(
            "CREATE {unique}INDEX `{idx_name}` ON `{table_name}` ({})",
            cols.join(", ")
        )]
    }

    fn drop_index(&self, index_name: &str) -> Vec<String> {
        vec![format!("DROP INDEX `{index_name}`")]
    }

    fn add_unique_constraint(&self, table_name: &str, columns: &[&str]) -> Vec<String> {
        let cols: Vec<String> = columns.iter().map(|c| format!("`{c}`")).collect();
        let constraint_name = format!("{table_name}_{}_{}", columns.join("_"), "uniq");
        vec![format!(
            "ALTER TABLE `{table_name}` ADD CONSTRAINT `{constraint_name}` UNIQUE ({})",
            cols.join(", ")
        )]
    }

    fn column_sql(&self, field: &FieldDef) -> String {
        let type_str = mysql_type_sql(&field.field_type, field.max_length);
        let null_str = if field.primary_key {
            " PRIMARY KEY"
        } else if field.null {
            " NULL"
        } else {
            " NOT NULL"
        };
        let unique_str = if field.unique && !field.primary_key {
            " UNIQUE"
        } else {
            ""
        };
        let auto_inc = if field.primary_key
            && matches!(
                field.field_type,
                FieldType::AutoField | FieldType::BigAutoField
            ) {
            " AUTO_INCREMENT"
        } else {
            ""
        };
        let default_str = default_sql(field);
        format!("{type_str}{null_str}{auto_inc}{unique_str}{default_str}")
    }
}

/// Returns the MySQL type name for a field type.
fn mysql_type_sql(field_type: &FieldType, max_length: Option<usize>) -> String {
    match field_type {
        FieldType::AutoField => "INT".to_string(),
        FieldType::BigAutoField => "BIGINT".to_string(),
        FieldType::CharField
        | FieldType::EmailField
        | FieldType::UrlField
        | FieldType::SlugField => {
            let len = max_length.unwrap_or(255);
            format!("VARCHAR({len})")
        }
        FieldType::TextField => "LONGTEXT".to_string(),
        FieldType::IntegerField => "INT".to_string(),
        FieldType::BigIntegerField => "BIGINT".to_string(),
        FieldType::SmallIntegerField => "SMALLINT".to_string(),
        FieldType::FloatField => "DOUBLE".to_string(),
        FieldType::DecimalField {
            max_digits,
            decimal_places,
        } => format!("DECIMAL({max_digits}, {decimal_places})"),
        FieldType::BooleanField => "TINYINT(1)".to_string(),
        FieldType::DateField => "DATE".to_string(),
        FieldType::DateTimeField => "DATETIME".to_string(),
        FieldType::TimeField => "TIME".to_string(),
        FieldType::DurationField => "BIGINT".to_string(),
        FieldType::UuidField => "CHAR(36)".to_string(),
        FieldType::BinaryField => "LONGBLOB".to_string(),
        FieldType::JsonField => "JSON".to_string(),
        FieldType::IpAddressField => "VARCHAR(45)".to_string(),
        FieldType::FilePathField => "VARCHAR(255)".to_string(),
        FieldType::ForeignKey { .. } | FieldType::OneToOneField { .. } => "BIGINT".to_string(),
        FieldType::ManyToManyField { .. } => String::new(),
        // PostgreSQL-specific types: use JSON representation in MySQL
        FieldType::ArrayField { .. } | FieldType::HStoreField => "JSON".to_string(),
        FieldType::IntegerRangeField
        | FieldType::BigIntegerRangeField
        | FieldType::FloatRangeField
        | FieldType::DateRangeField
        | FieldType::DateTimeRangeField => "VARCHAR(255)".to_string(),
        FieldType::GeneratedField {
            expression,
            output_field,
            db_persist,
        } => {
            let output_type = mysql_type_sql(output_field, None);
            let persist = if *db_persist { "STORED" } else { "VIRTUAL" };
            format!("{output_type} GENERATED ALWAYS AS ({expression}) {persist}")
        }
    }
}
