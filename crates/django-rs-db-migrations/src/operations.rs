//! Migration operations that describe schema changes.
//!
//! Each operation knows how to apply itself forwards and backwards. Operations
//! are the fundamental building blocks of migrations, corresponding to
//! Django's `django.db.migrations.operations`.

use django_rs_core::DjangoError;
use django_rs_db::model::Index;

use crate::autodetect::{MigrationFieldDef, ModelOptions, ModelState, ProjectState};
use crate::schema_editor::{DdlSession, SchemaEditor};

/// A single migration operation that can be applied forwards or backwards.
///
/// Operations modify both the in-memory project state and produce DDL SQL
/// for the database schema.
pub trait Operation: Send + Sync {
    /// Returns a human-readable description of this operation.
    fn describe(&self) -> String;

    /// Applies this operation to the in-memory project state (forward direction).
    fn state_forwards(&self, app_label: &str, state: &mut ProjectState);

    /// Generates the DDL SQL to apply this operation (forward direction).
    fn database_forwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        session: &mut DdlSession,
        from_state: &ProjectState,
        to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError>;

    /// Generates the DDL SQL to reverse this operation (backward direction).
    fn database_backwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        session: &mut DdlSession,
        from_state: &ProjectState,
        to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError>;

    /// Returns whether this operation is reversible.
    fn reversible(&self) -> bool;
}

/// Creates a new database table.
///
/// Generates a `CREATE TABLE` statement with all specified fields and
/// constraints.
#[derive(Debug, Clone)]
pub struct CreateModel {
    /// The model name.
    pub name: String,
    /// The fields for the new table.
    pub fields: Vec<MigrationFieldDef>,
    /// Model-level options (indexes, unique_together, etc.).
    pub options: ModelOptions,
}

impl Operation for CreateModel {
    fn describe(&self) -> String {
        format!("Create model {}", self.name)
    }

    fn state_forwards(&self, app_label: &str, state: &mut ProjectState) {
        let model = ModelState {
            app_label: app_label.to_string(),
            name: self.name.clone(),
            fields: self.fields.clone(),
            options: self.options.clone(),
        };
        state.add_model(model);
    }

    fn database_forwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        session: &mut DdlSession,
        _from_state: &ProjectState,
        to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let key = (app_label.to_string(), self.name.clone());
        let model = to_state
            .models
            .get(&key)
            .ok_or_else(|| DjangoError::DatabaseError(format!("Model {} not found in state", self.name)))?;
        Ok(schema_editor.create_table(session, model))
    }

    fn database_backwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        session: &mut DdlSession,
        _from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let table_name = format!("{app_label}_{}", self.name);
        Ok(schema_editor.drop_table(session, &table_name, true))
    }

    fn reversible(&self) -> bool {
        true
    }
}

/// Drops a database table.
///
/// Generates a `DROP TABLE` statement. This is reversible only if
/// the model state is available in the "from" state.
#[derive(Debug, Clone)]
pub struct DeleteModel {
    /// The model name to delete.
    pub name: String,
}

impl Operation for DeleteModel {
    fn describe(&self) -> String {
        format!("Delete model {}", self.name)
    }

    fn state_forwards(&self, app_label: &str, state: &mut ProjectState) {
        let key = (app_label.to_string(), self.name.clone());
        state.models.remove(&key);
    }

    fn database_forwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        session: &mut DdlSession,
        _from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let table_name = format!("{app_label}_{}", self.name);
        Ok(schema_editor.drop_table(session, &table_name, true))
    }

    fn database_backwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        session: &mut DdlSession,
        from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let key = (app_label.to_string(), self.name.clone());
        let model = from_state
            .models
            .get(&key)
            .ok_or_else(|| DjangoError::DatabaseError(format!("Model {} not found in from_state", self.name)))?;
        Ok(schema_editor.create_table(session, model))
    }

    fn reversible(&self) -> bool {
        true
    }
}

/// Adds a column to an existing table.
///
/// Generates an `ALTER TABLE ... ADD COLUMN` statement.
#[derive(Debug, Clone)]
pub struct AddField {
    /// The model name the field is being added to.
    pub model_name: String,
    /// The field to add.
    pub field: MigrationFieldDef,
}

impl Operation for AddField {
    fn describe(&self) -> String {
        format!("Add field {} to {}", self.field.name, self.model_name)
    }

    fn state_forwards(&self, app_label: &str, state: &mut ProjectState) {
        let key = (app_label.to_string(), self.model_name.clone());
        if let Some(model) = state.models.get_mut(&key) {
            model.fields.push(self.field.clone());
        }
    }

    fn database_forwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        session: &mut DdlSession,
        _from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let table_name = format!("{app_label}_{}", self.model_name);
        let fd = self.field.to_field_def();
        schema_editor
            .add_column(session, &table_name, &fd, true)
            .map_err(|e| DjangoError::DatabaseError(e.to_string()))
    }

    fn database_backwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        session: &mut DdlSession,
        _from_state: &ProjectState,
        to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let table_name = format!("{app_label}_{}", self.model_name);
        let key = (app_label.to_string(), self.model_name.clone());
        let remaining: Vec<_> = to_state
            .models
            .get(&key)
            .map(|m| {
                m.fields
                    .iter()
                    .filter(|f| f.name != self.field.name)
                    .map(|f| f.to_field_def())
                    .collect()
            })
            .unwrap_or_default();
        Ok(schema_editor.drop_column_with_columns(session, &table_name, &self.field.column, &remaining))
    }

    fn reversible(&self) -> bool {
        true
    }
}

/// Removes a column from an existing table.
///
/// Generates an `ALTER TABLE ... DROP COLUMN` statement.
#[derive(Debug, Clone)]
pub struct RemoveField {
    /// The model name the field is being removed from.
    pub model_name: String,
    /// The name of the field to remove.
    pub field_name: String,
}

impl Operation for RemoveField {
    fn describe(&self) -> String {
        format!("Remove field {} from {}", self.field_name, self.model_name)
    }

    fn state_forwards(&self, app_label: &str, state: &mut ProjectState) {
        let key = (app_label.to_string(), self.model_name.clone());
        if let Some(model) = state.models.get_mut(&key) {
            model.fields.retain(|f| f.name != self.field_name);
        }
    }

    fn database_forwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        session: &mut DdlSession,
        _from_state: &ProjectState,
        to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let table_name = format!("{app_label}_{}", self.model_name);
        let key = (app_label.to_string(), self.model_name.clone());
        let remaining: Vec<_> = to_state
            .models
            .get(&key)
            .map(|m| {
                m.fields
                    .iter()
                    .filter(|f| f.name != self.field_name)
                    .map(|f| f.to_field_def())
                    .collect()
            })
            .unwrap_or_default();
        Ok(schema_editor.drop_column_with_columns(session, &table_name, &self.field_name, &remaining))
    }

    fn database_backwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        session: &mut DdlSession,
        from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let key = (app_label.to_string(), self.model_name.clone());
        let model = from_state
            .models
            .get(&key)
            .ok_or_else(|| DjangoError::DatabaseError("Model not found".into()))?;
        let field = model
            .fields
            .iter()
            .find(|f| f.name == self.field_name)
            .ok_or_else(|| DjangoError::DatabaseError("Field not found".into()))?;
        let table_name = format!("{app_label}_{}", self.model_name);
        let fd = field.to_field_def();
        schema_editor
            .add_column(session, &table_name, &fd, true)
            .map_err(|e| DjangoError::DatabaseError(e.to_string()))
    }

    fn reversible(&self) -> bool {
        true
    }
}

/// Alters a column on an existing table.
///
/// Generates `ALTER TABLE ... ALTER COLUMN` or equivalent DDL.
/// On SQLite this triggers a table recreation.
#[derive(Debug, Clone)]
pub struct AlterField {
    /// The model name containing the field.
    pub model_name: String,
    /// The name of the field being altered.
    pub field_name: String,
    /// The new field definition.
    pub field: MigrationFieldDef,
}

impl Operation for AlterField {
    fn describe(&self) -> String {
        format!(
            "Alter field {} on {}",
            self.field_name, self.model_name
        )
    }

    fn state_forwards(&self, app_label: &str, state: &mut ProjectState) {
        let key = (app_label.to_string(), self.model_name.clone());
        if let Some(model) = state.models.get_mut(&key) {
            if let Some(f) = model.fields.iter_mut().find(|f| f.name == self.field_name) {
                *f = self.field.clone();
            }
        }
    }

    fn database_forwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        _session: &mut DdlSession,
        from_state: &ProjectState,
        to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let table_name = format!("{app_label}_{}", self.model_name);
        let key = (app_label.to_string(), self.model_name.clone());
        let old_model = from_state
            .models
            .get(&key)
            .ok_or_else(|| DjangoError::DatabaseError("Model not found".into()))?;
        let old_field = old_model
            .fields
            .iter()
            .find(|f| f.name == self.field_name)
            .ok_or_else(|| DjangoError::DatabaseError("Old field not found".into()))?;
        let old_fd = old_field.to_field_def();
        let new_fd = self.field.to_field_def();
        let all_columns: Vec<_> = to_state
            .models
            .get(&key)
            .map(|m| {
                m.fields
                    .iter()
                    .map(|f| {
                        if f.name == self.field_name {
                            self.field.to_field_def()
                        } else {
                            f.to_field_def()
                        }
                    })
                    .collect()
            })
            .unwrap_or_else(|| vec![self.field.to_field_def()]);
        Ok(schema_editor.alter_column_with_columns(&table_name, &old_fd, &new_fd, &all_columns))
    }

    fn database_backwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        _session: &mut DdlSession,
        from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        // Reverse: apply the old field definition
        let table_name = format!("{app_label}_{}", self.model_name);
        let key = (app_label.to_string(), self.model_name.clone());
        let old_model = from_state
            .models
            .get(&key)
            .ok_or_else(|| DjangoError::DatabaseError("Model not found".into()))?;
        let old_field = old_model
            .fields
            .iter()
            .find(|f| f.name == self.field_name)
            .ok_or_else(|| DjangoError::DatabaseError("Old field not found".into()))?;
        let new_fd = self.field.to_field_def();
        let old_fd = old_field.to_field_def();
        let all_columns: Vec<_> = old_model.fields.iter().map(|f| f.to_field_def()).collect();
        Ok(schema_editor.alter_column_with_columns(&table_name, &new_fd, &old_fd, &all_columns))
    }

    fn reversible(&self) -> bool {
        true
    }
}

/// Renames a column on an existing table.
///
/// Generates `ALTER TABLE ... RENAME COLUMN` DDL.
#[derive(Debug, Clone)]
pub struct RenameField {
    /// The model name containing the field.
    pub model_name: String,
    /// The old field name.
    pub old_name: String,
    /// The new field name.
    pub new_name: String,
}

impl Operation for RenameField {
    fn describe(&self) -> String {
        format!(
            "Rename field {} to {} on {}",
            self.old_name, self.new_name, self.model_name
        )
    }

    fn state_forwards(&self, app_label: &str, state: &mut ProjectState) {
        let key = (app_label.to_string(), self.model_name.clone());
        if let Some(model) = state.models.get_mut(&key) {
            if let Some(f) = model.fields.iter_mut().find(|f| f.name == self.old_name) {
                f.name.clone_from(&self.new_name);
                f.column.clone_from(&self.new_name);
            }
        }
    }

    fn database_forwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        _session: &mut DdlSession,
        _from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let table_name = format!("{app_label}_{}", self.model_name);
        Ok(schema_editor.rename_column(&table_name, &self.old_name, &self.new_name))
    }

    fn database_backwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        _session: &mut DdlSession,
        _from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let table_name = format!("{app_label}_{}", self.model_name);
        Ok(schema_editor.rename_column(&table_name, &self.new_name, &self.old_name))
    }

    fn reversible(&self) -> bool {
        true
    }
}

/// Adds an index to a table.
///
/// Generates a `CREATE INDEX` statement.
#[derive(Debug, Clone)]
pub struct AddIndex {
    /// The model name the index is for.
    pub model_name: String,
    /// The index definition.
    pub index: Index,
}

impl Operation for AddIndex {
    fn describe(&self) -> String {
        format!(
            "Add index {} on {}",
            self.index.name.as_deref().unwrap_or("unnamed"),
            self.model_name
        )
    }

    fn state_forwards(&self, app_label: &str, state: &mut ProjectState) {
        let key = (app_label.to_string(), self.model_name.clone());
        if let Some(model) = state.models.get_mut(&key) {
            model.options.indexes.push(self.index.clone());
        }
    }

    fn database_forwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        _session: &mut DdlSession,
        _from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let table_name = format!("{app_label}_{}", self.model_name);
        Ok(schema_editor.create_index(&table_name, &self.index))
    }

    fn database_backwards(
        &self,
        _app_label: &str,
        schema_editor: &dyn SchemaEditor,
        _session: &mut DdlSession,
        _from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let idx_name = self
            .index
            .name
            .as_deref()
            .unwrap_or("unnamed_index");
        Ok(schema_editor.drop_index(idx_name))
    }

    fn reversible(&self) -> bool {
        true
    }
}

/// Removes an index from a table.
///
/// Generates a `DROP INDEX` statement.
#[derive(Debug, Clone)]
pub struct RemoveIndex {
    /// The model name the index belongs to.
    pub model_name: String,
    /// The name of the index to remove.
    pub index_name: String,
}

impl Operation for RemoveIndex {
    fn describe(&self) -> String {
        format!("Remove index {} from {}", self.index_name, self.model_name)
    }

    fn state_forwards(&self, app_label: &str, state: &mut ProjectState) {
        let key = (app_label.to_string(), self.model_name.clone());
        if let Some(model) = state.models.get_mut(&key) {
            model
                .options
                .indexes
                .retain(|i| i.name.as_deref() != Some(&self.index_name));
        }
    }

    fn database_forwards(
        &self,
        _app_label: &str,
        schema_editor: &dyn SchemaEditor,
        _session: &mut DdlSession,
        _from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        Ok(schema_editor.drop_index(&self.index_name))
    }

    fn database_backwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        _session: &mut DdlSession,
        from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let key = (app_label.to_string(), self.model_name.clone());
        let model = from_state
            .models
            .get(&key)
            .ok_or_else(|| DjangoError::DatabaseError("Model not found".into()))?;
        let index = model
            .options
            .indexes
            .iter()
            .find(|i| i.name.as_deref() == Some(&self.index_name))
            .ok_or_else(|| DjangoError::DatabaseError("Index not found".into()))?;
        let table_name = format!("{app_label}_{}", self.model_name);
        Ok(schema_editor.create_index(&table_name, index))
    }

    fn reversible(&self) -> bool {
        true
    }
}

/// Alters the `unique_together` constraint set on a model.
///
/// Drops old unique constraints and creates new ones.
#[derive(Debug, Clone)]
pub struct AlterUniqueTogether {
    /// The model name.
    pub model_name: String,
    /// The new set of `unique_together` field groups.
    pub unique_together: Vec<Vec<String>>,
}

impl Operation for AlterUniqueTogether {
    fn describe(&self) -> String {
        format!("Alter unique_together for {}", self.model_name)
    }

    fn state_forwards(&self, app_label: &str, state: &mut ProjectState) {
        let key = (app_label.to_string(), self.model_name.clone());
        if let Some(model) = state.models.get_mut(&key) {
            model.options.unique_together.clone_from(&self.unique_together);
        }
    }

    fn database_forwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        session: &mut DdlSession,
        _from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let table_name = format!("{app_label}_{}", self.model_name);
        let mut sqls = Vec::new();
        for group in &self.unique_together {
            let cols: Vec<&str> = group.iter().map(String::as_str).collect();
            sqls.extend(schema_editor.create_unique(session, &table_name, &cols));
        }
        Ok(sqls)
    }

    fn database_backwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        session: &mut DdlSession,
        from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        // Reverse: re-apply the old unique_together
        let key = (app_label.to_string(), self.model_name.clone());
        let table_name = format!("{app_label}_{}", self.model_name);
        let mut sqls = Vec::new();
        if let Some(model) = from_state.models.get(&key) {
            for group in &model.options.unique_together {
                let cols: Vec<&str> = group.iter().map(String::as_str).collect();
                sqls.extend(schema_editor.create_unique(session, &table_name, &cols));
            }
        }
        Ok(sqls)
    }

    fn reversible(&self) -> bool {
        true
    }
}

/// Adds a `UNIQUE` constraint to a single field.
///
/// Distinct from [`AlterUniqueTogether`], which covers multi-field groups:
/// this is emitted when a field's own `unique` flag flips, rather than
/// folding that into a generic [`AlterField`].
#[derive(Debug, Clone)]
pub struct AddUnique {
    /// The model name containing the field.
    pub model_name: String,
    /// The field gaining the constraint.
    pub field_name: String,
}

impl Operation for AddUnique {
    fn describe(&self) -> String {
        format!("Add unique constraint on {} of {}", self.field_name, self.model_name)
    }

    fn state_forwards(&self, app_label: &str, state: &mut ProjectState) {
        let key = (app_label.to_string(), self.model_name.clone());
        if let Some(model) = state.models.get_mut(&key) {
            if let Some(f) = model.fields.iter_mut().find(|f| f.name == self.field_name) {
                f.unique = true;
            }
        }
    }

    fn database_forwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        session: &mut DdlSession,
        _from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let table_name = format!("{app_label}_{}", self.model_name);
        Ok(schema_editor.create_unique(session, &table_name, &[&self.field_name]))
    }

    fn database_backwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        session: &mut DdlSession,
        _from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let table_name = format!("{app_label}_{}", self.model_name);
        Ok(schema_editor.delete_unique(session, &table_name, &[&self.field_name]))
    }

    fn reversible(&self) -> bool {
        true
    }
}

/// Removes a `UNIQUE` constraint from a single field.
///
/// The reverse of [`AddUnique`].
#[derive(Debug, Clone)]
pub struct DeleteUnique {
    /// The model name containing the field.
    pub model_name: String,
    /// The field losing the constraint.
    pub field_name: String,
}

impl Operation for DeleteUnique {
    fn describe(&self) -> String {
        format!("Remove unique constraint on {} of {}", self.field_name, self.model_name)
    }

    fn state_forwards(&self, app_label: &str, state: &mut ProjectState) {
        let key = (app_label.to_string(), self.model_name.clone());
        if let Some(model) = state.models.get_mut(&key) {
            if let Some(f) = model.fields.iter_mut().find(|f| f.name == self.field_name) {
                f.unique = false;
            }
        }
    }

    fn database_forwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        session: &mut DdlSession,
        _from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let table_name = format!("{app_label}_{}", self.model_name);
        Ok(schema_editor.delete_unique(session, &table_name, &[&self.field_name]))
    }

    fn database_backwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        session: &mut DdlSession,
        _from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let table_name = format!("{app_label}_{}", self.model_name);
        Ok(schema_editor.create_unique(session, &table_name, &[&self.field_name]))
    }

    fn reversible(&self) -> bool {
        true
    }
}

/// Runs raw SQL in a migration.
///
/// Both forward and backward SQL must be provided for reversibility.
#[derive(Debug, Clone)]
pub struct RunSQL {
    /// SQL to run in the forward direction.
    pub sql_forwards: String,
    /// SQL to run in the backward direction (empty string = irreversible).
    pub sql_backwards: String,
}

impl Operation for RunSQL {
    fn describe(&self) -> String {
        "Run SQL".to_string()
    }

    fn state_forwards(&self, _app_label: &str, _state: &mut ProjectState) {
        // Raw SQL does not change the project state
    }

    fn database_forwards(
        &self,
        _app_label: &str,
        _schema_editor: &dyn SchemaEditor,
        _session: &mut DdlSession,
        _from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        Ok(vec![self.sql_forwards.clone()])
    }

    fn database_backwards(
        &self,
        _app_label: &str,
        _schema_editor: &dyn SchemaEditor,
        _session: &mut DdlSession,
        _from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        if self.sql_backwards.is_empty() {
            Err(DjangoError::DatabaseError(
                "RunSQL operation is not reversible (no backwards SQL provided)".into(),
            ))
        } else {
            Ok(vec![self.sql_backwards.clone()])
        }
    }

    fn reversible(&self) -> bool {
        !self.sql_backwards.is_empty()
    }
}

/// Type alias for the closure type used in `RunRust` operations.
pub type RustMigrationFn = Box<dyn Fn() -> Result<(), DjangoError> + Send + Sync>;

/// Runs arbitrary Rust code in a migration.
///
/// The closures are executed during migration application / reversal.
pub struct RunRust {
    /// A description of what this code does.
    pub description: String,
    /// The forward closure.
    pub forwards: RustMigrationFn,
    /// The backward closure (None = irreversible).
    pub backwards: Option<RustMigrationFn>,
}

impl Operation for RunRust {
    fn describe(&self) -> String {
        format!("Run Rust: {}", self.description)
    }

    fn state_forwards(&self, _app_label: &str, _state: &mut ProjectState) {
        // Rust code does not change the project state
    }

    fn database_forwards(
        &self,
        _app_label: &str,
        _schema_editor: &dyn SchemaEditor,
        _session: &mut DdlSession,
        _from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        (self.forwards)()?;
        Ok(vec![])
    }

    fn database_backwards(
        &self,
        _app_label: &str,
        _schema_editor: &dyn SchemaEditor,
        _session: &mut DdlSession,
        _from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        match &self.backwards {
            Some(f) => {
                f()?;
                Ok(vec![])
            }
            None => Err(DjangoError::DatabaseError(
                "RunRust operation is not reversible".into(),
            )),
        }
    }

    fn reversible(&self) -> bool {
        self.backwards.is_some()
    }
}
