//! Migration auto-detection by comparing project states.
//!
//! The [`MigrationAutodetector`] compares an "old" [`ProjectState`] against a "new"
//! [`ProjectState`] and generates the minimal set of [`Operation`]s needed to
//! transform one into the other. This mirrors Django's `MigrationAutodetector`.

use std::collections::HashMap;

use django_rs_db::fields::FieldType;
use django_rs_db::model::{Index, IndexType};
use django_rs_db::value::Value;

use crate::operations::{
    AddField, AddIndex, AddUnique, AlterField, AlterUniqueTogether, CreateModel, DeleteModel,
    DeleteUnique, Operation, RemoveField, RemoveIndex, RenameField,
};

/// A snapshot of the entire project's model state at a point in time.
///
/// Contains all models across all apps, keyed by `(app_label, model_name)`.
/// This is the fundamental input to the autodetector.
#[derive(Debug, Clone, Default)]
pub struct ProjectState {
    /// All models in the project, keyed by `(app_label, model_name)`.
    pub models: HashMap<(String, String), ModelState>,
}

impl ProjectState {
    /// Creates a new empty project state.
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    /// Adds a model to this project state.
    pub fn add_model(&mut self, model: ModelState) {
        let key = (model.app_label.clone(), model.name.clone());
        self.models.insert(key, model);
    }
}

/// Options for a model, equivalent to Django's `class Meta`.
#[derive(Debug, Clone, Default)]
pub struct ModelOptions {
    /// The explicit database table name, if set.
    pub db_table: Option<String>,
    /// Sets of fields that must be unique together.
    pub unique_together: Vec<Vec<String>>,
    /// Database indexes.
    pub indexes: Vec<Index>,
    /// `true` if this entry is a stub: present only to terminate a
    /// cross-application foreign key, carrying nothing beyond its primary
    /// key. Used by the frozen ORM when reconstituting a historical model
    /// universe for a single migration unit.
    pub is_stub: bool,
}

impl ModelOptions {
    /// Marks these options as belonging to a stub model.
    pub fn stub(mut self) -> Self {
        self.is_stub = true;
        self
    }
}

/// The state of a single model at a point in time.
///
/// This is a migration-friendly representation of a model that does not
/// require the full `FieldDef` (which contains non-cloneable validators).
/// Instead it uses [`MigrationFieldDef`] which captures all schema-relevant
/// information.
#[derive(Debug, Clone)]
pub struct ModelState {
    /// The application label this model belongs to.
    pub app_label: String,
    /// The model name (lowercase).
    pub name: String,
    /// The fields of this model.
    pub fields: Vec<MigrationFieldDef>,
    /// Model-level options.
    pub options: ModelOptions,
}

impl ModelState {
    /// Creates a new model state.
    pub fn new(
        app_label: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<MigrationFieldDef>,
    ) -> Self {
        Self {
            app_label: app_label.into(),
            name: name.into(),
            fields,
            options: ModelOptions::default(),
        }
    }

    /// Sets model options.
    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the database table name for this model.
    pub fn db_table(&self) -> String {
        self.options
            .db_table
            .clone()
            .unwrap_or_else(|| format!("{}_{}", self.app_label, self.name))
    }
}

/// A migration-friendly field definition.
///
/// Unlike [`django_rs_db::fields::FieldDef`], this struct is fully `Clone`-able
/// because it omits validators (which are runtime objects). It captures all
/// information needed for schema generation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MigrationFieldDef {
    /// The field name.
    pub name: String,
    /// The database column name.
    pub column: String,
    /// The field type.
    pub field_type: FieldType,
    /// Whether this field is the primary key.
    pub primary_key: bool,
    /// Whether NULL is allowed.
    pub null: bool,
    /// Default value.
    pub default: Option<Value>,
    /// Whether a UNIQUE constraint is applied.
    pub unique: bool,
    /// Whether a database index should be created.
    pub db_index: bool,
    /// Maximum character length.
    pub max_length: Option<usize>,
}

impl MigrationFieldDef {
    /// Creates a new migration field definition with sensible defaults.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        let column = name.clone();
        Self {
            name,
            column,
            field_type,
            primary_key: false,
            null: false,
            default: None,
            unique: false,
            db_index: false,
            max_length: None,
        }
    }

    /// Sets the database column name.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    /// Marks this field as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Allows NULL values.
    pub fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    /// Sets the maximum character length.
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Marks this field as having a UNIQUE constraint.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks this field as having a database index.
    pub fn db_index(mut self) -> Self {
        self.db_index = true;
        self
    }

    /// Sets the default value.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Returns `true` if this is a relational field (FK, O2O, M2M).
    pub fn is_relation(&self) -> bool {
        matches!(
            self.field_type,
            FieldType::ForeignKey { .. }
                | FieldType::OneToOneField { .. }
                | FieldType::ManyToManyField { .. }
        )
    }

    /// Converts this to a `FieldDef` for use with the schema editor.
    pub fn to_field_def(&self) -> django_rs_db::fields::FieldDef {
        let mut fd = django_rs_db::fields::FieldDef::new(
            // SAFETY: we leak a string to get a &'static str. In migrations
            // this is acceptable as field defs are long-lived.
            Box::leak(self.name.clone().into_boxed_str()),
            self.field_type.clone(),
        )
        .column(self.column.clone());

        if self.primary_key {
            fd = fd.primary_key();
        }
        if self.null {
            fd = fd.nullable();
        }
        if self.unique {
            fd = fd.unique();
        }
        if self.db_index {
            fd = fd.db_index();
        }
        if let Some(ml) = self.max_length {
            fd = fd.max_length(ml);
        }
        if let Some(ref val) = self.default {
            fd = fd.default(val.clone());
        }
        fd
    }
}

/// Compares two [`ProjectState`]s and generates migration operations.
///
/// The autodetector detects:
/// - New models (creates `CreateModel`)
/// - Deleted models (creates `DeleteModel`)
/// - Added fields (creates `AddField`)
/// - Removed fields (creates `RemoveField`)
/// - Altered fields (creates `AlterField`)
/// - Renamed fields (heuristic: same type + one removed + one added)
/// - Changed `unique_together` (creates `AlterUniqueTogether`)
/// - Added/removed indexes (creates `AddIndex` / `RemoveIndex`)
pub struct MigrationAutodetector {
    /// The old project state (before changes).
    pub from_state: ProjectState,
    /// The new project state (after changes).
    pub to_state: ProjectState,
}

impl MigrationAutodetector {
    /// Creates a new autodetector with from and to states.
    pub fn new(from_state: ProjectState, to_state: ProjectState) -> Self {
        Self {
            from_state,
            to_state,
        }
    }

    /// Detects differences between the two states and returns operations
    /// grouped by app label.
    pub fn detect_changes(&self) -> HashMap<String, Vec<Box<dyn Operation>>> {
        let mut result: HashMap<String, Vec<Box<dyn Operation>>> = HashMap::new();

        // 1. Detect deleted models first, so a new model can reuse a table
        // name or constraint a deleted one just freed.
        for (key, model) in &self.from_state.models {
            if !self.to_state.models.contains_key(key) {
                result
                    .entry(key.0.clone())
                    .or_default()
                    .push(Box::new(DeleteModel {
                        name: model.name.clone(),
                    }));
            }
        }

        // 2. Detect new models
        for (key, model) in &self.to_state.models {
            if !self.from_state.models.contains_key(key) {
                result.entry(key.0.clone()).or_default().push(Box::new(
                    CreateModel {
                        name: model.name.clone(),
                        fields: model.fields.clone(),
                        options: model.options.clone(),
                    },
                ));
            }
        }

        // 3. Detect field changes for existing models
        for (key, new_model) in &self.to_state.models {
            if let Some(old_model) = self.from_state.models.get(key) {
                let old_fields: HashMap<&str, &MigrationFieldDef> =
                    old_model.fields.iter().map(|f| (f.name.as_str(), f)).collect();
                let new_fields: HashMap<&str, &MigrationFieldDef> =
                    new_model.fields.iter().map(|f| (f.name.as_str(), f)).collect();

                let mut added: Vec<&MigrationFieldDef> = Vec::new();
                let mut removed: Vec<&MigrationFieldDef> = Vec::new();

                // Find removed fields
                for (name, field) in &old_fields {
                    if !new_fields.contains_key(name) {
                        removed.push(field);
                    }
                }

                // Find added fields
                for (name, field) in &new_fields {
                    if !old_fields.contains_key(name) {
                        added.push(field);
                    }
                }

                // Detect renames (heuristic: same type, one removed + one added)
                let mut renamed_old: Vec<String> = Vec::new();
                let mut renamed_new: Vec<String> = Vec::new();

                if added.len() == 1 && removed.len() == 1 {
                    let a = added[0];
                    let r = removed[0];
                    if field_types_match(&a.field_type, &r.field_type) {
                        result.entry(key.0.clone()).or_default().push(Box::new(
                            RenameField {
                                model_name: new_model.name.clone(),
                                old_name: r.name.clone(),
                                new_name: a.name.clone(),
                            },
                        ));
                        renamed_old.push(r.name.clone());
                        renamed_new.push(a.name.clone());
                    }
                }

                // Emit AddField for truly new fields
                for field in &added {
                    if !renamed_new.contains(&field.name) {
                        result.entry(key.0.clone()).or_default().push(Box::new(
                            AddField {
                                model_name: new_model.name.clone(),
                                field: (*field).clone(),
                            },
                        ));
                    }
                }

                // Emit RemoveField for truly removed fields
                for field in &removed {
                    if !renamed_old.contains(&field.name) {
                        result.entry(key.0.clone()).or_default().push(Box::new(
                            RemoveField {
                                model_name: new_model.name.clone(),
                                field_name: field.name.clone(),
                            },
                        ));
                    }
                }

                // Detect altered fields
                for (name, new_field) in &new_fields {
                    if let Some(old_field) = old_fields.get(name) {
                        if fields_differ(old_field, new_field) {
                            result.entry(key.0.clone()).or_default().push(Box::new(
                                AlterField {
                                    model_name: new_model.name.clone(),
                                    field_name: (*name).to_string(),
                                    field: (*new_field).clone(),
                                },
                            ));
                        }
                        if !old_field.unique && new_field.unique {
                            result.entry(key.0.clone()).or_default().push(Box::new(AddUnique {
                                model_name: new_model.name.clone(),
                                field_name: (*name).to_string(),
                            }));
                        } else if old_field.unique && !new_field.unique {
                            result.entry(key.0.clone()).or_default().push(Box::new(DeleteUnique {
                                model_name: new_model.name.clone(),
                                field_name: (*name).to_string(),
                            }));
                        }
                    }
                }

                // Detect unique_together changes. Compared as a set of sets:
                // neither the order of the tuples nor the order of field
                // names within a tuple is semantically meaningful.
                if normalize_unique_together(&old_model.options.unique_together)
                    != normalize_unique_together(&new_model.options.unique_together)
                {
                    result
                        .entry(key.0.clone())
                        .or_default()
                        .push(Box::new(AlterUniqueTogether {
                            model_name: new_model.name.clone(),
                            unique_together: new_model.options.unique_together.clone(),
                        }));
                }

                // Detect index changes
                let old_idx_names: Vec<Option<&str>> = old_model
                    .options
                    .indexes
                    .iter()
                    .map(|i| i.name.as_deref())
                    .collect();
                let new_idx_names: Vec<Option<&str>> = new_model
                    .options
                    .indexes
                    .iter()
                    .map(|i| i.name.as_deref())
                    .collect();

                // Removed indexes
                for idx in &old_model.options.indexes {
                    if let Some(ref idx_name) = idx.name {
                        if !new_idx_names.contains(&Some(idx_name.as_str())) {
                            result.entry(key.0.clone()).or_default().push(Box::new(
                                RemoveIndex {
                                    model_name: new_model.name.clone(),
                                    index_name: idx_name.clone(),
                                },
                            ));
                        }
                    }
                }

                // Added indexes
                for idx in &new_model.options.indexes {
                    if let Some(ref idx_name) = idx.name {
                        if !old_idx_names.contains(&Some(idx_name.as_str())) {
                            result.entry(key.0.clone()).or_default().push(Box::new(
                                AddIndex {
                                    model_name: new_model.name.clone(),
                                    index: idx.clone(),
                                },
                            ));
                        }
                    }
                }
            }
        }

        result
    }
}

/// Checks if two field types are structurally the same (for rename detection).
fn field_types_match(a: &FieldType, b: &FieldType) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

/// Normalizes a `unique_together` declaration into a sorted set of sorted
/// tuples, so that reordering tuples or the field names within one does not
/// register as a schema change.
fn normalize_unique_together(groups: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut normalized: Vec<Vec<String>> = groups
        .iter()
        .map(|group| {
            let mut g = group.clone();
            g.sort();
            g
        })
        .collect();
    normalized.sort();
    normalized
}

/// Checks if two fields differ in schema-relevant properties.
///
/// `unique` is intentionally excluded: a toggle there is reported through
/// dedicated `AddUnique`/`DeleteUnique` operations instead of folding it
/// into a generic `AlterField`.
fn fields_differ(a: &MigrationFieldDef, b: &MigrationFieldDef) -> bool {
    !field_types_match(&a.field_type, &b.field_type)
        || a.null != b.null
        || a.primary_key != b.primary_key
        || a.db_index != b.db_index
        || a.max_length != b.max_length
        || a.default != b.default
        || a.column != b.column
}
