//! Frozen-ORM reconstitution.
//!
//! A migration unit's forward/backward procedure and any data migration it
//! runs must see the schema exactly as it stood when the unit was authored,
//! not as the current in-memory model set looks today. [`FrozenOrm`] wraps a
//! [`ProjectState`] snapshot, the unit's own models plus stubs for any
//! cross-application foreign-key targets, and exposes it through the same
//! `orm[app.Model]` / `orm.Model` shortcut the runner hands to a procedure.
//!
//! [`MigrationFieldDef`] stores relation targets as plain structural
//! descriptors (a foreign key names its target as an `"app.model"` string,
//! not an expression to evaluate), so there is no construction-order problem
//! to solve, only a resolution one: does every such target actually appear
//! in the snapshot, as a full model or a stub. [`FrozenOrmBuilder`] checks
//! that in a single pass over the fully-registered entry set.

use django_rs_db::fields::FieldType;

use crate::autodetect::{MigrationFieldDef, ModelOptions, ModelState, ProjectState};
use crate::errors::MigrationError;

/// A reconstructed model universe, as it stood at one migration unit.
///
/// Construct via [`FrozenOrmBuilder`]. Access a model either explicitly
/// (`orm.model("auth", "user")`) or through the shortcut bound to the
/// snapshot's default application (`orm.get("user")`, resolved against
/// whichever app the owning migration belongs to).
#[derive(Debug, Clone)]
pub struct FrozenOrm {
    state: ProjectState,
    default_app: String,
}

impl FrozenOrm {
    /// Wraps an already-validated snapshot. Prefer [`FrozenOrmBuilder::build`]
    /// when assembling a snapshot from scratch, since it performs the
    /// forward-reference check this type assumes has already passed.
    pub fn from_state(state: ProjectState, default_app: impl Into<String>) -> Self {
        Self {
            state,
            default_app: default_app.into(),
        }
    }

    /// Explicit `orm[app_label.model_name]` lookup.
    pub fn model(&self, app_label: &str, name: &str) -> Option<FrozenModel<'_>> {
        self.state
            .models
            .get(&(app_label.to_string(), name.to_lowercase()))
            .map(FrozenModel)
    }

    /// Attribute-style `orm.Model` shortcut, resolved against the snapshot's
    /// default application.
    pub fn get(&self, name: &str) -> Option<FrozenModel<'_>> {
        self.model(&self.default_app, name)
    }

    /// The default application new lookups resolve against.
    pub fn default_app(&self) -> &str {
        &self.default_app
    }

    /// The underlying project state, for callers that need the whole
    /// snapshot rather than one model at a time (e.g. re-running the
    /// autodetector against a historical point).
    pub fn state(&self) -> &ProjectState {
        &self.state
    }
}

/// A handle onto one model within a [`FrozenOrm`] snapshot.
#[derive(Debug, Clone, Copy)]
pub struct FrozenModel<'a>(&'a ModelState);

impl<'a> FrozenModel<'a> {
    /// `true` if this entry is a stub: present only to terminate a
    /// cross-application foreign-key relation, carrying nothing beyond its
    /// primary key.
    pub fn is_stub(&self) -> bool {
        self.0.options.is_stub
    }

    /// The model's fields as they existed at this point in history.
    pub fn fields(&self) -> &'a [MigrationFieldDef] {
        &self.0.fields
    }

    /// The underlying model state.
    pub fn state(&self) -> &'a ModelState {
        self.0
    }

    /// A data-manipulation capability on this historical model: a minimal
    /// read/write handle a data migration could use to touch rows as they
    /// existed at this schema version.
    ///
    /// Stubs carry only a primary key and exist solely to terminate foreign
    /// keys from other applications; Django's stub query manager raises on
    /// every attribute access, and this mirrors that by refusing to produce
    /// a handle at all.
    pub fn query(&self) -> Result<FrozenQueryHandle<'a>, MigrationError> {
        if self.is_stub() {
            return Err(MigrationError::StubModelAccess(format!(
                "{}.{}",
                self.0.app_label, self.0.name
            )));
        }
        Ok(FrozenQueryHandle(self.0))
    }
}

/// A data-manipulation handle over one historical model.
///
/// Intentionally thin: the frozen ORM's job ends at exposing the schema a
/// data migration should assume, not at re-implementing the live query
/// builder against it.
#[derive(Debug, Clone, Copy)]
pub struct FrozenQueryHandle<'a>(&'a ModelState);

impl<'a> FrozenQueryHandle<'a> {
    /// The table this model's rows live in, at this point in history.
    pub fn table_name(&self) -> String {
        self.0.db_table()
    }

    /// The historical field set, for building hand-written SQL against
    /// `table_name()`.
    pub fn fields(&self) -> &'a [MigrationFieldDef] {
        &self.0.fields
    }
}

/// Assembles a [`FrozenOrm`] from a unit's own models plus stub entries for
/// foreign-keyed models outside it, validating that every relation resolves.
#[derive(Debug, Clone, Default)]
pub struct FrozenOrmBuilder {
    entries: Vec<ModelState>,
}

impl FrozenOrmBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a full model definition.
    pub fn add_model(mut self, model: ModelState) -> Self {
        self.entries.push(model);
        self
    }

    /// Registers a stub: an entry carrying only its primary key and the
    /// `_stub` marker, sufficient to terminate a foreign-key relation from
    /// another application without pulling in the target's full definition.
    pub fn add_stub(
        mut self,
        app_label: impl Into<String>,
        name: impl Into<String>,
        primary_key: MigrationFieldDef,
    ) -> Self {
        let mut options = ModelOptions::default();
        options.is_stub = true;
        self.entries.push(ModelState {
            app_label: app_label.into(),
            name: name.into().to_lowercase(),
            fields: vec![primary_key],
            options,
        });
        self
    }

    /// Validates every relation field against the fully-registered entry
    /// set and, if every target resolves, produces a [`FrozenOrm`] whose
    /// lookups default to `default_app`.
    ///
    /// A field whose target model is absent from the snapshot entirely
    /// (neither a full definition nor a stub) is fatal, naming both the
    /// model and field.
    pub fn build(self, default_app: impl Into<String>) -> Result<FrozenOrm, MigrationError> {
        let known: std::collections::HashSet<String> = self
            .entries
            .iter()
            .map(|m| m.name.to_lowercase())
            .collect();

        for model in &self.entries {
            for field in &model.fields {
                if let Some(target) = relation_target(&field.field_type) {
                    let target_model = target.rsplit('.').next().unwrap_or(&target).to_lowercase();
                    if !known.contains(&target_model) {
                        return Err(MigrationError::BrokenMigration {
                            unit: format!("{}.{}", model.app_label, model.name),
                            cause: format!(
                                "field '{}' references unresolved model '{target}'",
                                field.name
                            ),
                        });
                    }
                }
            }
        }

        let mut state = ProjectState::new();
        for model in self.entries {
            state.add_model(model);
        }
        Ok(FrozenOrm::from_state(state, default_app))
    }
}

/// Returns the `"app.model"` relation target of a field, if it has one.
fn relation_target(field_type: &FieldType) -> Option<String> {
    match field_type {
        FieldType::ForeignKey { to, .. }
        | FieldType::OneToOneField { to, .. }
        | FieldType::ManyToManyField { to, .. } => Some(to.clone()),
        _ => None,
    }
}

/// Computes the dependency closure for freezing a set of applications:
/// starting from every model of every requested application, follows
/// relation fields until fixed point. Models owned by one of
/// `complete_apps` are embedded in full; everything else reachable only
/// through a relation is reduced to a stub.
pub fn freeze_apps(live: &ProjectState, complete_apps: &[String]) -> ProjectState {
    let complete: std::collections::HashSet<&str> =
        complete_apps.iter().map(String::as_str).collect();

    let mut included: std::collections::HashSet<(String, String)> = live
        .models
        .keys()
        .filter(|(app, _)| complete.contains(app.as_str()))
        .cloned()
        .collect();

    loop {
        let mut added = Vec::new();
        for key in &included {
            let Some(model) = live.models.get(key) else {
                continue;
            };
            for field in &model.fields {
                if let Some(target) = relation_target(&field.field_type) {
                    if let Some(found) = find_model_by_name(live, &target) {
                        if !included.contains(&found) {
                            added.push(found);
                        }
                    }
                }
            }
        }
        if added.is_empty() {
            break;
        }
        included.extend(added);
    }

    let mut frozen = ProjectState::new();
    for key in &included {
        let Some(model) = live.models.get(key) else {
            continue;
        };
        if complete.contains(key.0.as_str()) {
            frozen.add_model(model.clone());
        } else {
            frozen.add_model(stub_of(model));
        }
    }
    frozen
}

/// Resolves a `"app.model"` (or bare `"model"`) relation target against a
/// live project state's keys.
fn find_model_by_name(live: &ProjectState, target: &str) -> Option<(String, String)> {
    let wanted = target.rsplit('.').next().unwrap_or(target).to_lowercase();
    live.models
        .keys()
        .find(|(_, name)| name == &wanted)
        .cloned()
}

/// Reduces a full model to a stub carrying only its primary key.
fn stub_of(model: &ModelState) -> ModelState {
    let pk = model
        .fields
        .iter()
        .find(|f| f.primary_key)
        .cloned()
        .unwrap_or_else(|| MigrationFieldDef::new("id", django_rs_db::fields::FieldType::BigAutoField).primary_key());

    let mut options = ModelOptions::default();
    options.is_stub = true;
    ModelState {
        app_label: model.app_label.clone(),
        name: model.name.clone(),
        fields: vec![pk],
        options,
    }
}
