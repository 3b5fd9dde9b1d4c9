//! Live model inspection: turns a [`Model`](django_rs_db::model::Model)'s
//! static metadata into the migration-friendly [`ModelState`]/
//! [`MigrationFieldDef`] representation the autodetector compares against
//! the frozen state recorded in prior migrations.
//!
//! South inspects a live field through three tiers: a native
//! `south_field_triple` method, a registered rule-set matched against the
//! field's class hierarchy, and a source-text parse as a last resort. This
//! crate has no equivalent tiering to do: `FieldDef::field_type` is a closed
//! `FieldType` enum covering every field kind the ORM knows about, so every
//! field is always in the "native" tier — there is no third-party field
//! class that could fall through to rule matching or a source parse. The
//! inspector is therefore a single direct conversion rather than a
//! rule-dispatch table.

use django_rs_db::fields::FieldDef;
use django_rs_db::model::{Model, ModelMeta};

use crate::autodetect::{MigrationFieldDef, ModelOptions, ModelState};

/// Builds a [`ModelState`] snapshot from a live model type's metadata.
///
/// This is the counterpart to [`FrozenOrm`](crate::frozen_orm::FrozenOrm)
/// reconstruction: where the frozen ORM turns a recorded `ModelState` back
/// into something migration procedures can query, `inspect_model` turns the
/// application's current, compiled-in model definition into a `ModelState`
/// the autodetector can diff against that recorded history.
pub fn inspect_model<M: Model>() -> ModelState {
    let meta = M::meta();
    ModelState::new(
        meta.app_label,
        meta.model_name,
        meta.fields.iter().map(inspect_field).collect(),
    )
    .with_options(inspect_options(meta))
}

/// Converts a single live [`FieldDef`] into its migration-friendly
/// [`MigrationFieldDef`] counterpart, dropping the validator objects that
/// have no serializable representation (validators are re-attached at model
/// definition time, not reconstructed from history).
fn inspect_field(field: &FieldDef) -> MigrationFieldDef {
    let mut mfd = MigrationFieldDef::new(field.name, field.field_type.clone())
        .column(field.column.clone());
    if field.primary_key {
        mfd = mfd.primary_key();
    }
    if field.null {
        mfd = mfd.nullable();
    }
    if field.unique {
        mfd = mfd.unique();
    }
    if field.db_index {
        mfd = mfd.db_index();
    }
    if let Some(max_length) = field.max_length {
        mfd = mfd.max_length(max_length);
    }
    if let Some(ref default) = field.default {
        mfd = mfd.default(default.clone());
    }
    mfd
}

/// Converts a model's `Meta`-equivalent options into [`ModelOptions`].
///
/// Live models never produce a stub entry — stubs only arise when the
/// frozen ORM terminates a cross-application relation it was not asked to
/// freeze (see [`freeze_apps`](crate::frozen_orm::freeze_apps)).
fn inspect_options(meta: &ModelMeta) -> ModelOptions {
    ModelOptions {
        db_table: Some(meta.db_table.clone()),
        unique_together: meta
            .unique_together
            .iter()
            .map(|group| group.iter().map(|f| (*f).to_string()).collect())
            .collect(),
        indexes: meta.indexes.clone(),
        is_stub: false,
    }
}

/// Inspects every model in `models`, producing a [`ProjectState`] that
/// represents "what the application's code currently says its schema should
/// be" — the target state `MigrationAutodetector` diffs the latest recorded
/// `ProjectState` against to propose operations.
pub fn inspect_models<'a, I>(entries: I) -> crate::autodetect::ProjectState
where
    I: IntoIterator<Item = &'a ModelMeta>,
{
    let mut state = crate::autodetect::ProjectState::new();
    for meta in entries {
        let model_state = ModelState::new(
            meta.app_label,
            meta.model_name,
            meta.fields.iter().map(inspect_field).collect(),
        )
        .with_options(inspect_options(meta));
        state.add_model(model_state);
    }
    state
}
