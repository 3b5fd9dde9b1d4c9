//! Migration execution engine.
//!
//! The [`MigrationExecutor`] takes a [`MigrationPlan`] and applies or reverts
//! migrations in the correct order. The [`MigrationRecorder`] tracks which
//! migrations have been applied in the `django_migrations` table.
//!
//! ## Async Execution
//!
//! The executor can run SQL against a real database via
//! [`MigrationExecutor::execute_against_db`], which takes a
//! [`DatabaseBackend`](django_rs_db_backends::DatabaseBackend) and executes
//! each generated SQL statement. The recorder persists applied migrations
//! to the `django_migrations` table.

use std::collections::HashSet;

use django_rs_core::DjangoError;
use django_rs_db_backends::DatabaseBackend;
use tracing::{debug, info, warn};

use crate::autodetect::ProjectState;
use crate::errors::MigrationError;
use crate::migration::MigrationGraph;
use crate::operations::Operation;
use crate::schema_editor::{DdlSession, SchemaEditor};

/// How to proceed when recorded history conflicts with the planned set.
///
/// Mirrors south's `migrate_app(resolve_mode=...)`: by default an
/// inconsistency is fatal, `Merge` accepts it and continues, `Skip` drops
/// the conflicting migrations from the plan instead of applying them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveMode {
    /// Inconsistent history is a hard error.
    #[default]
    Strict,
    /// Accept the inconsistency and migrate anyway.
    Merge,
    /// Drop the conflicting migrations from the plan.
    Skip,
}

/// Lifecycle hooks fired around a migration run.
///
/// Mirrors south's `pre_migrate`/`post_migrate`/`ran_migration` signals,
/// which callers used to refresh caches or fire application-level events
/// around a migration. The default implementations do nothing; use
/// [`TracingObserver`] to have each event emitted through `tracing`, or
/// implement the trait yourself to wire in application-specific behavior.
pub trait MigrationObserver {
    /// Fired once before an application's migrations begin running.
    fn pre_migrate(&self, _app_label: &str) {}

    /// Fired once after an application's migrations finish running,
    /// whether or not the plan was empty.
    fn post_migrate(&self, _app_label: &str) {}

    /// Fired after each individual migration step is applied or reverted.
    fn ran_migration(&self, _app_label: &str, _name: &str, _backwards: bool) {}
}

/// An observer with no hooks; the default when a caller does not need one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl MigrationObserver for NullObserver {}

/// The external "initial data" loader a host application wires in to reload
/// fixtures after an application's migrations complete.
///
/// Mirrors south's `LoadInitialDataMigrator`, which shells out to the
/// fixture loader once an application's forward plan has been fully
/// applied. This crate does not implement fixture loading itself (it lives
/// outside the core's scope, same as the database driver); callers supply
/// their own implementation and pass it to
/// [`MigrationExecutor::execute_against_db_with_initial_data`].
pub trait InitialDataLoader {
    /// Loads initial-data fixtures scoped to `app_label`.
    fn load_initial_data(&self, _app_label: &str) {}
}

/// An [`InitialDataLoader`] that does nothing; the default when a caller has
/// no fixture loader to wire in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullInitialDataLoader;

impl InitialDataLoader for NullInitialDataLoader {}

/// An observer that reports every lifecycle event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl MigrationObserver for TracingObserver {
    fn pre_migrate(&self, app_label: &str) {
        info!(app = app_label, "pre_migrate");
    }

    fn post_migrate(&self, app_label: &str) {
        info!(app = app_label, "post_migrate");
    }

    fn ran_migration(&self, app_label: &str, name: &str, backwards: bool) {
        info!(app = app_label, migration = name, backwards, "ran_migration");
    }
}

/// Flags controlling a single `migrate_app` invocation.
///
/// Grouped the way south groups `fake`/`db_dry_run`/`load_initial_data`/`skip`
/// as keyword arguments to `migrate_app`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrateAppOptions {
    /// How to react to inconsistent migration history.
    pub resolve_mode: ResolveMode,
    /// Record migrations as applied/unapplied without executing their SQL.
    pub fake: bool,
    /// Generate SQL without executing it (dry run).
    pub db_dry_run: bool,
    /// Whether to reload initial data fixtures after a forward migration.
    pub load_initial_data: bool,
    /// Skip the run entirely (used by callers that only want the plan).
    pub skip: bool,
}

/// A single step in a migration plan.
///
/// Each step references a migration by its `(app_label, name)` key and
/// indicates whether the migration should be applied or reversed.
#[derive(Debug, Clone)]
pub struct MigrationStep {
    /// The migration key: `(app_label, migration_name)`.
    pub migration: (String, String),
    /// If `true`, this step reverses the migration.
    pub backwards: bool,
    /// Mirrors [`Migration::no_dry_run`](crate::migration::Migration::no_dry_run):
    /// excluded from the dry-run preflight pass, since south's own dry-run
    /// skips migrations flagged this way (typically ones with data-migration
    /// side effects that are unsafe to run twice).
    pub no_dry_run: bool,
}

impl MigrationStep {
    /// Creates a forward migration step.
    pub fn forward(app_label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            migration: (app_label.into(), name.into()),
            backwards: false,
            no_dry_run: false,
        }
    }

    /// Creates a backward (reverse) migration step.
    pub fn backward(app_label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            migration: (app_label.into(), name.into()),
            backwards: true,
            no_dry_run: false,
        }
    }

    /// Marks this step as excluded from the dry-run preflight pass.
    pub fn skip_dry_run(mut self) -> Self {
        self.no_dry_run = true;
        self
    }
}

/// A plan describing which migrations to apply or reverse.
///
/// The plan is an ordered list of [`MigrationStep`]s that should be executed
/// sequentially.
#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
    /// The ordered steps to execute.
    pub steps: Vec<MigrationStep>,
}

impl MigrationPlan {
    /// Creates a new empty migration plan.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Adds a step to the plan.
    pub fn add_step(&mut self, step: MigrationStep) {
        self.steps.push(step);
    }

    /// Returns whether the plan is empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

/// Executes migration plans using a schema editor.
///
/// The executor applies migrations in order, tracking state changes in a
/// [`ProjectState`]. It uses the [`MigrationRecorder`] to determine which
/// migrations have already been applied and produces SQL statements via
/// the [`SchemaEditor`].
pub struct MigrationExecutor {
    /// The schema editor to use for generating SQL.
    schema_editor: Box<dyn SchemaEditor>,
    /// The recorder tracking applied migrations.
    recorder: MigrationRecorder,
    /// Deferred DDL and per-table constraint cache for the run in progress.
    ddl_session: DdlSession,
}

impl MigrationExecutor {
    /// Creates a new executor with the given schema editor.
    pub fn new(schema_editor: Box<dyn SchemaEditor>) -> Self {
        Self {
            schema_editor,
            recorder: MigrationRecorder::new(),
            ddl_session: DdlSession::new(),
        }
    }

    /// Creates a new executor with a pre-populated recorder.
    pub fn with_recorder(
        schema_editor: Box<dyn SchemaEditor>,
        recorder: MigrationRecorder,
    ) -> Self {
        Self {
            schema_editor,
            recorder,
            ddl_session: DdlSession::new(),
        }
    }

    /// Returns a reference to the executor's [`DdlSession`].
    pub fn ddl_session(&self) -> &DdlSession {
        &self.ddl_session
    }

    /// Creates a migration plan to reach the target state from the current state.
    ///
    /// If `target` is `None`, applies all unapplied migrations. If `target` is
    /// `Some((app, name))`, migrates the app to that specific migration (or
    /// reverts if it's already past it).
    pub fn make_plan(
        &self,
        graph: &MigrationGraph,
        target: Option<&(String, String)>,
    ) -> Result<MigrationPlan, MigrationError> {
        let order = graph.topological_order()?;
        let applied = self.recorder.applied();
        let mut plan = MigrationPlan::new();

        match target {
            None => {
                // Apply all unapplied migrations in order
                for key in &order {
                    if !applied.contains(key) {
                        plan.add_step(Self::step_forward(graph, key));
                    }
                }
            }
            Some(target_key) => {
                if !graph.contains(target_key) {
                    return Err(MigrationError::UnknownMigration(format!(
                        "{}.{}",
                        target_key.0, target_key.1
                    )));
                }

                // Find the target position
                let target_pos = order.iter().position(|k| k == target_key).ok_or_else(|| {
                    MigrationError::UnknownMigration(format!(
                        "{}.{}",
                        target_key.0, target_key.1
                    ))
                })?;

                // Filter to same app
                let app_label = &target_key.0;
                let app_migrations: Vec<_> = order
                    .iter()
                    .enumerate()
                    .filter(|(_, k)| &k.0 == app_label)
                    .collect();

                let target_app_pos = app_migrations.iter().position(|(_, k)| *k == target_key);

                // Apply unapplied up to target
                for (global_pos, key) in &app_migrations {
                    if *global_pos <= target_pos && !applied.contains(key) {
                        plan.add_step(Self::step_forward(graph, key));
                    }
                }

                // Reverse applied migrations after target
                if let Some(tap) = target_app_pos {
                    for (_global_pos, key) in app_migrations.iter().rev() {
                        let key_app_pos = app_migrations.iter().position(|(_, k)| k == key);
                        if let Some(pos) = key_app_pos {
                            if pos > tap && applied.contains(key) {
                                plan.add_step(Self::step_backward(graph, key));
                            }
                        }
                    }
                }
            }
        }

        Ok(plan)
    }

    /// Builds the plan to migrate a single application to `target`,
    /// selecting direction the way south's `migrate_app` does.
    ///
    /// `target` follows [`MigrationGraph::resolve_target`]'s conventions.
    /// The current state of the application (its latest applied migration,
    /// if any) is compared against the resolved target: if the target is
    /// reachable forwards from there, the plan applies everything between;
    /// if it lies behind, the plan reverts everything after it down to (not
    /// including) the target; if they're equal, the plan is empty.
    ///
    /// Ghost migrations (history entries with no corresponding unit on disk)
    /// are always fatal, regardless of `options.resolve_mode` — a caller
    /// must repair the history table manually before migrating again.
    pub fn migrate_app(
        &self,
        graph: &MigrationGraph,
        app_label: &str,
        target: Option<&str>,
        options: MigrateAppOptions,
    ) -> Result<MigrationPlan, MigrationError> {
        let applied = self.recorder.applied();
        let applied_vec: Vec<(String, String)> = applied.iter().cloned().collect();

        let ghosts = graph.find_ghost_migrations(&applied_vec);
        if !ghosts.is_empty() {
            return Err(MigrationError::GhostMigrations(ghosts));
        }

        let resolved_target = graph.resolve_target(app_label, target)?;

        let mut app_applied: Vec<(String, String)> =
            applied.iter().filter(|k| k.0 == app_label).cloned().collect();
        app_applied.sort();
        let latest_applied = app_applied.last().cloned();

        let mut plan = MigrationPlan::new();

        match (&resolved_target, &latest_applied) {
            (None, None) => {
                info!(app = app_label, "nothing applied, nothing to unapply");
            }
            (None, Some(_)) => {
                // target "zero": unapply everything in this app, most-recent first,
                // along with anything elsewhere that depends on it.
                let mut seen = HashSet::new();
                for root in app_applied.iter().rev() {
                    for key in graph.backwards_plan(root)? {
                        if applied.contains(&key) && seen.insert(key.clone()) {
                            plan.add_step(Self::step_backward(graph, &key));
                        }
                    }
                }
            }
            (Some(target_key), _) if Some(target_key) == latest_applied.as_ref() => {
                debug!(app = app_label, unit = %target_key.1, "already at target");
            }
            (Some(target_key), _) => {
                let forward_order = graph.forwards_plan(target_key)?;
                let is_after = match &latest_applied {
                    None => true,
                    Some(latest) => forward_order.iter().any(|k| k == latest),
                };

                if is_after {
                    let mut candidates: Vec<(String, String)> = forward_order
                        .iter()
                        .filter(|k| !applied.contains(*k))
                        .cloned()
                        .collect();

                    let problems = graph.forwards_problems(&candidates, &applied)?;
                    if !problems.is_empty() {
                        match options.resolve_mode {
                            ResolveMode::Strict => {
                                return Err(MigrationError::InconsistentMigrationHistory {
                                    problems,
                                });
                            }
                            ResolveMode::Merge => {
                                warn!(
                                    app = app_label,
                                    problems = problems.len(),
                                    "merging inconsistent migration history"
                                );
                            }
                            ResolveMode::Skip => {
                                let skip: HashSet<_> =
                                    problems.iter().map(|p| p.conflicting.clone()).collect();
                                warn!(
                                    app = app_label,
                                    skipped = skip.len(),
                                    "skipping migrations conflicting with recorded history"
                                );
                                candidates.retain(|k| !skip.contains(k));
                            }
                        }
                    }

                    for key in candidates {
                        plan.add_step(Self::step_forward(graph, &key));
                    }
                } else {
                    let backward_order = graph.backwards_plan(target_key)?;
                    let candidates: Vec<(String, String)> = backward_order
                        .iter()
                        .filter(|k| *k != target_key && applied.contains(*k))
                        .cloned()
                        .collect();

                    let problems = graph.backwards_problems(&candidates, &applied)?;
                    if !problems.is_empty() && options.resolve_mode == ResolveMode::Strict {
                        return Err(MigrationError::InconsistentMigrationHistory { problems });
                    }

                    for key in candidates {
                        plan.add_step(Self::step_backward(graph, &key));
                    }
                }
            }
        }

        if options.fake {
            info!(app = app_label, steps = plan.len(), "faking migration plan");
        }
        if options.db_dry_run {
            warn!(app = app_label, "dry run requested, plan not executed");
        }

        Ok(plan)
    }

    /// Builds a forward step, carrying the key's `no_dry_run` flag over from
    /// the graph it was resolved against.
    fn step_forward(graph: &MigrationGraph, key: &(String, String)) -> MigrationStep {
        let step = MigrationStep::forward(key.0.clone(), key.1.clone());
        if graph.no_dry_run(key) {
            step.skip_dry_run()
        } else {
            step
        }
    }

    /// Builds a backward step, carrying the key's `no_dry_run` flag over from
    /// the graph it was resolved against.
    fn step_backward(graph: &MigrationGraph, key: &(String, String)) -> MigrationStep {
        let step = MigrationStep::backward(key.0.clone(), key.1.clone());
        if graph.no_dry_run(key) {
            step.skip_dry_run()
        } else {
            step
        }
    }

    /// Executes a migration plan, returning all generated SQL statements.
    ///
    /// This applies each step's operations in order, updating the project state
    /// and recording the migration as applied/unapplied.
    pub fn execute_plan(
        &mut self,
        plan: &MigrationPlan,
        operations: &std::collections::HashMap<(String, String), Vec<Box<dyn Operation>>>,
        initial_state: &ProjectState,
    ) -> Result<Vec<String>, DjangoError> {
        let mut all_sql = Vec::new();
        let mut state = initial_state.clone();

        for step in &plan.steps {
            let ops = operations.get(&step.migration).ok_or_else(|| {
                DjangoError::DatabaseError(format!(
                    "Operations for migration {:?} not found",
                    step.migration
                ))
            })?;

            let from_state = state.clone();
            if step.backwards {
                // Apply operations in reverse
                for op in ops.iter().rev() {
                    let sql = op.database_backwards(
                        &step.migration.0,
                        &*self.schema_editor,
                        &mut self.ddl_session,
                        &from_state,
                        &state,
                    )?;
                    all_sql.extend(sql);
                }
                // Revert state (re-apply forward from initial to rebuild)
                self.recorder.unapply(&step.migration);
            } else {
                for op in ops {
                    op.state_forwards(&step.migration.0, &mut state);
                    let sql = op.database_forwards(
                        &step.migration.0,
                        &*self.schema_editor,
                        &mut self.ddl_session,
                        &from_state,
                        &state,
                    )?;
                    all_sql.extend(sql);
                }
                self.recorder.apply(step.migration.clone());
            }
        }

        self.drain_signals();

        Ok(all_sql)
    }

    /// Returns a reference to the recorder.
    pub fn recorder(&self) -> &MigrationRecorder {
        &self.recorder
    }

    /// Returns a mutable reference to the recorder.
    pub fn recorder_mut(&mut self) -> &mut MigrationRecorder {
        &mut self.recorder
    }

    /// Executes a migration plan against a real database.
    ///
    /// For each step in the plan, generates SQL via the schema editor, executes
    /// each statement against the backend, and records the migration in the
    /// `django_migrations` table.
    ///
    /// If `fake` is `true`, the migration is recorded as applied without
    /// executing the SQL statements.
    pub async fn execute_against_db(
        &mut self,
        plan: &MigrationPlan,
        operations: &std::collections::HashMap<(String, String), Vec<Box<dyn Operation>>>,
        initial_state: &ProjectState,
        backend: &dyn DatabaseBackend,
        fake: bool,
    ) -> Result<Vec<String>, DjangoError> {
        self.execute_against_db_with_observer(
            plan,
            operations,
            initial_state,
            backend,
            fake,
            &NullObserver,
        )
        .await
    }

    /// Same as [`Self::execute_against_db`], additionally firing
    /// `pre_migrate`/`post_migrate`/`ran_migration` on `observer` around the
    /// run. `pre_migrate`/`post_migrate` fire once per distinct application
    /// label touched by the plan, in the order each label is first seen.
    ///
    /// A thin wrapper over [`Self::execute_against_db_checked`] that folds
    /// its richer [`MigrationError`] back into [`DjangoError`] to keep this
    /// method's long-standing signature intact.
    pub async fn execute_against_db_with_observer(
        &mut self,
        plan: &MigrationPlan,
        operations: &std::collections::HashMap<(String, String), Vec<Box<dyn Operation>>>,
        initial_state: &ProjectState,
        backend: &dyn DatabaseBackend,
        fake: bool,
        observer: &dyn MigrationObserver,
    ) -> Result<Vec<String>, DjangoError> {
        self.execute_against_db_checked(plan, operations, initial_state, backend, fake, observer)
            .await
            .map_err(|e| match e {
                MigrationError::Database(inner) => inner,
                other => DjangoError::DatabaseError(other.to_string()),
            })
    }

    /// Same as [`Self::execute_against_db_with_observer`], additionally
    /// invoking `loader` once the plan has finished, if `load_initial_data`
    /// is set and the plan contained at least one newly-applied forward
    /// step for `target_app`.
    ///
    /// south's own `migrate_app` only reloads fixtures on a real (non-fake)
    /// forward run that reaches the target application's latest migration;
    /// a fake run or a run that only touched other applications' migrations
    /// (pulled in transitively as dependencies) does not trigger it.
    #[allow(clippy::too_many_arguments)]
    pub async fn execute_against_db_with_initial_data(
        &mut self,
        plan: &MigrationPlan,
        operations: &std::collections::HashMap<(String, String), Vec<Box<dyn Operation>>>,
        initial_state: &ProjectState,
        backend: &dyn DatabaseBackend,
        fake: bool,
        observer: &dyn MigrationObserver,
        target_app: &str,
        load_initial_data: bool,
        loader: &dyn InitialDataLoader,
    ) -> Result<Vec<String>, DjangoError> {
        let reached_target = !fake
            && plan
                .steps
                .iter()
                .any(|s| !s.backwards && s.migration.0 == target_app);

        let sql = self
            .execute_against_db_with_observer(
                plan,
                operations,
                initial_state,
                backend,
                fake,
                observer,
            )
            .await?;

        if load_initial_data && reached_target {
            loader.load_initial_data(target_app);
        }

        Ok(sql)
    }

    /// Generates the SQL for every step of `plan` in order, mutating a clone
    /// of `initial_state` the way [`Self::execute_plan`] does, without
    /// touching the recorder or a database connection.
    ///
    /// Returns one entry per step holding its generated statements. Used by
    /// both the dry-run preflight and the real execution pass, so the two
    /// always see identical SQL.
    ///
    /// Takes the schema editor and session explicitly, rather than as a
    /// method on `&self`/`&mut self`, so callers that also need a live
    /// `&mut self.ddl_session` borrow (for real execution) and callers that
    /// only want throwaway SQL (dry-run preflight, reverse hints) can both
    /// use it without fighting the borrow checker over `self`.
    fn generate_plan_sql(
        schema_editor: &dyn SchemaEditor,
        session: &mut DdlSession,
        plan: &MigrationPlan,
        operations: &std::collections::HashMap<(String, String), Vec<Box<dyn Operation>>>,
        initial_state: &ProjectState,
    ) -> Result<Vec<Vec<String>>, DjangoError> {
        let mut state = initial_state.clone();
        let mut per_step = Vec::with_capacity(plan.steps.len());

        for step in &plan.steps {
            let ops = operations.get(&step.migration).ok_or_else(|| {
                DjangoError::DatabaseError(format!(
                    "Operations for migration {:?} not found",
                    step.migration
                ))
            })?;

            let from_state = state.clone();
            let mut step_sql = Vec::new();

            if step.backwards {
                for op in ops.iter().rev() {
                    let sql = op.database_backwards(
                        &step.migration.0,
                        schema_editor,
                        session,
                        &from_state,
                        &state,
                    )?;
                    step_sql.extend(sql);
                }
            } else {
                for op in ops {
                    op.state_forwards(&step.migration.0, &mut state);
                    let sql = op.database_forwards(
                        &step.migration.0,
                        schema_editor,
                        session,
                        &from_state,
                        &state,
                    )?;
                    step_sql.extend(sql);
                }
            }

            per_step.push(step_sql);
        }

        Ok(per_step)
    }

    /// Runs every non-comment statement of `plan` inside a transaction that
    /// is always rolled back, regardless of outcome.
    ///
    /// This is the pre-flight south itself runs before a real migration on
    /// engines whose DDL does not participate in transactions: it cannot
    /// undo a failed `ALTER TABLE` once it has run, so it tries the whole
    /// plan once inside a transaction it intends to discard, to catch
    /// failures before they can leave the schema half-migrated. Steps
    /// flagged [`MigrationStep::no_dry_run`] are skipped, mirroring
    /// [`Migration::no_dry_run`](crate::migration::Migration::no_dry_run):
    /// typically data migrations unsafe to run twice.
    pub async fn dry_run(
        &self,
        plan: &MigrationPlan,
        operations: &std::collections::HashMap<(String, String), Vec<Box<dyn Operation>>>,
        initial_state: &ProjectState,
        backend: &dyn DatabaseBackend,
    ) -> Result<(), MigrationError> {
        let per_step_sql = Self::generate_plan_sql(
            &*self.schema_editor,
            &mut DdlSession::new(),
            plan,
            operations,
            initial_state,
        )?;

        backend.begin_transaction().await?;

        let mut outcome: Result<(), MigrationError> = Ok(());
        'steps: for (step, step_sql) in plan.steps.iter().zip(per_step_sql.iter()) {
            if step.no_dry_run {
                continue;
            }
            for sql in step_sql {
                if sql.starts_with("--") {
                    continue;
                }
                if let Err(e) = backend.execute(sql, &[]).await {
                    outcome = Err(MigrationError::FailedDryRun(format!(
                        "{}.{}: {e}",
                        step.migration.0, step.migration.1
                    )));
                    break 'steps;
                }
            }
        }

        // Always discard; a dry run must never leave a mark.
        backend.rollback().await?;
        outcome
    }

    /// Same as [`Self::execute_against_db_with_observer`], returning the
    /// richer [`MigrationError`] instead of folding it into [`DjangoError`].
    ///
    /// On an engine whose DDL transacts ([`SchemaEditor::has_ddl_transactions`]),
    /// the whole plan runs inside one transaction: any failure rolls back
    /// cleanly and nothing is recorded. On an engine whose DDL does not
    /// ([`MySqlSchemaEditor`](crate::schema_editor::MySqlSchemaEditor)), a
    /// [`Self::dry_run`] pass runs first to catch failures before they can
    /// land; a failure mid-run past that point cannot be undone, so this
    /// logs a recovery hint (the reverse operations' SQL) instead.
    pub async fn execute_against_db_checked(
        &mut self,
        plan: &MigrationPlan,
        operations: &std::collections::HashMap<(String, String), Vec<Box<dyn Operation>>>,
        initial_state: &ProjectState,
        backend: &dyn DatabaseBackend,
        fake: bool,
        observer: &dyn MigrationObserver,
    ) -> Result<Vec<String>, MigrationError> {
        self.recorder.ensure_table(backend).await?;

        let transactional_ddl = self.schema_editor.has_ddl_transactions();

        if !fake && !transactional_ddl {
            self.dry_run(plan, operations, initial_state, backend).await?;
        }

        let per_step_sql = Self::generate_plan_sql(
            &*self.schema_editor,
            &mut self.ddl_session,
            plan,
            operations,
            initial_state,
        )?;

        let mut seen_apps = HashSet::new();
        for step in &plan.steps {
            if seen_apps.insert(step.migration.0.clone()) {
                observer.pre_migrate(&step.migration.0);
            }
        }

        if !fake && transactional_ddl {
            backend.begin_transaction().await?;
        }

        let fk_checks_disabled = if !fake && !transactional_ddl {
            if let Some(sql) = self.schema_editor.disable_foreign_key_checks() {
                backend.execute(&sql, &[]).await?;
                if let Some(enable) = self.schema_editor.enable_foreign_key_checks() {
                    self.ddl_session.defer(enable);
                }
                true
            } else {
                false
            }
        } else {
            false
        };

        let mut all_sql = Vec::new();

        for (step, step_sql) in plan.steps.iter().zip(per_step_sql.iter()) {
            if !fake {
                for sql in step_sql {
                    if sql.starts_with("--") {
                        continue;
                    }
                    if let Err(e) = backend.execute(sql, &[]).await {
                        if !transactional_ddl {
                            let hint = self
                                .reverse_hint_sql(step, operations, initial_state)
                                .unwrap_or_default();
                            warn!(
                                app = %step.migration.0,
                                unit = %step.migration.1,
                                error = %e,
                                recovery_hint = %hint.join("; "),
                                "non-transactional DDL failed mid-migration; schema left partially applied"
                            );
                            if fk_checks_disabled {
                                for deferred in self.ddl_session.execute_deferred_sql() {
                                    let _ = backend.execute(&deferred, &[]).await;
                                }
                            }
                            self.drain_signals();
                        } else {
                            backend.rollback().await?;
                            // Nothing actually landed; any signals queued while
                            // generating this plan's SQL never fired for real.
                            self.ddl_session.drain_pending_create_signals();
                        }
                        return Err(MigrationError::Database(e));
                    }
                }
            }
            all_sql.extend(step_sql.clone());

            if step.backwards {
                self.recorder.unapply(&step.migration);
                self.recorder
                    .unrecord_from_db(backend, &step.migration.0, &step.migration.1)
                    .await?;
            } else {
                self.recorder.apply(step.migration.clone());
                self.recorder
                    .record_to_db(backend, &step.migration.0, &step.migration.1)
                    .await?;
            }

            observer.ran_migration(&step.migration.0, &step.migration.1, step.backwards);
        }

        if !fake {
            if transactional_ddl {
                backend.commit().await?;
            } else if fk_checks_disabled {
                for deferred in self.ddl_session.execute_deferred_sql() {
                    backend.execute(&deferred, &[]).await?;
                }
            }
            self.drain_signals();
        } else {
            // Faked: nothing was actually created, so any queued signals
            // never fired for real.
            self.ddl_session.drain_pending_create_signals();
        }

        for app_label in &seen_apps {
            observer.post_migrate(app_label);
        }

        Ok(all_sql)
    }

    /// Best-effort recovery hint for a step that failed mid-run on an engine
    /// whose DDL cannot be rolled back: the SQL that would reverse it, for
    /// an operator to review and apply by hand. Generation failures (state
    /// mismatches, missing fields) are swallowed; a hint is a courtesy, not
    /// a guarantee.
    fn reverse_hint_sql(
        &self,
        step: &MigrationStep,
        operations: &std::collections::HashMap<(String, String), Vec<Box<dyn Operation>>>,
        initial_state: &ProjectState,
    ) -> Option<Vec<String>> {
        let ops = operations.get(&step.migration)?;
        let mut state = initial_state.clone();
        let mut session = DdlSession::new();
        let mut hint = Vec::new();
        for op in ops {
            let from_state = state.clone();
            op.state_forwards(&step.migration.0, &mut state);
            if step.backwards {
                hint.extend(
                    op.database_forwards(&step.migration.0, &*self.schema_editor, &mut session, &from_state, &state)
                        .ok()?,
                );
            } else {
                hint.extend(
                    op.database_backwards(&step.migration.0, &*self.schema_editor, &mut session, &from_state, &state)
                        .ok()?,
                );
            }
        }
        Some(hint)
    }

    /// Drains the session's pending `CREATE TABLE` signals and logs each
    /// one, mirroring south's `db.send_pending_create_signals`: a hook point
    /// for anything a host application wants to run once a table genuinely
    /// exists (e.g. registering it with a cache or search index).
    fn drain_signals(&mut self) {
        for signal in self.ddl_session.drain_pending_create_signals() {
            debug!(table = %signal.table_name, "pending create signal");
        }
    }
}

/// Tracks which migrations have been applied.
///
/// Operates both in-memory and against the `django_migrations` database table.
/// The in-memory set is the source of truth for plan building; the database
/// table provides persistence across runs.
#[derive(Debug, Clone, Default)]
pub struct MigrationRecorder {
    /// Set of applied migration keys.
    applied_migrations: HashSet<(String, String)>,
}

impl MigrationRecorder {
    /// Creates a new empty recorder.
    pub fn new() -> Self {
        Self {
            applied_migrations: HashSet::new(),
        }
    }

    /// Returns the SQL to create the `django_migrations` table.
    ///
    /// Uses SQLite-compatible syntax (INTEGER PRIMARY KEY AUTOINCREMENT).
    /// For PostgreSQL, use `ensure_schema_sql_pg()`.
    pub fn ensure_schema_sql() -> Vec<String> {
        vec!["CREATE TABLE IF NOT EXISTS \"django_migrations\" (\
                \"id\" BIGSERIAL PRIMARY KEY, \
                \"app\" VARCHAR(255) NOT NULL, \
                \"name\" VARCHAR(255) NOT NULL, \
                \"applied\" TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP\
            )"
        .to_string()]
    }

    /// Returns the SQLite-compatible SQL to create the `django_migrations` table.
    pub fn ensure_schema_sql_sqlite() -> &'static str {
        "CREATE TABLE IF NOT EXISTS \"django_migrations\" (\
            \"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
            \"app\" TEXT NOT NULL, \
            \"name\" TEXT NOT NULL, \
            \"applied\" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP\
        )"
    }

    /// Records a migration as applied (in-memory only).
    pub fn apply(&mut self, key: (String, String)) {
        self.applied_migrations.insert(key);
    }

    /// Records a migration as unapplied (in-memory only).
    pub fn unapply(&mut self, key: &(String, String)) {
        self.applied_migrations.remove(key);
    }

    /// Returns the set of applied migrations.
    pub fn applied(&self) -> &HashSet<(String, String)> {
        &self.applied_migrations
    }

    /// Returns whether a specific migration has been applied.
    pub fn is_applied(&self, key: &(String, String)) -> bool {
        self.applied_migrations.contains(key)
    }

    /// Returns the SQL to record a migration as applied.
    pub fn record_applied_sql(app_label: &str, name: &str) -> String {
        format!(
            "INSERT INTO \"django_migrations\" (\"app\", \"name\", \"applied\") \
             VALUES ('{app_label}', '{name}', CURRENT_TIMESTAMP)"
        )
    }

    /// Returns the SQL to record a migration as unapplied.
    pub fn record_unapplied_sql(app_label: &str, name: &str) -> String {
        format!(
            "DELETE FROM \"django_migrations\" \
             WHERE \"app\" = '{app_label}' AND \"name\" = '{name}'"
        )
    }

    // ── Async database operations ────────────────────────────────────

    /// Ensures the `django_migrations` table exists in the database.
    ///
    /// Detects the backend type and uses the appropriate DDL syntax.
    pub async fn ensure_table(&self, backend: &dyn DatabaseBackend) -> Result<(), DjangoError> {
        let sql = match backend.vendor() {
            "sqlite" => Self::ensure_schema_sql_sqlite().to_string(),
            _ => Self::ensure_schema_sql()[0].clone(),
        };
        backend.execute(&sql, &[]).await?;
        Ok(())
    }

    /// Loads applied migrations from the database into the in-memory set.
    ///
    /// Reads all rows from `django_migrations` and populates the applied set.
    /// If the table does not exist, it is created first.
    pub async fn load_from_db(&mut self, backend: &dyn DatabaseBackend) -> Result<(), DjangoError> {
        self.ensure_table(backend).await?;

        let rows = backend
            .query("SELECT \"app\", \"name\" FROM \"django_migrations\"", &[])
            .await?;

        self.applied_migrations.clear();
        for row in &rows {
            let app: String = row
                .get("app")
                .map_err(|_| DjangoError::DatabaseError("Missing 'app' column".into()))?;
            let name: String = row
                .get("name")
                .map_err(|_| DjangoError::DatabaseError("Missing 'name' column".into()))?;
            self.applied_migrations.insert((app, name));
        }

        Ok(())
    }

    /// Records a migration as applied in the database.
    pub async fn record_to_db(
        &self,
        backend: &dyn DatabaseBackend,
        app_label: &str,
        name: &str,
    ) -> Result<(), DjangoError> {
        let sql = Self::record_applied_sql(app_label, name);
        backend.execute(&sql, &[]).await?;
        Ok(())
    }

    /// Removes a migration record from the database.
    pub async fn unrecord_from_db(
        &self,
        backend: &dyn DatabaseBackend,
        app_label: &str,
        name: &str,
    ) -> Result<(), DjangoError> {
        let sql = Self::record_unapplied_sql(app_label, name);
        backend.execute(&sql, &[]).await?;
        Ok(())
    }
}
