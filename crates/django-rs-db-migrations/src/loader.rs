//! Migration loader for discovering migrations from the filesystem.
//!
//! The [`MigrationLoader`] scans a directory structure to find migration files
//! and builds a [`MigrationGraph`] from them. This mirrors Django's
//! `MigrationLoader`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::errors::MigrationResult;
use crate::migration::{Migration, MigrationGraph};

/// Metadata about a discovered migration file.
///
/// The loader discovers migration files but does not execute them directly.
/// Instead it returns metadata that the executor uses to build a plan.
#[derive(Debug, Clone)]
pub struct MigrationFileInfo {
    /// The app label.
    pub app_label: String,
    /// The migration name (without extension).
    pub name: String,
    /// The path to the migration file.
    pub path: PathBuf,
    /// Dependencies declared in the migration file.
    pub dependencies: Vec<(String, String)>,
    /// Whether this is an initial migration.
    pub initial: bool,
    /// Whether this migration's `forwards`/`backwards` take no arguments.
    ///
    /// Older migrations wrote `forwards(self)` with no ORM/schema-editor
    /// parameters; the runner dispatches the zero-arg form for these.
    pub legacy_signature: bool,
    /// If `true`, this migration is never included in a dry run.
    pub no_dry_run: bool,
    /// Restricts a frozen-ORM rebuild to only these applications, when set.
    pub complete_apps: Option<Vec<String>>,
}

/// Discovers and loads migrations from the filesystem.
///
/// The loader expects a directory structure like:
/// ```text
/// migrations_dir/
///   app_label/
///     0001_initial.json
///     0002_add_field.json
/// ```
///
/// Each migration file is a JSON file containing migration metadata.
pub struct MigrationLoader {
    /// The base directory containing app migration directories.
    migrations_dir: PathBuf,
    /// Discovered migrations keyed by `(app_label, name)`.
    migrations: HashMap<(String, String), MigrationFileInfo>,
}

impl MigrationLoader {
    /// Creates a new loader for the given migrations directory.
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
            migrations: HashMap::new(),
        }
    }

    /// Scans the filesystem for migration files and builds a graph.
    ///
    /// Returns the migration graph with all discovered migrations added as
    /// nodes and their dependencies as edges.
    pub fn load(&mut self) -> MigrationResult<MigrationGraph> {
        self.discover()?;
        self.build_graph()
    }

    /// Discovers migration files from the directory structure.
    fn discover(&mut self) -> MigrationResult<()> {
        self.migrations.clear();

        let dir = &self.migrations_dir;
        if !dir.exists() {
            return Ok(());
        }

        let entries = std::fs::read_dir(dir)?;

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                let app_label = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("")
                    .to_string();
                if !app_label.is_empty() {
                    self.discover_app(&app_label, &path)?;
                }
            }
        }

        Ok(())
    }

    /// Discovers migration files for a single app.
    fn discover_app(&mut self, app_label: &str, app_dir: &Path) -> MigrationResult<()> {
        let entries = std::fs::read_dir(app_dir)?;

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                let name = path
                    .file_stem()
                    .and_then(|n| n.to_str())
                    .unwrap_or("")
                    .to_string();
                if !name.is_empty() {
                    let info = self.parse_migration_file(app_label, &name, &path)?;
                    let key = (app_label.to_string(), name);
                    self.migrations.insert(key, info);
                }
            }
        }

        Ok(())
    }

    /// Parses a migration JSON file to extract metadata.
    #[allow(clippy::unused_self)]
    fn parse_migration_file(
        &self,
        app_label: &str,
        name: &str,
        path: &Path,
    ) -> MigrationResult<MigrationFileInfo> {
        let content = std::fs::read_to_string(path)?;

        let json: serde_json::Value = serde_json::from_str(&content)?;

        let initial = json
            .get("initial")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);

        let dependencies = json
            .get("dependencies")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|dep| {
                        let dep_arr = dep.as_array()?;
                        if dep_arr.len() == 2 {
                            Some((
                                dep_arr[0].as_str()?.to_string(),
                                dep_arr[1].as_str()?.to_string(),
                            ))
                        } else {
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let legacy_signature = json
            .get("legacy_signature")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);

        let no_dry_run = json
            .get("no_dry_run")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);

        let complete_apps = json.get("complete_apps").and_then(|v| v.as_array()).map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(ToString::to_string))
                .collect()
        });

        Ok(MigrationFileInfo {
            app_label: app_label.to_string(),
            name: name.to_string(),
            path: path.to_path_buf(),
            dependencies,
            initial,
            legacy_signature,
            no_dry_run,
            complete_apps,
        })
    }

    /// Builds a migration graph from discovered migrations.
    ///
    /// Within each application, migrations form an implicit sequence:
    /// migration *n* depends on migration *n-1* even when no `dependencies`
    /// entry says so. That implicit edge is recorded before any explicit
    /// `dependencies` entries from the file, so `MigrationGraph::forwards_plan`
    /// visits it first.
    fn build_graph(&self) -> MigrationResult<MigrationGraph> {
        let mut graph = MigrationGraph::new();

        for (key, info) in &self.migrations {
            graph.add_node(&key.0, &key.1, info.initial);
            graph.set_no_dry_run(key, info.no_dry_run);
        }

        let mut by_app: HashMap<&str, Vec<&str>> = HashMap::new();
        for key in self.migrations.keys() {
            by_app.entry(&key.0).or_default().push(&key.1);
        }
        for names in by_app.values_mut() {
            names.sort_unstable();
        }

        for (app, names) in &by_app {
            for pair in names.windows(2) {
                let (prev, next) = (pair[0], pair[1]);
                graph.add_dependency(
                    ((*app).to_string(), next.to_string()),
                    ((*app).to_string(), prev.to_string()),
                )?;
            }
        }

        let mut keys: Vec<_> = self.migrations.keys().cloned().collect();
        keys.sort();
        for key in &keys {
            let info = &self.migrations[key];
            for dep in &info.dependencies {
                graph.validate_explicit_edge(key, dep)?;
                graph.add_dependency(key.clone(), dep.clone())?;
            }
        }

        graph.validate()?;
        Ok(graph)
    }

    /// Returns the discovered migrations.
    pub fn migrations(&self) -> &HashMap<(String, String), MigrationFileInfo> {
        &self.migrations
    }

    /// Returns the migrations directory.
    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Creates a `MigrationGraph` from a list of in-memory migrations.
    ///
    /// This is useful for testing and for programmatic migration definitions
    /// that don't come from the filesystem.
    pub fn graph_from_migrations(migrations: &[&Migration]) -> MigrationResult<MigrationGraph> {
        let mut graph = MigrationGraph::new();

        for m in migrations {
            graph.add_node(&m.app_label, &m.name, m.initial);
            graph.set_no_dry_run(&m.key(), m.no_dry_run);
        }

        for m in migrations {
            for dep in &m.dependencies {
                graph.validate_explicit_edge(&m.key(), dep)?;
                graph.add_dependency(m.key(), dep.clone())?;
            }
        }

        graph.validate()?;
        Ok(graph)
    }
}
