//! Migration structs and dependency graph.
//!
//! A [`Migration`] is a named unit of schema change containing a sequence of
//! [`Operation`]s. The [`MigrationGraph`] manages the dependency DAG between
//! migrations across all apps, enabling topological ordering.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::errors::{HistoryProblem, MigrationError, MigrationResult};
use crate::operations::Operation;

/// A single migration containing a sequence of operations.
///
/// Migrations are identified by `(app_label, name)` and may declare
/// dependencies on other migrations. Operations within a migration
/// are applied in order.
pub struct Migration {
    /// The migration name (e.g., "0001_initial").
    pub name: String,
    /// The application label this migration belongs to.
    pub app_label: String,
    /// Dependencies on other migrations: `(app_label, migration_name)`.
    pub dependencies: Vec<(String, String)>,
    /// The operations to apply, in order.
    pub operations: Vec<Box<dyn Operation>>,
    /// Whether this is the initial migration for the app.
    pub initial: bool,
    /// Whether this migration's procedures take no arguments.
    pub legacy_signature: bool,
    /// If `true`, this migration is skipped from a dry run.
    pub no_dry_run: bool,
    /// Restricts a frozen-ORM rebuild to only these applications, when set.
    pub complete_apps: Option<Vec<String>>,
}

impl Migration {
    /// Creates a new migration.
    pub fn new(app_label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            app_label: app_label.into(),
            dependencies: Vec::new(),
            operations: Vec::new(),
            initial: false,
            legacy_signature: false,
            no_dry_run: false,
            complete_apps: None,
        }
    }

    /// Marks this migration as the initial migration.
    pub fn initial(mut self) -> Self {
        self.initial = true;
        self
    }

    /// Marks this migration's procedures as taking no arguments.
    pub fn legacy_signature(mut self) -> Self {
        self.legacy_signature = true;
        self
    }

    /// Excludes this migration from dry runs.
    pub fn no_dry_run(mut self) -> Self {
        self.no_dry_run = true;
        self
    }

    /// Restricts a frozen-ORM rebuild to the given applications.
    pub fn complete_apps(mut self, apps: Vec<String>) -> Self {
        self.complete_apps = Some(apps);
        self
    }

    /// Adds a dependency on another migration.
    pub fn depends_on(mut self, app_label: impl Into<String>, name: impl Into<String>) -> Self {
        self.dependencies.push((app_label.into(), name.into()));
        self
    }

    /// Adds an operation to this migration.
    pub fn add_operation(mut self, op: Box<dyn Operation>) -> Self {
        self.operations.push(op);
        self
    }

    /// Returns the `(app_label, name)` key for this migration.
    pub fn key(&self) -> (String, String) {
        (self.app_label.clone(), self.name.clone())
    }
}

/// A directed acyclic graph (DAG) of migrations.
///
/// The graph tracks which migrations exist and their dependency relationships.
/// It provides topological ordering so migrations can be applied in the
/// correct sequence.
pub struct MigrationGraph {
    /// All migration nodes keyed by `(app_label, name)`.
    nodes: HashMap<(String, String), MigrationNode>,
    /// Forward edges: from dependency to dependent.
    forward_edges: HashMap<(String, String), Vec<(String, String)>>,
    /// Backward edges: from dependent to dependency.
    backward_edges: HashMap<(String, String), Vec<(String, String)>>,
}

/// A node in the migration graph.
#[allow(dead_code)]
struct MigrationNode {
    /// The migration key.
    key: (String, String),
    /// Whether this migration is an initial migration.
    initial: bool,
    /// Mirrors [`Migration::no_dry_run`]: whether a runner should skip this
    /// node when building a dry-run preflight.
    no_dry_run: bool,
}

impl MigrationGraph {
    /// Creates a new empty migration graph.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            forward_edges: HashMap::new(),
            backward_edges: HashMap::new(),
        }
    }

    /// Adds a migration to the graph.
    pub fn add_node(
        &mut self,
        app_label: impl Into<String>,
        name: impl Into<String>,
        initial: bool,
    ) {
        let key = (app_label.into(), name.into());
        self.nodes.insert(
            key.clone(),
            MigrationNode {
                key: key.clone(),
                initial,
                no_dry_run: false,
            },
        );
        self.forward_edges.entry(key.clone()).or_default();
        self.backward_edges.entry(key).or_default();
    }

    /// Marks a node's [`Migration::no_dry_run`] flag, if the node exists.
    ///
    /// Called after `add_node` by callers that build the graph from full
    /// `Migration`/`MigrationFileInfo` values, which carry this flag but
    /// aren't themselves stored in the graph.
    pub fn set_no_dry_run(&mut self, key: &(String, String), no_dry_run: bool) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.no_dry_run = no_dry_run;
        }
    }

    /// Returns whether a node is flagged [`Migration::no_dry_run`].
    ///
    /// Unknown keys return `false`.
    pub fn no_dry_run(&self, key: &(String, String)) -> bool {
        self.nodes.get(key).is_some_and(|n| n.no_dry_run)
    }

    /// Adds a dependency edge: `child` depends on `parent`.
    ///
    /// Both nodes must have been added previously. This performs no
    /// validation beyond "do both nodes exist" — it is used both for the
    /// implicit in-app predecessor edge (always valid by construction) and,
    /// after [`validate_explicit_edge`](Self::validate_explicit_edge) has
    /// passed, for explicit `depends_on` edges.
    pub fn add_dependency(
        &mut self,
        child: (String, String),
        parent: (String, String),
    ) -> MigrationResult<()> {
        if !self.nodes.contains_key(&child) {
            return Err(MigrationError::UnknownMigration(format!(
                "{}.{}",
                child.0, child.1
            )));
        }
        if !self.nodes.contains_key(&parent) {
            return Err(MigrationError::UnknownMigration(format!(
                "{}.{}",
                parent.0, parent.1
            )));
        }
        self.forward_edges
            .entry(parent.clone())
            .or_default()
            .push(child.clone());
        self.backward_edges.entry(child).or_default().push(parent);
        Ok(())
    }

    /// Validates an explicit `depends_on` edge per the migration graph's
    /// dependency rules, before [`add_dependency`](Self::add_dependency) is
    /// called to actually add it.
    ///
    /// Three conditions, checked in order:
    /// 1. `parent`'s application must already have a migration sequence in
    ///    this graph, else [`MigrationError::DependsOnUnmigratedApplication`].
    /// 2. `parent` itself must exist as a node, else
    ///    [`MigrationError::DependsOnUnknownMigration`].
    /// 3. If `parent` is in the same application as `child`, `parent`'s name
    ///    must be strictly less than `child`'s — an explicit edge may not
    ///    invert the implicit lexicographic order — else
    ///    [`MigrationError::DependsOnHigherMigration`].
    pub fn validate_explicit_edge(
        &self,
        child: &(String, String),
        parent: &(String, String),
    ) -> MigrationResult<()> {
        let unit = format!("{}.{}", child.0, child.1);
        if !self.nodes.keys().any(|k| k.0 == parent.0) {
            return Err(MigrationError::DependsOnUnmigratedApplication {
                unit,
                app: parent.0.clone(),
            });
        }
        if !self.nodes.contains_key(parent) {
            return Err(MigrationError::DependsOnUnknownMigration {
                unit,
                target: format!("{}.{}", parent.0, parent.1),
            });
        }
        if child.0 == parent.0 && parent.1 >= child.1 {
            return Err(MigrationError::DependsOnHigherMigration {
                unit,
                target: format!("{}.{}", parent.0, parent.1),
            });
        }
        Ok(())
    }

    /// Returns all migrations in topological order (dependencies first).
    ///
    /// Returns an error if the graph contains a cycle.
    pub fn topological_order(&self) -> MigrationResult<Vec<(String, String)>> {
        let mut in_degree: HashMap<(String, String), usize> = HashMap::new();
        for key in self.nodes.keys() {
            in_degree.insert(key.clone(), 0);
        }
        for children in self.forward_edges.values() {
            for child in children {
                *in_degree.entry(child.clone()).or_insert(0) += 1;
            }
        }

        let mut queue: VecDeque<(String, String)> = VecDeque::new();
        for (key, &degree) in &in_degree {
            if degree == 0 {
                queue.push_back(key.clone());
            }
        }

        // Sort the initial queue for deterministic ordering
        let mut initial: Vec<(String, String)> = queue.into_iter().collect();
        initial.sort();
        queue = initial.into_iter().collect();

        let mut result = Vec::new();
        while let Some(node) = queue.pop_front() {
            result.push(node.clone());
            if let Some(children) = self.forward_edges.get(&node) {
                let mut sorted_children = children.clone();
                sorted_children.sort();
                for child in &sorted_children {
                    if let Some(deg) = in_degree.get_mut(child) {
                        *deg -= 1;
                        if *deg == 0 {
                            queue.push_back(child.clone());
                        }
                    }
                }
            }
        }

        if result.len() != self.nodes.len() {
            let resolved: HashSet<_> = result.iter().cloned().collect();
            let mut trace: Vec<String> = self
                .nodes
                .keys()
                .filter(|k| !resolved.contains(*k))
                .map(|(app, name)| format!("{app}.{name}"))
                .collect();
            trace.sort();
            return Err(MigrationError::CircularDependency { trace });
        }

        Ok(result)
    }

    /// Returns the leaf nodes (migrations with no dependents) for a given app.
    pub fn leaf_nodes(&self, app_label: &str) -> Vec<(String, String)> {
        let mut leaves = Vec::new();
        for (key, children) in &self.forward_edges {
            if key.0 == app_label && children.is_empty() {
                leaves.push(key.clone());
            }
        }
        leaves.sort();
        leaves
    }

    /// Returns the root nodes (migrations with no dependencies) for a given app.
    pub fn root_nodes(&self, app_label: &str) -> Vec<(String, String)> {
        let mut roots = Vec::new();
        for (key, parents) in &self.backward_edges {
            if key.0 == app_label && parents.is_empty() {
                roots.push(key.clone());
            }
        }
        roots.sort();
        roots
    }

    /// Returns all node keys in the graph.
    pub fn node_keys(&self) -> Vec<(String, String)> {
        let mut keys: Vec<_> = self.nodes.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns whether the graph contains a given node.
    pub fn contains(&self, key: &(String, String)) -> bool {
        self.nodes.contains_key(key)
    }

    /// Returns the dependencies of a node.
    pub fn dependencies(&self, key: &(String, String)) -> Vec<(String, String)> {
        self.backward_edges.get(key).cloned().unwrap_or_default()
    }

    /// Returns the dependents of a node.
    pub fn dependents(&self, key: &(String, String)) -> Vec<(String, String)> {
        self.forward_edges.get(key).cloned().unwrap_or_default()
    }

    /// Validates that the graph has no cycles.
    pub fn validate(&self) -> MigrationResult<()> {
        self.topological_order()?;
        Ok(())
    }

    /// Resolves a user-supplied target name within `app_label` to a full key.
    ///
    /// `None` selects the application's current leaf migration. `Some("zero")`
    /// requests a full unapply and resolves to `None`. Any other value is
    /// matched first as an exact migration name, then as a unique prefix of
    /// one; a prefix matching more than one migration is an error.
    pub fn resolve_target(
        &self,
        app_label: &str,
        target: Option<&str>,
    ) -> Result<Option<(String, String)>, MigrationError> {
        match target {
            None => {
                let leaves = self.leaf_nodes(app_label);
                if leaves.is_empty() {
                    return Err(MigrationError::NoMigrations(app_label.to_string()));
                }
                Ok(leaves.into_iter().next())
            }
            Some("zero") => Ok(None),
            Some(name) => {
                let exact = (app_label.to_string(), name.to_string());
                if self.contains(&exact) {
                    return Ok(Some(exact));
                }
                let mut matches: Vec<String> = self
                    .nodes
                    .keys()
                    .filter(|k| k.0 == app_label && k.1.starts_with(name))
                    .map(|k| k.1.clone())
                    .collect();
                matches.sort();
                match matches.len() {
                    0 => Err(MigrationError::UnknownMigration(format!(
                        "{app_label}.{name}"
                    ))),
                    1 => Ok(Some((app_label.to_string(), matches.remove(0)))),
                    _ => Err(MigrationError::MultiplePrefixMatches {
                        prefix: name.to_string(),
                        matches,
                    }),
                }
            }
        }
    }

    /// Returns the ordered sequence of migrations needed to reach `target`
    /// from empty history.
    ///
    /// Dependencies of each node are visited depth-first, in the order their
    /// edges were recorded against that node (the loader records the implicit
    /// in-app predecessor before explicit `depends_on` entries, so that
    /// ordering carries through here). Each migration appears once, at its
    /// first visit; `target` is always last.
    pub fn forwards_plan(
        &self,
        target: &(String, String),
    ) -> Result<Vec<(String, String)>, MigrationError> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut path = Vec::new();
        self.plan_visit(target, &self.backward_edges, &mut seen, &mut order, &mut path)?;
        Ok(order)
    }

    /// Returns the ordered sequence of migrations to revert in order to move
    /// history back to just before `target`.
    ///
    /// Every migration that transitively depends on `target` is reverted
    /// before `target` itself; `target` is always last in the returned
    /// sequence.
    pub fn backwards_plan(
        &self,
        target: &(String, String),
    ) -> Result<Vec<(String, String)>, MigrationError> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut path = Vec::new();
        self.plan_visit(target, &self.forward_edges, &mut seen, &mut order, &mut path)?;
        Ok(order)
    }

    fn plan_visit(
        &self,
        node: &(String, String),
        edges: &HashMap<(String, String), Vec<(String, String)>>,
        seen: &mut HashSet<(String, String)>,
        order: &mut Vec<(String, String)>,
        path: &mut Vec<(String, String)>,
    ) -> Result<(), MigrationError> {
        if seen.contains(node) {
            return Ok(());
        }
        if path.contains(node) {
            let mut trace: Vec<String> =
                path.iter().map(|(app, name)| format!("{app}.{name}")).collect();
            trace.push(format!("{}.{}", node.0, node.1));
            return Err(MigrationError::CircularDependency { trace });
        }
        if !self.nodes.contains_key(node) {
            return Err(MigrationError::UnknownMigration(format!(
                "{}.{}",
                node.0, node.1
            )));
        }
        path.push(node.clone());
        for next in edges.get(node).cloned().unwrap_or_default() {
            self.plan_visit(&next, edges, seen, order, path)?;
        }
        path.pop();
        seen.insert(node.clone());
        order.push(node.clone());
        Ok(())
    }

    /// Checks a set of not-yet-applied forward candidates against history
    /// for "applied descendant without its prerequisite" inconsistencies.
    ///
    /// For each candidate that is not itself applied, walks its
    /// [`backwards_plan`](Self::backwards_plan) — everything that transitively
    /// depends on it — and flags any entry that *is* applied. That entry was
    /// applied before a migration it depends on, which can only happen if
    /// history was hand-edited or a migration file was renumbered after the
    /// fact.
    pub fn forwards_problems(
        &self,
        planned_forward: &[(String, String)],
        applied: &HashSet<(String, String)>,
    ) -> Result<Vec<HistoryProblem>, MigrationError> {
        let mut problems = Vec::new();
        for ancestor in planned_forward {
            if applied.contains(ancestor) {
                continue;
            }
            for entry in self.backwards_plan(ancestor)? {
                if &entry == ancestor {
                    continue;
                }
                if applied.contains(&entry) {
                    problems.push(HistoryProblem {
                        migration: entry,
                        conflicting: ancestor.clone(),
                    });
                }
            }
        }
        Ok(problems)
    }

    /// Checks a set of applied backward candidates for the same
    /// inconsistency as [`forwards_problems`](Self::forwards_problems), found
    /// from the other end: for each candidate that is applied, walks its
    /// `forwards_plan` (its own prerequisites) and flags any entry that is
    /// *not* applied.
    pub fn backwards_problems(
        &self,
        planned_backward: &[(String, String)],
        applied: &HashSet<(String, String)>,
    ) -> Result<Vec<HistoryProblem>, MigrationError> {
        let mut problems = Vec::new();
        for unit in planned_backward {
            if !applied.contains(unit) {
                continue;
            }
            for entry in self.forwards_plan(unit)? {
                if &entry == unit {
                    continue;
                }
                if !applied.contains(&entry) {
                    problems.push(HistoryProblem {
                        migration: unit.clone(),
                        conflicting: entry,
                    });
                }
            }
        }
        Ok(problems)
    }

    /// Returns every `(app_label, name)` pair recorded in history with no
    /// corresponding node in this graph — migrations that were applied and
    /// later deleted from disk.
    pub fn find_ghost_migrations(
        &self,
        applied: &[(String, String)],
    ) -> Vec<(String, String)> {
        applied
            .iter()
            .filter(|key| !self.contains(key))
            .cloned()
            .collect()
    }
}

impl Default for MigrationGraph {
    fn default() -> Self {
        Self::new()
    }
}
