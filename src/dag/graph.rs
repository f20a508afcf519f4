// src/dag/graph.rs

//! The graph store: an arena of [`TaskRecord`]s plus a name index.
//!
//! Record 0 is the root sentinel. Every other record is reachable from it:
//! a task with no declared dependencies is a direct dependent of root, and
//! a forward reference (a dependency name nobody has registered yet) becomes
//! a placeholder hanging off root. When the real task shows up later it is
//! merged into the placeholder's slot, so every edge that already points at
//! the placeholder now points at the real task.

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::dag::record::{RecordId, TaskRecord, Work};
use crate::errors::SchedulerError;
use crate::types::{TaskFn, TaskName};

/// Key of the root sentinel. User tasks may not use it.
pub const ROOT_KEY: &str = "__ROOT_TASK_KEY_SHOULD_NOT_BE_USED_BY_USER__";

#[derive(Debug)]
pub struct GraphStore<T> {
    records: Vec<TaskRecord<T>>,
    index: HashMap<TaskName, RecordId>,
}

impl<T> GraphStore<T> {
    pub fn new() -> Self {
        Self {
            records: vec![TaskRecord::new(ROOT_KEY.to_string(), Work::Noop)],
            index: HashMap::new(),
        }
    }

    /// Register `name` with `work`, waiting on `deps`.
    ///
    /// - An existing record with the same name (placeholder or earlier
    ///   registration) is reused in place; its edges stay valid.
    /// - No dependencies: the record hangs off root, unless it was an
    ///   existing record that already has its own edges.
    /// - Each dependency is looked up by name; unknown names get a
    ///   placeholder hanging off root.
    /// - A record with explicit dependencies never keeps a root edge.
    pub fn insert(
        &mut self,
        name: &str,
        work: TaskFn<T>,
        deps: &[&str],
    ) -> Result<RecordId, SchedulerError> {
        validate_task_name(name)?;
        validate_dependency_names(name, deps)?;

        let (id, existed) = match self.index.get(name) {
            Some(&id) => {
                debug!(task = %name, "merging registration into existing record");
                self.records[id.0].work = Work::Task(work);
                (id, true)
            }
            None => (self.push(name, Work::Task(work)), false),
        };

        if deps.is_empty() {
            if !existed {
                self.add_edge(RecordId::ROOT, id);
            }
            return Ok(id);
        }

        for dep in deps {
            let dep_id = match self.index.get(*dep) {
                Some(&dep_id) => dep_id,
                None => {
                    debug!(task = %name, dependency = %dep, "forward reference; creating placeholder");
                    let placeholder = self.push(dep, Work::Noop);
                    self.add_edge(RecordId::ROOT, placeholder);
                    placeholder
                }
            };
            self.add_edge(dep_id, id);
        }

        self.remove_edge(RecordId::ROOT, id);
        Ok(id)
    }

    /// Look up a record by name (real task or placeholder).
    pub fn find(&self, name: &str) -> Option<RecordId> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Whether `name` is only known as a forward reference.
    pub fn is_placeholder(&self, name: &str) -> bool {
        self.find(name)
            .map(|id| self.records[id.0].is_placeholder())
            .unwrap_or(false)
    }

    /// Names of real (non-placeholder) tasks, in first-seen order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.records
            .iter()
            .skip(1)
            .filter(|rec| !rec.is_placeholder())
            .map(|rec| rec.key.as_str())
    }

    /// Number of real tasks.
    pub fn len(&self) -> usize {
        self.task_names().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Immediate dependencies of a task, root excluded.
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.neighbours(name, |rec| &rec.depends_on)
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.neighbours(name, |rec| &rec.dependents)
    }

    /// Names hanging directly off the root sentinel.
    pub fn roots(&self) -> Vec<&str> {
        self.records[0]
            .dependents
            .iter()
            .map(|id| self.records[id.0].key.as_str())
            .collect()
    }

    /// Every `(dependent, missing dependency)` pair where the dependency was
    /// never registered as a real task, in registration order.
    pub fn unresolved(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        for placeholder in self.records.iter().skip(1).filter(|r| r.is_placeholder()) {
            for dependent in &placeholder.dependents {
                out.push((self.records[dependent.0].key.as_str(), placeholder.key.as_str()));
            }
        }
        out.sort_by_key(|(dependent, _)| self.find(dependent));
        out
    }

    /// Check that the task graph is acyclic.
    ///
    /// The root sentinel is left out: it has no upstream edges so it can
    /// never be part of a cycle.
    pub fn check_acyclic(&self) -> Result<(), SchedulerError> {
        let mut graph: DiGraphMap<RecordId, ()> = DiGraphMap::new();

        for (idx, rec) in self.records.iter().enumerate().skip(1) {
            let id = RecordId(idx);
            graph.add_node(id);
            for dep in rec.depends_on.iter().filter(|d| **d != RecordId::ROOT) {
                graph.add_edge(*dep, id, ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(SchedulerError::CycleDetected(format!(
                "cycle detected in task graph involving task '{}'",
                self.records[cycle.node_id().0].key
            ))),
        }
    }

    pub(crate) fn record(&self, id: RecordId) -> &TaskRecord<T> {
        &self.records[id.0]
    }

    pub(crate) fn record_mut(&mut self, id: RecordId) -> &mut TaskRecord<T> {
        &mut self.records[id.0]
    }

    pub(crate) fn add_edge(&mut self, upstream: RecordId, downstream: RecordId) {
        self.records[downstream.0].depends_on.insert(upstream);
        self.records[upstream.0].dependents.insert(downstream);
    }

    fn remove_edge(&mut self, upstream: RecordId, downstream: RecordId) {
        self.records[downstream.0].depends_on.remove(&upstream);
        self.records[upstream.0].dependents.remove(&downstream);
    }

    fn push(&mut self, name: &str, work: Work<T>) -> RecordId {
        let id = RecordId(self.records.len());
        self.records.push(TaskRecord::new(name.to_string(), work));
        self.index.insert(name.to_string(), id);
        id
    }

    fn neighbours(
        &self,
        name: &str,
        edges: impl Fn(&TaskRecord<T>) -> &BTreeSet<RecordId>,
    ) -> Vec<&str> {
        let Some(id) = self.find(name) else {
            return Vec::new();
        };
        edges(&self.records[id.0])
            .iter()
            .filter(|other| **other != RecordId::ROOT)
            .map(|other| self.records[other.0].key.as_str())
            .collect()
    }
}

impl<T> Default for GraphStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn validate_task_name(name: &str) -> Result<(), SchedulerError> {
    if name.is_empty() {
        return Err(SchedulerError::InvalidArgument(
            "task name must not be empty".to_string(),
        ));
    }
    if name == ROOT_KEY {
        return Err(SchedulerError::InvalidArgument(format!(
            "task name '{name}' is reserved"
        )));
    }
    Ok(())
}

pub(crate) fn validate_dependency_names(name: &str, deps: &[&str]) -> Result<(), SchedulerError> {
    if deps.iter().any(|dep| dep.is_empty()) {
        return Err(SchedulerError::InvalidArgument(format!(
            "task '{name}' has an empty dependency name"
        )));
    }
    Ok(())
}
