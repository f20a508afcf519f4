// src/dag/record.rs

//! Task records stored in the graph arena.

use std::collections::BTreeSet;
use std::fmt;

use crate::engine::completion::Completion;
use crate::types::{TaskFn, TaskName};

/// Stable handle of a record inside the graph arena.
///
/// Edges are stored as sets of handles, so replacing a record's contents
/// (placeholder promotion) never invalidates an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(pub(crate) usize);

impl RecordId {
    /// The synthetic root every dependency-free task hangs off.
    pub const ROOT: RecordId = RecordId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// The work attached to a record.
#[derive(Clone)]
pub enum Work<T> {
    /// No-op: the root sentinel and forward-reference placeholders.
    Noop,
    Task(TaskFn<T>),
}

impl<T> fmt::Debug for Work<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Work::Noop => f.write_str("Noop"),
            Work::Task(_) => f.write_str("Task(..)"),
        }
    }
}

/// One node of the dependency graph.
#[derive(Debug)]
pub struct TaskRecord<T> {
    pub(crate) key: TaskName,
    pub(crate) work: Work<T>,
    /// Write-once; `None` means "not launched yet".
    pub(crate) result: Option<Completion<T>>,
    /// Upstream records this one waits for.
    pub(crate) depends_on: BTreeSet<RecordId>,
    /// Downstream records waiting on this one.
    pub(crate) dependents: BTreeSet<RecordId>,
}

impl<T> TaskRecord<T> {
    pub(crate) fn new(key: TaskName, work: Work<T>) -> Self {
        Self {
            key,
            work,
            result: None,
            depends_on: BTreeSet::new(),
            dependents: BTreeSet::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// A forward reference that no real task has claimed yet.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.work, Work::Noop)
    }

    pub fn is_launched(&self) -> bool {
        self.result.is_some()
    }

    pub(crate) fn result(&self) -> Option<&Completion<T>> {
        self.result.as_ref()
    }

    /// Assign the record's result cell.
    ///
    /// # Panics
    /// If the slot was already written. That can only happen if the
    /// traversal visits a record twice, which is an internal defect.
    pub(crate) fn set_result(&mut self, completion: Completion<T>) {
        assert!(
            self.result.is_none(),
            "result of task '{}' assigned twice: dependency graph traversal error",
            self.key
        );
        self.result = Some(completion);
    }
}
