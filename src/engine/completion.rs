// src/engine/completion.rs

//! Single-assignment result cells.
//!
//! A [`Completion`] is the read side: cheap to clone, any number of readers
//! can `wait()` on it. The paired [`Resolver`] is the write side and is
//! consumed by `resolve`, so a cell can only ever be written once. Both are
//! thin wrappers over a `tokio::sync::watch` channel holding
//! `Option<outcome>`.
//!
//! If the resolver is dropped without resolving (e.g. the task panicked),
//! readers get [`SchedulerError::TaskAborted`] instead of hanging.

use std::collections::HashMap;
use std::fmt;

use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::errors::SchedulerError;
use crate::types::TaskName;

/// Outcome stored in a cell.
pub type Outcome<V> = Result<V, SchedulerError>;

/// Create an empty cell labelled with the task it belongs to.
pub fn completion<V>(label: impl Into<TaskName>) -> (Resolver<V>, Completion<V>) {
    let (tx, rx) = watch::channel(None);
    let label = label.into();
    (
        Resolver { tx },
        Completion { label, rx },
    )
}

/// Write side of a cell.
pub struct Resolver<V> {
    tx: watch::Sender<Option<Outcome<V>>>,
}

impl<V> Resolver<V> {
    pub fn resolve(self, outcome: Outcome<V>) {
        // Receivers may all be gone already; the value is still stored.
        self.tx.send_replace(Some(outcome));
    }
}

/// Read side of a cell.
pub struct Completion<V> {
    label: TaskName,
    rx: watch::Receiver<Option<Outcome<V>>>,
}

impl<V> Clone for Completion<V> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            rx: self.rx.clone(),
        }
    }
}

impl<V> fmt::Debug for Completion<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("label", &self.label)
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl<V: Clone> Completion<V> {
    /// Wait until the cell is written and return a copy of the outcome.
    pub async fn wait(&self) -> Outcome<V> {
        let mut rx = self.rx.clone();
        match rx.wait_for(Option::is_some).await {
            Ok(slot) => match &*slot {
                Some(outcome) => outcome.clone(),
                None => Err(self.aborted()),
            },
            Err(_closed) => Err(self.aborted()),
        }
    }
}

impl<V> Completion<V> {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the cell holds an outcome (success or failure).
    pub fn is_settled(&self) -> bool {
        self.rx.borrow().is_some()
    }

    fn aborted(&self) -> SchedulerError {
        SchedulerError::TaskAborted {
            task: self.label.clone(),
        }
    }
}

/// Wait for every cell and collect the values keyed by name.
///
/// Fail-fast: returns the first failure in completion order, without waiting
/// for the remaining cells. The underlying tasks keep running; only the
/// waiters are dropped.
pub async fn gather<V>(cells: Vec<(TaskName, Completion<V>)>) -> Outcome<HashMap<TaskName, V>>
where
    V: Clone + Send + Sync + 'static,
{
    let mut out = HashMap::with_capacity(cells.len());
    let mut waiters = JoinSet::new();

    for (name, cell) in cells {
        waiters.spawn(async move { cell.wait().await.map(|value| (name, value)) });
    }

    while let Some(joined) = waiters.join_next().await {
        let (name, value) = match joined {
            Ok(outcome) => outcome?,
            Err(join_err) => {
                return Err(SchedulerError::task_failure(
                    "<gather>",
                    anyhow::Error::new(join_err),
                ));
            }
        };
        out.insert(name, value);
    }

    Ok(out)
}
