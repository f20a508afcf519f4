// src/types.rs

//! Shared type aliases and small enums used across the crate.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// Resolved values of a task's direct dependencies, keyed by dependency name.
///
/// Empty when the task declared no dependencies.
pub type TaskInputs<T> = HashMap<TaskName, T>;

/// Aggregate result: one entry per launched real task.
pub type TaskResultMap<T> = HashMap<TaskName, T>;

/// Future returned by a task's work.
pub type TaskFuture<T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'static>>;

/// A unit of asynchronous work: dependency values in, a future of a value out.
pub type TaskFn<T> = Arc<dyn Fn(TaskInputs<T>) -> TaskFuture<T> + Send + Sync>;

/// Box a plain closure returning any `Send` future into a [`TaskFn`].
pub fn task_fn<T, F, Fut>(work: F) -> TaskFn<T>
where
    F: Fn(TaskInputs<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
{
    Arc::new(move |inputs: TaskInputs<T>| -> TaskFuture<T> { Box::pin(work(inputs)) })
}

/// What `start()` does about dependency names that were never registered.
///
/// - `Fail`: refuse to start and report the first dangling dependency
///   (default behaviour).
/// - `Skip`: start anyway; every task that (transitively) waits on a
///   never-registered name simply never runs and is left out of the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    Fail,
    Skip,
}

impl Default for UnresolvedPolicy {
    fn default() -> Self {
        UnresolvedPolicy::Fail
    }
}

impl FromStr for UnresolvedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail" => Ok(UnresolvedPolicy::Fail),
            "skip" => Ok(UnresolvedPolicy::Skip),
            other => Err(format!(
                "invalid on_unresolved: {other} (expected \"fail\" or \"skip\")"
            )),
        }
    }
}

/// Lifecycle of a scheduler instance.
///
/// `Building -> Running` happens once, on a successful `start()`. `Done` is
/// observed (not stored) once the current aggregate result has settled; an
/// `append_task` moves a `Done` scheduler back to `Running` until the new
/// aggregate settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Building,
    Running,
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_policy_parses_case_insensitively() {
        assert_eq!("fail".parse::<UnresolvedPolicy>(), Ok(UnresolvedPolicy::Fail));
        assert_eq!(" Skip ".parse::<UnresolvedPolicy>(), Ok(UnresolvedPolicy::Skip));
        assert!("ignore".parse::<UnresolvedPolicy>().is_err());
    }

    #[test]
    fn unresolved_policy_defaults_to_fail() {
        assert_eq!(UnresolvedPolicy::default(), UnresolvedPolicy::Fail);
    }

    #[tokio::test]
    async fn task_fn_boxes_closure() {
        let work: TaskFn<u32> = task_fn(|inputs: TaskInputs<u32>| async move {
            Ok(inputs.values().sum::<u32>() + 1)
        });

        let mut inputs = TaskInputs::new();
        inputs.insert("a".to_string(), 2);
        inputs.insert("b".to_string(), 3);

        assert_eq!(work(inputs).await.unwrap(), 6);
    }
}
