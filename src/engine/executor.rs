// src/engine/executor.rs

//! Breadth-first launch of the task graph.
//!
//! Starting from the root, each dequeued record gets its result cell: a
//! Tokio task that waits for the record's dependency cells, assembles them
//! into a name -> value map and runs the record's work. After a record is
//! launched, each of its dependents is checked; a dependent is enqueued once
//! *all* of its dependencies have a cell. Because a record only enters the
//! queue after its last dependency was launched, every record is visited
//! exactly once and always after its dependencies.
//!
//! Placeholders are never launched, so anything waiting on one never
//! becomes ready.

use std::collections::VecDeque;

use tokio::runtime::Handle;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::dag::graph::GraphStore;
use crate::dag::record::{RecordId, Work};
use crate::engine::completion::{Completion, Outcome, completion, gather};
use crate::errors::SchedulerError;
use crate::types::{TaskFn, TaskName, TaskResultMap};

/// Label of the aggregate result cell.
pub(crate) const AGGREGATE_LABEL: &str = "<aggregate>";

pub(crate) type Inputs<T> = Vec<(TaskName, Completion<T>)>;

/// Launch every ready record and return the aggregate result cell.
///
/// The aggregate resolves to one entry per launched real task, or to the
/// first failure observed.
pub(crate) fn launch<T>(graph: &mut GraphStore<T>, handle: &Handle) -> Completion<TaskResultMap<T>>
where
    T: Clone + Send + Sync + 'static,
{
    let mut queue: VecDeque<(RecordId, Inputs<T>)> = VecDeque::new();
    let mut launched: Inputs<T> = Vec::new();

    // The root resolves immediately: it has no work and contributes no input.
    queue.push_back((RecordId::ROOT, Vec::new()));

    while let Some((id, inputs)) = queue.pop_front() {
        if id != RecordId::ROOT {
            let rec = graph.record(id);
            let work = match &rec.work {
                Work::Task(work) => work.clone(),
                Work::Noop => {
                    debug!(task = %rec.key, "placeholder never registered; not launching");
                    continue;
                }
            };
            let key = rec.key.clone();
            let cell = spawn_task(handle, key.clone(), work, inputs);
            graph.record_mut(id).set_result(cell.clone());
            launched.push((key, cell));
        }

        for &next in &graph.record(id).dependents {
            if let Some(inputs) = ready_inputs(graph, next) {
                queue.push_back((next, inputs));
            }
        }
    }

    let skipped: Vec<&str> = graph
        .task_names()
        .filter(|name| {
            graph
                .find(name)
                .map(|id| !graph.record(id).is_launched())
                .unwrap_or(false)
        })
        .collect();
    if !skipped.is_empty() {
        warn!(?skipped, "tasks waiting on unregistered dependencies will not run");
    }

    info!(tasks = launched.len(), "launched task graph");
    spawn_aggregate(handle, launched)
}

/// Dependency cells of `id`, or `None` if some dependency has not been
/// launched yet. The root counts as resolved and contributes nothing.
pub(crate) fn ready_inputs<T>(graph: &GraphStore<T>, id: RecordId) -> Option<Inputs<T>> {
    let mut inputs = Vec::new();
    for &dep in &graph.record(id).depends_on {
        if dep == RecordId::ROOT {
            continue;
        }
        let rec = graph.record(dep);
        inputs.push((rec.key.clone(), rec.result()?.clone()));
    }
    Some(inputs)
}

/// Run one task's work on the runtime once its inputs resolve.
pub(crate) fn spawn_task<T>(
    handle: &Handle,
    name: TaskName,
    work: TaskFn<T>,
    inputs: Inputs<T>,
) -> Completion<T>
where
    T: Clone + Send + Sync + 'static,
{
    let (resolver, cell) = completion(name.clone());
    let span = info_span!("task", task = %name);

    handle.spawn(
        async move {
            let outcome = run_task(&name, work, inputs).await;
            resolver.resolve(outcome);
        }
        .instrument(span),
    );

    cell
}

async fn run_task<T>(name: &str, work: TaskFn<T>, inputs: Inputs<T>) -> Outcome<T>
where
    T: Clone + Send + Sync + 'static,
{
    // A failed dependency is passed on unchanged, so every reader sees the
    // task that actually failed.
    let values = gather(inputs).await?;
    debug!(inputs = values.len(), "dependencies resolved; running task");

    match work(values).await {
        Ok(value) => {
            info!("task finished");
            Ok(value)
        }
        Err(err) => {
            let message = format!("{err:#}");
            warn!(error = %message, "task failed");
            Err(SchedulerError::task_failure(name, err))
        }
    }
}

fn spawn_aggregate<T>(handle: &Handle, launched: Inputs<T>) -> Completion<TaskResultMap<T>>
where
    T: Clone + Send + Sync + 'static,
{
    let (resolver, aggregate) = completion(AGGREGATE_LABEL);

    handle.spawn(async move {
        let outcome = gather(launched).await;
        match &outcome {
            Ok(results) => info!(tasks = results.len(), "all tasks finished"),
            Err(err) => warn!(error = %err, "task graph failed"),
        }
        resolver.resolve(outcome);
    });

    aggregate
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::types::{TaskInputs, task_fn};

    fn constant(value: &'static str) -> TaskFn<String> {
        task_fn(move |_| async move { Ok(value.to_string()) })
    }

    #[tokio::test]
    async fn launches_each_record_once_in_dependency_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = {
            let calls = Arc::clone(&calls);
            task_fn(move |inputs: TaskInputs<String>| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let mut keys: Vec<_> = inputs.keys().cloned().collect();
                    keys.sort();
                    Ok(format!("d({})", keys.join(",")))
                }
            })
        };

        let mut graph = GraphStore::new();
        graph.insert("d", counted, &["b", "c"]).unwrap();
        graph.insert("b", constant("B"), &["a"]).unwrap();
        graph.insert("c", constant("C"), &["a"]).unwrap();
        graph.insert("a", constant("A"), &[]).unwrap();

        let aggregate = launch(&mut graph, &Handle::current());
        let results = aggregate.wait().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(results.len(), 4);
        assert_eq!(results["d"], "d(b,c)");
        for name in ["a", "b", "c", "d"] {
            let id = graph.find(name).unwrap();
            assert!(graph.record(id).is_launched(), "{name} should be launched");
        }
    }

    #[tokio::test]
    async fn placeholder_branch_is_not_launched() {
        let mut graph = GraphStore::new();
        graph.insert("a", constant("A"), &[]).unwrap();
        graph.insert("b", constant("B"), &["missing"]).unwrap();
        graph.insert("c", constant("C"), &["b"]).unwrap();

        let results = launch(&mut graph, &Handle::current()).wait().await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results["a"], "A");
        assert!(!graph.record(graph.find("b").unwrap()).is_launched());
        assert!(!graph.record(graph.find("missing").unwrap()).is_launched());
    }

    #[tokio::test]
    async fn ready_inputs_requires_every_dependency_launched() {
        let mut graph = GraphStore::new();
        graph.insert("a", constant("A"), &[]).unwrap();
        let b = graph.insert("b", constant("B"), &["a"]).unwrap();
        let a = graph.find("a").unwrap();

        assert!(ready_inputs(&graph, a).unwrap().is_empty());
        assert!(ready_inputs(&graph, b).is_none());
    }
}
