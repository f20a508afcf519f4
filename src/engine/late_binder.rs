// src/engine/late_binder.rs

//! Adding tasks after the graph has been launched.
//!
//! The breadth-first pass is over by then, so an appended task is launched
//! directly: its dependencies are looked up by name among records that
//! already have a result cell, and the aggregate is re-chained so that it
//! also waits for the new task.

use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::dag::graph::{GraphStore, validate_dependency_names, validate_task_name};
use crate::dag::record::RecordId;
use crate::engine::completion::{Completion, completion};
use crate::engine::executor::{AGGREGATE_LABEL, Inputs, spawn_task};
use crate::errors::SchedulerError;
use crate::types::{TaskFn, TaskResultMap};

/// Register and launch `name`, returning the new aggregate cell.
///
/// - A name already held by a real task is rejected; its result is written.
/// - A placeholder with the same name is promoted in place and launched.
/// - Dependencies that are unknown (or never launched) are dropped.
pub(crate) fn append<T>(
    graph: &mut GraphStore<T>,
    handle: &Handle,
    previous: &Completion<TaskResultMap<T>>,
    name: &str,
    work: TaskFn<T>,
    deps: &[&str],
) -> Result<Completion<TaskResultMap<T>>, SchedulerError>
where
    T: Clone + Send + Sync + 'static,
{
    validate_task_name(name)?;
    validate_dependency_names(name, deps)?;

    if let Some(id) = graph.find(name) {
        if !graph.record(id).is_placeholder() {
            return Err(SchedulerError::InvalidArgument(format!(
                "task '{name}' is already registered"
            )));
        }
    }

    let mut located = Vec::with_capacity(deps.len());
    for dep in deps {
        let launched = graph
            .find(dep)
            .map(|id| graph.record(id).is_launched())
            .unwrap_or(false);
        if launched {
            located.push(*dep);
        } else {
            warn!(task = %name, dependency = %dep, "appended task depends on an unknown task; dropping dependency");
        }
    }

    let id = graph.insert(name, work.clone(), &located)?;
    let inputs = launched_inputs(graph, id);
    debug!(task = %name, inputs = inputs.len(), "launching appended task");

    let cell = spawn_task(handle, name.to_string(), work, inputs);
    graph.record_mut(id).set_result(cell.clone());

    let (resolver, aggregate) = completion(AGGREGATE_LABEL);
    let previous = previous.clone();
    let key = name.to_string();

    handle.spawn(async move {
        let outcome = tokio::try_join!(previous.wait(), cell.wait()).map(
            |(mut results, value)| {
                results.insert(key, value);
                results
            },
        );
        resolver.resolve(outcome);
    });

    Ok(aggregate)
}

fn launched_inputs<T>(graph: &GraphStore<T>, id: RecordId) -> Inputs<T> {
    graph
        .record(id)
        .depends_on
        .iter()
        .filter(|dep| **dep != RecordId::ROOT)
        .filter_map(|dep| {
            let rec = graph.record(*dep);
            rec.result().map(|cell| (rec.key.clone(), cell.clone()))
        })
        .collect()
}
