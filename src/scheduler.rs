// src/scheduler.rs

//! Public entry point: [`TaskScheduler`].
//!
//! Usage follows one sequence: register tasks with [`TaskScheduler::add_task`]
//! in any order, call [`TaskScheduler::start`] once, then optionally add more
//! work with [`TaskScheduler::append_task`].
//!
//! ```no_run
//! # async fn demo() -> Result<(), taskdag::SchedulerError> {
//! use taskdag::TaskScheduler;
//!
//! let mut scheduler = TaskScheduler::<String>::new();
//! // `task2` may be registered before `task1` exists.
//! scheduler.add_task("task2", |inputs| async move {
//!     Ok(format!("{}+R2", inputs["task1"]))
//! }, &["task1"])?;
//! scheduler.add_task("task1", |_| async { Ok("R1".to_string()) }, &[])?;
//!
//! let results = scheduler.start()?.await?;
//! assert_eq!(results["task2"], "R1+R2");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::future::Future;

use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::dag::graph::GraphStore;
use crate::engine::TaskResults;
use crate::engine::{executor, late_binder};
use crate::errors::SchedulerError;
use crate::types::{Phase, TaskInputs, UnresolvedPolicy, task_fn};

/// Tunables for a [`TaskScheduler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// What `start()` does about dependency names that were never registered.
    pub on_unresolved: UnresolvedPolicy,
}

enum State<T> {
    Building,
    Started {
        handle: Handle,
        /// The aggregate callers currently observe; re-pointed by every
        /// `append_task`.
        results: TaskResults<T>,
    },
}

/// Dependency-graph task scheduler.
///
/// Tasks are asynchronous closures receiving the resolved values of their
/// direct dependencies, keyed by dependency name. Independent tasks run
/// concurrently as Tokio tasks; each task runs exactly once.
pub struct TaskScheduler<T> {
    graph: GraphStore<T>,
    options: SchedulerOptions,
    state: State<T>,
}

impl<T> fmt::Debug for TaskScheduler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskScheduler")
            .field("phase", &self.phase())
            .field("tasks", &self.graph.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<T> Default for TaskScheduler<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskScheduler<T> {
    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        match &self.state {
            State::Building => Phase::Building,
            State::Started { results, .. } if results.is_settled() => Phase::Done,
            State::Started { .. } => Phase::Running,
        }
    }

    /// Read-only view of the registered graph.
    pub fn graph(&self) -> &GraphStore<T> {
        &self.graph
    }

    pub fn options(&self) -> SchedulerOptions {
        self.options
    }

    /// The aggregate result currently observed, once started.
    ///
    /// Each `append_task` replaces it with one that also includes the
    /// appended task.
    pub fn results(&self) -> Option<TaskResults<T>> {
        match &self.state {
            State::Building => None,
            State::Started { results, .. } => Some(results.clone()),
        }
    }
}

impl<T> TaskScheduler<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_options(SchedulerOptions::default())
    }

    pub fn with_options(options: SchedulerOptions) -> Self {
        Self {
            graph: GraphStore::new(),
            options,
            state: State::Building,
        }
    }

    /// Register a task before `start()`.
    ///
    /// Dependencies may name tasks that are registered later. Registering
    /// the same name again replaces its work and adds the new dependencies.
    ///
    /// # Errors
    /// - `AlreadyStarted` once the scheduler has started.
    /// - `InvalidArgument` for an empty or reserved name, or an empty
    ///   dependency name.
    pub fn add_task<F, Fut>(
        &mut self,
        name: &str,
        work: F,
        dependencies: &[&str],
    ) -> Result<(), SchedulerError>
    where
        F: Fn(TaskInputs<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        if matches!(self.state, State::Started { .. }) {
            return Err(SchedulerError::AlreadyStarted);
        }

        self.graph.insert(name, task_fn(work), dependencies)?;
        debug!(task = %name, ?dependencies, "task registered");
        Ok(())
    }

    /// Launch every task and return a handle to the aggregate result.
    ///
    /// Must be called from within a Tokio runtime; tasks run on that
    /// runtime. Validation failures leave the scheduler in
    /// [`Phase::Building`] so the graph can be fixed and `start()` retried.
    ///
    /// # Errors
    /// - `AlreadyStarted` after a successful `start()`.
    /// - `NoRuntime` outside a Tokio runtime.
    /// - `CycleDetected` if the dependencies form a cycle.
    /// - `UnresolvedDependency` if a dependency was never registered and
    ///   the policy is [`UnresolvedPolicy::Fail`].
    pub fn start(&mut self) -> Result<TaskResults<T>, SchedulerError> {
        if matches!(self.state, State::Started { .. }) {
            return Err(SchedulerError::AlreadyStarted);
        }
        let handle = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;

        self.graph.check_acyclic()?;

        let unresolved = self.graph.unresolved();
        match self.options.on_unresolved {
            UnresolvedPolicy::Fail => {
                if let Some((task, dependency)) = unresolved.first() {
                    return Err(SchedulerError::UnresolvedDependency {
                        task: task.to_string(),
                        dependency: dependency.to_string(),
                    });
                }
            }
            UnresolvedPolicy::Skip => {
                for (task, dependency) in unresolved {
                    warn!(task = %task, dependency = %dependency, "dependency never registered; task will be skipped");
                }
            }
        }

        info!(tasks = self.graph.len(), "starting task graph");
        let results = TaskResults::new(executor::launch(&mut self.graph, &handle));
        self.state = State::Started {
            handle,
            results: results.clone(),
        };
        Ok(results)
    }

    /// Register and immediately launch a task after `start()`.
    ///
    /// Dependencies must already be known; unknown names are dropped with a
    /// warning. The task's value is folded into a new aggregate, available
    /// from [`TaskScheduler::results`] (and returned here), that resolves to
    /// the previous aggregate's map plus this task's entry.
    ///
    /// # Errors
    /// - `NotStarted` before `start()`.
    /// - `InvalidArgument` for an invalid name or a name that already
    ///   belongs to a registered task.
    pub fn append_task<F, Fut>(
        &mut self,
        name: &str,
        work: F,
        dependencies: &[&str],
    ) -> Result<TaskResults<T>, SchedulerError>
    where
        F: Fn(TaskInputs<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let State::Started { handle, results } = &mut self.state else {
            return Err(SchedulerError::NotStarted);
        };

        let aggregate = late_binder::append(
            &mut self.graph,
            handle,
            results.completion(),
            name,
            task_fn(work),
            dependencies,
        )?;
        *results = TaskResults::new(aggregate);
        debug!(task = %name, ?dependencies, "task appended");
        Ok(results.clone())
    }
}
