// src/errors.rs

//! Crate-wide error types.
//!
//! - [`SchedulerError`] is what the scheduler reports, both synchronously
//!   (argument / lifecycle problems) and through result cells (task
//!   failures). It is `Clone` because one failure may be observed by many
//!   readers: every dependent and the aggregate.
//! - [`TaskdagError`] is the application-level error used by config loading
//!   and the CLI.

use std::sync::Arc;

use thiserror::Error;

use crate::types::TaskName;

#[derive(Error, Debug, Clone)]
pub enum SchedulerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("scheduler has already been started")]
    AlreadyStarted,

    #[error("scheduler has not been started yet")]
    NotStarted,

    #[error("task '{task}' failed: {error:#}")]
    TaskFailure {
        task: TaskName,
        error: Arc<anyhow::Error>,
    },

    #[error("task '{task}' was aborted before producing a result")]
    TaskAborted { task: TaskName },

    #[error("task '{task}' depends on '{dependency}', which was never registered")]
    UnresolvedDependency {
        task: TaskName,
        dependency: TaskName,
    },

    #[error("Cycle detected in task graph: {0}")]
    CycleDetected(String),

    #[error("start() must be called from within a Tokio runtime")]
    NoRuntime,
}

impl SchedulerError {
    pub(crate) fn task_failure(task: impl Into<TaskName>, error: anyhow::Error) -> Self {
        SchedulerError::TaskFailure {
            task: task.into(),
            error: Arc::new(error),
        }
    }

    /// Name of the task whose failure this error reports, if any.
    pub fn failed_task(&self) -> Option<&str> {
        match self {
            SchedulerError::TaskFailure { task, .. } | SchedulerError::TaskAborted { task } => {
                Some(task)
            }
            _ => None,
        }
    }

    /// The error returned by the task's own work, for `TaskFailure`.
    pub fn task_error(&self) -> Option<&anyhow::Error> {
        match self {
            SchedulerError::TaskFailure { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum TaskdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TaskdagError>;
