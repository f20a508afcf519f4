// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::UnresolvedPolicy;

/// Task file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// on_unresolved = "fail"
///
/// [task.fetch]
/// cmd = "echo data"
///
/// [task.build]
/// cmd = "echo built-from-$TASKDAG_DEP_FETCH"
/// after = ["fetch"]
/// ```
///
/// All sections are optional at this stage; validation enforces that at
/// least one task exists.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// A validated task file. Build one with `ConfigFile::try_from(raw)` or
/// [`crate::config::load_and_validate`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    /// Wrap already-validated sections.
    pub(crate) fn new_unchecked(config: ConfigSection, task: BTreeMap<String, TaskConfig>) -> Self {
        Self { config, task }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigSection {
    /// `"fail"` (default) or `"skip"`.
    ///
    /// - `"fail"`: refuse to run if an `after` entry names a task that does
    ///   not exist.
    /// - `"skip"`: run everything else; tasks waiting on a missing task
    ///   never run.
    #[serde(default)]
    pub on_unresolved: UnresolvedPolicy,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Shell command to execute. Its trimmed stdout becomes the task's value.
    pub cmd: String,

    /// Dependency list: this task waits for all tasks listed here and sees
    /// their values as `TASKDAG_DEP_<NAME>` environment variables.
    #[serde(default)]
    pub after: Vec<String>,
}
