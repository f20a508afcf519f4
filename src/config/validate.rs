// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::dag::ROOT_KEY;
use crate::errors::{Result, TaskdagError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TaskdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_tasks(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(TaskdagError::ConfigError(
            "task file must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if name.is_empty() || name == ROOT_KEY {
            return Err(TaskdagError::ConfigError(format!(
                "invalid task name '{name}'"
            )));
        }
        if task.cmd.trim().is_empty() {
            return Err(TaskdagError::ConfigError(format!(
                "task '{name}' has an empty `cmd`"
            )));
        }
        for dep in task.after.iter() {
            if dep.is_empty() {
                return Err(TaskdagError::ConfigError(format!(
                    "task '{name}' has an empty entry in `after`"
                )));
            }
            if dep == name {
                return Err(TaskdagError::ConfigError(format!(
                    "task '{name}' cannot depend on itself in `after`"
                )));
            }
        }
    }
    Ok(())
}
