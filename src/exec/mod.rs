// src/exec/mod.rs

//! Process execution layer for the `taskdag` binary.
//!
//! [`command`] turns a shell command into a scheduler task: dependency
//! values go in as environment variables, trimmed stdout comes out as the
//! task's value.

pub mod command;

pub use command::{command_task, dep_env_var, run_command};
