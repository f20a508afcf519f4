// src/lib.rs

//! Dependency-graph task scheduler.
//!
//! Register named asynchronous tasks, each optionally depending on other
//! tasks by name (registered before *or after* it), then `start()`: every
//! task runs exactly once, as soon as all of its dependencies have produced
//! a value, and receives those values keyed by dependency name. Independent
//! tasks run concurrently on the Tokio runtime. More tasks can be appended
//! after start; their results are folded into the aggregate.
//!
//! The `taskdag` binary wraps the scheduler around a TOML task file of shell
//! commands.

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod scheduler;
pub mod types;

pub use engine::TaskResults;
pub use errors::{SchedulerError, TaskdagError};
pub use scheduler::{SchedulerOptions, TaskScheduler};
pub use types::{Phase, TaskFn, TaskInputs, TaskResultMap, UnresolvedPolicy};

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::exec::command_task;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - task file loading
/// - scheduler construction (CLI policy override wins over the file)
/// - execution and result printing
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)
        .with_context(|| format!("loading task file '{}'", args.config))?;

    let options = SchedulerOptions {
        on_unresolved: args.on_unresolved.unwrap_or(cfg.config.on_unresolved),
    };
    let scheduler = build_scheduler(&cfg, options)?;

    if args.dry_run {
        print_dry_run(&scheduler);
        return Ok(());
    }

    let results = run_scheduler(scheduler).await?;
    for (name, value) in results {
        println!("{name}: {value}");
    }
    Ok(())
}

/// Register every `[task.<name>]` of `cfg` as a shell-command task.
pub fn build_scheduler(
    cfg: &ConfigFile,
    options: SchedulerOptions,
) -> std::result::Result<TaskScheduler<String>, SchedulerError> {
    let mut scheduler = TaskScheduler::with_options(options);

    for (name, task) in cfg.task.iter() {
        let after: Vec<&str> = task.after.iter().map(String::as_str).collect();
        scheduler.add_task(name, command_task(name, &task.cmd), &after)?;
    }

    info!(tasks = scheduler.graph().len(), "task file registered");
    Ok(scheduler)
}

/// Start `scheduler` and wait for all results, sorted by task name.
pub async fn run_scheduler(
    mut scheduler: TaskScheduler<String>,
) -> std::result::Result<BTreeMap<String, String>, SchedulerError> {
    let results = scheduler.start()?.await?;
    Ok(results.into_iter().collect())
}

/// Simple dry-run output: print tasks and their dependencies.
fn print_dry_run(scheduler: &TaskScheduler<String>) {
    let graph = scheduler.graph();

    println!("taskdag dry-run");
    println!("  on_unresolved = {:?}", scheduler.options().on_unresolved);
    println!();

    println!("tasks ({}):", graph.len());
    for name in graph.task_names() {
        println!("  - {name}");
        let deps = graph.dependencies_of(name);
        if !deps.is_empty() {
            println!("      after: {:?}", deps);
        }
    }

    let unresolved = graph.unresolved();
    if !unresolved.is_empty() {
        println!();
        println!("unresolved:");
        for (task, dep) in unresolved {
            println!("  - {task} -> {dep}");
        }
    }

    debug!("dry-run complete (no execution)");
}
