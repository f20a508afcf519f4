// src/exec/command.rs

use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::{debug, info};

use crate::types::{TaskFuture, TaskInputs};

/// Prefix of the environment variables carrying dependency values.
pub const DEP_ENV_PREFIX: &str = "TASKDAG_DEP_";

/// Build a scheduler task that runs `cmd` through the platform shell.
pub fn command_task(
    name: &str,
    cmd: &str,
) -> impl Fn(TaskInputs<String>) -> TaskFuture<String> + Send + Sync + 'static + use<> {
    let name = name.to_string();
    let cmd = cmd.to_string();

    move |inputs: TaskInputs<String>| -> TaskFuture<String> {
        let name = name.clone();
        let cmd = cmd.clone();
        Box::pin(async move { run_command(&name, &cmd, &inputs).await })
    }
}

/// Environment variable name under which a dependency's value is exported:
/// `TASKDAG_DEP_` + the name upper-cased, non-alphanumerics replaced by `_`.
pub fn dep_env_var(dep: &str) -> String {
    let suffix: String = dep
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{DEP_ENV_PREFIX}{suffix}")
}

/// Run a single task command and return its trimmed stdout.
///
/// A non-zero exit status is an error; stderr is logged at debug.
pub async fn run_command(name: &str, cmd: &str, inputs: &TaskInputs<String>) -> Result<String> {
    info!(task = %name, cmd = %cmd, "starting task process");

    // Build a shell command appropriate for the platform.
    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    for (dep, value) in inputs {
        command.env(dep_env_var(dep), value);
    }

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = command
        .output()
        .await
        .with_context(|| format!("spawning process for task '{name}'"))?;

    for line in String::from_utf8_lossy(&output.stderr).lines() {
        debug!(task = %name, "stderr: {}", line);
    }

    let code = output.status.code().unwrap_or(-1);
    info!(
        task = %name,
        exit_code = code,
        success = output.status.success(),
        "task process exited"
    );

    if !output.status.success() {
        bail!("command `{cmd}` exited with status {code}");
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dep_env_var_sanitizes_names() {
        assert_eq!(dep_env_var("fetch"), "TASKDAG_DEP_FETCH");
        assert_eq!(dep_env_var("build-web.v2"), "TASKDAG_DEP_BUILD_WEB_V2");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_trimmed_stdout() {
        let out = run_command("t", "echo hello", &TaskInputs::new()).await.unwrap();
        assert_eq!(out, "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exports_dependency_values() {
        let mut inputs = TaskInputs::new();
        inputs.insert("up-stream".to_string(), "42".to_string());

        let out = run_command("t", "echo got-$TASKDAG_DEP_UP_STREAM", &inputs)
            .await
            .unwrap();
        assert_eq!(out, "got-42");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_an_error() {
        let err = run_command("t", "exit 3", &TaskInputs::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("status 3"));
    }
}
