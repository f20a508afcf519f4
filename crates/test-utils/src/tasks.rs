//! Ready-made task closures for scheduler tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use taskdag::types::TaskFuture;
use taskdag::TaskInputs;

/// Resolves to `value`, ignoring its inputs.
pub fn constant<T>(value: T) -> impl Fn(TaskInputs<T>) -> TaskFuture<T> + Send + Sync + 'static
where
    T: Clone + Send + Sync + 'static,
{
    move |_: TaskInputs<T>| -> TaskFuture<T> {
        let value = value.clone();
        Box::pin(async move { Ok(value) })
    }
}

/// Resolves to `value` after sleeping for `delay`.
pub fn delayed<T>(
    value: T,
    delay: Duration,
) -> impl Fn(TaskInputs<T>) -> TaskFuture<T> + Send + Sync + 'static
where
    T: Clone + Send + Sync + 'static,
{
    move |_: TaskInputs<T>| -> TaskFuture<T> {
        let value = value.clone();
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            Ok(value)
        })
    }
}

/// Always fails with `message`, optionally after `delay`.
pub fn failing<T>(
    message: &'static str,
    delay: Duration,
) -> impl Fn(TaskInputs<T>) -> TaskFuture<T> + Send + Sync + 'static
where
    T: Send + 'static,
{
    move |_: TaskInputs<T>| -> TaskFuture<T> {
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Err(anyhow::anyhow!(message))
        })
    }
}

/// Deterministic "echo" task: its value describes its name and its inputs,
/// e.g. `c(a=a(),b=b())`. Useful for comparing runs of the same graph.
pub fn echo(
    name: &str,
) -> impl Fn(TaskInputs<String>) -> TaskFuture<String> + Send + Sync + 'static + use<> {
    let name = name.to_string();
    move |inputs: TaskInputs<String>| -> TaskFuture<String> {
        let sorted: BTreeMap<String, String> = inputs.into_iter().collect();
        let args: Vec<String> = sorted.iter().map(|(k, v)| format!("{k}={v}")).collect();
        let value = format!("{}({})", name, args.join(","));
        Box::pin(async move { Ok(value) })
    }
}

/// Records every invocation (task name + sorted inputs) in call order.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<(String, BTreeMap<String, String>)>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A task that logs its call and resolves to `value`.
    pub fn task(
        &self,
        name: &str,
        value: &str,
    ) -> impl Fn(TaskInputs<String>) -> TaskFuture<String> + Send + Sync + 'static + use<> {
        self.task_with_delay(name, value, Duration::ZERO)
    }

    /// Like [`CallLog::task`] but sleeps for `delay` before resolving.
    pub fn task_with_delay(
        &self,
        name: &str,
        value: &str,
        delay: Duration,
    ) -> impl Fn(TaskInputs<String>) -> TaskFuture<String> + Send + Sync + 'static + use<> {
        let calls = Arc::clone(&self.calls);
        let name = name.to_string();
        let value = value.to_string();
        move |inputs: TaskInputs<String>| -> TaskFuture<String> {
            calls
                .lock()
                .unwrap()
                .push((name.clone(), inputs.into_iter().collect()));
            let value = value.clone();
            Box::pin(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(value)
            })
        }
    }

    /// All recorded calls, in call order.
    pub fn calls(&self) -> Vec<(String, BTreeMap<String, String>)> {
        self.calls.lock().unwrap().clone()
    }

    /// Names in call order.
    pub fn order(&self) -> Vec<String> {
        self.calls().into_iter().map(|(name, _)| name).collect()
    }

    /// How many times `name` was invoked.
    pub fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|(n, _)| n == name).count()
    }

    /// Inputs of the first call to `name`.
    pub fn inputs_of(&self, name: &str) -> Option<BTreeMap<String, String>> {
        self.calls()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, inputs)| inputs)
    }
}
