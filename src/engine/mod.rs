// src/engine/mod.rs

//! Execution engine.
//!
//! - [`completion`] holds the single-assignment result cells every record
//!   and the aggregate are built on.
//! - [`executor`] performs the breadth-first launch of the graph on `start`.
//! - [`late_binder`] launches tasks appended after `start` and re-chains the
//!   aggregate.

pub mod completion;
pub(crate) mod executor;
pub(crate) mod late_binder;

use std::future::{Future, IntoFuture};
use std::pin::Pin;

use crate::engine::completion::{Completion, Outcome};
use crate::types::TaskResultMap;

/// Handle to an aggregate result: the name -> value map of every task that
/// was part of it.
///
/// Cheap to clone; can be awaited directly or through [`TaskResults::wait`]
/// any number of times.
#[derive(Debug)]
pub struct TaskResults<T> {
    inner: Completion<TaskResultMap<T>>,
}

impl<T> Clone for TaskResults<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> TaskResults<T> {
    pub(crate) fn new(inner: Completion<TaskResultMap<T>>) -> Self {
        Self { inner }
    }

    pub(crate) fn completion(&self) -> &Completion<TaskResultMap<T>> {
        &self.inner
    }

    /// Whether the aggregate has resolved or failed.
    pub fn is_settled(&self) -> bool {
        self.inner.is_settled()
    }
}

impl<T: Clone> TaskResults<T> {
    pub async fn wait(&self) -> Outcome<TaskResultMap<T>> {
        self.inner.wait().await
    }
}

impl<T> IntoFuture for TaskResults<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = Outcome<TaskResultMap<T>>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.inner.wait().await })
    }
}
