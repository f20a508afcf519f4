// src/dag/mod.rs

//! Graph representation.
//!
//! - [`record`] defines the arena handle and the per-task record.
//! - [`graph`] holds the arena, the name index and the insertion algorithm
//!   (placeholders for forward references, in-place merge when the real
//!   task is registered), plus the pre-start checks.

pub mod graph;
pub mod record;

pub use graph::{GraphStore, ROOT_KEY};
pub use record::{RecordId, TaskRecord};
