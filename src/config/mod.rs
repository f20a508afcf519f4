// src/config/mod.rs

//! Task file loading and validation for the `taskdag` binary.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a task file from disk (`loader.rs`).
//! - Validate basic invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, parse_str};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
