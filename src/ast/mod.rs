//! AST Module - YAML chain definitions
//!
//! Contains parsed Rust types from YAML chain files:
//! - `chain`: ChainFile, TaskDef, task id validation
//! - `action`: TaskAction, ExecParams
//!
//! These types represent the "what" - static structure parsed from YAML.
//! For runtime execution, see the `runtime` module.

mod action;
mod chain;

// Re-export all public types
pub use action::{ExecParams, TaskAction};
pub use chain::{validate_task_id, ChainFile, TaskDef, SCHEMA_V01};
