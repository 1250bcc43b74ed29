//! Runtime Module - chain execution
//!
//! Contains the runtime execution components:
//! - `step`: the `Step` trait plus emit/rename task kinds
//! - `exec`: shell-command task kind
//! - `runner`: sequential execution with reverse-order rollback
//!
//! This module represents the "how" - runtime execution.
//! For static structure, see the `ast` module.

mod exec;
mod runner;
mod step;

// Re-export public types
pub use exec::ExecTask;
pub use runner::{RunReport, Runner};
pub use step::{EmitTask, RenameTask, Step};
