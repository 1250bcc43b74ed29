//! Store Module - result history
//!
//! Key types:
//! - `ResultLog`: append-only `(task, outputs)` history
//! - `ResultSource`: last-entry access used by input resolution
//! - `Outputs`: key → value map produced by a task

mod result_log;

// Re-export all public types
pub use result_log::{LogEntry, Outputs, ResultLog, ResultSource};
