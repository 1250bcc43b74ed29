//! Event Module - audit trail for chain runs
//!
//! - `log`: `EventLog` (append-only, thread-safe) and `EventKind`

mod log;

pub use log::{Event, EventKind, EventLog};
