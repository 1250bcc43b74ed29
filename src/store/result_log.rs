//! ResultLog - append-only record of produced task outputs
//!
//! Entries are `(task, outputs)` pairs in completion order. Input resolution
//! only ever looks at the last entry, through [`ResultSource`].
//! Uses parking_lot::RwLock so concurrent readers never block each other.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::chain::Task;

/// Key → value outputs of one task (also the shape of resolved inputs)
pub type Outputs = Map<String, Value>;

/// One completed task and what it produced
pub struct LogEntry<T: ?Sized = dyn Task> {
    pub task: Arc<T>,
    /// Arc for O(1) cloning when handed to readers
    pub outputs: Arc<Outputs>,
}

impl<T: ?Sized> LogEntry<T> {
    pub fn new(task: Arc<T>, outputs: Outputs) -> Self {
        Self {
            task,
            outputs: Arc::new(outputs),
        }
    }
}

impl<T: ?Sized> Clone for LogEntry<T> {
    fn clone(&self) -> Self {
        Self {
            task: Arc::clone(&self.task),
            outputs: Arc::clone(&self.outputs),
        }
    }
}

impl<T: Task + ?Sized> fmt::Debug for LogEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogEntry")
            .field("task", &self.task.name())
            .field("outputs", &self.outputs)
            .finish()
    }
}

/// Read access to the most recent entry of a result history
pub trait ResultSource {
    /// Outputs of the last appended entry, if any
    fn last_outputs(&self) -> Option<Arc<Outputs>>;
}

impl<T: ?Sized> ResultSource for [LogEntry<T>] {
    fn last_outputs(&self) -> Option<Arc<Outputs>> {
        self.last().map(|entry| Arc::clone(&entry.outputs))
    }
}

impl<T: ?Sized> ResultSource for Vec<LogEntry<T>> {
    fn last_outputs(&self) -> Option<Arc<Outputs>> {
        self.as_slice().last_outputs()
    }
}

/// Thread-safe, append-only result log
pub struct ResultLog<T: ?Sized = dyn Task> {
    entries: Arc<RwLock<Vec<LogEntry<T>>>>,
}

impl<T: ?Sized> ResultLog<T> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Append a task's outputs (returns the entry index)
    pub fn append(&self, task: Arc<T>, outputs: Outputs) -> usize {
        let mut entries = self.entries.write();
        entries.push(LogEntry::new(task, outputs));
        entries.len() - 1
    }

    /// Most recent entry
    pub fn last(&self) -> Option<LogEntry<T>> {
        self.entries.read().last().cloned()
    }

    /// Snapshot of all entries in append order
    pub fn entries(&self) -> Vec<LogEntry<T>> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized> ResultSource for ResultLog<T> {
    fn last_outputs(&self) -> Option<Arc<Outputs>> {
        self.entries
            .read()
            .last()
            .map(|entry| Arc::clone(&entry.outputs))
    }
}

impl<T: ?Sized> Clone for ResultLog<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T: ?Sized> Default for ResultLog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for ResultLog<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultLog")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::StaticTask;
    use serde_json::json;

    fn outputs(value: Value) -> Outputs {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_log_has_no_last_outputs() {
        let log: ResultLog = ResultLog::new();
        assert!(log.is_empty());
        assert!(log.last_outputs().is_none());
        assert!(log.last().is_none());
    }

    #[test]
    fn append_tracks_last_entry() {
        let log: ResultLog = ResultLog::new();
        let a: Arc<dyn Task> = Arc::new(StaticTask::new("a"));
        let b: Arc<dyn Task> = Arc::new(StaticTask::new("b"));

        assert_eq!(log.append(a, outputs(json!({"x": 5}))), 0);
        assert_eq!(log.append(b, outputs(json!({"y": 9}))), 1);

        let last = log.last().unwrap();
        assert_eq!(last.task.name(), "b");
        assert_eq!(log.last_outputs().unwrap()["y"], 9);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn clones_share_entries() {
        let log: ResultLog = ResultLog::new();
        let reader = log.clone();
        log.append(Arc::new(StaticTask::new("a")), Outputs::new());
        assert_eq!(reader.len(), 1);
    }

    #[test]
    fn vec_of_entries_is_a_source() {
        let entries: Vec<LogEntry> = vec![LogEntry::<dyn Task>::new(
            Arc::new(StaticTask::new("a")),
            outputs(json!({"k": "v"})),
        )];
        assert_eq!(entries.last_outputs().unwrap()["k"], "v");
        assert!(Vec::<LogEntry>::new().last_outputs().is_none());
    }
}
