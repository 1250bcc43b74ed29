//! LinearChain - adjacency-checked sequential composition
//!
//! Each task's requires must be covered by the provides of the task right
//! before it (or be empty for the first task). The check runs once, at
//! `add()` time. At execution time only the last result entry is consulted
//! when resolving inputs, so a value produced two steps back is invisible
//! unless every task in between re-provides it.

use std::fmt;
use std::sync::Arc;

use serde_json::Map;
use tracing::{debug, warn};

use super::keys::{canonicalize, KeySet};
use super::task::Task;
use crate::store::{Outputs, ResultSource};

/// Raised by [`LinearChain::add`] when the predecessor does not provide
/// everything the candidate task requires
pub struct ContractViolation<T: ?Sized = dyn Task> {
    /// Required keys the predecessor does not provide
    pub missing: KeySet,
    /// The task that was being added
    pub consumer: Arc<T>,
    /// The current tail of the chain, `None` if the chain was empty
    pub producer: Option<Arc<T>>,
}

impl<T: Task + ?Sized> fmt::Display for ContractViolation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.producer {
            Some(producer) => write!(
                f,
                "task '{}' does not provide {} needed by '{}'",
                producer.name(),
                self.missing,
                self.consumer.name()
            ),
            None => write!(
                f,
                "no previous task provides {} needed by '{}'",
                self.missing,
                self.consumer.name()
            ),
        }
    }
}

impl<T: Task + ?Sized> fmt::Debug for ContractViolation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractViolation")
            .field("missing", &self.missing)
            .field("consumer", &self.consumer.name())
            .field("producer", &self.producer.as_ref().map(|p| p.name()))
            .finish()
    }
}

impl<T: Task + ?Sized> std::error::Error for ContractViolation<T> {}

/// Pick out of the last result entry the keys `task` requires
///
/// Keys missing from that entry are silently left out. An empty source
/// yields an empty map. Earlier entries are never looked at.
pub fn resolve_inputs<T, S>(task: &T, results: &S) -> Outputs
where
    T: Task + ?Sized,
    S: ResultSource + ?Sized,
{
    let Some(last) = results.last_outputs() else {
        return Map::new();
    };

    canonicalize(task.declared_requires())
        .iter()
        .filter_map(|key| {
            last.get(&**key)
                .map(|value| (key.to_string(), value.clone()))
        })
        .collect()
}

/// Ordered chain of tasks under construction
pub struct LinearChain<T: ?Sized = dyn Task> {
    name: Arc<str>,
    tasks: Vec<Arc<T>>,
}

impl<T: Task + ?Sized> LinearChain<T> {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validate `task` against the current tail and append it
    ///
    /// Adding the same task twice is not detected.
    pub fn add(&mut self, task: Arc<T>) -> Result<(), ContractViolation<T>> {
        let requires = canonicalize(task.declared_requires());
        let producer = self.tasks.last().cloned();
        let last_provides = producer
            .as_ref()
            .map(|p| canonicalize(p.declared_provides()))
            .unwrap_or_default();

        let missing = requires.difference(&last_provides);
        if !missing.is_empty() {
            warn!(
                chain = %self.name,
                task = task.name(),
                producer = producer.as_ref().map(|p| p.name()),
                missing = %missing,
                "contract violation"
            );
            return Err(ContractViolation {
                missing,
                consumer: task,
                producer,
            });
        }

        debug!(
            chain = %self.name,
            task = task.name(),
            position = self.tasks.len(),
            "task added"
        );
        self.tasks.push(task);
        Ok(())
    }

    /// Copy of the tasks in execution order (rollback runs it backwards)
    pub fn order(&self) -> Vec<Arc<T>> {
        self.tasks.clone()
    }

    /// See [`resolve_inputs`]
    pub fn resolve_inputs<S: ResultSource + ?Sized>(&self, task: &T, results: &S) -> Outputs {
        resolve_inputs(task, results)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tail of the chain (the producer the next `add` validates against)
    pub fn last(&self) -> Option<&Arc<T>> {
        self.tasks.last()
    }

    /// End the build phase
    pub fn freeze(self) -> FrozenChain<T> {
        FrozenChain {
            name: self.name,
            tasks: Arc::from(self.tasks),
        }
    }
}

impl<T: Task + ?Sized> fmt::Debug for LinearChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinearChain")
            .field("name", &self.name)
            .field(
                "tasks",
                &self.tasks.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// A chain whose build phase is over
///
/// Has no `add`; cheap to clone and safe to share between readers.
pub struct FrozenChain<T: ?Sized = dyn Task> {
    name: Arc<str>,
    tasks: Arc<[Arc<T>]>,
}

impl<T: Task + ?Sized> FrozenChain<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn order(&self) -> Vec<Arc<T>> {
        self.tasks.to_vec()
    }

    pub fn resolve_inputs<S: ResultSource + ?Sized>(&self, task: &T, results: &S) -> Outputs {
        resolve_inputs(task, results)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.tasks.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<T>> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<T: ?Sized> Clone for FrozenChain<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            tasks: Arc::clone(&self.tasks),
        }
    }
}

impl<T: Task + ?Sized> fmt::Debug for FrozenChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrozenChain")
            .field("name", &self.name)
            .field("len", &self.tasks.len())
            .finish()
    }
}
