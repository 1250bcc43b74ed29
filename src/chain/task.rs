//! Task capability interface
//!
//! A task is opaque to the chain beyond its name and two declarations.
//! Executable behaviour lives one layer up in [`crate::runtime::Step`].

use std::sync::Arc;

use super::keys::{canonicalize, Declaration, KeySet};

/// A unit of work that declares the keys it needs and the keys it produces
///
/// Declarations may be computed on every call; the chain asks each task at
/// most once per validation.
pub trait Task: Send + Sync {
    /// Human-readable identifier used in errors and logs
    fn name(&self) -> &str;

    /// Input keys this task needs from its predecessor
    fn declared_requires(&self) -> Declaration;

    /// Output keys this task produces for its successor
    fn declared_provides(&self) -> Declaration;
}

/// A task with fixed, pre-canonicalized declarations
///
/// Useful when composing chains in code and for tests; carries no behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticTask {
    name: Arc<str>,
    requires: KeySet,
    provides: KeySet,
}

impl StaticTask {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            requires: KeySet::new(),
            provides: KeySet::new(),
        }
    }

    pub fn requires(mut self, keys: impl Into<Declaration>) -> Self {
        self.requires = canonicalize(keys.into());
        self
    }

    pub fn provides(mut self, keys: impl Into<Declaration>) -> Self {
        self.provides = canonicalize(keys.into());
        self
    }
}

impl Task for StaticTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn declared_requires(&self) -> Declaration {
        Declaration::Set(self.requires.clone())
    }

    fn declared_provides(&self) -> Declaration {
        Declaration::Set(self.provides.clone())
    }
}
