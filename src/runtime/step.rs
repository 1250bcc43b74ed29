//! Executable tasks
//!
//! `Step` extends the declaration-only [`Task`] with execute/revert. Each
//! task kind parsed from a chain file has its own implementation:
//! - [`EmitTask`]: produces a fixed mapping
//! - [`RenameTask`]: republishes inputs under new keys
//! - [`ExecTask`](super::ExecTask): shell command speaking JSON

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::chain::{Declaration, Task};
use crate::error::{LinflowError, Result};
use crate::store::Outputs;

/// A task the runner can execute and roll back
pub trait Step: Task {
    /// Short kind label for logs and `linflow order`
    fn kind(&self) -> &'static str;

    /// Run with the inputs resolved from the previous task's outputs
    fn execute(&self, inputs: &Outputs) -> Result<Outputs>;

    /// Undo a completed execution (`outputs` is what `execute` returned)
    fn revert(&self, _outputs: &Outputs) -> Result<()> {
        Ok(())
    }
}

/// Emits a literal mapping
///
/// Unless overridden, it provides exactly the keys of that mapping.
#[derive(Debug, Clone)]
pub struct EmitTask {
    id: Arc<str>,
    values: Outputs,
    requires: Declaration,
    provides: Option<Declaration>,
}

impl EmitTask {
    pub fn new(id: impl Into<Arc<str>>, values: Outputs) -> Self {
        Self {
            id: id.into(),
            values,
            requires: Declaration::Absent,
            provides: None,
        }
    }

    pub fn with_requires(mut self, requires: impl Into<Declaration>) -> Self {
        self.requires = requires.into();
        self
    }

    pub fn with_provides(mut self, provides: impl Into<Declaration>) -> Self {
        self.provides = Some(provides.into());
        self
    }
}

impl Task for EmitTask {
    fn name(&self) -> &str {
        &self.id
    }

    fn declared_requires(&self) -> Declaration {
        self.requires.clone()
    }

    fn declared_provides(&self) -> Declaration {
        self.provides
            .clone()
            .unwrap_or_else(|| Declaration::Mapping(self.values.clone()))
    }
}

impl Step for EmitTask {
    fn kind(&self) -> &'static str {
        "emit"
    }

    fn execute(&self, _inputs: &Outputs) -> Result<Outputs> {
        Ok(self.values.clone())
    }
}

/// Copies input values to new output keys (`from → to`)
///
/// Requires the source keys and provides the target keys unless told
/// otherwise.
#[derive(Debug, Clone)]
pub struct RenameTask {
    id: Arc<str>,
    mapping: BTreeMap<String, String>,
    requires: Option<Declaration>,
    provides: Option<Declaration>,
}

impl RenameTask {
    pub fn new(id: impl Into<Arc<str>>, mapping: BTreeMap<String, String>) -> Self {
        Self {
            id: id.into(),
            mapping,
            requires: None,
            provides: None,
        }
    }

    pub fn with_requires(mut self, requires: impl Into<Declaration>) -> Self {
        self.requires = Some(requires.into());
        self
    }

    pub fn with_provides(mut self, provides: impl Into<Declaration>) -> Self {
        self.provides = Some(provides.into());
        self
    }
}

impl Task for RenameTask {
    fn name(&self) -> &str {
        &self.id
    }

    fn declared_requires(&self) -> Declaration {
        self.requires
            .clone()
            .unwrap_or_else(|| Declaration::list(self.mapping.keys().map(String::as_str)))
    }

    fn declared_provides(&self) -> Declaration {
        self.provides
            .clone()
            .unwrap_or_else(|| Declaration::list(self.mapping.values().map(String::as_str)))
    }
}

impl Step for RenameTask {
    fn kind(&self) -> &'static str {
        "rename"
    }

    fn execute(&self, inputs: &Outputs) -> Result<Outputs> {
        let mut outputs = Outputs::new();
        for (from, to) in &self.mapping {
            let value = inputs.get(from).ok_or_else(|| LinflowError::TaskFailed {
                task_id: self.id.to_string(),
                reason: format!("input '{}' was not provided", from),
            })?;
            outputs.insert(to.clone(), value.clone());
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{canonicalize, KeySet};
    use serde_json::json;

    fn map(value: serde_json::Value) -> Outputs {
        value.as_object().cloned().unwrap()
    }

    fn keys(items: &[&str]) -> KeySet {
        items.iter().copied().collect()
    }

    #[test]
    fn emit_provides_its_keys_by_default() {
        let task = EmitTask::new("seed", map(json!({"name": "world", "n": 1})));
        assert_eq!(canonicalize(task.declared_provides()), keys(&["n", "name"]));
        assert!(canonicalize(task.declared_requires()).is_empty());
        assert_eq!(task.execute(&Outputs::new()).unwrap()["name"], "world");
    }

    #[test]
    fn emit_provides_override() {
        let task = EmitTask::new("seed", map(json!({"a": 1}))).with_provides(["a", "b"]);
        assert_eq!(canonicalize(task.declared_provides()), keys(&["a", "b"]));
    }

    #[test]
    fn rename_defaults_from_mapping() {
        let mapping = BTreeMap::from([("greeting".to_string(), "message".to_string())]);
        let task = RenameTask::new("relabel", mapping);
        assert_eq!(canonicalize(task.declared_requires()), keys(&["greeting"]));
        assert_eq!(canonicalize(task.declared_provides()), keys(&["message"]));

        let out = task.execute(&map(json!({"greeting": "hi"}))).unwrap();
        assert_eq!(out, map(json!({"message": "hi"})));
    }

    #[test]
    fn rename_missing_input_fails() {
        let mapping = BTreeMap::from([("a".to_string(), "b".to_string())]);
        let err = RenameTask::new("r", mapping)
            .execute(&Outputs::new())
            .unwrap_err();
        assert!(matches!(err, LinflowError::TaskFailed { .. }));
    }

    #[test]
    fn default_revert_is_noop() {
        let task = EmitTask::new("seed", Outputs::new());
        assert!(task.revert(&Outputs::new()).is_ok());
    }
}
