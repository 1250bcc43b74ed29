//! Chain file parsing structures
//!
//! ```yaml
//! schema: linflow/chain@0.1
//! name: greet
//! tasks:
//!   - id: seed
//!     emit: { name: world }
//!   - id: shout
//!     requires: [name]
//!     provides: [greeting]
//!     exec:
//!       command: "jq '{greeting: (\"HELLO \" + .name)}'"
//!   - id: relabel
//!     rename: { greeting: message }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::chain::{Declaration, LinearChain};
use crate::config::RunnerConfig;
use crate::error::{LinflowError, Result};
use crate::runtime::{EmitTask, ExecTask, RenameTask, Step};

use super::action::{ExecParams, TaskAction};

/// Current schema version
pub const SCHEMA_V01: &str = "linflow/chain@0.1";

/// Task ids: lowercase letter, then letters, digits, `_` or `-`
static TASK_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_-]*$").expect("task id pattern is valid"));

/// Check a task id against [`TASK_ID_PATTERN`]
pub fn validate_task_id(task_id: &str) -> Result<()> {
    if TASK_ID_PATTERN.is_match(task_id) {
        Ok(())
    } else {
        Err(LinflowError::InvalidTaskId {
            task_id: task_id.to_string(),
        })
    }
}

/// Chain definition parsed from YAML
#[derive(Debug, Deserialize)]
pub struct ChainFile {
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tasks: Vec<TaskDef>,
}

/// One task entry; `requires`/`provides` fall back to per-kind defaults
///
/// Exactly one of `emit`, `rename`, `exec` must be present, see
/// [`TaskDef::action`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskDef {
    pub id: String,
    #[serde(default)]
    pub requires: Option<Declaration>,
    #[serde(default)]
    pub provides: Option<Declaration>,
    #[serde(default)]
    pub emit: Option<Map<String, Value>>,
    #[serde(default)]
    pub rename: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub exec: Option<ExecParams>,
}

impl TaskDef {
    /// The single action this entry declares
    pub fn action(&self) -> Result<TaskAction> {
        let mut actions = Vec::with_capacity(1);
        if let Some(emit) = &self.emit {
            actions.push(TaskAction::Emit { emit: emit.clone() });
        }
        if let Some(rename) = &self.rename {
            actions.push(TaskAction::Rename {
                rename: rename.clone(),
            });
        }
        if let Some(exec) = &self.exec {
            actions.push(TaskAction::Exec { exec: exec.clone() });
        }

        match actions.len() {
            1 => Ok(actions.remove(0)),
            0 => Err(LinflowError::InvalidAction {
                task_id: self.id.clone(),
                reason: "no action; expected one of emit, rename, exec".to_string(),
            }),
            _ => Err(LinflowError::InvalidAction {
                task_id: self.id.clone(),
                reason: format!(
                    "more than one action: {}",
                    actions.iter().map(TaskAction::kind).collect::<Vec<_>>().join(", ")
                ),
            }),
        }
    }

    /// Turn the definition into an executable step
    pub fn to_step(&self, config: &RunnerConfig) -> Result<Arc<dyn Step>> {
        let step: Arc<dyn Step> = match self.action()? {
            TaskAction::Emit { emit } => {
                let mut task = EmitTask::new(self.id.as_str(), emit);
                if let Some(requires) = &self.requires {
                    task = task.with_requires(requires.clone());
                }
                if let Some(provides) = &self.provides {
                    task = task.with_provides(provides.clone());
                }
                Arc::new(task)
            }
            TaskAction::Rename { rename } => {
                let mut task = RenameTask::new(self.id.as_str(), rename);
                if let Some(requires) = &self.requires {
                    task = task.with_requires(requires.clone());
                }
                if let Some(provides) = &self.provides {
                    task = task.with_provides(provides.clone());
                }
                Arc::new(task)
            }
            TaskAction::Exec { exec } => {
                let mut task = ExecTask::new(self.id.as_str(), exec.command, config)
                    .with_requires(self.requires.clone())
                    .with_provides(self.provides.clone());
                if let Some(undo) = exec.undo {
                    task = task.with_undo(undo);
                }
                if let Some(secs) = exec.timeout_secs {
                    task = task.with_timeout(Duration::from_secs(secs));
                }
                Arc::new(task)
            }
        };
        Ok(step)
    }
}

impl ChainFile {
    /// Parse YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| LinflowError::ParseError {
            details: e.to_string(),
        })
    }

    /// Read and parse a chain file
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LinflowError::ChainNotFound {
                path: path.display().to_string(),
            },
            _ => LinflowError::Io(e),
        })?;
        Self::from_yaml(&yaml)
    }

    /// Check schema version, task ids and actions
    pub fn validate(&self) -> Result<()> {
        if self.schema != SCHEMA_V01 {
            return Err(LinflowError::InvalidSchema {
                expected: SCHEMA_V01.to_string(),
                actual: self.schema.clone(),
            });
        }

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for task in &self.tasks {
            validate_task_id(&task.id)?;
            task.action()?.validate(&task.id)?;
            if !seen.insert(task.id.as_str()) {
                return Err(LinflowError::DuplicateTaskId {
                    task_id: task.id.clone(),
                });
            }
        }

        Ok(())
    }

    /// Validate, then add every task in file order
    ///
    /// Contract violations surface here as `LinflowError::ContractViolation`.
    pub fn build(&self, config: &RunnerConfig) -> Result<LinearChain<dyn Step>> {
        self.validate()?;

        let mut chain: LinearChain<dyn Step> = LinearChain::new(self.name.as_str());
        for def in &self.tasks {
            chain.add(def.to_step(config)?)?;
        }

        debug!(chain = %self.name, tasks = chain.len(), "chain built");
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{canonicalize, KeySet, Task};

    fn keys(items: &[&str]) -> KeySet {
        items.iter().copied().collect()
    }

    const GREET: &str = r#"
schema: linflow/chain@0.1
name: greet
tasks:
  - id: seed
    emit: { name: world }
  - id: echo
    requires: [name]
    provides: { name: ~ }
    exec:
      command: cat
      timeout_secs: 5
  - id: relabel
    rename: { name: subject }
"#;

    #[test]
    fn parse_and_build() {
        let file = ChainFile::from_yaml(GREET).unwrap();
        assert_eq!(file.tasks.len(), 3);
        assert_eq!(file.tasks[1].action().unwrap().kind(), "exec");

        let chain = file.build(&RunnerConfig::default()).unwrap();
        let order = chain.order();
        let names: Vec<&str> = order.iter().map(|t| t.name()).collect();
        assert_eq!(names, ["seed", "echo", "relabel"]);
        assert_eq!(
            canonicalize(order[1].declared_provides()),
            keys(&["name"])
        );
        assert_eq!(order[2].kind(), "rename");
    }

    #[test]
    fn invalid_schema() {
        let file = ChainFile::from_yaml("schema: other@1\nname: x\ntasks: []").unwrap();
        let err = file.validate().unwrap_err();
        assert!(matches!(err, LinflowError::InvalidSchema { .. }));
    }

    #[test]
    fn duplicate_ids() {
        let yaml = r#"
schema: linflow/chain@0.1
name: dup
tasks:
  - id: a
    emit: {}
  - id: a
    emit: {}
"#;
        let err = ChainFile::from_yaml(yaml).unwrap().validate().unwrap_err();
        assert!(matches!(err, LinflowError::DuplicateTaskId { ref task_id } if task_id == "a"));
    }

    #[test]
    fn task_id_pattern() {
        assert!(validate_task_id("seed").is_ok());
        assert!(validate_task_id("step_2-b").is_ok());
        assert!(validate_task_id("2step").is_err());
        assert!(validate_task_id("Seed").is_err());
        assert!(validate_task_id("").is_err());
    }

    #[test]
    fn build_reports_contract_violation() {
        let yaml = r#"
schema: linflow/chain@0.1
name: broken
tasks:
  - id: seed
    emit: { name: world }
  - id: relabel
    rename: { greeting: message }
"#;
        let err = ChainFile::from_yaml(yaml)
            .unwrap()
            .build(&RunnerConfig::default())
            .unwrap_err();
        match err {
            LinflowError::ContractViolation {
                consumer,
                producer,
                missing,
            } => {
                assert_eq!(consumer, "relabel");
                assert_eq!(producer.as_deref(), Some("seed"));
                assert_eq!(missing, keys(&["greeting"]));
            }
            other => panic!("expected ContractViolation, got {:?}", other),
        }
    }

    #[test]
    fn first_task_with_requires_has_no_producer() {
        let yaml = r#"
schema: linflow/chain@0.1
name: orphan
tasks:
  - id: echo
    requires: [name]
    exec: { command: cat }
"#;
        let err = ChainFile::from_yaml(yaml)
            .unwrap()
            .build(&RunnerConfig::default())
            .unwrap_err();
        assert!(matches!(err, LinflowError::ContractViolation { producer: None, .. }));
    }

    #[test]
    fn missing_action_is_invalid_action() {
        let yaml = "schema: linflow/chain@0.1\nname: x\ntasks:\n  - id: a\n";
        let err = ChainFile::from_yaml(yaml).unwrap().validate().unwrap_err();
        assert!(matches!(err, LinflowError::InvalidAction { ref task_id, .. } if task_id == "a"));
    }

    #[test]
    fn two_actions_on_one_task_are_rejected() {
        let yaml = r#"
schema: linflow/chain@0.1
name: both
tasks:
  - id: a
    emit: { name: world }
    exec: { command: cat }
"#;
        let file = ChainFile::from_yaml(yaml).unwrap();
        let err = file.validate().unwrap_err();
        match err {
            LinflowError::InvalidAction { task_id, reason } => {
                assert_eq!(task_id, "a");
                assert_eq!(reason, "more than one action: emit, exec");
            }
            other => panic!("expected InvalidAction, got {:?}", other),
        }
        assert!(file.build(&RunnerConfig::default()).is_err());
    }

    #[test]
    fn unknown_task_key_is_parse_error() {
        let yaml = "schema: linflow/chain@0.1\nname: x\ntasks:\n  - id: a\n    fetch: {url: x}\n";
        let err = ChainFile::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, LinflowError::ParseError { .. }));
    }

    #[test]
    fn missing_file_is_chain_not_found() {
        let err = ChainFile::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, LinflowError::ChainNotFound { .. }));
    }
}
