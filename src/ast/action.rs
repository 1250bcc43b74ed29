//! Task action definitions
//!
//! Defines the 3 task kinds: Emit, Rename, Exec

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{LinflowError, Result};

/// Exec action - shell command speaking JSON on stdin/stdout
#[derive(Debug, Clone, Deserialize)]
pub struct ExecParams {
    pub command: String,
    /// Rollback command, gets the task's outputs on stdin
    #[serde(default)]
    pub undo: Option<String>,
    /// Override the configured exec timeout
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// The 3 task kinds
///
/// Built by [`TaskDef::action`](super::TaskDef::action), which insists on
/// exactly one action key per task entry.
#[derive(Debug, Clone)]
pub enum TaskAction {
    Emit { emit: Map<String, Value> },
    Rename { rename: BTreeMap<String, String> },
    Exec { exec: ExecParams },
}

impl TaskAction {
    pub fn kind(&self) -> &'static str {
        match self {
            TaskAction::Emit { .. } => "emit",
            TaskAction::Rename { .. } => "rename",
            TaskAction::Exec { .. } => "exec",
        }
    }

    /// Reject actions that parse but can never run
    pub fn validate(&self, task_id: &str) -> Result<()> {
        let invalid = |reason: String| LinflowError::InvalidAction {
            task_id: task_id.to_string(),
            reason,
        };

        match self {
            TaskAction::Emit { .. } => Ok(()),
            TaskAction::Rename { rename } => {
                let mut targets = FxHashSet::default();
                for to in rename.values() {
                    if !targets.insert(to.as_str()) {
                        return Err(invalid(format!("rename target '{}' used twice", to)));
                    }
                }
                Ok(())
            }
            TaskAction::Exec { exec } => {
                if exec.command.trim().is_empty() {
                    return Err(invalid("exec command is empty".to_string()));
                }
                if exec.timeout_secs == Some(0) {
                    return Err(invalid("timeout_secs must be at least 1".to_string()));
                }
                Ok(())
            }
        }
    }
}
