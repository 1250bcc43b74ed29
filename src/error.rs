// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! Linflow Error Types with Error Codes
//!
//! Error code ranges:
//! - LINFLOW-000-009: Chain definition errors
//! - LINFLOW-010-019: Contract errors
//! - LINFLOW-020-029: Execution errors
//! - LINFLOW-030-039: Config errors
//! - LINFLOW-090-099: IO errors
//!
//! The chain core itself only ever raises [`ContractViolation`]; this enum
//! is what the file loader, runner and CLI speak.
//!
//! [`ContractViolation`]: crate::chain::ContractViolation

use miette::Diagnostic;
use thiserror::Error;

use crate::chain::{ContractViolation, KeySet, Task};

pub type Result<T> = std::result::Result<T, LinflowError>;

fn describe_violation(consumer: &str, producer: Option<&str>, missing: &KeySet) -> String {
    match producer {
        Some(producer) => format!(
            "task '{}' does not provide {} needed by '{}'",
            producer, missing, consumer
        ),
        None => format!(
            "no previous task provides {} needed by '{}'",
            missing, consumer
        ),
    }
}

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
///
/// Implements both `thiserror::Error` for std error compatibility
/// and `miette::Diagnostic` for fancy terminal error display.
#[derive(Error, Debug, Diagnostic)]
pub enum LinflowError {
    // ═══════════════════════════════════════════
    // CHAIN DEFINITION ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[LINFLOW-001] Failed to parse chain file: {details}")]
    #[diagnostic(
        code(linflow::parse_error),
        help("Check YAML syntax: indentation and quoting")
    )]
    ParseError { details: String },

    #[error("[LINFLOW-002] Invalid schema version: expected '{expected}', got '{actual}'")]
    #[diagnostic(code(linflow::invalid_schema))]
    InvalidSchema { expected: String, actual: String },

    #[error("[LINFLOW-003] Chain file not found: {path}")]
    #[diagnostic(code(linflow::chain_not_found), help("Check the file path exists"))]
    ChainNotFound { path: String },

    #[error("[LINFLOW-004] Duplicate task id '{task_id}'")]
    #[diagnostic(code(linflow::duplicate_task_id))]
    DuplicateTaskId { task_id: String },

    #[error("[LINFLOW-005] Invalid task id '{task_id}'")]
    #[diagnostic(code(linflow::invalid_task_id))]
    InvalidTaskId { task_id: String },

    #[error("[LINFLOW-006] Invalid action for task '{task_id}': {reason}")]
    #[diagnostic(code(linflow::invalid_action))]
    InvalidAction { task_id: String, reason: String },

    // ═══════════════════════════════════════════
    // CONTRACT ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[LINFLOW-010] Contract violation: {}", describe_violation(.consumer, .producer.as_deref(), .missing))]
    #[diagnostic(
        code(linflow::contract_violation),
        help("Each task may only require keys that the task right before it provides")
    )]
    ContractViolation {
        consumer: String,
        producer: Option<String>,
        missing: KeySet,
    },

    // ═══════════════════════════════════════════
    // EXECUTION ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[LINFLOW-020] Task '{task_id}' failed: {reason}")]
    #[diagnostic(code(linflow::task_failed))]
    TaskFailed { task_id: String, reason: String },

    #[error("[LINFLOW-021] Task '{task_id}' timed out after {timeout_ms}ms")]
    #[diagnostic(code(linflow::task_timeout))]
    TaskTimeout { task_id: String, timeout_ms: u64 },

    #[error("[LINFLOW-022] Task '{task_id}' produced invalid output: {details}")]
    #[diagnostic(code(linflow::invalid_output))]
    InvalidOutput { task_id: String, details: String },

    #[error("[LINFLOW-023] Rollback of task '{task_id}' failed: {reason} (after: {cause})")]
    #[diagnostic(code(linflow::revert_failed))]
    RevertFailed {
        task_id: String,
        reason: String,
        cause: Box<LinflowError>,
    },

    // ═══════════════════════════════════════════
    // CONFIG ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[LINFLOW-030] Configuration error: {reason}")]
    #[diagnostic(code(linflow::config_error))]
    ConfigError { reason: String },

    // ═══════════════════════════════════════════
    // IO ERRORS (090-099)
    // ═══════════════════════════════════════════
    #[error("[LINFLOW-090] IO error: {0}")]
    #[diagnostic(code(linflow::io))]
    Io(#[from] std::io::Error),
}

impl LinflowError {
    /// Error code (`LINFLOW-NNN`) extracted from the message prefix
    pub fn code(&self) -> &'static str {
        match self {
            Self::ParseError { .. } => "LINFLOW-001",
            Self::InvalidSchema { .. } => "LINFLOW-002",
            Self::ChainNotFound { .. } => "LINFLOW-003",
            Self::DuplicateTaskId { .. } => "LINFLOW-004",
            Self::InvalidTaskId { .. } => "LINFLOW-005",
            Self::InvalidAction { .. } => "LINFLOW-006",
            Self::ContractViolation { .. } => "LINFLOW-010",
            Self::TaskFailed { .. } => "LINFLOW-020",
            Self::TaskTimeout { .. } => "LINFLOW-021",
            Self::InvalidOutput { .. } => "LINFLOW-022",
            Self::RevertFailed { .. } => "LINFLOW-023",
            Self::ConfigError { .. } => "LINFLOW-030",
            Self::Io(_) => "LINFLOW-090",
        }
    }
}

impl<T: Task + ?Sized> From<ContractViolation<T>> for LinflowError {
    fn from(violation: ContractViolation<T>) -> Self {
        LinflowError::ContractViolation {
            consumer: violation.consumer.name().to_string(),
            producer: violation.producer.as_ref().map(|p| p.name().to_string()),
            missing: violation.missing,
        }
    }
}

impl FixSuggestion for LinflowError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            LinflowError::ParseError { .. } => Some("Check YAML syntax: indentation and quoting"),
            LinflowError::InvalidSchema { .. } => Some("Use 'linflow/chain@0.1' as the schema"),
            LinflowError::ChainNotFound { .. } => Some("Check the file path exists"),
            LinflowError::DuplicateTaskId { .. } => Some("Give every task a unique id"),
            LinflowError::InvalidTaskId { .. } => {
                Some("Use lowercase ids: a letter followed by letters, digits, '_' or '-'")
            }
            LinflowError::InvalidAction { .. } => {
                Some("Give each task exactly one of emit, rename, exec; exec needs a non-empty command and timeout_secs >= 1; rename targets must be unique")
            }
            LinflowError::ContractViolation { producer: None, .. } => {
                Some("The first task cannot require anything; move it later or drop its requires")
            }
            LinflowError::ContractViolation { .. } => {
                Some("Add the missing keys to the previous task's provides")
            }
            LinflowError::TaskFailed { .. } => Some("Check the task command and its stderr"),
            LinflowError::TaskTimeout { .. } => {
                Some("Raise timeout_secs on the task or exec_timeout_secs in config")
            }
            LinflowError::InvalidOutput { .. } => {
                Some("Exec commands must print a single JSON object on stdout")
            }
            LinflowError::RevertFailed { .. } => Some("Check the task's undo command"),
            LinflowError::ConfigError { .. } => Some("Check ~/.config/linflow/config.toml"),
            LinflowError::Io(_) => Some("Check file path and permissions"),
        }
    }
}
