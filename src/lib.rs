//! Linflow - linear task-chain composer
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  chain/     Task, Declaration/KeySet, LinearChain            │
//! │  ast/       YAML → ChainFile, TaskDef, TaskAction            │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  runtime/   Step kinds (emit, rename, exec), Runner          │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    INFRASTRUCTURE LAYER                      │
//! │  store/     ResultLog (append-only task outputs)             │
//! │  event/     Event sourcing (EventLog, EventKind)             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`chain`] | Adjacency contract checks, ordering, single-hop input resolution |
//! | [`ast`] | YAML parsing → `ChainFile` → `LinearChain<dyn Step>` |
//! | [`runtime`] | Sequential execution with reverse-order rollback |
//! | [`store`] | Result history read by input resolution |
//! | [`event`] | Event sourcing for audit trail |
//! | [`config`] | Runner defaults from file and environment |
//! | [`error`] | Error types with fix suggestions |

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL
// ═══════════════════════════════════════════════════════════════
pub mod ast;
pub mod chain;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER - Execution logic
// ═══════════════════════════════════════════════════════════════
pub mod runtime;

// ═══════════════════════════════════════════════════════════════
// INFRASTRUCTURE LAYER - Storage, events
// ═══════════════════════════════════════════════════════════════
pub mod event;
pub mod store;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - Error handling, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

pub use error::{FixSuggestion, LinflowError, Result};

pub use config::{LinflowConfig, RunnerConfig};

pub use chain::{
    canonicalize, resolve_inputs, ContractViolation, Declaration, FrozenChain, KeySet,
    LinearChain, StaticTask, Task,
};

pub use ast::{ChainFile, TaskAction, TaskDef};

pub use runtime::{EmitTask, ExecTask, RenameTask, RunReport, Runner, Step};

pub use event::{Event, EventKind, EventLog};

pub use store::{LogEntry, Outputs, ResultLog, ResultSource};
