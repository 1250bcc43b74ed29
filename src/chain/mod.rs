//! Chain Module - linear task composition
//!
//! Contains the composition core:
//! - `keys`: `Declaration` shapes and their canonical `KeySet`
//! - `task`: the `Task` capability trait
//! - `linear`: `LinearChain` (build phase) and `FrozenChain` (execution phase)
//!
//! Only adjacent tasks are checked against each other, and input resolution
//! only reads the most recent result entry.

mod keys;
mod linear;
mod task;

// Re-export public types
pub use keys::{canonicalize, Declaration, KeySet};
pub use linear::{resolve_inputs, ContractViolation, FrozenChain, LinearChain};
pub use task::{StaticTask, Task};
