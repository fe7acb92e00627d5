//! Error types for caller-contract violations.
//!
//! Steady-state computation (similarity, layout, reduction, ticks) never fails:
//! malformed numeric input degrades to a well-defined result instead. These
//! variants cover the few places where the caller handed us something we
//! cannot act on.

use thiserror::Error;

/// Errors surfaced by the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NebulaError {
    /// A pin/drag/unpin referenced a node the simulation does not know about.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// An embedding had a different length than the rest of the set.
    #[error("embedding dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// The item snapshot could not be parsed or failed validation.
    #[error("invalid items: {0}")]
    InvalidItems(String),

    /// A configuration value is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, NebulaError>;
