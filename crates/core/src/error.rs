//! Domain error model.

use thiserror::Error;

use crate::blood_group::BloodGroup;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a local, synchronous, deterministic failure. A rejected
/// operation leaves ledger, log and request state untouched, so none of these
/// are retried internally; retry policy belongs to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input: non-positive quantity, unknown blood-group code, blank field.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation on a blood group that was never initialized.
    #[error("blood group not found: {0}")]
    UnknownGroup(BloodGroup),

    /// A record for this blood group already exists.
    #[error("blood group already exists: {0}")]
    DuplicateGroup(BloodGroup),

    /// A request asked for more units than the group currently holds.
    #[error("insufficient blood units available for {blood_group} (requested: {requested}, available: {available})")]
    InsufficientStock {
        blood_group: BloodGroup,
        requested: u32,
        available: u32,
    },

    /// Illegal request-status change.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// A referenced entity (request, donor) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An identifier failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The backing store could not be accessed (e.g. a poisoned lock).
    #[error("storage unavailable: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_transition(from: impl core::fmt::Display, to: impl core::fmt::Display) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidArgument(_) => "invalid_argument",
            DomainError::UnknownGroup(_) => "unknown_group",
            DomainError::DuplicateGroup(_) => "duplicate_group",
            DomainError::InsufficientStock { .. } => "insufficient_stock",
            DomainError::InvalidTransition { .. } => "invalid_transition",
            DomainError::NotFound(_) => "not_found",
            DomainError::InvalidId(_) => "invalid_id",
            DomainError::Storage(_) => "storage_error",
        }
    }
}
