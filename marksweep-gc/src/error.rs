//! Error types for heap operations.

use thiserror::Error;

use crate::object::ObjectId;

/// Error raised when a handle cannot be resolved by a heap.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcError {
    /// The handle belongs to this heap, but its object is no longer live.
    #[error("unknown object {0}: it is not live in this heap")]
    UnknownObject(ObjectId),

    /// The handle was produced by another heap.
    #[error("unknown object {0}: the handle belongs to another heap")]
    ForeignHandle(ObjectId),
}

impl GcError {
    /// Returns the identity carried by the rejected handle.
    pub fn object_id(&self) -> ObjectId {
        match self {
            GcError::UnknownObject(id) | GcError::ForeignHandle(id) => *id,
        }
    }
}

/// Result type alias
pub type GcResult<T> = Result<T, GcError>;
