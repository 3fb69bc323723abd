//! Error types for revdb core.

use crate::types::{DocumentId, Revision};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// A write was rejected because the caller's revision is stale.
///
/// Carries enough information for the caller to decide whether to re-read the
/// document and retry. The core never retries on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "can not {operation} document {document_id}: given revision ({given}) does not match the current revision ({actual})"
)]
pub struct OptimisticLockError {
    /// The document that was being modified.
    pub document_id: DocumentId,
    /// The revision supplied by the caller.
    pub given: Revision,
    /// The revision currently persisted (`Revision::UNSET` if absent).
    pub actual: Revision,
    /// Name of the rejected operation, e.g. `"delete"`.
    pub operation: &'static str,
}

/// Errors that can occur in revdb core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Optimistic-lock conflict.
    #[error(transparent)]
    OptimisticLock(#[from] OptimisticLockError),

    /// A unique secondary key is already held by another document.
    #[error("key {key:?} is already held by document {holder}")]
    DuplicateKey {
        /// The conflicting key value.
        key: String,
        /// The document that currently holds the key.
        holder: DocumentId,
    },

    /// Error reported by the storage engine.
    #[error("engine error: {0}")]
    Engine(#[from] redb::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Record encoding or decoding failed.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the failure.
        message: String,
    },

    /// Persisted data violates a store invariant.
    #[error("store corruption: {message}")]
    Corruption {
        /// Description of the corruption.
        message: String,
    },

    /// The file lock could not be acquired before the deadline.
    #[error("timed out after {waited:?} waiting for the lock on {path}")]
    LockTimeout {
        /// Store file path.
        path: PathBuf,
        /// How long the open attempt waited.
        waited: Duration,
    },

    /// The caller cancelled the context.
    #[error("operation cancelled")]
    Cancelled,

    /// A document reached the maximum revision.
    #[error("revision overflow for document {document_id}")]
    RevisionOverflow {
        /// The affected document.
        document_id: DocumentId,
    },

    /// Database is closed.
    #[error("database is closed")]
    DatabaseClosed,
}

impl CoreError {
    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Creates a corruption error.
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption {
            message: message.into(),
        }
    }

    /// Returns the optimistic-lock details if this is a lock conflict.
    #[must_use]
    pub fn as_optimistic_lock(&self) -> Option<&OptimisticLockError> {
        match self {
            Self::OptimisticLock(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true if re-reading and retrying the operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::OptimisticLock(_) | Self::LockTimeout { .. })
    }
}

macro_rules! engine_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CoreError {
                fn from(e: $ty) -> Self {
                    Self::Engine(e.into())
                }
            }
        )*
    };
}

engine_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);
