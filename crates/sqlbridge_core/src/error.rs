//! Error types for sqlbridge core.

use sqlbridge_codec::CodecError;
use thiserror::Error;

/// Result type for core operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors surfaced by database, session, transaction and cursor handles.
///
/// Lifecycle violations are detected locally and never reach the engine.
/// Engine failures keep the engine's own diagnostic text.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A database handle could not be opened.
    #[error("open failed: {message}")]
    OpenFailure {
        /// Why the open failed.
        message: String,
    },

    /// The database handle has been closed.
    #[error("database handle is closed")]
    HandleClosed,

    /// The session (or the session owning this handle) has been closed.
    #[error("session is closed")]
    SessionClosed,

    /// The row cursor has been closed.
    #[error("row cursor is closed")]
    CursorClosed,

    /// The transaction has already been committed or rolled back.
    #[error("transaction already finished")]
    TransactionFinished,

    /// The session already has an active transaction.
    #[error("session already has an active transaction")]
    AlreadyInTransaction,

    /// A transaction cannot be started from inside another transaction.
    #[error("nested transactions are not allowed")]
    NestedTransactionNotAllowed,

    /// Parameter or row bytes could not be decoded.
    #[error("malformed encoding: {0}")]
    MalformedEncoding(#[from] CodecError),

    /// The engine rejected an operation.
    #[error("engine error: {message}")]
    Engine {
        /// Diagnostic text from the engine.
        message: String,
    },

    /// Replica synchronization failed.
    #[error("sync failed: {message}")]
    SyncFailure {
        /// Diagnostic text from the engine.
        message: String,
    },

    /// The handle lacks the capability for this operation.
    #[error("operation not supported by this handle: {operation}")]
    Unsupported {
        /// Name of the unsupported operation.
        operation: &'static str,
    },
}

impl BridgeError {
    /// Creates an open failure error.
    pub fn open_failure(message: impl Into<String>) -> Self {
        Self::OpenFailure {
            message: message.into(),
        }
    }

    /// Creates an engine error.
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }

    /// Creates a sync failure error.
    pub fn sync_failure(message: impl Into<String>) -> Self {
        Self::SyncFailure {
            message: message.into(),
        }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Returns true for errors caused by using a handle after close or
    /// after its transaction finished.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::HandleClosed
                | Self::SessionClosed
                | Self::CursorClosed
                | Self::TransactionFinished
        )
    }
}

impl From<libsql::Error> for BridgeError {
    fn from(err: libsql::Error) -> Self {
        Self::engine(err.to_string())
    }
}
