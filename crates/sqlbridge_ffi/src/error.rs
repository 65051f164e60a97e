//! Result codes and the thread-local last error.

use sqlbridge_core::BridgeError;
use std::cell::RefCell;
use std::ffi::CString;

/// Result code for FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlbResult {
    /// Operation succeeded.
    Ok = 0,
    /// Generic error.
    Error = 1,
    /// Invalid argument (bad UTF-8, embedded NUL).
    InvalidArgument = 2,
    /// Null pointer argument.
    NullPointer = 3,
    /// Database could not be opened.
    OpenFailure = 4,
    /// Database handle is closed.
    HandleClosed = 5,
    /// Session is closed.
    SessionClosed = 6,
    /// Row cursor is closed.
    CursorClosed = 7,
    /// Transaction already committed or rolled back.
    TransactionFinished = 8,
    /// Session already has an active transaction.
    AlreadyInTransaction = 9,
    /// Transactions cannot nest.
    NestedTransaction = 10,
    /// Parameter bytes could not be decoded.
    MalformedEncoding = 11,
    /// The engine rejected the operation.
    EngineError = 12,
    /// Replica sync failed.
    SyncFailure = 13,
    /// Operation not supported by this handle.
    NotSupported = 14,
    /// Row cursor reached end of data.
    Done = 15,
}

impl SqlbResult {
    /// Returns true if the result indicates success.
    pub fn is_ok(self) -> bool {
        matches!(self, SqlbResult::Ok | SqlbResult::Done)
    }

    /// Returns true if the result indicates an error.
    pub fn is_err(self) -> bool {
        !self.is_ok()
    }
}

/// Error code type for C compatibility.
pub type ErrorCode = i32;

impl From<SqlbResult> for ErrorCode {
    fn from(result: SqlbResult) -> Self {
        result as ErrorCode
    }
}

impl From<&BridgeError> for SqlbResult {
    fn from(err: &BridgeError) -> Self {
        match err {
            BridgeError::OpenFailure { .. } => SqlbResult::OpenFailure,
            BridgeError::HandleClosed => SqlbResult::HandleClosed,
            BridgeError::SessionClosed => SqlbResult::SessionClosed,
            BridgeError::CursorClosed => SqlbResult::CursorClosed,
            BridgeError::TransactionFinished => SqlbResult::TransactionFinished,
            BridgeError::AlreadyInTransaction => SqlbResult::AlreadyInTransaction,
            BridgeError::NestedTransactionNotAllowed => SqlbResult::NestedTransaction,
            BridgeError::MalformedEncoding(_) => SqlbResult::MalformedEncoding,
            BridgeError::Engine { .. } => SqlbResult::EngineError,
            BridgeError::SyncFailure { .. } => SqlbResult::SyncFailure,
            BridgeError::Unsupported { .. } => SqlbResult::NotSupported,
        }
    }
}

// Thread-local storage for last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Sets the last error message.
pub fn set_last_error(message: impl Into<String>) {
    let mut msg = message.into();
    msg.retain(|c| c != '\0');
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clears the last error.
pub fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Records `err` as the last error and returns its code.
pub(crate) fn fail(err: &BridgeError) -> SqlbResult {
    set_last_error(err.to_string());
    SqlbResult::from(err)
}

/// Records a null pointer argument.
pub(crate) fn null_pointer() -> SqlbResult {
    set_last_error("null pointer argument");
    SqlbResult::NullPointer
}

/// Gets the last error message as a C string.
///
/// Returns null if no error is set.
///
/// # Safety
///
/// The returned pointer is valid until the next FFI call on this thread.
#[no_mangle]
pub extern "C" fn sqlbridge_last_error() -> *const std::ffi::c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cstr) => cstr.as_ptr(),
        None => std::ptr::null(),
    })
}

/// Clears the last error message.
#[no_mangle]
pub extern "C" fn sqlbridge_clear_error() {
    clear_last_error();
}
