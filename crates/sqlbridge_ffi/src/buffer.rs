//! Buffer types for FFI.

use crate::error::{fail, null_pointer, SqlbResult};
use sqlbridge_core::{BridgeError, Params};

/// A byte buffer for FFI.
///
/// Memory is owned by Rust. Call `sqlbridge_free_buffer` to release.
#[repr(C)]
pub struct SqlbBuffer {
    /// Pointer to data.
    pub data: *mut u8,
    /// Length in bytes.
    pub len: usize,
    /// Capacity (for internal use).
    pub capacity: usize,
}

impl SqlbBuffer {
    /// Creates a new buffer from a Vec.
    pub fn from_vec(vec: Vec<u8>) -> Self {
        let mut vec = vec.into_boxed_slice();
        let data = vec.as_mut_ptr();
        let len = vec.len();
        std::mem::forget(vec);

        Self {
            data,
            len,
            capacity: len,
        }
    }

    /// Creates an empty buffer.
    pub fn empty() -> Self {
        Self {
            data: std::ptr::null_mut(),
            len: 0,
            capacity: 0,
        }
    }

    /// Returns true if the buffer is null/empty.
    pub fn is_null(&self) -> bool {
        self.data.is_null()
    }

    /// Borrows the contents.
    ///
    /// # Safety
    ///
    /// The buffer must have been created by this crate and not yet freed.
    pub unsafe fn as_slice(&self) -> &[u8] {
        if self.data.is_null() {
            return &[];
        }
        std::slice::from_raw_parts(self.data, self.len)
    }
}

/// Frees a buffer allocated by sqlbridge.
///
/// # Safety
///
/// The buffer must have been allocated by sqlbridge FFI functions and not
/// freed before.
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_free_buffer(buffer: SqlbBuffer) {
    if !buffer.data.is_null() {
        drop(Vec::from_raw_parts(buffer.data, buffer.len, buffer.capacity));
    }
}

/// Decodes an encoded parameter frame passed by the host. A zero length
/// means no parameters.
///
/// # Safety
///
/// When `len` is non-zero, `data` must point to `len` readable bytes.
pub(crate) unsafe fn params_arg(data: *const u8, len: usize) -> Result<Params, SqlbResult> {
    if len == 0 {
        return Ok(Params::empty());
    }
    if data.is_null() {
        return Err(null_pointer());
    }
    let bytes = std::slice::from_raw_parts(data, len);
    sqlbridge_codec::decode_params(bytes).map_err(|e| fail(&BridgeError::from(e)))
}
