//! Row cursor FFI functions.

use crate::buffer::SqlbBuffer;
use crate::error::{clear_last_error, fail, null_pointer, SqlbResult};
use crate::types::SqlbRows;
use sqlbridge_core::{BridgeError, Rows};

/// Fetches the next row as an encoded row frame.
///
/// # Arguments
///
/// * `rows` - The cursor handle
/// * `out_buffer` - Output buffer for the encoded row
///
/// # Returns
///
/// `SqlbResult::Ok` with a row, `SqlbResult::Done` at end of data (the
/// buffer is left empty), error code otherwise.
///
/// # Safety
///
/// - `rows` must be a valid cursor handle
/// - `out_buffer` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_rows_next(
    rows: *mut SqlbRows,
    out_buffer: *mut SqlbBuffer,
) -> SqlbResult {
    clear_last_error();

    if rows.is_null() || out_buffer.is_null() {
        return null_pointer();
    }
    *out_buffer = SqlbBuffer::empty();

    let rows = &mut *(rows.cast::<Rows>());
    match rows.advance() {
        Ok(Some(row)) => match sqlbridge_codec::encode_row(&row) {
            Ok(bytes) => {
                *out_buffer = SqlbBuffer::from_vec(bytes);
                SqlbResult::Ok
            }
            Err(e) => fail(&BridgeError::from(e)),
        },
        Ok(None) => SqlbResult::Done,
        Err(e) => fail(&e),
    }
}

/// Gets the number of columns in each row.
///
/// # Safety
///
/// - `rows` must be a valid cursor handle
/// - `out_count` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_rows_column_count(
    rows: *mut SqlbRows,
    out_count: *mut usize,
) -> SqlbResult {
    clear_last_error();

    if rows.is_null() || out_count.is_null() {
        return null_pointer();
    }

    let rows = &*(rows.cast::<Rows>());
    *out_count = rows.column_count();
    SqlbResult::Ok
}

/// Gets a column name as UTF-8 bytes.
///
/// # Safety
///
/// - `rows` must be a valid cursor handle
/// - `out_buffer` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_rows_column_name(
    rows: *mut SqlbRows,
    index: usize,
    out_buffer: *mut SqlbBuffer,
) -> SqlbResult {
    clear_last_error();

    if rows.is_null() || out_buffer.is_null() {
        return null_pointer();
    }

    let rows = &*(rows.cast::<Rows>());
    match rows.column_names().get(index) {
        Some(name) => {
            *out_buffer = SqlbBuffer::from_vec(name.as_bytes().to_vec());
            SqlbResult::Ok
        }
        None => {
            crate::error::set_last_error(format!("column index {index} out of range"));
            *out_buffer = SqlbBuffer::empty();
            SqlbResult::InvalidArgument
        }
    }
}

/// Closes a cursor and nulls the caller's pointer.
///
/// # Safety
///
/// `rows` must point to a handle pointer returned by a query function, or
/// to null.
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_rows_close(rows: *mut *mut SqlbRows) -> SqlbResult {
    clear_last_error();

    if rows.is_null() {
        return null_pointer();
    }
    let handle = std::mem::replace(&mut *rows, std::ptr::null_mut());
    if !handle.is_null() {
        let mut rows = Box::from_raw(handle.cast::<Rows>());
        rows.close();
    }
    SqlbResult::Ok
}
