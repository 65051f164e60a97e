//! Session FFI functions.
//!
//! Sessions and transactions share the statement entry points below through
//! the [`Connection`] trait.

use crate::buffer::params_arg;
use crate::error::{clear_last_error, fail, null_pointer, SqlbResult};
use crate::types::{str_arg, SqlbRows, SqlbSession, SqlbTransaction};
use sqlbridge_core::{Connection, Session};
use std::ffi::c_char;

pub(crate) unsafe fn execute_on<C: Connection>(
    conn: &C,
    sql: *const c_char,
    params_data: *const u8,
    params_len: usize,
    out_affected: *mut u64,
) -> SqlbResult {
    let sql = match str_arg(sql) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let params = match params_arg(params_data, params_len) {
        Ok(p) => p,
        Err(code) => return code,
    };

    match conn.execute(sql, params) {
        Ok(affected) => {
            if !out_affected.is_null() {
                *out_affected = affected;
            }
            SqlbResult::Ok
        }
        Err(e) => fail(&e),
    }
}

pub(crate) unsafe fn query_on<C: Connection>(
    conn: &C,
    sql: *const c_char,
    params_data: *const u8,
    params_len: usize,
    out_rows: *mut *mut SqlbRows,
) -> SqlbResult {
    if out_rows.is_null() {
        return null_pointer();
    }
    let sql = match str_arg(sql) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let params = match params_arg(params_data, params_len) {
        Ok(p) => p,
        Err(code) => return code,
    };

    match conn.query(sql, params) {
        Ok(rows) => {
            *out_rows = Box::into_raw(Box::new(rows)).cast::<SqlbRows>();
            SqlbResult::Ok
        }
        Err(e) => fail(&e),
    }
}

pub(crate) unsafe fn execute_batch_on<C: Connection>(conn: &C, sql: *const c_char) -> SqlbResult {
    let sql = match str_arg(sql) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match conn.execute_batch(sql) {
        Ok(()) => SqlbResult::Ok,
        Err(e) => fail(&e),
    }
}

pub(crate) unsafe fn transaction_on<C: Connection>(
    conn: &C,
    out_txn: *mut *mut SqlbTransaction,
) -> SqlbResult {
    if out_txn.is_null() {
        return null_pointer();
    }
    match conn.transaction() {
        Ok(txn) => {
            *out_txn = Box::into_raw(Box::new(txn)).cast::<SqlbTransaction>();
            SqlbResult::Ok
        }
        Err(e) => fail(&e),
    }
}

/// Executes one statement. Parameters are an encoded parameter frame;
/// pass a zero length for none. `out_affected` may be null.
///
/// # Safety
///
/// - `session` must be a valid session handle
/// - `sql` must be a valid null-terminated UTF-8 string
/// - `params_data` must point to `params_len` readable bytes
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_session_execute(
    session: *mut SqlbSession,
    sql: *const c_char,
    params_data: *const u8,
    params_len: usize,
    out_affected: *mut u64,
) -> SqlbResult {
    clear_last_error();

    if session.is_null() {
        return null_pointer();
    }
    let session = &*(session.cast::<Session>());
    execute_on(session, sql, params_data, params_len, out_affected)
}

/// Runs a query and returns a row cursor.
///
/// # Safety
///
/// - `session` must be a valid session handle
/// - `sql` must be a valid null-terminated UTF-8 string
/// - `params_data` must point to `params_len` readable bytes
/// - `out_rows` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_session_query(
    session: *mut SqlbSession,
    sql: *const c_char,
    params_data: *const u8,
    params_len: usize,
    out_rows: *mut *mut SqlbRows,
) -> SqlbResult {
    clear_last_error();

    if session.is_null() {
        return null_pointer();
    }
    let session = &*(session.cast::<Session>());
    query_on(session, sql, params_data, params_len, out_rows)
}

/// Runs a semicolon-separated script.
///
/// # Safety
///
/// - `session` must be a valid session handle
/// - `sql` must be a valid null-terminated UTF-8 string
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_session_execute_batch(
    session: *mut SqlbSession,
    sql: *const c_char,
) -> SqlbResult {
    clear_last_error();

    if session.is_null() {
        return null_pointer();
    }
    let session = &*(session.cast::<Session>());
    execute_batch_on(session, sql)
}

/// Begins a transaction on a session.
///
/// # Safety
///
/// - `session` must be a valid session handle
/// - `out_txn` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_session_transaction(
    session: *mut SqlbSession,
    out_txn: *mut *mut SqlbTransaction,
) -> SqlbResult {
    clear_last_error();

    if session.is_null() {
        return null_pointer();
    }
    let session = &*(session.cast::<Session>());
    transaction_on(session, out_txn)
}

/// Gets the rowid of the last successful insert on a session.
///
/// # Safety
///
/// - `session` must be a valid session handle
/// - `out_rowid` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_session_last_insert_rowid(
    session: *mut SqlbSession,
    out_rowid: *mut i64,
) -> SqlbResult {
    clear_last_error();

    if session.is_null() || out_rowid.is_null() {
        return null_pointer();
    }
    let session = &*(session.cast::<Session>());
    match session.last_insert_rowid() {
        Ok(rowid) => {
            *out_rowid = rowid;
            SqlbResult::Ok
        }
        Err(e) => fail(&e),
    }
}

/// Closes a session and nulls the caller's pointer. An active transaction
/// is rolled back.
///
/// # Safety
///
/// `session` must point to a handle pointer returned by
/// `sqlbridge_db_connect`, or to null.
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_session_close(session: *mut *mut SqlbSession) -> SqlbResult {
    clear_last_error();

    if session.is_null() {
        return null_pointer();
    }
    let handle = std::mem::replace(&mut *session, std::ptr::null_mut());
    if handle.is_null() {
        return SqlbResult::Ok;
    }

    let session = Box::from_raw(handle.cast::<Session>());
    match session.close() {
        Ok(()) => SqlbResult::Ok,
        Err(e) => fail(&e),
    }
}
