//! Transaction FFI functions.

use crate::error::{clear_last_error, fail, null_pointer, SqlbResult};
use crate::session::{execute_batch_on, execute_on, query_on, transaction_on};
use crate::types::{SqlbRows, SqlbTransaction};
use sqlbridge_core::{BridgeResult, Transaction};
use std::ffi::c_char;

unsafe fn finish(
    txn: *mut SqlbTransaction,
    f: impl FnOnce(&Transaction) -> BridgeResult<()>,
) -> SqlbResult {
    clear_last_error();

    if txn.is_null() {
        return null_pointer();
    }
    let txn = &*(txn.cast::<Transaction>());
    match f(txn) {
        Ok(()) => SqlbResult::Ok,
        Err(e) => fail(&e),
    }
}

/// Executes one statement inside a transaction.
///
/// # Safety
///
/// - `txn` must be a valid transaction handle
/// - `sql` must be a valid null-terminated UTF-8 string
/// - `params_data` must point to `params_len` readable bytes
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_txn_execute(
    txn: *mut SqlbTransaction,
    sql: *const c_char,
    params_data: *const u8,
    params_len: usize,
    out_affected: *mut u64,
) -> SqlbResult {
    clear_last_error();

    if txn.is_null() {
        return null_pointer();
    }
    let txn = &*(txn.cast::<Transaction>());
    execute_on(txn, sql, params_data, params_len, out_affected)
}

/// Runs a query inside a transaction.
///
/// # Safety
///
/// - `txn` must be a valid transaction handle
/// - `sql` must be a valid null-terminated UTF-8 string
/// - `params_data` must point to `params_len` readable bytes
/// - `out_rows` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_txn_query(
    txn: *mut SqlbTransaction,
    sql: *const c_char,
    params_data: *const u8,
    params_len: usize,
    out_rows: *mut *mut SqlbRows,
) -> SqlbResult {
    clear_last_error();

    if txn.is_null() {
        return null_pointer();
    }
    let txn = &*(txn.cast::<Transaction>());
    query_on(txn, sql, params_data, params_len, out_rows)
}

/// Runs a script inside a transaction.
///
/// # Safety
///
/// - `txn` must be a valid transaction handle
/// - `sql` must be a valid null-terminated UTF-8 string
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_txn_execute_batch(
    txn: *mut SqlbTransaction,
    sql: *const c_char,
) -> SqlbResult {
    clear_last_error();

    if txn.is_null() {
        return null_pointer();
    }
    let txn = &*(txn.cast::<Transaction>());
    execute_batch_on(txn, sql)
}

/// Always fails with `NestedTransaction`.
///
/// # Safety
///
/// - `txn` must be a valid transaction handle
/// - `out_txn` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_txn_transaction(
    txn: *mut SqlbTransaction,
    out_txn: *mut *mut SqlbTransaction,
) -> SqlbResult {
    clear_last_error();

    if txn.is_null() {
        return null_pointer();
    }
    let txn = &*(txn.cast::<Transaction>());
    transaction_on(txn, out_txn)
}

/// Commits a transaction. The handle stays allocated until
/// `sqlbridge_txn_close`.
///
/// # Safety
///
/// `txn` must be a valid transaction handle.
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_txn_commit(txn: *mut SqlbTransaction) -> SqlbResult {
    finish(txn, Transaction::commit)
}

/// Rolls back a transaction.
///
/// # Safety
///
/// `txn` must be a valid transaction handle.
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_txn_rollback(txn: *mut SqlbTransaction) -> SqlbResult {
    finish(txn, Transaction::rollback)
}

/// Closes a transaction and nulls the caller's pointer. An active
/// transaction is rolled back.
///
/// # Safety
///
/// `txn` must point to a handle pointer returned by a transaction function,
/// or to null.
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_txn_close(txn: *mut *mut SqlbTransaction) -> SqlbResult {
    clear_last_error();

    if txn.is_null() {
        return null_pointer();
    }
    let handle = std::mem::replace(&mut *txn, std::ptr::null_mut());
    if handle.is_null() {
        return SqlbResult::Ok;
    }

    let txn = Box::from_raw(handle.cast::<Transaction>());
    match txn.close() {
        Ok(()) => SqlbResult::Ok,
        Err(e) => fail(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{sqlbridge_db_close, sqlbridge_db_connect, sqlbridge_open_local};
    use crate::session::{
        sqlbridge_session_close, sqlbridge_session_execute_batch, sqlbridge_session_transaction,
    };
    use sqlbridge_core::{Session, Value};

    fn count(session: *mut crate::types::SqlbSession) -> Option<Value> {
        let session = unsafe { &*(session.cast::<Session>()) };
        session.query_scalar("select count(*) from t", ()).unwrap()
    }

    #[test]
    fn commit_rollback_and_nesting() {
        let mut db = std::ptr::null_mut();
        let mut session = std::ptr::null_mut();
        let mut txn = std::ptr::null_mut();
        let mut nested = std::ptr::null_mut();

        unsafe {
            sqlbridge_open_local(c":memory:".as_ptr(), &mut db);
            sqlbridge_db_connect(db, &mut session);
            sqlbridge_session_execute_batch(session, c"create table t(i integer)".as_ptr());

            assert_eq!(sqlbridge_session_transaction(session, &mut txn), SqlbResult::Ok);
            assert_eq!(
                sqlbridge_txn_execute(
                    txn,
                    c"insert into t values(1)".as_ptr(),
                    std::ptr::null(),
                    0,
                    std::ptr::null_mut(),
                ),
                SqlbResult::Ok
            );
            assert_eq!(
                sqlbridge_txn_transaction(txn, &mut nested),
                SqlbResult::NestedTransaction
            );
            assert!(nested.is_null());

            assert_eq!(sqlbridge_txn_commit(txn), SqlbResult::Ok);
            assert_eq!(sqlbridge_txn_commit(txn), SqlbResult::TransactionFinished);
            assert_eq!(
                sqlbridge_txn_execute_batch(txn, c"select 1".as_ptr()),
                SqlbResult::TransactionFinished
            );
            assert_eq!(sqlbridge_txn_close(&mut txn), SqlbResult::Ok);
            assert_eq!(sqlbridge_txn_close(&mut txn), SqlbResult::Ok);
            assert_eq!(count(session), Some(Value::Integer(1)));

            assert_eq!(sqlbridge_session_transaction(session, &mut txn), SqlbResult::Ok);
            sqlbridge_txn_execute_batch(txn, c"insert into t values(2)".as_ptr());
            assert_eq!(sqlbridge_txn_rollback(txn), SqlbResult::Ok);
            assert_eq!(sqlbridge_txn_rollback(txn), SqlbResult::TransactionFinished);
            sqlbridge_txn_close(&mut txn);
            assert_eq!(count(session), Some(Value::Integer(1)));

            sqlbridge_session_close(&mut session);
            sqlbridge_db_close(&mut db);
        }
    }

    #[test]
    fn closing_an_active_transaction_rolls_back() {
        let mut db = std::ptr::null_mut();
        let mut session = std::ptr::null_mut();
        let mut txn = std::ptr::null_mut();

        unsafe {
            sqlbridge_open_local(c":memory:".as_ptr(), &mut db);
            sqlbridge_db_connect(db, &mut session);
            sqlbridge_session_execute_batch(session, c"create table t(i integer)".as_ptr());

            sqlbridge_session_transaction(session, &mut txn);
            sqlbridge_txn_execute_batch(txn, c"insert into t values(1)".as_ptr());
            assert_eq!(sqlbridge_txn_close(&mut txn), SqlbResult::Ok);
            assert_eq!(count(session), Some(Value::Integer(0)));

            sqlbridge_session_close(&mut session);
            sqlbridge_db_close(&mut db);
        }
    }
}
