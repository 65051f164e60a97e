//! End-to-end use of the C ABI against an on-disk database.

use sqlbridge_codec::{decode_row, encode_params, Params, Value};
use sqlbridge_ffi::*;
use std::ffi::CString;
use std::ptr;

fn open(path: &CString) -> *mut SqlbDatabase {
    let mut db = ptr::null_mut();
    let result = unsafe { sqlbridge_open_local(path.as_ptr(), &mut db) };
    assert_eq!(result, SqlbResult::Ok);
    db
}

fn connect(db: *mut SqlbDatabase) -> *mut SqlbSession {
    let mut session = ptr::null_mut();
    let result = unsafe { sqlbridge_db_connect(db, &mut session) };
    assert_eq!(result, SqlbResult::Ok);
    session
}

fn read_all(rows: *mut SqlbRows) -> Vec<Vec<Value>> {
    let mut out = Vec::new();
    loop {
        let mut buffer = SqlbBuffer::empty();
        match unsafe { sqlbridge_rows_next(rows, &mut buffer) } {
            SqlbResult::Ok => {
                let row = decode_row(unsafe { buffer.as_slice() }).unwrap();
                unsafe { sqlbridge_free_buffer(buffer) };
                out.push(row.into_values());
            }
            SqlbResult::Done => return out,
            other => panic!("rows_next failed: {other:?}"),
        }
    }
}

#[test]
fn committed_writes_are_visible_to_a_second_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = CString::new(dir.path().join("abi.db").to_str().unwrap()).unwrap();
    let mut db = open(&path);
    let mut writer = connect(db);
    let mut reader = connect(db);

    unsafe {
        assert_eq!(
            sqlbridge_session_execute_batch(
                writer,
                c"create table kv(k text primary key, v blob)".as_ptr()
            ),
            SqlbResult::Ok
        );

        let mut txn = ptr::null_mut();
        assert_eq!(sqlbridge_session_transaction(writer, &mut txn), SqlbResult::Ok);
        for (k, v) in [("a", vec![1u8, 2]), ("b", Vec::new())] {
            let params = encode_params(&Params::named([
                (":k", Value::from(k)),
                (":v", Value::Blob(v)),
            ]))
            .unwrap();
            assert_eq!(
                sqlbridge_txn_execute(
                    txn,
                    c"insert into kv values(:k, :v)".as_ptr(),
                    params.as_ptr(),
                    params.len(),
                    ptr::null_mut(),
                ),
                SqlbResult::Ok
            );
        }
        assert_eq!(sqlbridge_txn_commit(txn), SqlbResult::Ok);
        assert_eq!(sqlbridge_txn_close(&mut txn), SqlbResult::Ok);

        let mut rows = ptr::null_mut();
        assert_eq!(
            sqlbridge_session_query(
                reader,
                c"select k, v from kv order by k".as_ptr(),
                ptr::null(),
                0,
                &mut rows,
            ),
            SqlbResult::Ok
        );
        assert_eq!(
            read_all(rows),
            vec![
                vec![Value::from("a"), Value::Blob(vec![1, 2])],
                vec![Value::from("b"), Value::Blob(Vec::new())],
            ]
        );
        sqlbridge_rows_close(&mut rows);

        let mut stats = SqlbStats::default();
        sqlbridge_db_stats(db, &mut stats);
        assert_eq!(stats.sessions_opened, 2);
        assert_eq!(stats.transactions_committed, 1);
        assert_eq!(stats.rows_read, 2);

        assert_eq!(sqlbridge_session_close(&mut writer), SqlbResult::Ok);
        assert_eq!(sqlbridge_session_close(&mut reader), SqlbResult::Ok);
        assert_eq!(sqlbridge_db_close(&mut db), SqlbResult::Ok);
    }
}

#[test]
fn last_error_describes_the_failure() {
    let path = CString::new(":memory:").unwrap();
    let mut db = open(&path);
    let mut session = connect(db);

    unsafe {
        let result = sqlbridge_session_execute(
            session,
            c"select * from nowhere".as_ptr(),
            ptr::null(),
            0,
            ptr::null_mut(),
        );
        assert_eq!(result, SqlbResult::EngineError);
        let message = std::ffi::CStr::from_ptr(sqlbridge_last_error());
        assert!(message.to_str().unwrap().contains("nowhere"));

        assert_eq!(
            sqlbridge_session_execute(
                session,
                c"create table t(i integer)".as_ptr(),
                ptr::null(),
                0,
                ptr::null_mut(),
            ),
            SqlbResult::Ok
        );
        assert!(sqlbridge_last_error().is_null());

        sqlbridge_session_close(&mut session);
        sqlbridge_db_close(&mut db);
    }
}
