//! Handle lifecycle: close, reuse after close, and ownership between handles.

use sqlbridge_core::{
    BridgeError, CursorState, Database, Session, TransactionState, Value, MEMORY_PATH,
};

fn setup() -> (Database, Session) {
    let db = Database::open_local(MEMORY_PATH).unwrap();
    let session = db.connect().unwrap();
    session
        .execute_batch(
            "create table t(i integer);
             insert into t values(1);
             insert into t values(2);
             insert into t values(3);",
        )
        .unwrap();
    (db, session)
}

#[test]
fn double_close_is_a_no_op_on_every_handle() {
    let (db, session) = setup();
    let txn = session.transaction().unwrap();
    let mut rows = session.query("select i from t", ()).unwrap();

    rows.close();
    rows.close();
    assert_eq!(rows.state(), CursorState::Closed);

    txn.close().unwrap();
    txn.close().unwrap();
    assert_eq!(txn.state(), TransactionState::RolledBack);

    session.close().unwrap();
    session.close().unwrap();
    assert!(!session.is_open());

    db.close().unwrap();
    db.close().unwrap();
    assert!(!db.is_open());
}

#[test]
fn nested_transaction_fails_and_outer_stays_active() {
    let (_db, session) = setup();
    let txn = session.transaction().unwrap();

    let err = txn.transaction().unwrap_err();
    assert!(matches!(err, BridgeError::NestedTransactionNotAllowed));
    assert_eq!(txn.state(), TransactionState::Active);

    txn.execute("insert into t values(4)", ()).unwrap();
    txn.commit().unwrap();
    assert_eq!(
        session.query_scalar("select count(*) from t", ()).unwrap(),
        Some(Value::Integer(4))
    );
}

#[test]
fn nesting_is_rejected_even_after_commit() {
    let (_db, session) = setup();
    let txn = session.transaction().unwrap();
    txn.commit().unwrap();
    assert!(matches!(
        txn.transaction(),
        Err(BridgeError::NestedTransactionNotAllowed)
    ));
}

#[test]
fn second_transaction_on_a_session_fails() {
    let (_db, session) = setup();
    let txn = session.transaction().unwrap();
    assert!(session.in_transaction());
    assert!(matches!(
        session.transaction(),
        Err(BridgeError::AlreadyInTransaction)
    ));
    txn.rollback().unwrap();
    assert!(!session.in_transaction());
    session.transaction().unwrap().commit().unwrap();
}

#[test]
fn operations_after_commit_fail_with_transaction_finished() {
    let (_db, session) = setup();
    let txn = session.transaction().unwrap();
    txn.commit().unwrap();

    assert!(matches!(
        txn.execute("insert into t values(9)", ()),
        Err(BridgeError::TransactionFinished)
    ));
    assert!(matches!(
        txn.query("select i from t", ()),
        Err(BridgeError::TransactionFinished)
    ));
    assert!(matches!(
        txn.execute_batch("select 1"),
        Err(BridgeError::TransactionFinished)
    ));
    assert!(matches!(txn.commit(), Err(BridgeError::TransactionFinished)));
    assert!(matches!(
        txn.rollback(),
        Err(BridgeError::TransactionFinished)
    ));
    txn.close().unwrap();
}

#[test]
fn operations_after_rollback_fail_with_transaction_finished() {
    let (_db, session) = setup();
    let txn = session.transaction().unwrap();
    txn.rollback().unwrap();

    assert!(matches!(
        txn.execute("insert into t values(9)", ()),
        Err(BridgeError::TransactionFinished)
    ));
    assert!(matches!(txn.commit(), Err(BridgeError::TransactionFinished)));
    assert!(matches!(
        txn.rollback(),
        Err(BridgeError::TransactionFinished)
    ));
}

#[test]
fn session_close_rolls_back_active_transaction() {
    let (db, session) = setup();
    let txn = session.transaction().unwrap();
    txn.execute("insert into t values(4)", ()).unwrap();

    session.close().unwrap();
    assert_eq!(txn.state(), TransactionState::RolledBack);
    assert!(matches!(
        txn.execute("insert into t values(5)", ()),
        Err(BridgeError::SessionClosed)
    ));
    assert!(matches!(txn.commit(), Err(BridgeError::SessionClosed)));
    txn.close().unwrap();
    assert_eq!(db.stats().transactions_rolled_back, 1);
}

#[test]
fn session_operations_after_close_fail() {
    let (_db, session) = setup();
    session.close().unwrap();

    assert!(matches!(
        session.execute("select 1", ()),
        Err(BridgeError::SessionClosed)
    ));
    assert!(matches!(
        session.query("select 1", ()),
        Err(BridgeError::SessionClosed)
    ));
    assert!(matches!(
        session.execute_batch("select 1"),
        Err(BridgeError::SessionClosed)
    ));
    assert!(matches!(
        session.transaction(),
        Err(BridgeError::SessionClosed)
    ));
    assert!(matches!(
        session.last_insert_rowid(),
        Err(BridgeError::SessionClosed)
    ));
}

#[test]
fn advance_after_close_fails() {
    let (_db, session) = setup();
    let mut rows = session.query("select i from t", ()).unwrap();
    assert!(rows.advance().unwrap().is_some());
    rows.close();
    assert!(matches!(rows.advance(), Err(BridgeError::CursorClosed)));
    assert!(matches!(rows.advance(), Err(BridgeError::CursorClosed)));
}

#[test]
fn close_after_exhaustion_then_advance_fails() {
    let (_db, session) = setup();
    let mut rows = session.query("select i from t where i > 100", ()).unwrap();
    assert_eq!(rows.advance().unwrap(), None);
    assert_eq!(rows.state(), CursorState::Exhausted);
    rows.close();
    assert!(matches!(rows.advance(), Err(BridgeError::CursorClosed)));
}

#[test]
fn cursor_fails_once_its_session_closes() {
    let (_db, session) = setup();
    let mut rows = session.query("select i from t order by i", ()).unwrap();
    assert!(rows.advance().unwrap().is_some());

    session.close().unwrap();
    assert!(matches!(rows.advance(), Err(BridgeError::SessionClosed)));
    assert!(matches!(rows.advance(), Err(BridgeError::SessionClosed)));
    rows.close();
    rows.close();
}

#[test]
fn cursor_fails_once_its_transaction_finishes() {
    let (_db, session) = setup();
    let txn = session.transaction().unwrap();
    let mut rows = txn.query("select i from t order by i", ()).unwrap();
    assert!(rows.advance().unwrap().is_some());

    txn.rollback().unwrap();
    assert!(matches!(
        rows.advance(),
        Err(BridgeError::TransactionFinished)
    ));
}

#[test]
fn iterator_fuses_after_error() {
    let (_db, session) = setup();
    let mut rows = session.query("select i from t", ()).unwrap();
    session.close().unwrap();

    assert!(matches!(rows.next(), Some(Err(BridgeError::SessionClosed))));
    assert!(rows.next().is_none());
}

#[test]
fn handles_move_to_other_threads() {
    let (_db, session) = setup();
    let rows = session.query("select i from t order by i", ()).unwrap();

    let count = std::thread::spawn(move || rows.count()).join().unwrap();
    assert_eq!(count, 3);

    let total = std::thread::spawn(move || {
        session
            .query_scalar("select sum(i) from t", ())
            .unwrap()
    })
    .join()
    .unwrap();
    assert_eq!(total, Some(Value::Integer(6)));
}

#[test]
fn dropping_database_keeps_open_sessions_usable() {
    let (db, session) = setup();
    drop(db);
    assert_eq!(
        session.query_scalar("select max(i) from t", ()).unwrap(),
        Some(Value::Integer(3))
    );
}
