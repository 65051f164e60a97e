//! Blocking calls made from inside a host's tokio runtime.

use sqlbridge_core::{BridgeError, Database, Value, MEMORY_PATH};

fn open_and_count() -> Result<Option<Value>, BridgeError> {
    let db = Database::open_local(MEMORY_PATH)?;
    let session = db.connect()?;
    session.execute_batch(
        "create table t(i integer);
         insert into t values(1);
         insert into t values(2);",
    )?;
    let txn = session.transaction()?;
    txn.execute("insert into t values(?1)", vec![Value::Integer(3)])?;
    txn.commit()?;
    session.query_scalar("select count(*) from t", ())
}

#[test]
fn works_inside_multi_thread_block_on() {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .build()
        .unwrap();

    // Handles are opened, used and dropped inside the host runtime.
    let count = rt.block_on(async { open_and_count() }).unwrap();
    assert_eq!(count, Some(Value::Integer(3)));
}

#[test]
fn works_inside_a_spawned_task() {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .build()
        .unwrap();

    let count = rt
        .block_on(async { tokio::spawn(async { open_and_count() }).await })
        .unwrap()
        .unwrap();
    assert_eq!(count, Some(Value::Integer(3)));
}

#[test]
fn handles_opened_outside_can_be_dropped_inside() {
    let db = Database::open_local(MEMORY_PATH).unwrap();
    let session = db.connect().unwrap();
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .build()
        .unwrap();

    rt.block_on(async move {
        assert_eq!(
            session.query_scalar("select 41 + 1", ()).unwrap(),
            Some(Value::Integer(42))
        );
        drop(session);
        drop(db);
    });
}

#[test]
fn current_thread_runtime_is_rejected_without_panicking() {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    let err = rt
        .block_on(async { Database::open_local(MEMORY_PATH) })
        .unwrap_err();
    assert!(matches!(err, BridgeError::Unsupported { .. }));
}

#[test]
fn current_thread_runtime_rejects_statements_on_existing_sessions() {
    let db = Database::open_local(MEMORY_PATH).unwrap();
    let session = db.connect().unwrap();
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    let err = rt
        .block_on(async { session.execute("create table t(i integer)", ()) })
        .unwrap_err();
    assert!(matches!(err, BridgeError::Unsupported { .. }));

    session.execute("create table t(i integer)", ()).unwrap();
}
