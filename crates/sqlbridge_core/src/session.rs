//! Sessions: one logical connection to the engine.

use crate::connection::{Batch, Connection};
use crate::error::{BridgeError, BridgeResult};
use crate::native::{to_engine_params, Driver, NativeSlot};
use crate::rows::{CursorOwner, Rows};
use crate::transaction::{Transaction, TransactionInner};
use crate::types::HandleId;
use parking_lot::Mutex;
use sqlbridge_codec::{Params, Value};
use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// State shared by a session and every handle opened from it.
pub(crate) struct SessionInner {
    slot: NativeSlot<libsql::Connection>,
    driver: Driver,
    db: HandleId,
    active_txn: Mutex<Option<Arc<TransactionInner>>>,
}

impl SessionInner {
    pub(crate) fn id(&self) -> HandleId {
        self.slot.id()
    }

    pub(crate) fn is_open(&self) -> bool {
        self.slot.is_live()
    }

    pub(crate) fn driver(&self) -> &Driver {
        &self.driver
    }

    pub(crate) fn ensure_open(&self) -> BridgeResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(BridgeError::SessionClosed)
        }
    }

    /// Forgets the active transaction if it is `txn`.
    pub(crate) fn detach_transaction(&self, txn: HandleId) {
        let mut active = self.active_txn.lock();
        if active.as_ref().is_some_and(|t| t.id() == txn) {
            *active = None;
        }
    }

    /// Issues `ROLLBACK` if the engine still has a transaction open.
    pub(crate) fn rollback_leftover(&self) {
        let result = self.slot.with(BridgeError::SessionClosed, |conn| {
            if conn.is_autocommit() {
                return Ok(());
            }
            self.driver.run(conn.execute("ROLLBACK", ())).map(drop)
        });
        if let Err(err) = result {
            warn!(session = %self.id(), error = %err, "best-effort rollback failed");
        }
    }

    fn close(&self) -> BridgeResult<()> {
        let active = self.active_txn.lock().take();
        let mut result = Ok(());
        if let Some(txn) = active {
            warn!(
                session = %self.id(),
                txn = %txn.id(),
                "session closed with an active transaction, rolling back"
            );
            result = txn.abort().map(drop);
        }
        if self.slot.release() {
            debug!(db = %self.db, session = %self.id(), "session closed");
        }
        result
    }
}

/// Runs one statement on an engine connection.
pub(crate) fn run_execute(
    driver: &Driver,
    conn: &libsql::Connection,
    sql: &str,
    params: Params,
) -> BridgeResult<u64> {
    let affected = driver.run(conn.execute(sql, to_engine_params(params)))?;
    driver.stats().record_statement();
    Ok(affected)
}

/// Starts a query on an engine connection.
pub(crate) fn run_query(
    driver: &Driver,
    conn: &libsql::Connection,
    sql: &str,
    params: Params,
) -> BridgeResult<libsql::Rows> {
    let rows = driver.run(conn.query(sql, to_engine_params(params)))?;
    driver.stats().record_query();
    Ok(rows)
}

/// Runs a batch on an engine connection, stopping at the first failure.
pub(crate) fn run_batch(
    driver: &Driver,
    conn: &libsql::Connection,
    batch: Batch,
    owner: HandleId,
) -> BridgeResult<()> {
    match batch {
        Batch::Script(script) => {
            driver.run(conn.execute_batch(&script))?;
            driver.stats().record_statement();
        }
        Batch::Statements(statements) => {
            for (index, sql) in statements.iter().enumerate() {
                if let Err(err) = driver.run(conn.execute(sql, ())) {
                    debug!(handle = %owner, index, "batch stopped at failing statement");
                    return Err(err);
                }
                driver.stats().record_statement();
            }
        }
    }
    Ok(())
}

/// A logical connection to the engine.
///
/// Sessions are opened with [`Database::connect`](crate::Database::connect).
/// A session may be moved to another thread but not shared between threads:
/// operations on one session must come from a single caller at a time.
/// Dropping a session closes it.
pub struct Session {
    inner: Arc<SessionInner>,
    _not_sync: PhantomData<Cell<()>>,
}

impl Session {
    pub(crate) fn new(conn: libsql::Connection, driver: Driver, db: HandleId) -> Self {
        let inner = SessionInner {
            slot: NativeSlot::new(conn),
            driver,
            db,
            active_txn: Mutex::new(None),
        };
        inner.driver.stats().record_session_open();
        debug!(db = %db, session = %inner.id(), "session opened");
        Self {
            inner: Arc::new(inner),
            _not_sync: PhantomData,
        }
    }

    /// Returns the session's handle ID.
    #[must_use]
    pub fn id(&self) -> HandleId {
        self.inner.id()
    }

    /// Checks if the session is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    /// Checks if a transaction is active on this session.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.inner.active_txn.lock().is_some()
    }

    /// Executes a statement that produces no rows and returns the number of
    /// affected rows.
    ///
    /// # Errors
    ///
    /// `SessionClosed` after close; `Engine` with the engine's message if
    /// the statement is invalid or violates a constraint.
    pub fn execute(&self, sql: &str, params: impl Into<Params>) -> BridgeResult<u64> {
        let params = params.into();
        self.inner.slot.with(BridgeError::SessionClosed, |conn| {
            run_execute(&self.inner.driver, conn, sql, params)
        })
    }

    /// Starts a query and returns a cursor bound to this session.
    ///
    /// Rows are pulled from the engine one at a time as the cursor
    /// advances. Several cursors may be open on one session at once; each
    /// reads its own statement.
    pub fn query(&self, sql: &str, params: impl Into<Params>) -> BridgeResult<Rows> {
        let params = params.into();
        let rows = self.inner.slot.with(BridgeError::SessionClosed, |conn| {
            run_query(&self.inner.driver, conn, sql, params)
        })?;
        Ok(Rows::new(rows, CursorOwner::Session(Arc::clone(&self.inner))))
    }

    /// Executes several statements in order.
    ///
    /// Stops at the first failing statement and returns its error.
    /// Statements that already ran are not undone.
    pub fn execute_batch(&self, batch: impl Into<Batch>) -> BridgeResult<()> {
        let batch = batch.into();
        self.inner.slot.with(BridgeError::SessionClosed, |conn| {
            run_batch(&self.inner.driver, conn, batch, self.inner.id())
        })
    }

    /// Begins a transaction on this session.
    ///
    /// # Errors
    ///
    /// `AlreadyInTransaction` if a transaction is already active here.
    pub fn transaction(&self) -> BridgeResult<Transaction> {
        self.inner.ensure_open()?;
        let mut active = self.inner.active_txn.lock();
        if active.is_some() {
            return Err(BridgeError::AlreadyInTransaction);
        }
        let txn = self
            .inner
            .slot
            .with(BridgeError::SessionClosed, |conn| {
                self.inner.driver.run(conn.transaction())
            })?;
        let txn = Arc::new(TransactionInner::new(txn, Arc::clone(&self.inner)));
        *active = Some(Arc::clone(&txn));
        self.inner.driver.stats().record_transaction_start();
        debug!(session = %self.id(), txn = %txn.id(), "transaction started");
        Ok(Transaction::new(txn))
    }

    /// Returns the rowid of the most recent successful insert.
    pub fn last_insert_rowid(&self) -> BridgeResult<i64> {
        self.inner
            .slot
            .with(BridgeError::SessionClosed, |conn| Ok(conn.last_insert_rowid()))
    }

    /// Returns true if the engine is not inside a transaction.
    pub fn is_autocommit(&self) -> BridgeResult<bool> {
        self.inner
            .slot
            .with(BridgeError::SessionClosed, |conn| Ok(conn.is_autocommit()))
    }

    /// Runs a query and returns the first column of its first row, or
    /// `None` if it produced no rows.
    pub fn query_scalar(
        &self,
        sql: &str,
        params: impl Into<Params>,
    ) -> BridgeResult<Option<Value>> {
        let mut rows = self.query(sql, params)?;
        let first = rows.advance()?;
        rows.close();
        Ok(first.and_then(|row| row.into_values().into_iter().next()))
    }

    /// Closes the session.
    ///
    /// An active transaction is rolled back first. Cursors and transactions
    /// opened from this session fail with `SessionClosed` afterwards.
    /// Closing twice is a no-op.
    pub fn close(&self) -> BridgeResult<()> {
        self.inner.close()
    }
}

impl Connection for Session {
    fn execute(&self, sql: &str, params: impl Into<Params>) -> BridgeResult<u64> {
        Session::execute(self, sql, params)
    }

    fn query(&self, sql: &str, params: impl Into<Params>) -> BridgeResult<Rows> {
        Session::query(self, sql, params)
    }

    fn execute_batch(&self, batch: impl Into<Batch>) -> BridgeResult<()> {
        Session::execute_batch(self, batch)
    }

    fn transaction(&self) -> BridgeResult<Transaction> {
        Session::transaction(self)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(err) = self.inner.close() {
            warn!(session = %self.id(), error = %err, "error while dropping session");
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id())
            .field("open", &self.is_open())
            .finish()
    }
}
