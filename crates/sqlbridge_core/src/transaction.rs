//! Transactions.
//!
//! A transaction moves from `Active` to exactly one of `Committed` or
//! `RolledBack` and never leaves a terminal state. Transactions do not nest:
//! starting one from inside another always fails with
//! `NestedTransactionNotAllowed` and leaves the outer one untouched.

use crate::connection::{Batch, Connection};
use crate::error::{BridgeError, BridgeResult};
use crate::native::NativeSlot;
use crate::rows::{CursorOwner, Rows};
use crate::session::{run_batch, run_execute, run_query, SessionInner};
use crate::types::HandleId;
use parking_lot::Mutex;
use sqlbridge_codec::Params;
use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can run statements.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been rolled back.
    RolledBack,
}

impl TransactionState {
    /// Returns true for `Committed` and `RolledBack`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

pub(crate) struct TransactionInner {
    slot: NativeSlot<libsql::Transaction>,
    state: Mutex<TransactionState>,
    session: Arc<SessionInner>,
}

impl TransactionInner {
    pub(crate) fn new(txn: libsql::Transaction, session: Arc<SessionInner>) -> Self {
        Self {
            slot: NativeSlot::new(txn),
            state: Mutex::new(TransactionState::Active),
            session,
        }
    }

    pub(crate) fn id(&self) -> HandleId {
        self.slot.id()
    }

    pub(crate) fn state(&self) -> TransactionState {
        *self.state.lock()
    }

    pub(crate) fn session(&self) -> &SessionInner {
        &self.session
    }

    /// Session liveness is checked before transaction state.
    pub(crate) fn ensure_usable(&self) -> BridgeResult<()> {
        self.session.ensure_open()?;
        if self.state().is_terminal() {
            return Err(BridgeError::TransactionFinished);
        }
        Ok(())
    }

    fn with_txn<R>(
        &self,
        f: impl FnOnce(&libsql::Connection) -> BridgeResult<R>,
    ) -> BridgeResult<R> {
        self.ensure_usable()?;
        self.slot
            .with(BridgeError::TransactionFinished, |txn| f(&**txn))
    }

    fn commit(&self) -> BridgeResult<()> {
        self.ensure_usable()?;
        let txn = self.slot.take().ok_or(BridgeError::TransactionFinished)?;
        let driver = self.session.driver();
        let result = driver.run(txn.commit());
        self.session.detach_transaction(self.id());
        match result {
            Ok(()) => {
                *self.state.lock() = TransactionState::Committed;
                driver.stats().record_transaction_commit();
                debug!(session = %self.session.id(), txn = %self.id(), "transaction committed");
                Ok(())
            }
            Err(err) => {
                *self.state.lock() = TransactionState::RolledBack;
                driver.stats().record_transaction_rollback();
                warn!(txn = %self.id(), error = %err, "commit failed, transaction rolled back");
                self.session.rollback_leftover();
                Err(err)
            }
        }
    }

    /// Rolls back if still active. Returns true if this call rolled back.
    ///
    /// Used by explicit rollback, close, drop and session close.
    pub(crate) fn abort(&self) -> BridgeResult<bool> {
        let Some(txn) = self.slot.take() else {
            return Ok(false);
        };
        *self.state.lock() = TransactionState::RolledBack;
        self.session.detach_transaction(self.id());
        let driver = self.session.driver();
        driver.stats().record_transaction_rollback();
        driver.run(txn.rollback())?;
        debug!(session = %self.session.id(), txn = %self.id(), "transaction rolled back");
        Ok(true)
    }
}

/// A unit of work opened from a [`Session`](crate::Session).
///
/// Statements run through the transaction become durable on
/// [`commit`](Transaction::commit) and are discarded on
/// [`rollback`](Transaction::rollback). Dropping an active transaction
/// rolls it back.
pub struct Transaction {
    inner: Arc<TransactionInner>,
    _not_sync: PhantomData<Cell<()>>,
}

impl Transaction {
    pub(crate) fn new(inner: Arc<TransactionInner>) -> Self {
        Self {
            inner,
            _not_sync: PhantomData,
        }
    }

    /// Returns the transaction's handle ID.
    #[must_use]
    pub fn id(&self) -> HandleId {
        self.inner.id()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.inner.state()
    }

    /// Checks if the transaction is still active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state() == TransactionState::Active
    }

    /// Executes a statement inside the transaction.
    ///
    /// # Errors
    ///
    /// `SessionClosed` if the owning session has closed, then
    /// `TransactionFinished` after commit or rollback.
    pub fn execute(&self, sql: &str, params: impl Into<Params>) -> BridgeResult<u64> {
        let params = params.into();
        let driver = self.inner.session().driver();
        self.inner
            .with_txn(|conn| run_execute(driver, conn, sql, params))
    }

    /// Starts a query inside the transaction. The cursor stops working once
    /// the transaction finishes.
    pub fn query(&self, sql: &str, params: impl Into<Params>) -> BridgeResult<Rows> {
        let params = params.into();
        let driver = self.inner.session().driver();
        let rows = self
            .inner
            .with_txn(|conn| run_query(driver, conn, sql, params))?;
        Ok(Rows::new(
            rows,
            CursorOwner::Transaction(Arc::clone(&self.inner)),
        ))
    }

    /// Executes several statements inside the transaction, stopping at the
    /// first failure.
    pub fn execute_batch(&self, batch: impl Into<Batch>) -> BridgeResult<()> {
        let batch = batch.into();
        let driver = self.inner.session().driver();
        let id = self.id();
        self.inner
            .with_txn(|conn| run_batch(driver, conn, batch, id))
    }

    /// Always fails: transactions do not nest.
    ///
    /// # Errors
    ///
    /// `NestedTransactionNotAllowed`, whatever the state of this
    /// transaction. The transaction itself is unaffected.
    pub fn transaction(&self) -> BridgeResult<Transaction> {
        debug!(txn = %self.id(), "rejected nested transaction");
        Err(BridgeError::NestedTransactionNotAllowed)
    }

    /// Commits the transaction.
    ///
    /// If the engine rejects the commit the transaction ends up
    /// `RolledBack` and the engine's error is returned.
    pub fn commit(&self) -> BridgeResult<()> {
        self.inner.commit()
    }

    /// Rolls the transaction back.
    pub fn rollback(&self) -> BridgeResult<()> {
        self.inner.ensure_usable()?;
        self.inner.abort().map(drop)
    }

    /// Rolls back if still active; otherwise does nothing.
    pub fn close(&self) -> BridgeResult<()> {
        if self.inner.abort()? {
            warn!(txn = %self.id(), "transaction closed while active, rolled back");
        }
        Ok(())
    }
}

impl Connection for Transaction {
    fn execute(&self, sql: &str, params: impl Into<Params>) -> BridgeResult<u64> {
        Transaction::execute(self, sql, params)
    }

    fn query(&self, sql: &str, params: impl Into<Params>) -> BridgeResult<Rows> {
        Transaction::query(self, sql, params)
    }

    fn execute_batch(&self, batch: impl Into<Batch>) -> BridgeResult<()> {
        Transaction::execute_batch(self, batch)
    }

    fn transaction(&self) -> BridgeResult<Transaction> {
        Transaction::transaction(self)
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(txn = %self.id(), error = %err, "rollback on drop failed");
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!TransactionState::Active.is_terminal());
        assert!(TransactionState::Committed.is_terminal());
        assert!(TransactionState::RolledBack.is_terminal());
    }
}
