//! Row cursors.

use crate::error::{BridgeError, BridgeResult};
use crate::native::{from_engine_value, Driver, NativeSlot};
use crate::session::SessionInner;
use crate::transaction::TransactionInner;
use crate::types::HandleId;
use sqlbridge_codec::Row;
use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Lifecycle of a row cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Rows may remain.
    Open,
    /// End of data was reached and the engine stream released.
    Exhausted,
    /// Closed explicitly.
    Closed,
}

/// The handle a cursor was produced by.
pub(crate) enum CursorOwner {
    Session(Arc<SessionInner>),
    Transaction(Arc<TransactionInner>),
}

impl CursorOwner {
    fn ensure_live(&self) -> BridgeResult<()> {
        match self {
            Self::Session(session) => session.ensure_open(),
            Self::Transaction(txn) => txn.ensure_usable(),
        }
    }

    fn driver(&self) -> &Driver {
        match self {
            Self::Session(session) => session.driver(),
            Self::Transaction(txn) => txn.session().driver(),
        }
    }

    fn id(&self) -> HandleId {
        match self {
            Self::Session(session) => session.id(),
            Self::Transaction(txn) => txn.id(),
        }
    }
}

/// A forward-only cursor over the rows of one query.
///
/// Rows are fetched from the engine one per [`advance`](Rows::advance), so
/// a result set never has to fit in memory. Reaching the end releases the
/// engine stream; further advances keep returning `None`. Dropping the
/// cursor closes it.
pub struct Rows {
    slot: NativeSlot<libsql::Rows>,
    state: CursorState,
    owner: CursorOwner,
    columns: Vec<String>,
    failed: bool,
    _not_sync: PhantomData<Cell<()>>,
}

impl Rows {
    pub(crate) fn new(rows: libsql::Rows, owner: CursorOwner) -> Self {
        let columns = (0..rows.column_count())
            .map(|idx| rows.column_name(idx).unwrap_or_default().to_string())
            .collect();
        let slot = NativeSlot::new(rows);
        debug!(owner = %owner.id(), rows = %slot.id(), "cursor opened");
        Self {
            slot,
            state: CursorState::Open,
            owner,
            columns,
            failed: false,
            _not_sync: PhantomData,
        }
    }

    /// Returns the cursor's handle ID.
    #[must_use]
    pub fn id(&self) -> HandleId {
        self.slot.id()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Number of columns in each row.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names in order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Fetches the next row, or `None` at end of data.
    ///
    /// # Errors
    ///
    /// - `CursorClosed` after [`close`](Rows::close)
    /// - `SessionClosed` if the owning session has closed
    /// - `TransactionFinished` if the owning transaction has finished
    /// - `Engine` if the engine fails while stepping
    pub fn advance(&mut self) -> BridgeResult<Option<Row>> {
        match self.state {
            CursorState::Closed => return Err(BridgeError::CursorClosed),
            CursorState::Exhausted => return Ok(None),
            CursorState::Open => {}
        }
        if let Err(err) = self.owner.ensure_live() {
            if self.slot.release() {
                debug!(rows = %self.id(), "cursor orphaned, stream released");
            }
            return Err(err);
        }

        let driver = self.owner.driver();
        let column_count = self.columns.len();
        let next = self.slot.with(BridgeError::CursorClosed, |rows| {
            let Some(row) = driver.run(rows.next())? else {
                return Ok(None);
            };
            let mut values = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                let idx = i32::try_from(idx)
                    .map_err(|_| BridgeError::engine("column index out of range"))?;
                values.push(from_engine_value(driver.check(row.get_value(idx))?));
            }
            Ok(Some(Row::new(values)))
        })?;

        match next {
            Some(row) => {
                driver.stats().record_row();
                Ok(Some(row))
            }
            None => {
                self.slot.release();
                self.state = CursorState::Exhausted;
                debug!(rows = %self.id(), "cursor exhausted");
                Ok(None)
            }
        }
    }

    /// Closes the cursor. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.state == CursorState::Closed {
            return;
        }
        self.slot.release();
        self.state = CursorState::Closed;
        debug!(rows = %self.id(), "cursor closed");
    }
}

impl Iterator for Rows {
    type Item = BridgeResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.advance() {
            Ok(row) => row.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

impl Drop for Rows {
    fn drop(&mut self) {
        self.slot.release();
    }
}

impl std::fmt::Debug for Rows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rows")
            .field("id", &self.id())
            .field("state", &self.state)
            .field("columns", &self.columns)
            .finish()
    }
}
