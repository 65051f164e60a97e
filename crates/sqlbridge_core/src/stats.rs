//! Handle statistics.
//!
//! Every handle opened from a [`Database`](crate::Database) records into
//! the same counters, so the snapshot covers all of its sessions,
//! transactions and cursors.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sqlbridge_core::Database;
//!
//! let db = Database::open_local(":memory:")?;
//! let session = db.connect()?;
//! session.execute("CREATE TABLE t (x INTEGER)", ())?;
//!
//! let stats = db.stats();
//! println!("Statements: {}", stats.statements_executed);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by a database handle and everything opened from it.
///
/// All counters are atomic and monotonically increasing.
#[derive(Debug, Default)]
pub struct DatabaseStats {
    sessions_opened: AtomicU64,
    statements_executed: AtomicU64,
    queries: AtomicU64,
    rows_read: AtomicU64,

    transactions_started: AtomicU64,
    transactions_committed: AtomicU64,
    transactions_rolled_back: AtomicU64,

    syncs: AtomicU64,
    errors: AtomicU64,
}

impl DatabaseStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    // === Increment methods (internal use) ===

    pub(crate) fn record_session_open(&self) {
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_statement(&self) {
        self.statements_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_row(&self) {
        self.rows_read.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transaction_start(&self) {
        self.transactions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transaction_commit(&self) {
        self.transactions_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transaction_rollback(&self) {
        self.transactions_rolled_back.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sync(&self) {
        self.syncs.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    // === Getter methods (public API) ===

    /// Returns the number of sessions opened.
    pub fn sessions_opened(&self) -> u64 {
        self.sessions_opened.load(Ordering::Relaxed)
    }

    /// Returns the number of statements executed, batch members included.
    pub fn statements_executed(&self) -> u64 {
        self.statements_executed.load(Ordering::Relaxed)
    }

    /// Returns the number of queries started.
    pub fn queries(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    /// Returns the number of rows delivered by cursors.
    pub fn rows_read(&self) -> u64 {
        self.rows_read.load(Ordering::Relaxed)
    }

    /// Returns the number of transactions started.
    pub fn transactions_started(&self) -> u64 {
        self.transactions_started.load(Ordering::Relaxed)
    }

    /// Returns the number of transactions committed.
    pub fn transactions_committed(&self) -> u64 {
        self.transactions_committed.load(Ordering::Relaxed)
    }

    /// Returns the number of transactions rolled back, implicit rollbacks
    /// included.
    pub fn transactions_rolled_back(&self) -> u64 {
        self.transactions_rolled_back.load(Ordering::Relaxed)
    }

    /// Returns the number of successful replica syncs.
    pub fn syncs(&self) -> u64 {
        self.syncs.load(Ordering::Relaxed)
    }

    /// Returns the number of engine and sync errors.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sessions_opened: self.sessions_opened(),
            statements_executed: self.statements_executed(),
            queries: self.queries(),
            rows_read: self.rows_read(),
            transactions_started: self.transactions_started(),
            transactions_committed: self.transactions_committed(),
            transactions_rolled_back: self.transactions_rolled_back(),
            syncs: self.syncs(),
            errors: self.errors(),
        }
    }
}

/// A point-in-time snapshot of handle statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Sessions opened.
    pub sessions_opened: u64,
    /// Statements executed.
    pub statements_executed: u64,
    /// Queries started.
    pub queries: u64,
    /// Rows delivered by cursors.
    pub rows_read: u64,
    /// Transactions started.
    pub transactions_started: u64,
    /// Transactions committed.
    pub transactions_committed: u64,
    /// Transactions rolled back.
    pub transactions_rolled_back: u64,
    /// Successful replica syncs.
    pub syncs: u64,
    /// Engine and sync errors.
    pub errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let stats = DatabaseStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn record_transactions() {
        let stats = DatabaseStats::new();

        stats.record_transaction_start();
        stats.record_transaction_start();
        stats.record_transaction_commit();
        stats.record_transaction_rollback();

        assert_eq!(stats.transactions_started(), 2);
        assert_eq!(stats.transactions_committed(), 1);
        assert_eq!(stats.transactions_rolled_back(), 1);
    }

    #[test]
    fn snapshot() {
        let stats = DatabaseStats::new();
        stats.record_session_open();
        stats.record_query();
        stats.record_row();
        stats.record_row();
        stats.record_error();

        let snap = stats.snapshot();
        assert_eq!(snap.sessions_opened, 1);
        assert_eq!(snap.queries, 1);
        assert_eq!(snap.rows_read, 2);
        assert_eq!(snap.errors, 1);
        assert_eq!(snap.syncs, 0);
    }

    #[test]
    fn concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(DatabaseStats::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let s = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    s.record_statement();
                    s.record_row();
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(stats.statements_executed(), 1000);
        assert_eq!(stats.rows_read(), 1000);
    }
}
