//! Core type definitions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier for a handle.
///
/// Handle IDs are monotonically increasing and never reused. They appear in
/// log events so that a session, its transactions and its cursors can be
/// correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandleId(pub u64);

impl HandleId {
    /// Allocates the next handle ID.
    pub(crate) fn next() -> Self {
        Self(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h:{}", self.0)
    }
}

/// How a database handle reaches its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseKind {
    /// A file on disk or an in-memory database.
    Local,
    /// A remote server reached over the network.
    Remote,
    /// A local file kept in sync with a remote primary.
    EmbeddedReplica,
}

impl DatabaseKind {
    /// Returns a lowercase name for logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
            Self::EmbeddedReplica => "embedded_replica",
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one replica sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Latest replicated frame number, if any frame has been applied.
    pub frame_no: Option<u64>,
    /// Frames applied by this sync.
    pub frames_synced: usize,
    /// Wall time spent syncing.
    pub duration: Duration,
}
