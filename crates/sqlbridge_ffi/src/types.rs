//! Type definitions for FFI.

use crate::error::{null_pointer, set_last_error, SqlbResult};
use sqlbridge_core::{Config, StatsSnapshot, SyncReport};
use std::ffi::{c_char, CStr};

/// An opaque database handle.
#[repr(C)]
pub struct SqlbDatabase {
    _private: [u8; 0],
}

/// An opaque session handle.
#[repr(C)]
pub struct SqlbSession {
    _private: [u8; 0],
}

/// An opaque transaction handle.
#[repr(C)]
pub struct SqlbTransaction {
    _private: [u8; 0],
}

/// An opaque row cursor handle.
#[repr(C)]
pub struct SqlbRows {
    _private: [u8; 0],
}

/// Configuration for opening a database.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct SqlbConfig {
    /// Engine runtime worker threads (0 means 1).
    pub worker_threads: u32,
    /// Probe remote handles at open time.
    pub probe_remote: bool,
    /// Embedded replicas see their own writes before the next sync.
    pub read_your_writes: bool,
}

impl Default for SqlbConfig {
    fn default() -> Self {
        let config = Config::default();
        Self {
            worker_threads: config.worker_threads as u32,
            probe_remote: config.probe_remote,
            read_your_writes: config.read_your_writes,
        }
    }
}

impl From<&SqlbConfig> for Config {
    fn from(c: &SqlbConfig) -> Self {
        Config::new()
            .worker_threads(c.worker_threads as usize)
            .probe_remote(c.probe_remote)
            .read_your_writes(c.read_your_writes)
    }
}

/// Handle statistics snapshot.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlbStats {
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

impl From<StatsSnapshot> for SqlbStats {
    fn from(s: StatsSnapshot) -> Self {
        Self {
            sessions_opened: s.sessions_opened,
            statements_executed: s.statements_executed,
            queries: s.queries,
            rows_read: s.rows_read,
            transactions_started: s.transactions_started,
            transactions_committed: s.transactions_committed,
            transactions_rolled_back: s.transactions_rolled_back,
            syncs: s.syncs,
            errors: s.errors,
        }
    }
}

/// Outcome of a replica sync.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlbSyncReport {
    /// Whether `frame_no` is meaningful.
    pub has_frame_no: bool,
    /// Latest replicated frame number.
    pub frame_no: u64,
    /// Frames applied by this sync.
    pub frames_synced: u64,
    /// Wall time spent syncing, in milliseconds.
    pub duration_ms: u64,
}

impl From<SyncReport> for SqlbSyncReport {
    fn from(r: SyncReport) -> Self {
        Self {
            has_frame_no: r.frame_no.is_some(),
            frame_no: r.frame_no.unwrap_or(0),
            frames_synced: r.frames_synced as u64,
            duration_ms: u64::try_from(r.duration.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Reads a host string argument.
///
/// # Safety
///
/// `ptr` must be null or a valid null-terminated string.
pub(crate) unsafe fn str_arg<'a>(ptr: *const c_char) -> Result<&'a str, SqlbResult> {
    if ptr.is_null() {
        return Err(null_pointer());
    }
    CStr::from_ptr(ptr).to_str().map_err(|_| {
        set_last_error("invalid UTF-8 in string argument");
        SqlbResult::InvalidArgument
    })
}
