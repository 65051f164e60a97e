//! # sqlbridge core
//!
//! Handle layer between an application and the libsql engine.
//!
//! This crate provides:
//! - [`Database`] handles opened locally, against a remote server, or as an
//!   embedded replica with [`ReplicaSync`]
//! - [`Session`]s that execute statements and start queries
//! - single-level [`Transaction`]s
//! - lazy, forward-only [`Rows`] cursors
//!
//! Every handle owns exactly one engine resource, releases it exactly once,
//! and rejects use after close with a typed [`BridgeError`]. All calls block
//! the calling thread until the engine finishes.
//!
//! Calls may be made from inside a multi-threaded tokio runtime; the wait
//! then runs through `tokio::task::block_in_place`. Inside a current-thread
//! runtime every engine call fails with [`BridgeError::Unsupported`]; move
//! the work to `spawn_blocking` or a plain thread there.
//!
//! ```rust,ignore
//! use sqlbridge_core::{Database, Params, MEMORY_PATH};
//!
//! let db = Database::open_local(MEMORY_PATH)?;
//! let session = db.connect()?;
//! let mut rows = session.query("SELECT :a", Params::named([("a", 7i64)]))?;
//! while let Some(row) = rows.advance()? {
//!     println!("{:?}", row.values());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod connection;
mod database;
mod error;
mod native;
mod rows;
mod session;
mod stats;
mod transaction;
mod types;

pub use config::Config;
pub use connection::{Batch, Connection};
pub use database::{Database, ReplicaSync, MEMORY_PATH};
pub use error::{BridgeError, BridgeResult};
pub use rows::{CursorState, Rows};
pub use session::Session;
pub use stats::{DatabaseStats, StatsSnapshot};
pub use transaction::{Transaction, TransactionState};
pub use types::{DatabaseKind, HandleId, SyncReport};

pub use sqlbridge_codec::{CodecError, Params, Row, Value, ValueType};
