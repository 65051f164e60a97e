//! # sqlbridge FFI
//!
//! Stable C ABI over `sqlbridge_core` for host-language bindings.
//!
//! Conventions:
//! - every function returns a [`SqlbResult`]; on failure the message is
//!   available from `sqlbridge_last_error` on the same thread
//! - handles are opaque pointers; `*_close` functions take a pointer to the
//!   handle pointer, null it, and treat a second close as `Ok`
//! - parameters and rows cross the boundary as `sqlbridge_codec` frames;
//!   buffers returned by this crate are freed with `sqlbridge_free_buffer`

#![warn(missing_docs)]

mod buffer;
mod database;
mod error;
mod logging;
mod rows;
mod session;
mod transaction;
mod types;

pub use buffer::*;
pub use database::*;
pub use error::*;
pub use logging::*;
pub use rows::*;
pub use session::*;
pub use transaction::*;
pub use types::*;
