//! Host-controlled log output.

use crate::error::{clear_last_error, set_last_error, SqlbResult};
use crate::types::str_arg;
use std::ffi::c_char;
use tracing_subscriber::EnvFilter;

/// Installs a stderr log subscriber.
///
/// `filter` uses `RUST_LOG` directive syntax, e.g. `"sqlbridge_core=debug"`.
/// A null filter reads `RUST_LOG` and falls back to `info`. Calling this
/// again after a subscriber is installed is a no-op that returns `Ok`.
///
/// # Safety
///
/// `filter` must be null or a valid null-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_init_logging(filter: *const c_char) -> SqlbResult {
    clear_last_error();

    let filter = if filter.is_null() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        let directives = match str_arg(filter) {
            Ok(d) => d,
            Err(code) => return code,
        };
        match EnvFilter::try_new(directives) {
            Ok(f) => f,
            Err(e) => {
                set_last_error(format!("invalid log filter: {e}"));
                return SqlbResult::InvalidArgument;
            }
        }
    };

    // Another subscriber may already own the global slot.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    SqlbResult::Ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_repeatable() {
        unsafe {
            assert_eq!(sqlbridge_init_logging(c"sqlbridge_core=debug".as_ptr()), SqlbResult::Ok);
            assert_eq!(sqlbridge_init_logging(std::ptr::null()), SqlbResult::Ok);
        }
    }

    #[test]
    fn bad_directive_is_rejected() {
        unsafe {
            assert_eq!(
                sqlbridge_init_logging(c"sqlbridge_core=notalevel".as_ptr()),
                SqlbResult::InvalidArgument
            );
        }
    }
}
