//! Database FFI functions.

use crate::error::{clear_last_error, fail, null_pointer, SqlbResult};
use crate::types::{str_arg, SqlbConfig, SqlbDatabase, SqlbSession, SqlbStats, SqlbSyncReport};
use sqlbridge_core::{BridgeResult, Config, Database};
use std::ffi::c_char;

unsafe fn publish(result: BridgeResult<Database>, out_db: *mut *mut SqlbDatabase) -> SqlbResult {
    match result {
        Ok(db) => {
            *out_db = Box::into_raw(Box::new(db)).cast::<SqlbDatabase>();
            SqlbResult::Ok
        }
        Err(e) => fail(&e),
    }
}

unsafe fn config_arg(config: *const SqlbConfig) -> Config {
    if config.is_null() {
        Config::default()
    } else {
        Config::from(&*config)
    }
}

/// Opens a local database. Pass `":memory:"` for an in-memory database.
///
/// # Safety
///
/// - `path` must be a valid null-terminated UTF-8 string
/// - `out_db` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_open_local(
    path: *const c_char,
    out_db: *mut *mut SqlbDatabase,
) -> SqlbResult {
    sqlbridge_open_local_with_config(path, std::ptr::null(), out_db)
}

/// Opens a local database with configuration. A null `config` uses
/// defaults.
///
/// # Safety
///
/// - `path` must be a valid null-terminated UTF-8 string
/// - `config` must be null or point to a valid `SqlbConfig`
/// - `out_db` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_open_local_with_config(
    path: *const c_char,
    config: *const SqlbConfig,
    out_db: *mut *mut SqlbDatabase,
) -> SqlbResult {
    clear_last_error();

    if out_db.is_null() {
        return null_pointer();
    }
    let path = match str_arg(path) {
        Ok(p) => p,
        Err(code) => return code,
    };

    publish(
        Database::open_local_with_config(path, config_arg(config)),
        out_db,
    )
}

/// Opens a remote database.
///
/// # Safety
///
/// - `url` and `auth_token` must be valid null-terminated UTF-8 strings
/// - `out_db` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_open_remote(
    url: *const c_char,
    auth_token: *const c_char,
    out_db: *mut *mut SqlbDatabase,
) -> SqlbResult {
    sqlbridge_open_remote_with_config(url, auth_token, std::ptr::null(), out_db)
}

/// Opens a remote database with configuration.
///
/// # Safety
///
/// - `url` and `auth_token` must be valid null-terminated UTF-8 strings
/// - `config` must be null or point to a valid `SqlbConfig`
/// - `out_db` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_open_remote_with_config(
    url: *const c_char,
    auth_token: *const c_char,
    config: *const SqlbConfig,
    out_db: *mut *mut SqlbDatabase,
) -> SqlbResult {
    clear_last_error();

    if out_db.is_null() {
        return null_pointer();
    }
    let (url, token) = match (str_arg(url), str_arg(auth_token)) {
        (Ok(u), Ok(t)) => (u, t),
        (Err(code), _) | (_, Err(code)) => return code,
    };

    publish(
        Database::open_remote_with_config(url, token, config_arg(config)),
        out_db,
    )
}

/// Opens an embedded replica of a remote database.
///
/// # Safety
///
/// - `path`, `url` and `auth_token` must be valid null-terminated UTF-8
///   strings
/// - `config` must be null or point to a valid `SqlbConfig`
/// - `out_db` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_open_embedded_replica(
    path: *const c_char,
    url: *const c_char,
    auth_token: *const c_char,
    config: *const SqlbConfig,
    out_db: *mut *mut SqlbDatabase,
) -> SqlbResult {
    clear_last_error();

    if out_db.is_null() {
        return null_pointer();
    }
    let (path, url, token) = match (str_arg(path), str_arg(url), str_arg(auth_token)) {
        (Ok(p), Ok(u), Ok(t)) => (p, u, t),
        (Err(code), _, _) | (_, Err(code), _) | (_, _, Err(code)) => return code,
    };

    publish(
        Database::open_embedded_replica_with_config(path, url, token, config_arg(config)),
        out_db,
    )
}

/// Opens a session on a database.
///
/// # Safety
///
/// - `db` must be a valid database handle
/// - `out_session` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_db_connect(
    db: *mut SqlbDatabase,
    out_session: *mut *mut SqlbSession,
) -> SqlbResult {
    clear_last_error();

    if db.is_null() || out_session.is_null() {
        return null_pointer();
    }

    let db = &*(db.cast::<Database>());
    match db.connect() {
        Ok(session) => {
            *out_session = Box::into_raw(Box::new(session)).cast::<SqlbSession>();
            SqlbResult::Ok
        }
        Err(e) => fail(&e),
    }
}

/// Syncs an embedded replica. Fails with `NotSupported` on other handles.
///
/// # Safety
///
/// - `db` must be a valid database handle
/// - `out_report` must be null or a valid pointer
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_db_sync(
    db: *mut SqlbDatabase,
    out_report: *mut SqlbSyncReport,
) -> SqlbResult {
    clear_last_error();

    if db.is_null() {
        return null_pointer();
    }

    let db = &*(db.cast::<Database>());
    match db.sync() {
        Ok(report) => {
            if !out_report.is_null() {
                *out_report = report.into();
            }
            SqlbResult::Ok
        }
        Err(e) => fail(&e),
    }
}

/// Gets handle statistics.
///
/// # Safety
///
/// - `db` must be a valid database handle
/// - `out_stats` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_db_stats(
    db: *mut SqlbDatabase,
    out_stats: *mut SqlbStats,
) -> SqlbResult {
    clear_last_error();

    if db.is_null() || out_stats.is_null() {
        return null_pointer();
    }

    let db = &*(db.cast::<Database>());
    *out_stats = db.stats().into();
    SqlbResult::Ok
}

/// Closes a database and nulls the caller's pointer.
///
/// Closing an already-nulled handle returns `Ok`.
///
/// # Safety
///
/// `db` must point to a handle pointer returned by an open function, or to
/// null.
#[no_mangle]
pub unsafe extern "C" fn sqlbridge_db_close(db: *mut *mut SqlbDatabase) -> SqlbResult {
    clear_last_error();

    if db.is_null() {
        return null_pointer();
    }
    let handle = std::mem::replace(&mut *db, std::ptr::null_mut());
    if handle.is_null() {
        return SqlbResult::Ok;
    }

    let db = Box::from_raw(handle.cast::<Database>());
    match db.close() {
        Ok(()) => SqlbResult::Ok,
        Err(e) => fail(&e),
    }
}
