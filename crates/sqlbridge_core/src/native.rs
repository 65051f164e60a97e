//! Native resource ownership and engine bridging.
//!
//! Every engine object this crate holds lives in a [`NativeSlot`]. A slot
//! is released at most once; operations on a released slot fail with the
//! closed error of the handle that owns it.

use crate::error::{BridgeError, BridgeResult};
use crate::stats::DatabaseStats;
use crate::types::HandleId;
use parking_lot::Mutex;
use sqlbridge_codec::{Params, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

const BLOCKING_IN_CURRENT_THREAD: &str = "blocking call inside a current-thread async runtime";

/// Owner of one native engine resource.
pub(crate) struct NativeSlot<T> {
    id: HandleId,
    inner: Mutex<Option<T>>,
}

impl<T> NativeSlot<T> {
    pub(crate) fn new(resource: T) -> Self {
        Self {
            id: HandleId::next(),
            inner: Mutex::new(Some(resource)),
        }
    }

    pub(crate) fn id(&self) -> HandleId {
        self.id
    }

    pub(crate) fn is_live(&self) -> bool {
        self.inner.lock().is_some()
    }

    /// Runs `f` against the resource, or fails with `closed` if it has
    /// been released. The slot stays locked while `f` runs.
    pub(crate) fn with<R>(
        &self,
        closed: BridgeError,
        f: impl FnOnce(&mut T) -> BridgeResult<R>,
    ) -> BridgeResult<R> {
        let mut guard = self.inner.lock();
        match guard.as_mut() {
            Some(resource) => f(resource),
            None => Err(closed),
        }
    }

    /// Takes the resource out. Only the first call returns it.
    pub(crate) fn take(&self) -> Option<T> {
        self.inner.lock().take()
    }

    /// Drops the resource. Returns true if this call released it.
    pub(crate) fn release(&self) -> bool {
        self.take().is_some()
    }
}

/// The engine runtime. Shut down in the background when dropped from
/// inside another runtime, where a blocking shutdown would panic.
struct EngineRuntime(Option<Runtime>);

impl Drop for EngineRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            if Handle::try_current().is_ok() {
                runtime.shutdown_background();
            }
        }
    }
}

/// Runtime and counters shared by every handle of one database.
#[derive(Clone)]
pub(crate) struct Driver {
    runtime: Arc<EngineRuntime>,
    stats: Arc<DatabaseStats>,
}

impl Driver {
    pub(crate) fn new(runtime: Runtime) -> Self {
        Self {
            runtime: Arc::new(EngineRuntime(Some(runtime))),
            stats: Arc::new(DatabaseStats::new()),
        }
    }

    pub(crate) fn stats(&self) -> &DatabaseStats {
        &self.stats
    }

    /// Blocks on an engine future without mapping its output.
    ///
    /// Called from a multi-threaded tokio runtime, the wait goes through
    /// `block_in_place`. A current-thread runtime cannot give up its only
    /// thread, so the call fails with `Unsupported` there.
    pub(crate) fn block_on<F: Future>(&self, fut: F) -> BridgeResult<F::Output> {
        let Some(runtime) = self.runtime.0.as_ref() else {
            return Err(BridgeError::HandleClosed);
        };
        match Handle::try_current() {
            Err(_) => Ok(runtime.block_on(fut)),
            Ok(handle) if matches!(handle.runtime_flavor(), RuntimeFlavor::CurrentThread) => {
                Err(BridgeError::unsupported(BLOCKING_IN_CURRENT_THREAD))
            }
            Ok(_) => Ok(tokio::task::block_in_place(|| runtime.block_on(fut))),
        }
    }

    /// Blocks on an engine future, mapping failures to [`BridgeError::Engine`].
    pub(crate) fn run<T, F>(&self, fut: F) -> BridgeResult<T>
    where
        F: Future<Output = libsql::Result<T>>,
    {
        self.block_on(fut)?.map_err(|err| {
            self.stats.record_error();
            BridgeError::from(err)
        })
    }

    /// Maps a synchronous engine result the same way as [`Driver::run`].
    pub(crate) fn check<T>(&self, result: libsql::Result<T>) -> BridgeResult<T> {
        result.map_err(|err| {
            self.stats.record_error();
            BridgeError::from(err)
        })
    }
}

pub(crate) fn to_engine_value(value: Value) -> libsql::Value {
    match value {
        Value::Null => libsql::Value::Null,
        Value::Integer(n) => libsql::Value::Integer(n),
        Value::Real(r) => libsql::Value::Real(r),
        Value::Text(s) => libsql::Value::Text(s),
        Value::Blob(b) => libsql::Value::Blob(b),
    }
}

pub(crate) fn from_engine_value(value: libsql::Value) -> Value {
    match value {
        libsql::Value::Null => Value::Null,
        libsql::Value::Integer(n) => Value::Integer(n),
        libsql::Value::Real(r) => Value::Real(r),
        libsql::Value::Text(s) => Value::Text(s),
        libsql::Value::Blob(b) => Value::Blob(b),
    }
}

/// Converts parameters to the engine's binding form. Bare names bind as
/// `:name`.
pub(crate) fn to_engine_params(params: Params) -> libsql::params::Params {
    if params.is_empty() {
        return libsql::params::Params::None;
    }
    match params {
        Params::Positional(values) => {
            libsql::params::Params::Positional(values.into_iter().map(to_engine_value).collect())
        }
        Params::Named(map) => libsql::params::Params::Named(
            map.into_iter()
                .map(|(name, value)| (bind_name(name), to_engine_value(value)))
                .collect(),
        ),
    }
}

fn bind_name(name: String) -> String {
    if name.starts_with(&[':', '@', '$'][..]) {
        name
    } else {
        format!(":{name}")
    }
}
