//! Database handles and replica sync.

use crate::config::Config;
use crate::error::{BridgeError, BridgeResult};
use crate::native::{Driver, NativeSlot};
use crate::session::Session;
use crate::stats::StatsSnapshot;
use crate::types::{DatabaseKind, HandleId, SyncReport};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Runtime;
use tracing::{debug, warn};

/// Path that opens a private in-memory database.
///
/// Every session opened on an in-memory handle gets its own empty database.
pub const MEMORY_PATH: &str = ":memory:";

/// URL schemes accepted for remote and replica handles.
const REMOTE_SCHEMES: &[&str] = &["libsql", "http", "https", "ws", "wss"];

struct DatabaseInner {
    slot: NativeSlot<libsql::Database>,
    driver: Driver,
    kind: DatabaseKind,
    config: Config,
}

impl DatabaseInner {
    fn close(&self) {
        if self.slot.release() {
            debug!(db = %self.slot.id(), kind = %self.kind, "database closed");
        }
    }
}

/// The main database handle.
///
/// A `Database` owns one engine instance and opens [`Session`]s on it. It
/// can be shared between threads; each thread opens its own sessions.
///
/// # Async Callers
///
/// The handle drives the engine on its own tokio runtime. From inside a
/// multi-threaded runtime, blocking calls go through `block_in_place`.
/// From inside a current-thread runtime they fail with
/// [`BridgeError::Unsupported`] instead of blocking the only worker.
///
/// # Opening a Database
///
/// ```rust,ignore
/// use sqlbridge_core::{Database, MEMORY_PATH};
///
/// let db = Database::open_local(MEMORY_PATH)?;
/// let session = db.connect()?;
/// session.execute("CREATE TABLE t (i INTEGER, s TEXT)", ())?;
/// db.close()?;
/// ```
///
/// # Embedded Replicas
///
/// Handles opened with [`Database::open_embedded_replica`] carry a
/// [`ReplicaSync`] capability:
///
/// ```rust,ignore
/// let db = Database::open_embedded_replica("replica.db", "libsql://db.example", token)?;
/// if let Some(replica) = db.replica() {
///     let report = replica.sync()?;
///     println!("applied {} frames", report.frames_synced);
/// }
/// ```
pub struct Database {
    inner: Arc<DatabaseInner>,
    replica: Option<ReplicaSync>,
}

impl Database {
    /// Opens a file-backed database, creating the file if needed. Pass
    /// [`MEMORY_PATH`] for an in-memory database.
    ///
    /// # Errors
    ///
    /// `OpenFailure` if the path is empty or the engine cannot open it.
    pub fn open_local(path: impl AsRef<Path>) -> BridgeResult<Self> {
        Self::open_local_with_config(path, Config::default())
    }

    /// Opens a file-backed database with custom configuration.
    pub fn open_local_with_config(path: impl AsRef<Path>, config: Config) -> BridgeResult<Self> {
        let path = path.as_ref();
        validate_path(path)?;
        let driver = Driver::new(build_runtime(&config)?);

        let db = driver
            .block_on(libsql::Builder::new_local(path).build())?
            .map_err(|e| BridgeError::open_failure(format!("{}: {e}", path.display())))?;
        // The engine opens files lazily; connect once so bad paths fail here.
        db.connect()
            .map_err(|e| BridgeError::open_failure(format!("{}: {e}", path.display())))?;

        Ok(Self::from_parts(db, driver, DatabaseKind::Local, config))
    }

    /// Opens a handle on a remote database.
    ///
    /// # Errors
    ///
    /// `OpenFailure` for a malformed URL and, when
    /// [`Config::probe_remote`] is set, for an unreachable server or a
    /// rejected token.
    pub fn open_remote(url: &str, auth_token: &str) -> BridgeResult<Self> {
        Self::open_remote_with_config(url, auth_token, Config::default())
    }

    /// Opens a handle on a remote database with custom configuration.
    pub fn open_remote_with_config(
        url: &str,
        auth_token: &str,
        config: Config,
    ) -> BridgeResult<Self> {
        validate_url(url)?;
        let driver = Driver::new(build_runtime(&config)?);

        let db = driver
            .block_on(
                libsql::Builder::new_remote(url.to_string(), auth_token.to_string()).build(),
            )?
            .map_err(|e| BridgeError::open_failure(format!("{url}: {e}")))?;
        if config.probe_remote {
            probe(&driver, &db).map_err(|e| BridgeError::open_failure(format!("{url}: {e}")))?;
        }

        Ok(Self::from_parts(db, driver, DatabaseKind::Remote, config))
    }

    /// Opens a local replica of a remote primary.
    ///
    /// The handle reads from the local file and exposes [`ReplicaSync`]
    /// through [`Database::replica`].
    pub fn open_embedded_replica(
        path: impl AsRef<Path>,
        url: &str,
        auth_token: &str,
    ) -> BridgeResult<Self> {
        Self::open_embedded_replica_with_config(path, url, auth_token, Config::default())
    }

    /// Opens a local replica with custom configuration.
    pub fn open_embedded_replica_with_config(
        path: impl AsRef<Path>,
        url: &str,
        auth_token: &str,
        config: Config,
    ) -> BridgeResult<Self> {
        let path = path.as_ref();
        validate_path(path)?;
        validate_url(url)?;
        let driver = Driver::new(build_runtime(&config)?);

        let builder =
            libsql::Builder::new_remote_replica(path, url.to_string(), auth_token.to_string())
                .read_your_writes(config.read_your_writes);
        let db = driver
            .block_on(builder.build())?
            .map_err(|e| BridgeError::open_failure(format!("{}: {e}", path.display())))?;

        Ok(Self::from_parts(
            db,
            driver,
            DatabaseKind::EmbeddedReplica,
            config,
        ))
    }

    fn from_parts(
        db: libsql::Database,
        driver: Driver,
        kind: DatabaseKind,
        config: Config,
    ) -> Self {
        let inner = Arc::new(DatabaseInner {
            slot: NativeSlot::new(db),
            driver,
            kind,
            config,
        });
        debug!(db = %inner.slot.id(), kind = %kind, "database opened");
        let replica = (kind == DatabaseKind::EmbeddedReplica).then(|| ReplicaSync {
            db: Arc::clone(&inner),
        });
        Self { inner, replica }
    }

    /// Returns the handle ID.
    #[must_use]
    pub fn id(&self) -> HandleId {
        self.inner.slot.id()
    }

    /// Returns how this handle reaches its data.
    #[must_use]
    pub fn kind(&self) -> DatabaseKind {
        self.inner.kind
    }

    /// Returns the configuration the handle was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Checks if the handle is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.slot.is_live()
    }

    /// Opens a new session.
    ///
    /// # Errors
    ///
    /// `HandleClosed` after [`close`](Database::close).
    pub fn connect(&self) -> BridgeResult<Session> {
        let driver = &self.inner.driver;
        let conn = self
            .inner
            .slot
            .with(BridgeError::HandleClosed, |db| driver.check(db.connect()))?;
        Ok(Session::new(conn, driver.clone(), self.id()))
    }

    /// The sync capability, present only on embedded-replica handles.
    #[must_use]
    pub fn replica(&self) -> Option<&ReplicaSync> {
        self.replica.as_ref()
    }

    /// Syncs an embedded replica.
    ///
    /// # Errors
    ///
    /// `Unsupported` on local and remote handles.
    pub fn sync(&self) -> BridgeResult<SyncReport> {
        match &self.replica {
            Some(replica) => replica.sync(),
            None => Err(BridgeError::unsupported("sync")),
        }
    }

    /// Returns a snapshot of this handle's statistics.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.driver.stats().snapshot()
    }

    /// Closes the handle.
    ///
    /// Sessions opened earlier keep their own engine connections. Closing
    /// twice is a no-op.
    pub fn close(&self) -> BridgeResult<()> {
        self.inner.close();
        Ok(())
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.inner.close();
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("open", &self.is_open())
            .finish()
    }
}

/// Sync capability of an embedded-replica handle.
pub struct ReplicaSync {
    db: Arc<DatabaseInner>,
}

impl ReplicaSync {
    /// Pulls outstanding changes from the remote primary and applies them
    /// locally. Blocks until the engine finishes.
    ///
    /// # Errors
    ///
    /// `HandleClosed` after the database closed; `SyncFailure` with the
    /// engine's message on network or replication errors.
    pub fn sync(&self) -> BridgeResult<SyncReport> {
        let started = Instant::now();
        let driver = &self.db.driver;
        let replicated = self.db.slot.with(BridgeError::HandleClosed, |db| {
            driver.block_on(db.sync())?.map_err(|e| {
                driver.stats().record_error();
                warn!(db = %self.db.slot.id(), error = %e, "replica sync failed");
                BridgeError::sync_failure(e.to_string())
            })
        })?;

        let report = SyncReport {
            frame_no: replicated.frame_no(),
            frames_synced: replicated.frames_synced(),
            duration: started.elapsed(),
        };
        driver.stats().record_sync();
        debug!(
            db = %self.db.slot.id(),
            frame_no = ?report.frame_no,
            frames = report.frames_synced,
            "replica synced"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for ReplicaSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicaSync")
            .field("db", &self.db.slot.id())
            .finish()
    }
}

fn build_runtime(config: &Config) -> BridgeResult<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads.max(1))
        .thread_name("sqlbridge-engine")
        .enable_all()
        .build()
        .map_err(|e| BridgeError::open_failure(format!("engine runtime: {e}")))
}

fn validate_path(path: &Path) -> BridgeResult<()> {
    if path.as_os_str().is_empty() {
        return Err(BridgeError::open_failure("path is empty"));
    }
    Ok(())
}

fn validate_url(url: &str) -> BridgeResult<()> {
    if url.is_empty() {
        return Err(BridgeError::open_failure("url is empty"));
    }
    let Some((scheme, rest)) = url.split_once("://") else {
        return Err(BridgeError::open_failure(format!(
            "{url}: expected scheme://host"
        )));
    };
    let scheme = scheme.to_ascii_lowercase();
    if !REMOTE_SCHEMES.contains(&scheme.as_str()) {
        return Err(BridgeError::open_failure(format!(
            "{url}: unsupported scheme {scheme:?}"
        )));
    }
    if rest.is_empty() || rest.starts_with('/') {
        return Err(BridgeError::open_failure(format!("{url}: missing host")));
    }
    Ok(())
}

/// Runs `SELECT 1` on a throwaway connection.
fn probe(driver: &Driver, db: &libsql::Database) -> BridgeResult<()> {
    let conn = driver.check(db.connect())?;
    driver.run(async {
        let mut rows = conn.query("SELECT 1", ()).await?;
        rows.next().await?;
        Ok::<_, libsql::Error>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_validation() {
        assert!(validate_url("libsql://db.example.com").is_ok());
        assert!(validate_url("https://db.example.com:8080").is_ok());
        assert!(validate_url("WSS://db.example.com").is_ok());

        for bad in ["", "db.example.com", "ftp://db.example.com", "http://", "http:///x"] {
            let err = validate_url(bad).unwrap_err();
            assert!(matches!(err, BridgeError::OpenFailure { .. }), "{bad}");
        }
    }

    #[test]
    fn empty_path_is_rejected() {
        let err = validate_path(Path::new("")).unwrap_err();
        assert!(matches!(err, BridgeError::OpenFailure { .. }));
    }

    #[test]
    fn in_memory_handle_is_local() {
        let db = Database::open_local(MEMORY_PATH).unwrap();
        assert_eq!(db.kind(), DatabaseKind::Local);
        assert!(db.replica().is_none());
        assert!(db.is_open());
    }

    #[test]
    fn connect_after_close_fails() {
        let db = Database::open_local(MEMORY_PATH).unwrap();
        db.close().unwrap();
        assert!(!db.is_open());
        assert!(matches!(db.connect(), Err(BridgeError::HandleClosed)));
        db.close().unwrap();
    }

    #[test]
    fn stats_count_sessions() {
        let db = Database::open_local(MEMORY_PATH).unwrap();
        let _a = db.connect().unwrap();
        let _b = db.connect().unwrap();
        assert_eq!(db.stats().sessions_opened, 2);
    }
}
