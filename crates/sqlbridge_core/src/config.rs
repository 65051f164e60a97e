//! Handle configuration.

/// Configuration for opening a database handle.
#[derive(Debug, Clone)]
pub struct Config {
    /// Worker threads for the runtime that drives the engine.
    pub worker_threads: usize,

    /// Whether remote handles run a probe query at open time so that an
    /// unreachable server or a rejected token fails the open.
    pub probe_remote: bool,

    /// Whether an embedded replica sees its own writes before the next sync.
    pub read_your_writes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_threads: 1,
            probe_remote: true,
            read_your_writes: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime worker thread count (minimum 1).
    #[must_use]
    pub const fn worker_threads(mut self, count: usize) -> Self {
        self.worker_threads = count;
        self
    }

    /// Sets whether remote handles are probed at open time.
    #[must_use]
    pub const fn probe_remote(mut self, value: bool) -> Self {
        self.probe_remote = value;
        self
    }

    /// Sets read-your-writes for embedded replicas.
    #[must_use]
    pub const fn read_your_writes(mut self, value: bool) -> Self {
        self.read_your_writes = value;
        self
    }
}
