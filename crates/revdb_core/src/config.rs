//! Driver configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default permission bits for a newly created store file.
pub const DEFAULT_MODE: u32 = 0o600;

/// Default interval between attempts to acquire the file lock.
pub const DEFAULT_LOCK_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Engine tuning options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Maximum time to wait for the file lock when no context deadline is
    /// set. `None` waits indefinitely.
    pub timeout: Option<Duration>,

    /// How often the file lock is retried while another process holds it.
    pub lock_poll_interval: Duration,

    /// Engine page cache size in bytes. `None` uses the engine default.
    pub cache_size: Option<usize>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            lock_poll_interval: DEFAULT_LOCK_POLL_INTERVAL,
            cache_size: None,
        }
    }
}

impl EngineOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lock wait timeout used when the context has no deadline.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the lock poll interval.
    #[must_use]
    pub const fn lock_poll_interval(mut self, interval: Duration) -> Self {
        self.lock_poll_interval = interval;
        self
    }

    /// Sets the engine cache size.
    #[must_use]
    pub const fn cache_size(mut self, bytes: usize) -> Self {
        self.cache_size = Some(bytes);
        self
    }
}

/// Configuration for a driver over one store file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Location of the store file.
    pub path: PathBuf,

    /// Permission bits used when the file is created (Unix only).
    pub mode: u32,

    /// Engine options; `None` applies [`EngineOptions::default`].
    pub options: Option<EngineOptions>,
}

impl DriverConfig {
    /// Creates a configuration for the file at `path`.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            mode: DEFAULT_MODE,
            options: None,
        }
    }

    /// Sets the file permission bits.
    #[must_use]
    pub const fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the engine options.
    #[must_use]
    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Returns the effective engine options.
    #[must_use]
    pub fn engine_options(&self) -> EngineOptions {
        self.options.clone().unwrap_or_default()
    }
}
