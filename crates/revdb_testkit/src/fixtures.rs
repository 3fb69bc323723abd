//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores
//! and common test scenarios.

use revdb_core::{
    Context, DocStore, Document, DriverConfig, EngineOptions, ExclusiveDriver, SharedDriver,
};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// File name of the store inside a fixture directory.
pub const STORE_FILE: &str = "store.redb";

/// Installs a fmt subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A document store over a temporary file, removed on drop.
pub struct TestStore {
    /// The store.
    pub store: DocStore<SharedDriver>,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: TempDir,
}

impl TestStore {
    /// Creates a store over a shared driver with default options.
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    /// Creates a store over a shared driver with the given options.
    pub fn with_options(options: EngineOptions) -> Self {
        init_tracing();
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = DriverConfig::new(temp_dir.path().join(STORE_FILE)).options(options);
        Self {
            store: DocStore::new(SharedDriver::new(config)),
            temp_dir,
        }
    }

    /// Returns the path of the store file.
    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().join(STORE_FILE)
    }

    /// Returns the driver configuration for the store file.
    pub fn config(&self) -> DriverConfig {
        self.store.driver().config()
    }

    /// Creates another shared driver over the same file, standing in for a
    /// second process.
    pub fn second_driver(&self) -> SharedDriver {
        SharedDriver::new(self.config())
    }

    /// Opens an exclusive driver over the same file.
    pub fn exclusive_driver(&self) -> ExclusiveDriver {
        ExclusiveDriver::open(self.config(), &Context::background())
            .expect("Failed to open exclusive driver")
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestStore {
    type Target = DocStore<SharedDriver>;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a temporary store over a shared driver.
///
/// # Example
///
/// ```rust,ignore
/// use revdb_testkit::with_shared_store;
///
/// #[test]
/// fn my_test() {
///     with_shared_store(|store, ctx| {
///         assert!(store.fetch_all(ctx, "users").unwrap().is_empty());
///     });
/// }
/// ```
pub fn with_shared_store<F, R>(f: F) -> R
where
    F: FnOnce(&DocStore<SharedDriver>, &Context) -> R,
{
    let test_store = TestStore::new();
    f(&test_store.store, &test_context())
}

/// Runs a test with a temporary store over an exclusive driver.
pub fn with_exclusive_store<F, R>(f: F) -> R
where
    F: FnOnce(&DocStore<ExclusiveDriver>, &Context) -> R,
{
    let test_store = TestStore::new();
    let store = DocStore::new(test_store.exclusive_driver());
    f(&store, &test_context())
}

/// A context with a generous deadline, so a broken lock handoff fails the
/// test instead of hanging it.
pub fn test_context() -> Context {
    Context::background().with_timeout(Duration::from_secs(10))
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Namespace used by the scenario helpers.
    pub const NAMESPACE: &str = "test";

    /// Creates a store with `count` documents `doc-0..doc-<count>`.
    ///
    /// Every document holds a unique `email:<i>` key and a shared
    /// `group:<i % 3>` key.
    pub fn populated_store(count: usize) -> TestStore {
        let test_store = TestStore::new();
        let docs = (0..count)
            .map(|i| {
                Document::new(format!("doc-{i}"), format!(r#"{{"index":{i}}}"#).into_bytes())
                    .with_unique_key(format!("email:{i}"))
                    .with_shared_key(format!("group:{}", i % 3))
            })
            .collect();
        test_store
            .save_many(&test_context(), NAMESPACE, docs)
            .expect("Failed to save documents");
        test_store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revdb_core::Revision;

    #[test]
    fn init_tracing_is_repeatable() {
        init_tracing();
        init_tracing();
        with_shared_store(|store, ctx| {
            store
                .save(ctx, "logged", Document::new("doc1", b"x".to_vec()))
                .unwrap();
        });
    }

    #[test]
    fn test_store_starts_without_file() {
        let store = TestStore::new();
        assert!(!store.path().exists());
        assert!(store.fetch_all(&test_context(), "any").unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn with_shared_store_works() {
        let saved = with_shared_store(|store, ctx| {
            store
                .save(ctx, "users", Document::new("alice", b"a".to_vec()))
                .unwrap()
        });
        assert_eq!(saved.revision, Revision::FIRST);
    }

    #[test]
    fn with_exclusive_store_works() {
        with_exclusive_store(|store, ctx| {
            store
                .save(ctx, "users", Document::new("alice", Vec::new()))
                .unwrap();
            assert!(store.load(ctx, "users", "alice").unwrap().is_some());
        });
    }

    #[test]
    fn populated_store_indexes() {
        let store = scenarios::populated_store(7);
        let ctx = test_context();
        assert_eq!(store.fetch_all(&ctx, scenarios::NAMESPACE).unwrap().len(), 7);
        assert_eq!(
            store
                .fetch_by_key(&ctx, scenarios::NAMESPACE, "group:0")
                .unwrap()
                .len(),
            3
        );
        assert_eq!(
            store
                .fetch_by_key(&ctx, scenarios::NAMESPACE, "email:4")
                .unwrap()[0]
                .id
                .as_str(),
            "doc-4"
        );
    }

    #[test]
    fn second_driver_sees_writes() {
        let store = TestStore::new();
        let ctx = test_context();
        store
            .save(&ctx, "ns", Document::new("doc1", b"x".to_vec()))
            .unwrap();

        let other = DocStore::new(store.second_driver());
        assert_eq!(
            other.load(&ctx, "ns", "doc1").unwrap().unwrap().content,
            b"x"
        );
    }
}
