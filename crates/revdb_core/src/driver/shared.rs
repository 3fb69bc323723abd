//! Driver that opens the store file per operation.

use super::open::{open_read, open_write};
use super::{run_update, run_view, Driver};
use crate::config::{DriverConfig, EngineOptions};
use crate::context::Context;
use crate::error::{CoreError, CoreResult};
use crate::ops::{UpdateOp, ViewOp};
use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use redb::Database;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// A driver that only opens the store file while performing an operation,
/// allowing the file to be shared between multiple processes.
///
/// Views share the driver lock and may run concurrently; concurrent views
/// in this process reuse one open handle, which is closed when the last of
/// them finishes. Updates and [`close`](Driver::close) take the driver lock
/// exclusively. Once closed, every operation fails with
/// [`CoreError::DatabaseClosed`].
///
/// # Example
///
/// ```rust,ignore
/// use revdb_core::{Context, Driver, DriverConfig, OpLoad, SharedDriver};
///
/// let driver = SharedDriver::new(DriverConfig::new("app.redb"));
/// let mut op = OpLoad::new("users", "alice");
/// if driver.view(&Context::background(), &mut op)? {
///     println!("{:?}", op.document);
/// }
/// ```
pub struct SharedDriver {
    path: PathBuf,
    state: RwLock<State>,
    reader: Mutex<Option<Arc<Database>>>,
}

#[derive(Debug)]
struct State {
    config: DriverConfig,
    closed: bool,
}

impl State {
    fn ensure_open(&self) -> CoreResult<()> {
        if self.closed {
            Err(CoreError::DatabaseClosed)
        } else {
            Ok(())
        }
    }
}

impl SharedDriver {
    /// Creates a driver for the configured file. The file is not touched
    /// until the first operation.
    #[must_use]
    pub fn new(config: DriverConfig) -> Self {
        Self {
            path: config.path.clone(),
            state: RwLock::new(State {
                config,
                closed: false,
            }),
            reader: Mutex::new(None),
        }
    }

    /// Returns a copy of the driver configuration.
    #[must_use]
    pub fn config(&self) -> DriverConfig {
        self.state.read().config.clone()
    }

    /// Replaces the engine options used by subsequent operations.
    pub fn set_options(&self, options: Option<EngineOptions>) {
        self.state.write().config.options = options;
    }

    /// Returns true once the driver has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.read().closed
    }

    fn read_state(&self, ctx: &Context, started: Instant) -> CoreResult<RwLockReadGuard<'_, State>> {
        match ctx.deadline() {
            Some(deadline) => self
                .state
                .try_read_until(deadline)
                .ok_or_else(|| self.timeout(started)),
            None => Ok(self.state.read()),
        }
    }

    fn write_state(
        &self,
        ctx: &Context,
        started: Instant,
    ) -> CoreResult<RwLockWriteGuard<'_, State>> {
        match ctx.deadline() {
            Some(deadline) => self
                .state
                .try_write_until(deadline)
                .ok_or_else(|| self.timeout(started)),
            None => Ok(self.state.write()),
        }
    }

    fn timeout(&self, started: Instant) -> CoreError {
        CoreError::LockTimeout {
            path: self.path.clone(),
            waited: started.elapsed(),
        }
    }

    /// Returns the shared read handle, opening the file if no concurrent
    /// view holds it. `None` means the file does not exist.
    fn acquire_reader(
        &self,
        config: &DriverConfig,
        ctx: &Context,
        started: Instant,
    ) -> CoreResult<Option<ReaderGuard<'_>>> {
        let mut slot: MutexGuard<'_, _> = match ctx.deadline() {
            Some(deadline) => self
                .reader
                .try_lock_until(deadline)
                .ok_or_else(|| self.timeout(started))?,
            None => self.reader.lock(),
        };

        let db = match slot.as_ref() {
            Some(db) => Arc::clone(db),
            None => match open_read(config, ctx)? {
                Some(db) => {
                    let db = Arc::new(db);
                    *slot = Some(Arc::clone(&db));
                    db
                }
                None => return Ok(None),
            },
        };

        Ok(Some(ReaderGuard {
            driver: self,
            db: Some(db),
        }))
    }

    fn release_reader(&self, db: Arc<Database>) {
        let mut slot = self.reader.lock();
        drop(db);
        if slot.as_ref().is_some_and(|db| Arc::strong_count(db) == 1) {
            *slot = None;
        }
    }
}

impl Driver for SharedDriver {
    fn view<O: ViewOp + ?Sized>(&self, ctx: &Context, op: &mut O) -> CoreResult<bool> {
        let started = Instant::now();
        let state = self.read_state(ctx, started)?;
        state.ensure_open()?;

        let Some(reader) = self.acquire_reader(&state.config, ctx, started)? else {
            tracing::trace!(path = %state.config.path.display(), "store file does not exist");
            return Ok(false);
        };

        reader.view(ctx, op)
    }

    fn update<O: UpdateOp + ?Sized>(&self, ctx: &Context, op: &mut O) -> CoreResult<()> {
        let started = Instant::now();
        let state = self.write_state(ctx, started)?;
        state.ensure_open()?;

        let db = open_write(&state.config, ctx)?;
        run_update(&db, ctx, op)
    }

    fn close(&self) -> CoreResult<()> {
        let mut state = self.state.write();
        if !state.closed {
            state.closed = true;
            tracing::debug!(path = %state.config.path.display(), "driver closed");
        }
        Ok(())
    }
}

impl std::fmt::Debug for SharedDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedDriver")
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

/// Keeps the shared read handle alive for one view.
struct ReaderGuard<'a> {
    driver: &'a SharedDriver,
    db: Option<Arc<Database>>,
}

impl ReaderGuard<'_> {
    fn view<O: ViewOp + ?Sized>(&self, ctx: &Context, op: &mut O) -> CoreResult<bool> {
        match &self.db {
            Some(db) => run_view(db, ctx, op),
            None => Err(CoreError::DatabaseClosed),
        }
    }
}

impl Drop for ReaderGuard<'_> {
    fn drop(&mut self) {
        if let Some(db) = self.db.take() {
            self.driver.release_reader(db);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::ops::{OpFetchAll, OpLoad, OpSave};
    use crate::store::WriteStore;
    use redb::{ReadTransaction, WriteTransaction};
    use std::sync::mpsc;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn driver(dir: &TempDir) -> SharedDriver {
        SharedDriver::new(DriverConfig::new(dir.path().join("store.redb")))
    }

    fn save(driver: &SharedDriver, doc: Document) -> Document {
        let mut op = OpSave::new("ns", vec![doc]);
        driver.update(&Context::background(), &mut op).unwrap();
        op.saved.pop().unwrap()
    }

    #[test]
    fn view_on_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let driver = driver(&dir);

        let mut op = OpLoad::new("ns", "doc1");
        assert!(!driver.view(&Context::background(), &mut op).unwrap());
        assert!(op.document.is_none());
        assert!(!dir.path().join("store.redb").exists());
    }

    #[test]
    fn update_then_view() {
        let dir = TempDir::new().unwrap();
        let driver = driver(&dir);
        let saved = save(&driver, Document::new("doc1", b"hello".to_vec()));

        let mut op = OpLoad::new("ns", "doc1");
        assert!(driver.view(&Context::background(), &mut op).unwrap());
        assert_eq!(op.document, Some(saved));

        let mut op = OpLoad::new("other", "doc1");
        assert!(!driver.view(&Context::background(), &mut op).unwrap());
    }

    #[test]
    fn failed_update_rolls_back() {
        let dir = TempDir::new().unwrap();
        let driver = driver(&dir);

        let result = driver.update(&Context::background(), &mut |_: &Context, tx: &WriteTransaction| -> CoreResult<()> {
            let mut store = WriteStore::create(tx, "ns")?;
            store.put_content(&"doc1".into(), b"partial")?;
            Err(CoreError::corruption("simulated failure"))
        });
        assert!(matches!(result, Err(CoreError::Corruption { .. })));

        let mut op = OpFetchAll::new("ns");
        assert!(!driver.view(&Context::background(), &mut op).unwrap());
        assert!(op.documents.is_empty());
    }

    #[test]
    fn closed_driver_rejects_operations() {
        let dir = TempDir::new().unwrap();
        let driver = driver(&dir);
        save(&driver, Document::new("doc1", Vec::new()));

        driver.close().unwrap();
        driver.close().unwrap();
        assert!(driver.is_closed());

        for _ in 0..2 {
            let mut load = OpLoad::new("ns", "doc1");
            assert!(matches!(
                driver.view(&Context::background(), &mut load),
                Err(CoreError::DatabaseClosed)
            ));
            let mut op = OpSave::new("ns", vec![Document::new("doc2", Vec::new())]);
            assert!(matches!(
                driver.update(&Context::background(), &mut op),
                Err(CoreError::DatabaseClosed)
            ));
        }
    }

    #[test]
    fn file_is_released_between_operations() {
        let dir = TempDir::new().unwrap();
        let first = driver(&dir);
        let second = driver(&dir);
        let ctx = Context::background().with_timeout(Duration::from_secs(5));

        save(&first, Document::new("a", Vec::new()));
        let mut op = OpSave::new("ns", vec![Document::new("b", Vec::new())]);
        second.update(&ctx, &mut op).unwrap();

        let mut all = OpFetchAll::new("ns");
        assert!(first.view(&ctx, &mut all).unwrap());
        assert_eq!(all.documents.len(), 2);
    }

    #[test]
    fn concurrent_views_share_the_handle() {
        let dir = TempDir::new().unwrap();
        let driver = driver(&dir);
        save(&driver, Document::new("doc1", Vec::new()));

        let barrier = Barrier::new(3);
        thread::scope(|s| {
            for _ in 0..3 {
                s.spawn(|| {
                    let ctx = Context::background().with_timeout(Duration::from_secs(5));
                    let found = driver
                        .view(&ctx, &mut |_: &Context, _: &ReadTransaction| -> CoreResult<bool> {
                            // every view is inside its transaction at once
                            barrier.wait();
                            Ok(true)
                        })
                        .unwrap();
                    assert!(found);
                });
            }
        });

        assert!(driver.reader.lock().is_none());
    }

    #[test]
    fn deadline_bounds_wait_for_other_process() {
        let dir = TempDir::new().unwrap();
        let holder = driver(&dir);
        let waiter = driver(&dir);
        save(&holder, Document::new("doc1", Vec::new()));

        let (held_tx, held_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        thread::scope(|s| {
            let holder = &holder;
            s.spawn(move || {
                holder
                    .update(&Context::background(), &mut |_: &Context, _: &WriteTransaction| -> CoreResult<()> {
                        held_tx.send(()).unwrap();
                        release_rx.recv().unwrap();
                        Ok(())
                    })
                    .unwrap();
            });

            held_rx.recv().unwrap();
            let ctx = Context::background().with_timeout(Duration::from_millis(100));
            let mut op = OpLoad::new("ns", "doc1");
            let err = waiter.view(&ctx, &mut op).unwrap_err();
            assert!(matches!(err, CoreError::LockTimeout { .. }), "{err}");
            release_tx.send(()).unwrap();
        });

        let mut op = OpLoad::new("ns", "doc1");
        assert!(waiter.view(&Context::background(), &mut op).unwrap());
    }

    #[test]
    fn cancel_aborts_pending_open() {
        let dir = TempDir::new().unwrap();
        let holder = driver(&dir);
        let waiter = driver(&dir);
        save(&holder, Document::new("doc1", Vec::new()));

        let (held_tx, held_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (ctx, cancel) = Context::background().with_cancel();

        thread::scope(|s| {
            let holder = &holder;
            s.spawn(move || {
                holder
                    .update(&Context::background(), &mut |_: &Context, _: &WriteTransaction| -> CoreResult<()> {
                        held_tx.send(()).unwrap();
                        release_rx.recv().unwrap();
                        Ok(())
                    })
                    .unwrap();
            });

            held_rx.recv().unwrap();
            let canceller = s.spawn(move || {
                thread::sleep(Duration::from_millis(50));
                cancel.cancel();
            });

            let mut op = OpSave::new("ns", vec![Document::new("doc2", Vec::new())]);
            let err = waiter.update(&ctx, &mut op).unwrap_err();
            assert!(matches!(err, CoreError::Cancelled), "{err}");

            canceller.join().unwrap();
            release_tx.send(()).unwrap();
        });

        let mut op = OpLoad::new("ns", "doc2");
        assert!(!holder.view(&Context::background(), &mut op).unwrap());
    }

    #[test]
    fn options_timeout_applies_without_deadline() {
        let dir = TempDir::new().unwrap();
        let holder = driver(&dir);
        let waiter = driver(&dir);
        waiter.set_options(Some(
            EngineOptions::new()
                .timeout(Duration::from_millis(50))
                .lock_poll_interval(Duration::from_millis(5)),
        ));
        save(&holder, Document::new("doc1", Vec::new()));

        let (held_tx, held_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        thread::scope(|s| {
            let holder = &holder;
            s.spawn(move || {
                holder
                    .update(&Context::background(), &mut |_: &Context, _: &WriteTransaction| -> CoreResult<()> {
                        held_tx.send(()).unwrap();
                        release_rx.recv().unwrap();
                        Ok(())
                    })
                    .unwrap();
            });

            held_rx.recv().unwrap();
            let mut op = OpSave::new("ns", vec![Document::new("doc2", Vec::new())]);
            assert!(matches!(
                waiter.update(&Context::background(), &mut op),
                Err(CoreError::LockTimeout { .. })
            ));
            release_tx.send(()).unwrap();
        });
    }
}
