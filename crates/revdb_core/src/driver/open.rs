//! Opening the store file.
//!
//! The engine takes an exclusive lock on the file for as long as a handle is
//! open. Opening therefore polls for the lock until it is free, the
//! deadline passes, or the context is cancelled.

use crate::config::{DriverConfig, EngineOptions};
use crate::context::Context;
use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use redb::{Builder, Database, DatabaseError};
use std::fs::{File, OpenOptions};
use std::io;
use std::thread;
use std::time::Instant;

/// Outcome of one attempt to open the file.
enum Attempt<T> {
    Ready(T),
    Contended,
}

/// Opens the store for reading.
///
/// Returns `None` if the file does not exist yet (or was created but never
/// initialized); nothing is created on disk in that case.
///
/// The engine only builds on a writable handle, so the file is opened for
/// writing and views need write permission on it. Views never modify it.
pub(crate) fn open_read(config: &DriverConfig, ctx: &Context) -> CoreResult<Option<Database>> {
    let options = config.engine_options();
    wait_for_lock(config, &options, ctx, || {
        let file = match OpenOptions::new().read(true).write(true).open(&config.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Attempt::Ready(None)),
            Err(e) => return Err(e.into()),
        };
        if file.metadata()?.len() == 0 {
            return Ok(Attempt::Ready(None));
        }
        Ok(match build(file, &options)? {
            Attempt::Ready(db) => Attempt::Ready(Some(db)),
            Attempt::Contended => Attempt::Contended,
        })
    })
}

/// Opens the store for reading and writing, creating the file if needed.
pub(crate) fn open_write(config: &DriverConfig, ctx: &Context) -> CoreResult<Database> {
    let options = config.engine_options();
    wait_for_lock(config, &options, ctx, || {
        let mut open = OpenOptions::new();
        open.read(true).write(true).create(true).truncate(false);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            open.mode(config.mode);
        }
        build(open.open(&config.path)?, &options)
    })
}

fn wait_for_lock<T>(
    config: &DriverConfig,
    options: &EngineOptions,
    ctx: &Context,
    mut attempt: impl FnMut() -> CoreResult<Attempt<T>>,
) -> CoreResult<T> {
    let started = Instant::now();
    let deadline = ctx
        .deadline()
        .or_else(|| options.timeout.map(|timeout| started + timeout));

    loop {
        ctx.check()?;

        if let Attempt::Ready(value) = attempt()? {
            tracing::trace!(path = %config.path.display(), waited = ?started.elapsed(), "opened store");
            return Ok(value);
        }

        let now = Instant::now();
        let pause = match deadline {
            Some(deadline) if now >= deadline => {
                tracing::debug!(path = %config.path.display(), "timed out waiting for store lock");
                return Err(CoreError::LockTimeout {
                    path: config.path.clone(),
                    waited: now - started,
                });
            }
            Some(deadline) => options.lock_poll_interval.min(deadline - now),
            None => options.lock_poll_interval,
        };
        thread::sleep(pause);
    }
}

fn build(file: File, options: &EngineOptions) -> CoreResult<Attempt<Database>> {
    match file.try_lock_exclusive() {
        Ok(()) => {}
        Err(e) if is_contended(&e) => return Ok(Attempt::Contended),
        Err(e) => return Err(e.into()),
    }
    // The engine locks the handle itself.
    FileExt::unlock(&file)?;

    let mut builder = Builder::new();
    if let Some(bytes) = options.cache_size {
        builder.set_cache_size(bytes);
    }

    match builder.create_file(file) {
        Ok(db) => Ok(Attempt::Ready(db)),
        Err(DatabaseError::DatabaseAlreadyOpen) => Ok(Attempt::Contended),
        Err(e) => Err(e.into()),
    }
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
