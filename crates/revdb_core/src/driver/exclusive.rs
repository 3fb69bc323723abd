//! Driver that holds the store file open until closed.

use super::open::open_write;
use super::{run_update, run_view, Driver};
use crate::config::DriverConfig;
use crate::context::Context;
use crate::error::{CoreError, CoreResult};
use crate::ops::{UpdateOp, ViewOp};
use parking_lot::RwLock;
use redb::Database;
use std::path::{Path, PathBuf};

/// A driver that holds the store file open, and locked, from
/// [`open`](Self::open) until [`close`](Driver::close).
///
/// Other drivers, in this or another process, wait for the file until this
/// driver is closed. Operations run concurrently on the held handle; the
/// engine serializes writers.
pub struct ExclusiveDriver {
    path: PathBuf,
    db: RwLock<Option<Database>>,
}

impl ExclusiveDriver {
    /// Opens the store file, creating it if needed, and keeps it locked.
    pub fn open(config: DriverConfig, ctx: &Context) -> CoreResult<Self> {
        let db = open_write(&config, ctx)?;
        tracing::debug!(path = %config.path.display(), "opened store exclusively");
        Ok(Self {
            path: config.path,
            db: RwLock::new(Some(db)),
        })
    }

    /// Path of the held store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true once the driver has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.db.read().is_none()
    }
}

impl Driver for ExclusiveDriver {
    fn view<O: ViewOp + ?Sized>(&self, ctx: &Context, op: &mut O) -> CoreResult<bool> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(CoreError::DatabaseClosed)?;
        run_view(db, ctx, op)
    }

    fn update<O: UpdateOp + ?Sized>(&self, ctx: &Context, op: &mut O) -> CoreResult<()> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(CoreError::DatabaseClosed)?;
        run_update(db, ctx, op)
    }

    fn close(&self) -> CoreResult<()> {
        if self.db.write().take().is_some() {
            tracing::debug!(path = %self.path.display(), "released store");
        }
        Ok(())
    }
}

impl std::fmt::Debug for ExclusiveDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExclusiveDriver")
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .finish()
    }
}
