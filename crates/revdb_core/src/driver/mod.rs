//! Drivers own access to a store file and run operations against it.
//!
//! - [`SharedDriver`] opens the file only for the duration of each
//!   operation, so cooperating processes can take turns using it.
//! - [`ExclusiveDriver`] opens the file once and keeps it locked until
//!   closed.

mod exclusive;
mod open;
mod shared;

pub use exclusive::ExclusiveDriver;
pub use shared::SharedDriver;

use crate::context::Context;
use crate::error::CoreResult;
use crate::ops::{UpdateOp, ViewOp};
use redb::Database;

/// Executes operations against a store file.
pub trait Driver {
    /// Runs a read-only operation. Returns the operation's found flag.
    fn view<O: ViewOp + ?Sized>(&self, ctx: &Context, op: &mut O) -> CoreResult<bool>;

    /// Runs a read-write operation, committing on success.
    fn update<O: UpdateOp + ?Sized>(&self, ctx: &Context, op: &mut O) -> CoreResult<()>;

    /// Closes the driver. Operations issued afterwards fail with
    /// [`CoreError::DatabaseClosed`](crate::CoreError::DatabaseClosed).
    fn close(&self) -> CoreResult<()>;
}

fn run_view<O: ViewOp + ?Sized>(db: &Database, ctx: &Context, op: &mut O) -> CoreResult<bool> {
    let tx = db.begin_read()?;
    op.view(ctx, &tx)
}

fn run_update<O: UpdateOp + ?Sized>(db: &Database, ctx: &Context, op: &mut O) -> CoreResult<()> {
    let tx = db.begin_write()?;
    match op.update(ctx, &tx) {
        Ok(()) => {
            tx.commit()?;
            Ok(())
        }
        Err(e) => {
            // Keep the operation's error; the abort result is only logged.
            if let Err(abort) = tx.abort() {
                tracing::warn!(error = %abort, "failed to abort transaction");
            }
            Err(e)
        }
    }
}
