//! Operations executed by drivers.
//!
//! An operation runs inside exactly one engine transaction: read operations
//! implement [`ViewOp`] and report whether what they looked for was found,
//! write operations implement [`UpdateOp`]. Any error returned by an update
//! aborts its transaction, so record, content and index changes are applied
//! together or not at all.
//!
//! Closures with the matching signature are operations too:
//!
//! ```rust,ignore
//! driver.update(&ctx, &mut |_: &Context, tx: &WriteTransaction| -> CoreResult<()> {
//!     let mut store = WriteStore::create(tx, "users")?;
//!     // ...
//!     Ok(())
//! })?;
//! ```

mod delete;
mod load;
mod save;

pub use delete::{execute_delete, OpDelete};
pub use load::{OpFetchAll, OpFetchByKey, OpLoad, OpLoadMany};
pub use save::{execute_save, OpSave};

use crate::context::Context;
use crate::error::{CoreResult, OptimisticLockError};
use crate::types::{DocumentId, Revision};
use redb::{ReadTransaction, WriteTransaction};

/// An operation that runs inside a read transaction.
pub trait ViewOp {
    /// Executes the operation, returning true if the requested data exists.
    fn view(&mut self, ctx: &Context, tx: &ReadTransaction) -> CoreResult<bool>;
}

/// An operation that runs inside a read-write transaction.
pub trait UpdateOp {
    /// Executes the operation. Returning an error rolls the transaction back.
    fn update(&mut self, ctx: &Context, tx: &WriteTransaction) -> CoreResult<()>;
}

impl<F> ViewOp for F
where
    F: FnMut(&Context, &ReadTransaction) -> CoreResult<bool>,
{
    fn view(&mut self, ctx: &Context, tx: &ReadTransaction) -> CoreResult<bool> {
        self(ctx, tx)
    }
}

impl<F> UpdateOp for F
where
    F: FnMut(&Context, &WriteTransaction) -> CoreResult<()>,
{
    fn update(&mut self, ctx: &Context, tx: &WriteTransaction) -> CoreResult<()> {
        self(ctx, tx)
    }
}

/// Fails unless `given` matches the persisted revision `actual`.
fn check_revision(
    id: &DocumentId,
    given: Revision,
    actual: Revision,
    operation: &'static str,
) -> CoreResult<()> {
    if given == actual {
        return Ok(());
    }

    tracing::debug!(
        document_id = %id,
        %given,
        %actual,
        operation,
        "optimistic lock conflict"
    );

    Err(OptimisticLockError {
        document_id: id.clone(),
        given,
        actual,
        operation,
    }
    .into())
}
