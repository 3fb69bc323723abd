use super::{check_revision, UpdateOp};
use crate::context::Context;
use crate::document::Document;
use crate::error::CoreResult;
use crate::store::{revision_of, StoreRead, WriteStore};
use redb::WriteTransaction;

/// Deletes `doc`, provided its revision matches the persisted revision.
///
/// The revision is checked even when the namespace or the record does not
/// exist: an absent document has revision `UNSET`, so deleting it with any
/// other revision is a lock conflict, while deleting it with `UNSET` is a
/// no-op.
pub fn execute_delete(tx: &WriteTransaction, ns: &str, doc: &Document) -> CoreResult<()> {
    let mut store = WriteStore::open(tx, ns)?;

    let record = match &store {
        Some(store) => store.try_get_record(&doc.id)?,
        None => None,
    };

    check_revision(&doc.id, doc.revision, revision_of(record.as_ref()), "delete")?;

    let (Some(store), Some(record)) = (store.as_mut(), record) else {
        return Ok(());
    };

    store.delete_record(&doc.id)?;
    store.delete_content(&doc.id)?;
    store.update_keys(&doc.id, &record.keys, None)?;

    tracing::debug!(namespace = ns, document_id = %doc.id, "deleted document");
    Ok(())
}

/// Deletes a batch of documents in one transaction.
#[derive(Debug, Clone)]
pub struct OpDelete {
    /// Target namespace.
    pub namespace: String,
    /// Documents to delete, each carrying the caller's revision.
    pub documents: Vec<Document>,
}

impl OpDelete {
    /// Creates a delete operation.
    #[must_use]
    pub fn new(namespace: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            namespace: namespace.into(),
            documents,
        }
    }
}

impl UpdateOp for OpDelete {
    fn update(&mut self, ctx: &Context, tx: &WriteTransaction) -> CoreResult<()> {
        for doc in &self.documents {
            ctx.check()?;
            execute_delete(tx, &self.namespace, doc)?;
        }
        Ok(())
    }
}
