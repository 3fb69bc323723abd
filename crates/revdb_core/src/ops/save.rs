use super::{check_revision, UpdateOp};
use crate::context::Context;
use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::store::{revision_of, Record, StoreRead, WriteStore};
use crate::types::now_millis;
use redb::WriteTransaction;

/// Creates or updates `doc`, provided its revision matches the persisted one.
///
/// A new document must carry `Revision::UNSET`. On success the returned
/// document carries the new revision and timestamps.
pub fn execute_save(tx: &WriteTransaction, ns: &str, doc: &Document) -> CoreResult<Document> {
    let mut store = WriteStore::create(tx, ns)?;

    let current = store.try_get_record(&doc.id)?;
    let actual = revision_of(current.as_ref());
    check_revision(&doc.id, doc.revision, actual, "save")?;

    let revision = actual.next().ok_or_else(|| CoreError::RevisionOverflow {
        document_id: doc.id.clone(),
    })?;

    let now = now_millis();
    let (created_at, old_keys) = match current {
        Some(record) => (record.created_at, record.keys),
        None => (now, Default::default()),
    };

    store.update_keys(&doc.id, &old_keys, Some(&doc.keys))?;

    let record = Record {
        id: doc.id.clone(),
        revision,
        keys: doc.keys.clone(),
        headers: doc.headers.clone(),
        created_at,
        updated_at: now,
    };
    store.put_record(&record)?;
    store.put_content(&doc.id, &doc.content)?;

    tracing::debug!(
        namespace = ns,
        document_id = %doc.id,
        %revision,
        "saved document"
    );

    Ok(record.into_document(doc.content.clone()))
}

/// Saves a batch of documents in one transaction.
///
/// After a successful update, `saved` holds the persisted documents in input
/// order.
#[derive(Debug, Clone)]
pub struct OpSave {
    /// Target namespace.
    pub namespace: String,
    /// Documents to save, each carrying the caller's revision.
    pub documents: Vec<Document>,
    /// Persisted documents.
    pub saved: Vec<Document>,
}

impl OpSave {
    /// Creates a save operation.
    #[must_use]
    pub fn new(namespace: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            namespace: namespace.into(),
            documents,
            saved: Vec::new(),
        }
    }
}

impl UpdateOp for OpSave {
    fn update(&mut self, ctx: &Context, tx: &WriteTransaction) -> CoreResult<()> {
        let mut saved = Vec::with_capacity(self.documents.len());
        for doc in &self.documents {
            ctx.check()?;
            saved.push(execute_save(tx, &self.namespace, doc)?);
        }
        self.saved = saved;
        Ok(())
    }
}
