//! Typed document API over a driver.

use crate::context::Context;
use crate::document::Document;
use crate::driver::Driver;
use crate::error::{CoreError, CoreResult};
use crate::ops::{OpDelete, OpFetchAll, OpFetchByKey, OpLoad, OpLoadMany, OpSave};
use crate::types::{DocumentId, Revision};

/// Document store over any [`Driver`].
///
/// Each method runs one operation, and so one engine transaction. Batch
/// methods apply all documents or none of them.
///
/// # Example
///
/// ```rust,ignore
/// use revdb_core::{Context, DocStore, Document, DriverConfig, SharedDriver};
///
/// let store = DocStore::new(SharedDriver::new(DriverConfig::new("app.redb")));
/// let ctx = Context::background();
///
/// let saved = store.save(&ctx, "users", Document::new("alice", b"{}".to_vec()))?;
/// store.delete(&ctx, "users", saved.id.clone(), saved.revision)?;
/// ```
#[derive(Debug)]
pub struct DocStore<D: Driver> {
    driver: D,
}

impl<D: Driver> DocStore<D> {
    /// Wraps a driver.
    pub const fn new(driver: D) -> Self {
        Self { driver }
    }

    /// Returns the underlying driver.
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Unwraps the underlying driver.
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Loads a document, returning `None` if it does not exist.
    pub fn load(
        &self,
        ctx: &Context,
        namespace: &str,
        id: impl Into<DocumentId>,
    ) -> CoreResult<Option<Document>> {
        let mut op = OpLoad::new(namespace, id);
        self.driver.view(ctx, &mut op)?;
        Ok(op.document)
    }

    /// Loads the given documents, skipping the ones that do not exist.
    pub fn load_many(
        &self,
        ctx: &Context,
        namespace: &str,
        ids: Vec<DocumentId>,
    ) -> CoreResult<Vec<Document>> {
        let mut op = OpLoadMany::new(namespace, ids);
        self.driver.view(ctx, &mut op)?;
        Ok(op.documents)
    }

    /// Returns every document of a namespace in ID order.
    pub fn fetch_all(&self, ctx: &Context, namespace: &str) -> CoreResult<Vec<Document>> {
        let mut op = OpFetchAll::new(namespace);
        self.driver.view(ctx, &mut op)?;
        Ok(op.documents)
    }

    /// Returns the documents currently holding `key`, in ID order.
    pub fn fetch_by_key(
        &self,
        ctx: &Context,
        namespace: &str,
        key: &str,
    ) -> CoreResult<Vec<Document>> {
        let mut op = OpFetchByKey::new(namespace, key);
        self.driver.view(ctx, &mut op)?;
        Ok(op.documents)
    }

    /// Saves a document and returns it with its new revision.
    pub fn save(&self, ctx: &Context, namespace: &str, doc: Document) -> CoreResult<Document> {
        let id = doc.id.clone();
        self.save_many(ctx, namespace, vec![doc])?
            .pop()
            .ok_or_else(|| CoreError::corruption(format!("save of {id} returned no document")))
    }

    /// Saves several documents in one transaction.
    pub fn save_many(
        &self,
        ctx: &Context,
        namespace: &str,
        docs: Vec<Document>,
    ) -> CoreResult<Vec<Document>> {
        let mut op = OpSave::new(namespace, docs);
        self.driver.update(ctx, &mut op)?;
        Ok(op.saved)
    }

    /// Deletes a document, provided `revision` is its current revision.
    pub fn delete(
        &self,
        ctx: &Context,
        namespace: &str,
        id: impl Into<DocumentId>,
        revision: Revision,
    ) -> CoreResult<()> {
        let doc = Document::new(id, Vec::new()).with_revision(revision);
        self.delete_many(ctx, namespace, vec![doc])
    }

    /// Deletes several documents in one transaction. Each document's
    /// revision must match the persisted one.
    pub fn delete_many(&self, ctx: &Context, namespace: &str, docs: Vec<Document>) -> CoreResult<()> {
        let mut op = OpDelete::new(namespace, docs);
        self.driver.update(ctx, &mut op)
    }

    /// Closes the underlying driver.
    pub fn close(&self) -> CoreResult<()> {
        self.driver.close()
    }
}
