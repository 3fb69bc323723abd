use super::ViewOp;
use crate::context::Context;
use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::store::{ReadStore, StoreRead};
use crate::types::DocumentId;
use redb::ReadTransaction;

/// Loads a document by its ID.
#[derive(Debug, Clone)]
pub struct OpLoad {
    /// Source namespace.
    pub namespace: String,
    /// Document to load.
    pub id: DocumentId,
    /// The loaded document, if found.
    pub document: Option<Document>,
}

impl OpLoad {
    /// Creates a load operation.
    #[must_use]
    pub fn new(namespace: impl Into<String>, id: impl Into<DocumentId>) -> Self {
        Self {
            namespace: namespace.into(),
            id: id.into(),
            document: None,
        }
    }
}

impl ViewOp for OpLoad {
    fn view(&mut self, _ctx: &Context, tx: &ReadTransaction) -> CoreResult<bool> {
        let Some(store) = ReadStore::open(tx, &self.namespace)? else {
            return Ok(false);
        };
        self.document = store.load(&self.id)?;
        Ok(self.document.is_some())
    }
}

/// Loads several documents by ID. Found only if every document exists.
#[derive(Debug, Clone)]
pub struct OpLoadMany {
    /// Source namespace.
    pub namespace: String,
    /// Documents to load.
    pub ids: Vec<DocumentId>,
    /// The documents that exist, in request order.
    pub documents: Vec<Document>,
}

impl OpLoadMany {
    /// Creates a multi-load operation.
    #[must_use]
    pub fn new(namespace: impl Into<String>, ids: Vec<DocumentId>) -> Self {
        Self {
            namespace: namespace.into(),
            ids,
            documents: Vec::new(),
        }
    }
}

impl ViewOp for OpLoadMany {
    fn view(&mut self, _ctx: &Context, tx: &ReadTransaction) -> CoreResult<bool> {
        self.documents.clear();
        let Some(store) = ReadStore::open(tx, &self.namespace)? else {
            return Ok(self.ids.is_empty());
        };
        for id in &self.ids {
            if let Some(doc) = store.load(id)? {
                self.documents.push(doc);
            }
        }
        Ok(self.documents.len() == self.ids.len())
    }
}

/// Fetches every document of a namespace, in ID order.
#[derive(Debug, Clone)]
pub struct OpFetchAll {
    /// Source namespace.
    pub namespace: String,
    /// The fetched documents.
    pub documents: Vec<Document>,
}

impl OpFetchAll {
    /// Creates a fetch-all operation.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            documents: Vec::new(),
        }
    }
}

impl ViewOp for OpFetchAll {
    fn view(&mut self, _ctx: &Context, tx: &ReadTransaction) -> CoreResult<bool> {
        self.documents.clear();
        let Some(store) = ReadStore::open(tx, &self.namespace)? else {
            return Ok(false);
        };
        for record in store.records()? {
            let content = store.get_content(&record.id)?;
            self.documents.push(record.into_document(content));
        }
        Ok(!self.documents.is_empty())
    }
}

/// Fetches the documents indexed under a secondary key, in ID order.
#[derive(Debug, Clone)]
pub struct OpFetchByKey {
    /// Source namespace.
    pub namespace: String,
    /// Key value to look up.
    pub key: String,
    /// The fetched documents.
    pub documents: Vec<Document>,
}

impl OpFetchByKey {
    /// Creates a key lookup operation.
    #[must_use]
    pub fn new(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
            documents: Vec::new(),
        }
    }
}

impl ViewOp for OpFetchByKey {
    fn view(&mut self, _ctx: &Context, tx: &ReadTransaction) -> CoreResult<bool> {
        self.documents.clear();
        let Some(store) = ReadStore::open(tx, &self.namespace)? else {
            return Ok(false);
        };
        for id in store.ids_for_key(&self.key)? {
            let doc = store.load(&id)?.ok_or_else(|| {
                CoreError::corruption(format!(
                    "key {:?} in namespace {:?} points at missing document {id}",
                    self.key, self.namespace
                ))
            })?;
            self.documents.push(doc);
        }
        Ok(!self.documents.is_empty())
    }
}
