//! Namespace stores.
//!
//! A namespace store gives typed access to the records, content blobs and
//! secondary key index of one namespace inside an open engine transaction.
//! [`ReadStore`] wraps a read transaction, [`WriteStore`] a write
//! transaction; both implement [`StoreRead`].
//!
//! Nothing written through a store is visible outside its transaction until
//! the transaction commits.

mod read;
mod record;
mod tables;
mod write;

pub use read::ReadStore;
pub use record::{revision_of, Record};
pub use tables::TableNames;
pub use write::WriteStore;

use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::types::DocumentId;
use redb::{ReadableMultimapTable, ReadableTable};

/// Read access shared by both store kinds.
pub trait StoreRead {
    /// Returns the namespace this store belongs to.
    fn namespace(&self) -> &str;

    /// Returns the current record of `id`, if any.
    fn try_get_record(&self, id: &DocumentId) -> CoreResult<Option<Record>>;

    /// Returns the content blob of `id`.
    ///
    /// Only valid for documents whose record exists.
    fn get_content(&self, id: &DocumentId) -> CoreResult<Vec<u8>>;

    /// Returns the IDs currently indexed under `key`, in ID order.
    fn ids_for_key(&self, key: &str) -> CoreResult<Vec<DocumentId>>;

    /// Returns every record of the namespace, in ID order.
    fn records(&self) -> CoreResult<Vec<Record>>;

    /// Loads the full document for `id`, if it exists.
    fn load(&self, id: &DocumentId) -> CoreResult<Option<Document>> {
        match self.try_get_record(id)? {
            Some(record) => {
                let content = self.get_content(id)?;
                Ok(Some(record.into_document(content)))
            }
            None => Ok(None),
        }
    }
}

fn read_record<T>(records: &T, id: &str) -> CoreResult<Option<Record>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    match records.get(id)? {
        Some(guard) => Record::decode(guard.value()).map(Some),
        None => Ok(None),
    }
}

fn read_content<T>(content: &T, ns: &str, id: &str) -> CoreResult<Vec<u8>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    match content.get(id)? {
        Some(guard) => Ok(guard.value().to_vec()),
        None => Err(CoreError::corruption(format!(
            "document {id} in namespace {ns:?} has a record but no content"
        ))),
    }
}

fn read_key<T>(keys: &T, key: &str) -> CoreResult<Vec<DocumentId>>
where
    T: ReadableMultimapTable<&'static str, &'static str>,
{
    let mut ids = Vec::new();
    for entry in keys.get(key)? {
        ids.push(DocumentId::new(entry?.value()));
    }
    Ok(ids)
}

fn read_all<T>(records: &T) -> CoreResult<Vec<Record>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let mut out = Vec::new();
    for entry in records.iter()? {
        let (_, value) = entry?;
        out.push(Record::decode(value.value())?);
    }
    Ok(out)
}
