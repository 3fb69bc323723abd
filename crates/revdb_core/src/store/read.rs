//! Namespace store over a read transaction.

use super::{read_all, read_content, read_key, read_record, Record, StoreRead, TableNames};
use crate::error::CoreResult;
use crate::types::DocumentId;
use redb::{ReadOnlyMultimapTable, ReadOnlyTable, ReadTransaction, TableError};

/// Read-only view of one namespace.
pub struct ReadStore {
    namespace: String,
    records: ReadOnlyTable<&'static str, &'static [u8]>,
    content: ReadOnlyTable<&'static str, &'static [u8]>,
    keys: ReadOnlyMultimapTable<&'static str, &'static str>,
}

impl ReadStore {
    /// Opens namespace `ns`.
    ///
    /// Returns `None` if the namespace has never been written to.
    pub fn open(tx: &ReadTransaction, ns: &str) -> CoreResult<Option<Self>> {
        let names = TableNames::for_namespace(ns);

        let records = match tx.open_table(names.records_def()) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let content = tx.open_table(names.content_def())?;
        let keys = tx.open_multimap_table(names.keys_def())?;

        Ok(Some(Self {
            namespace: ns.to_string(),
            records,
            content,
            keys,
        }))
    }
}

impl StoreRead for ReadStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn try_get_record(&self, id: &DocumentId) -> CoreResult<Option<Record>> {
        read_record(&self.records, id.as_str())
    }

    fn get_content(&self, id: &DocumentId) -> CoreResult<Vec<u8>> {
        read_content(&self.content, &self.namespace, id.as_str())
    }

    fn ids_for_key(&self, key: &str) -> CoreResult<Vec<DocumentId>> {
        read_key(&self.keys, key)
    }

    fn records(&self) -> CoreResult<Vec<Record>> {
        read_all(&self.records)
    }
}

impl std::fmt::Debug for ReadStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
