//! Namespace store over a write transaction.

use super::{read_all, read_content, read_key, read_record, Record, StoreRead, TableNames};
use crate::error::{CoreError, CoreResult};
use crate::types::{DocumentId, KeyType, Keys};
use redb::{MultimapTable, Table, TableHandle, WriteTransaction};

/// Read-write view of one namespace.
///
/// All mutations are part of the transaction the store was opened from.
pub struct WriteStore<'tx> {
    namespace: String,
    records: Table<'tx, &'static str, &'static [u8]>,
    content: Table<'tx, &'static str, &'static [u8]>,
    keys: MultimapTable<'tx, &'static str, &'static str>,
}

impl<'tx> WriteStore<'tx> {
    /// Opens namespace `ns` if it exists.
    ///
    /// Returns `None` without creating anything if the namespace has never
    /// been written to.
    pub fn open(tx: &'tx WriteTransaction, ns: &str) -> CoreResult<Option<Self>> {
        let names = TableNames::for_namespace(ns);
        let exists = tx.list_tables()?.any(|t| t.name() == names.records);
        if !exists {
            return Ok(None);
        }
        Self::open_tables(tx, ns, &names).map(Some)
    }

    /// Opens namespace `ns`, creating its tables on first use.
    pub fn create(tx: &'tx WriteTransaction, ns: &str) -> CoreResult<Self> {
        let names = TableNames::for_namespace(ns);
        Self::open_tables(tx, ns, &names)
    }

    fn open_tables(tx: &'tx WriteTransaction, ns: &str, names: &TableNames) -> CoreResult<Self> {
        Ok(Self {
            namespace: ns.to_string(),
            records: tx.open_table(names.records_def())?,
            content: tx.open_table(names.content_def())?,
            keys: tx.open_multimap_table(names.keys_def())?,
        })
    }

    /// Writes the record of a document.
    pub fn put_record(&mut self, record: &Record) -> CoreResult<()> {
        let bytes = record.encode()?;
        self.records.insert(record.id.as_str(), bytes.as_slice())?;
        Ok(())
    }

    /// Writes the content blob of a document.
    pub fn put_content(&mut self, id: &DocumentId, content: &[u8]) -> CoreResult<()> {
        self.content.insert(id.as_str(), content)?;
        Ok(())
    }

    /// Removes the record of `id`, which must exist.
    pub fn delete_record(&mut self, id: &DocumentId) -> CoreResult<()> {
        if self.records.remove(id.as_str())?.is_none() {
            return Err(self.missing("record", id));
        }
        Ok(())
    }

    /// Removes the content of `id`, which must exist.
    pub fn delete_content(&mut self, id: &DocumentId) -> CoreResult<()> {
        if self.content.remove(id.as_str())?.is_none() {
            return Err(self.missing("content", id));
        }
        Ok(())
    }

    /// Replaces the index entries owned by `id`.
    ///
    /// Entries for keys in `old_keys` that are absent from `new_keys` are
    /// removed, then every key of `new_keys` is indexed. `None` removes all
    /// of the document's entries.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateKey`] if a new key is held by another
    /// document and either side holds it as [`KeyType::Unique`].
    pub fn update_keys(
        &mut self,
        id: &DocumentId,
        old_keys: &Keys,
        new_keys: Option<&Keys>,
    ) -> CoreResult<()> {
        for key in old_keys.keys() {
            if new_keys.is_some_and(|new| new.contains_key(key)) {
                continue;
            }
            if !self.keys.remove(key.as_str(), id.as_str())? {
                return Err(CoreError::corruption(format!(
                    "document {id} in namespace {:?} lists key {key:?} but is not indexed under it",
                    self.namespace
                )));
            }
        }

        for (key, kind) in new_keys.into_iter().flatten() {
            self.check_key(id, key, *kind)?;
            self.keys.insert(key.as_str(), id.as_str())?;
        }

        Ok(())
    }

    fn check_key(&self, id: &DocumentId, key: &str, kind: KeyType) -> CoreResult<()> {
        for holder in read_key(&self.keys, key)? {
            if holder == *id {
                continue;
            }

            let conflict = match kind {
                KeyType::Unique => true,
                KeyType::Shared => {
                    let record = read_record(&self.records, holder.as_str())?.ok_or_else(|| {
                        CoreError::corruption(format!(
                            "key {key:?} in namespace {:?} points at missing document {holder}",
                            self.namespace
                        ))
                    })?;
                    record.keys.get(key) == Some(&KeyType::Unique)
                }
            };

            if conflict {
                return Err(CoreError::DuplicateKey {
                    key: key.to_string(),
                    holder,
                });
            }
        }
        Ok(())
    }

    fn missing(&self, what: &str, id: &DocumentId) -> CoreError {
        CoreError::corruption(format!(
            "{what} of document {id} in namespace {:?} does not exist",
            self.namespace
        ))
    }
}

impl StoreRead for WriteStore<'_> {
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

impl std::fmt::Debug for WriteStore<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ReadStore;
    use crate::types::{Headers, Revision};
    use redb::Database;
    use tempfile::TempDir;

    fn temp_db() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::create(dir.path().join("store.redb")).unwrap();
        (dir, db)
    }

    fn keys(entries: &[(&str, KeyType)]) -> Keys {
        entries
            .iter()
            .map(|(k, t)| ((*k).to_string(), *t))
            .collect()
    }

    fn record(id: &str, rev: u64, keys: Keys) -> Record {
        Record {
            id: DocumentId::new(id),
            revision: Revision::new(rev),
            keys,
            headers: Headers::new(),
            created_at: 1,
            updated_at: 1,
        }
    }

    fn insert(store: &mut WriteStore<'_>, rec: &Record, content: &[u8]) {
        store.update_keys(&rec.id, &Keys::new(), Some(&rec.keys)).unwrap();
        store.put_record(rec).unwrap();
        store.put_content(&rec.id, content).unwrap();
    }

    #[test]
    fn open_missing_namespace() {
        let (_dir, db) = temp_db();

        let tx = db.begin_write().unwrap();
        assert!(WriteStore::open(&tx, "users").unwrap().is_none());
        tx.commit().unwrap();

        let tx = db.begin_read().unwrap();
        assert!(ReadStore::open(&tx, "users").unwrap().is_none());
    }

    #[test]
    fn rolled_back_create_leaves_no_namespace() {
        let (_dir, db) = temp_db();

        let tx = db.begin_write().unwrap();
        drop(WriteStore::create(&tx, "users").unwrap());
        tx.abort().unwrap();

        let tx = db.begin_read().unwrap();
        assert!(ReadStore::open(&tx, "users").unwrap().is_none());
    }

    #[test]
    fn put_then_read_back() {
        let (_dir, db) = temp_db();
        let rec = record("doc1", 1, keys(&[("k1", KeyType::Unique)]));

        let tx = db.begin_write().unwrap();
        {
            let mut store = WriteStore::create(&tx, "users").unwrap();
            insert(&mut store, &rec, b"hello");
            assert_eq!(store.try_get_record(&rec.id).unwrap(), Some(rec.clone()));
        }
        tx.commit().unwrap();

        let tx = db.begin_read().unwrap();
        let store = ReadStore::open(&tx, "users").unwrap().unwrap();
        assert_eq!(store.namespace(), "users");
        assert_eq!(store.try_get_record(&rec.id).unwrap(), Some(rec.clone()));
        assert_eq!(store.get_content(&rec.id).unwrap(), b"hello");
        assert_eq!(store.ids_for_key("k1").unwrap(), vec![rec.id.clone()]);
        assert_eq!(store.records().unwrap().len(), 1);

        let doc = store.load(&rec.id).unwrap().unwrap();
        assert_eq!(doc.revision, Revision::new(1));
        assert!(store.load(&DocumentId::new("other")).unwrap().is_none());
    }

    #[test]
    fn update_keys_replaces_entries() {
        let (_dir, db) = temp_db();
        let id = DocumentId::new("doc1");
        let old = keys(&[("a", KeyType::Shared), ("b", KeyType::Shared)]);
        let new = keys(&[("b", KeyType::Shared), ("c", KeyType::Unique)]);

        let tx = db.begin_write().unwrap();
        {
            let mut store = WriteStore::create(&tx, "ns").unwrap();
            store.update_keys(&id, &Keys::new(), Some(&old)).unwrap();
            store.update_keys(&id, &old, Some(&new)).unwrap();

            assert!(store.ids_for_key("a").unwrap().is_empty());
            assert_eq!(store.ids_for_key("b").unwrap(), vec![id.clone()]);
            assert_eq!(store.ids_for_key("c").unwrap(), vec![id.clone()]);

            store.update_keys(&id, &new, None).unwrap();
            assert!(store.ids_for_key("b").unwrap().is_empty());
            assert!(store.ids_for_key("c").unwrap().is_empty());
        }
        tx.commit().unwrap();
    }

    #[test]
    fn shared_keys_hold_many_documents() {
        let (_dir, db) = temp_db();

        let tx = db.begin_write().unwrap();
        {
            let mut store = WriteStore::create(&tx, "ns").unwrap();
            insert(&mut store, &record("a", 1, keys(&[("tag", KeyType::Shared)])), b"");
            insert(&mut store, &record("b", 1, keys(&[("tag", KeyType::Shared)])), b"");

            let ids = store.ids_for_key("tag").unwrap();
            assert_eq!(ids, vec![DocumentId::new("a"), DocumentId::new("b")]);
        }
        tx.commit().unwrap();
    }

    #[test]
    fn unique_key_conflicts() {
        let (_dir, db) = temp_db();

        let tx = db.begin_write().unwrap();
        {
            let mut store = WriteStore::create(&tx, "ns").unwrap();
            insert(&mut store, &record("a", 1, keys(&[("email", KeyType::Unique)])), b"");

            let err = store
                .update_keys(&DocumentId::new("b"), &Keys::new(), Some(&keys(&[("email", KeyType::Unique)])))
                .unwrap_err();
            assert!(matches!(
                err,
                CoreError::DuplicateKey { ref key, ref holder } if key == "email" && holder.as_str() == "a"
            ));

            let err = store
                .update_keys(&DocumentId::new("b"), &Keys::new(), Some(&keys(&[("email", KeyType::Shared)])))
                .unwrap_err();
            assert!(matches!(err, CoreError::DuplicateKey { .. }));

            // re-indexing the holder's own key is fine
            let own = keys(&[("email", KeyType::Unique)]);
            store.update_keys(&DocumentId::new("a"), &own, Some(&own)).unwrap();
        }
        tx.commit().unwrap();
    }

    #[test]
    fn delete_requires_existing_entries() {
        let (_dir, db) = temp_db();
        let id = DocumentId::new("ghost");

        let tx = db.begin_write().unwrap();
        {
            let mut store = WriteStore::create(&tx, "ns").unwrap();
            assert!(matches!(
                store.delete_record(&id),
                Err(CoreError::Corruption { .. })
            ));
            assert!(matches!(
                store.delete_content(&id),
                Err(CoreError::Corruption { .. })
            ));
            assert!(matches!(
                store.update_keys(&id, &keys(&[("k", KeyType::Shared)]), None),
                Err(CoreError::Corruption { .. })
            ));
        }
        tx.abort().unwrap();
    }

    #[test]
    fn delete_removes_entries() {
        let (_dir, db) = temp_db();
        let rec = record("doc1", 1, keys(&[("k1", KeyType::Unique)]));

        let tx = db.begin_write().unwrap();
        {
            let mut store = WriteStore::create(&tx, "ns").unwrap();
            insert(&mut store, &rec, b"x");
        }
        tx.commit().unwrap();

        let tx = db.begin_write().unwrap();
        {
            let mut store = WriteStore::open(&tx, "ns").unwrap().unwrap();
            store.delete_record(&rec.id).unwrap();
            store.delete_content(&rec.id).unwrap();
            store.update_keys(&rec.id, &rec.keys, None).unwrap();
        }
        tx.commit().unwrap();

        let tx = db.begin_read().unwrap();
        let store = ReadStore::open(&tx, "ns").unwrap().unwrap();
        assert!(store.try_get_record(&rec.id).unwrap().is_none());
        assert!(store.ids_for_key("k1").unwrap().is_empty());
        assert!(store.records().unwrap().is_empty());
    }
}
