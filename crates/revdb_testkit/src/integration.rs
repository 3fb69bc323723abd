//! Model-checking harness for document and index consistency.
//!
//! [`ModelHarness`] applies operations to a real store and to an in-memory
//! model side by side, asserting that every outcome matches and that the
//! secondary key index always agrees with the documents' keys.

use crate::fixtures::{test_context, TestStore};
use crate::generators::DocOperation;
use revdb_core::{CoreError, Document, DocumentId, KeyType, Keys, Revision};
use std::collections::{BTreeMap, BTreeSet};

/// Outcome expected from one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    /// The operation succeeds.
    Ok,
    /// The operation fails with an optimistic lock conflict.
    Conflict,
    /// The save fails because a key is already held.
    DuplicateKey,
}

/// A test harness pairing a store with a model of its contents.
pub struct ModelHarness {
    /// The store under test.
    pub store: TestStore,
    namespace: String,
    model: BTreeMap<DocumentId, Document>,
}

impl ModelHarness {
    /// Creates a harness over a fresh store.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            store: TestStore::new(),
            namespace: namespace.into(),
            model: BTreeMap::new(),
        }
    }

    /// Returns the number of documents the model holds.
    pub fn tracked_count(&self) -> usize {
        self.model.len()
    }

    /// Applies one operation to the store and the model.
    pub fn apply(&mut self, op: &DocOperation) {
        let ctx = test_context();
        match op {
            DocOperation::Save {
                id,
                keys,
                content,
                stale,
            } => {
                let revision = self.revision_to_send(id, *stale);
                let expected = if *stale {
                    Expected::Conflict
                } else if self.key_conflict(id, keys) {
                    Expected::DuplicateKey
                } else {
                    Expected::Ok
                };

                let mut doc = Document::new(id.clone(), content.clone()).with_revision(revision);
                doc.keys = keys.clone();
                let result = self.store.save(&ctx, &self.namespace, doc);
                check_outcome(op, &expected, result.as_ref().map(|_| ()));

                if let Ok(saved) = result {
                    assert_eq!(saved.revision, revision.next().expect("revision overflow"));
                    self.model.insert(id.clone(), saved);
                }
            }
            DocOperation::Delete { id, stale } => {
                let revision = self.revision_to_send(id, *stale);
                let expected = if *stale {
                    Expected::Conflict
                } else {
                    Expected::Ok
                };

                let result = self.store.delete(&ctx, &self.namespace, id.clone(), revision);
                check_outcome(op, &expected, result.as_ref().map(|_| ()));

                if result.is_ok() {
                    self.model.remove(id);
                }
            }
            DocOperation::Load { id } => {
                let loaded = self
                    .store
                    .load(&ctx, &self.namespace, id.clone())
                    .expect("Failed to load document");
                assert_eq!(loaded.as_ref(), self.model.get(id), "load of {id}");
            }
        }
    }

    /// Verifies that the store holds exactly the model's documents and that
    /// every key maps to exactly the documents holding it.
    pub fn verify(&self) {
        let ctx = test_context();

        let stored = self
            .store
            .fetch_all(&ctx, &self.namespace)
            .expect("Failed to fetch documents");
        let expected: Vec<&Document> = self.model.values().collect();
        assert_eq!(stored.iter().collect::<Vec<_>>(), expected);

        let mut holders: BTreeMap<&str, BTreeSet<&DocumentId>> = BTreeMap::new();
        for doc in self.model.values() {
            for key in doc.keys.keys() {
                holders.entry(key.as_str()).or_default().insert(&doc.id);
            }
        }

        for (key, ids) in &holders {
            let indexed = self
                .store
                .fetch_by_key(&ctx, &self.namespace, key)
                .expect("Failed to fetch by key");
            let indexed: BTreeSet<&DocumentId> = indexed.iter().map(|d| &d.id).collect();
            assert_eq!(&indexed, ids, "index entries for key {key:?}");
        }
    }

    /// Verifies that none of `keys` has an index entry left.
    pub fn verify_unindexed<'a>(&self, keys: impl IntoIterator<Item = &'a str>) {
        let ctx = test_context();
        for key in keys {
            if self.model.values().any(|doc| doc.keys.contains_key(key)) {
                continue;
            }
            let indexed = self
                .store
                .fetch_by_key(&ctx, &self.namespace, key)
                .expect("Failed to fetch by key");
            assert!(indexed.is_empty(), "stale index entries for key {key:?}");
        }
    }

    fn revision_to_send(&self, id: &DocumentId, stale: bool) -> Revision {
        let current = self.model.get(id).map_or(Revision::UNSET, |doc| doc.revision);
        if stale {
            Revision::new(current.as_u64() + 1)
        } else {
            current
        }
    }

    fn key_conflict(&self, id: &DocumentId, keys: &Keys) -> bool {
        keys.iter().any(|(key, kind)| {
            self.model.values().any(|other| {
                other.id != *id
                    && other.keys.get(key).is_some_and(|held| {
                        *kind == KeyType::Unique || *held == KeyType::Unique
                    })
            })
        })
    }
}

fn check_outcome(op: &DocOperation, expected: &Expected, result: Result<(), &CoreError>) {
    match (expected, result) {
        (Expected::Ok, Ok(())) => {}
        (Expected::Conflict, Err(e)) if e.as_optimistic_lock().is_some() => {}
        (Expected::DuplicateKey, Err(CoreError::DuplicateKey { .. })) => {}
        (expected, result) => panic!("{op:?}: expected {expected:?}, got {result:?}"),
    }
}
