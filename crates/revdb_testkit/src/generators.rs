//! Property-based test generators using proptest.
//!
//! Identifiers and keys are drawn from small pools so that generated
//! operation sequences collide on documents and keys often.

use proptest::prelude::*;
use revdb_core::{DocumentId, KeyType, Keys};

/// Strategy for document IDs drawn from `doc0..doc7`.
pub fn document_id_strategy() -> impl Strategy<Value = DocumentId> {
    (0u8..8).prop_map(|n| DocumentId::new(format!("doc{n}")))
}

/// Strategy for valid namespace names.
pub fn namespace_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for key types, biased towards shared keys.
pub fn key_type_strategy() -> impl Strategy<Value = KeyType> {
    prop_oneof![
        3 => Just(KeyType::Shared),
        1 => Just(KeyType::Unique),
    ]
}

/// Strategy for a key set drawn from `k0..k3`.
pub fn keys_strategy() -> impl Strategy<Value = Keys> {
    prop::collection::btree_map(
        (0u8..4).prop_map(|n| format!("k{n}")),
        key_type_strategy(),
        0..3,
    )
}

/// Strategy for document content (arbitrary bytes).
pub fn content_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
}

/// A document operation for model-based tests.
#[derive(Debug, Clone)]
pub enum DocOperation {
    /// Save a document.
    Save {
        /// Document ID
        id: DocumentId,
        /// Keys to hold after the save
        keys: Keys,
        /// New content
        content: Vec<u8>,
        /// Send a revision other than the current one
        stale: bool,
    },
    /// Delete a document.
    Delete {
        /// Document ID
        id: DocumentId,
        /// Send a revision other than the current one
        stale: bool,
    },
    /// Load a document.
    Load {
        /// Document ID
        id: DocumentId,
    },
}

/// Strategy for generating document operations.
pub fn doc_operation_strategy() -> impl Strategy<Value = DocOperation> {
    prop_oneof![
        4 => (document_id_strategy(), keys_strategy(), content_strategy(), prop::bool::weighted(0.15))
            .prop_map(|(id, keys, content, stale)| DocOperation::Save { id, keys, content, stale }),
        2 => (document_id_strategy(), prop::bool::weighted(0.15))
            .prop_map(|(id, stale)| DocOperation::Delete { id, stale }),
        1 => document_id_strategy().prop_map(|id| DocOperation::Load { id }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<DocOperation>> {
    prop::collection::vec(doc_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 64,
            max_shrink_iters: 500,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 16,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 5000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
