//! Engine table layout for namespaces.
//!
//! Every namespace owns three tables:
//!
//! ```text
//! records:<ns>   id  -> CBOR record
//! content:<ns>   id  -> content blob
//! keys:<ns>      key => id (multimap)
//! ```
//!
//! The prefixes keep the mapping from namespace to table names injective for
//! any namespace string.

use redb::{MultimapTableDefinition, TableDefinition};

/// Prefix of a namespace's record table.
pub const RECORDS_PREFIX: &str = "records:";
/// Prefix of a namespace's content table.
pub const CONTENT_PREFIX: &str = "content:";
/// Prefix of a namespace's secondary key table.
pub const KEYS_PREFIX: &str = "keys:";

/// Table definition used for records and content.
pub type BlobTable<'a> = TableDefinition<'a, &'static str, &'static [u8]>;

/// Table definition used for the secondary key index.
pub type KeyTable<'a> = MultimapTableDefinition<'a, &'static str, &'static str>;

/// Physical table names of one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    /// Record table name.
    pub records: String,
    /// Content table name.
    pub content: String,
    /// Key table name.
    pub keys: String,
}

impl TableNames {
    /// Computes the table names of namespace `ns`.
    #[must_use]
    pub fn for_namespace(ns: &str) -> Self {
        Self {
            records: format!("{RECORDS_PREFIX}{ns}"),
            content: format!("{CONTENT_PREFIX}{ns}"),
            keys: format!("{KEYS_PREFIX}{ns}"),
        }
    }

    /// Record table definition.
    #[must_use]
    pub fn records_def(&self) -> BlobTable<'_> {
        TableDefinition::new(&self.records)
    }

    /// Content table definition.
    #[must_use]
    pub fn content_def(&self) -> BlobTable<'_> {
        TableDefinition::new(&self.content)
    }

    /// Key table definition.
    #[must_use]
    pub fn keys_def(&self) -> KeyTable<'_> {
        MultimapTableDefinition::new(&self.keys)
    }
}
