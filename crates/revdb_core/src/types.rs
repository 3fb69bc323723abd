//! Core type definitions for revdb.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Identifier of a document, unique within a namespace.
///
/// The value is opaque to the store. Use [`DocumentId::generate`] when the
/// application has no natural identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Creates a document ID from any string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a new random document ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Version token of a document.
///
/// Revisions of persisted documents start at 1 and increase by one on every
/// successful save. [`Revision::UNSET`] stands for "no record".
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Revision(u64);

impl Revision {
    /// The revision of a document that does not exist.
    pub const UNSET: Self = Self(0);

    /// The revision written by the first save of a document.
    pub const FIRST: Self = Self(1);

    /// Creates a revision from its raw value.
    #[must_use]
    pub const fn new(rev: u64) -> Self {
        Self(rev)
    }

    /// Returns the raw revision value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns true for the "no record" sentinel.
    #[must_use]
    pub const fn is_unset(self) -> bool {
        self.0 == 0
    }

    /// Returns the next revision, or `None` on overflow.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(rev) => Some(Self(rev)),
            None => None,
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unset() {
            f.write_str("unset")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// How a secondary key may be shared between documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    /// At most one document in the namespace holds the key.
    Unique,
    /// Any number of documents may hold the key.
    Shared,
}

/// Secondary keys of a document.
pub type Keys = BTreeMap<String, KeyType>;

/// Free-form metadata attached to a document.
pub type Headers = BTreeMap<String, String>;

/// Returns the current time as Unix milliseconds.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(DocumentId::generate(), DocumentId::generate());
    }

    #[test]
    fn revision_next() {
        assert_eq!(Revision::UNSET.next(), Some(Revision::FIRST));
        assert_eq!(Revision::new(5).next(), Some(Revision::new(6)));
        assert_eq!(Revision::new(u64::MAX).next(), None);
    }

    #[test]
    fn revision_display() {
        assert_eq!(format!("{}", Revision::UNSET), "unset");
        assert_eq!(format!("{}", Revision::new(42)), "42");
    }

    #[test]
    fn document_id_display() {
        let id = DocumentId::from("doc1");
        assert_eq!(format!("{id}"), "doc1");
        assert_eq!(id.as_str(), "doc1");
    }
}
