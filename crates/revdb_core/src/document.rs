//! Application-visible documents.

use crate::types::{DocumentId, Headers, KeyType, Keys, Revision};

/// A document as seen by the application.
///
/// A new document starts at [`Revision::UNSET`]. Saving it returns a copy
/// carrying the persisted revision and timestamps; that copy is what must be
/// passed to the next save or delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Document identifier.
    pub id: DocumentId,
    /// Revision the caller believes is current.
    pub revision: Revision,
    /// Secondary keys.
    pub keys: Keys,
    /// Free-form metadata.
    pub headers: Headers,
    /// Opaque payload.
    pub content: Vec<u8>,
    /// Creation time (Unix millis), set by the store.
    pub created_at: u64,
    /// Last update time (Unix millis), set by the store.
    pub updated_at: u64,
}

impl Document {
    /// Creates a new, never-saved document.
    #[must_use]
    pub fn new(id: impl Into<DocumentId>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            revision: Revision::UNSET,
            keys: Keys::new(),
            headers: Headers::new(),
            content: content.into(),
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Adds a unique secondary key.
    #[must_use]
    pub fn with_unique_key(mut self, key: impl Into<String>) -> Self {
        self.keys.insert(key.into(), KeyType::Unique);
        self
    }

    /// Adds a shared secondary key.
    #[must_use]
    pub fn with_shared_key(mut self, key: impl Into<String>) -> Self {
        self.keys.insert(key.into(), KeyType::Shared);
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the revision the caller believes is current.
    #[must_use]
    pub const fn with_revision(mut self, revision: Revision) -> Self {
        self.revision = revision;
        self
    }

    /// Returns true if the document has never been saved.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.revision.is_unset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let doc = Document::new("doc1", b"hello".to_vec())
            .with_unique_key("email:a@example.com")
            .with_shared_key("tag:red")
            .with_header("content-type", "text/plain");

        assert!(doc.is_new());
        assert_eq!(doc.keys.get("email:a@example.com"), Some(&KeyType::Unique));
        assert_eq!(doc.keys.get("tag:red"), Some(&KeyType::Shared));
        assert_eq!(doc.headers.len(), 1);
        assert!(!doc.with_revision(Revision::FIRST).is_new());
    }
}
