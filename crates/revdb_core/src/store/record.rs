//! Persisted document metadata.

use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::types::{DocumentId, Headers, Keys, Revision};
use serde::{Deserialize, Serialize};

/// Metadata persisted for every existing document.
///
/// The record and the content blob of a document are always written and
/// removed in the same transaction, so `revision` is also the revision of the
/// stored content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Document identifier.
    pub id: DocumentId,
    /// Current revision, never [`Revision::UNSET`].
    pub revision: Revision,
    /// Secondary keys currently indexed for this document.
    #[serde(default)]
    pub keys: Keys,
    /// Document headers.
    #[serde(default)]
    pub headers: Headers,
    /// Creation time (Unix millis).
    pub created_at: u64,
    /// Last update time (Unix millis).
    pub updated_at: u64,
}

impl Record {
    /// Encodes the record as CBOR.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| CoreError::codec(e.to_string()))?;
        Ok(buf)
    }

    /// Decodes a CBOR record.
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        let record: Self =
            ciborium::from_reader(bytes).map_err(|e| CoreError::codec(e.to_string()))?;
        if record.revision.is_unset() {
            return Err(CoreError::corruption(format!(
                "record for document {} has no revision",
                record.id
            )));
        }
        Ok(record)
    }

    /// Builds the document view of this record.
    #[must_use]
    pub fn into_document(self, content: Vec<u8>) -> Document {
        Document {
            id: self.id,
            revision: self.revision,
            keys: self.keys,
            headers: self.headers,
            content,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Returns the revision of an optional record.
///
/// An absent record has revision [`Revision::UNSET`].
#[must_use]
pub fn revision_of(record: Option<&Record>) -> Revision {
    record.map_or(Revision::UNSET, |r| r.revision)
}
