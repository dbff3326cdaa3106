//! Wire types used by the Typesense client.

use crate::domain::Document;
use serde::{Deserialize, Serialize};

/// Document shape as stored in the `documents` collection.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DocumentRecord {
    pub(crate) id: String,
    pub(crate) content: String,
    #[serde(default)]
    pub(crate) embedding: Vec<f32>,
}

impl DocumentRecord {
    pub(crate) fn into_document(self) -> Document {
        Document {
            id: self.id,
            content: self.content,
            embedding: if self.embedding.is_empty() {
                None
            } else {
                Some(self.embedding)
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub(crate) hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchHit {
    pub(crate) document: DocumentRecord,
}
