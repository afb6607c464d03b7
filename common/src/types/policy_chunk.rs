use serde::{Deserialize, Serialize};

/// The atomic unit of retrievable text submitted to the vector index.
///
/// Field names follow the index's field-mapping convention: the index is
/// created with `text` mapped to `chunk_text`, so writes auto-embed the
/// `chunk_text` field server-side and callers never supply vectors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyChunk {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "chunk_text")]
    pub text: String,
    #[serde(default)]
    pub category: String,
}

impl PolicyChunk {
    pub fn new(id: String, text: String, category: String) -> Self {
        Self { id, text, category }
    }

    /// Whether the chunk carries content the embedding model will accept.
    pub fn is_indexable(&self) -> bool {
        !self.text.trim().is_empty()
    }
}
