use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{error::AppError, types::policy_chunk::PolicyChunk, utils::config::AppConfig};

pub mod pinecone;

pub use pinecone::PineconeClient;

/// Embedding configuration bound to an index at creation time. The provider
/// embeds the field named in `field_map` on every write, so callers submit
/// plain text and never supply vectors directly.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IndexEmbedConfig {
    pub model: String,
    pub field_map: HashMap<String, String>,
}

impl IndexEmbedConfig {
    /// The convention used by this system: the chunk's `text` is carried in
    /// the `chunk_text` field of each submitted record.
    pub fn for_chunk_text(model: &str) -> Self {
        Self {
            model: model.to_owned(),
            field_map: HashMap::from([("text".to_owned(), "chunk_text".to_owned())]),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct NamespaceStats {
    #[serde(alias = "vectorCount", default)]
    pub vector_count: u64,
}

/// Statistics snapshot of a remote index. The index is eventually
/// consistent: a successful write is not guaranteed to be reflected here
/// immediately.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct IndexStats {
    #[serde(default)]
    pub namespaces: HashMap<String, NamespaceStats>,
}

impl IndexStats {
    /// Vector count for a namespace, treating an absent namespace as empty.
    pub fn namespace_vector_count(&self, namespace: &str) -> u64 {
        self.namespaces
            .get(namespace)
            .map_or(0, |stats| stats.vector_count)
    }
}

/// Contract of the external vector-index provider. Retrieval ranking and
/// the embedding model itself live entirely behind this boundary.
#[async_trait]
pub trait VectorIndexProvider: Send + Sync {
    async fn has_index(&self, name: &str) -> Result<bool, AppError>;

    async fn create_index_for_model(
        &self,
        name: &str,
        cloud: &str,
        region: &str,
        embed: IndexEmbedConfig,
    ) -> Result<(), AppError>;

    async fn upsert_records(
        &self,
        index: &str,
        namespace: &str,
        records: &[PolicyChunk],
    ) -> Result<(), AppError>;

    async fn describe_index_stats(&self, index: &str) -> Result<IndexStats, AppError>;

    async fn delete_index(&self, name: &str) -> Result<(), AppError>;
}

/// Explicitly tagged configured/unconfigured index handle.
///
/// Absent credentials are a supported degraded mode, not a startup failure:
/// the ingestion pipeline still parses and normalizes records and simply
/// skips every network call.
pub enum IndexBackend {
    Remote(PineconeClient),
    Disabled,
}

impl IndexBackend {
    pub fn from_config(config: &AppConfig) -> Self {
        match config.pinecone_api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {
                Self::Remote(PineconeClient::new(key, &config.pinecone_control_plane_url))
            }
            _ => Self::Disabled,
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    pub fn provider(&self) -> Option<&dyn VectorIndexProvider> {
        match self {
            Self::Remote(client) => Some(client),
            Self::Disabled => None,
        }
    }
}
