use async_trait::async_trait;
use common::{
    error::AppError,
    index::{IndexBackend, IndexEmbedConfig, VectorIndexProvider},
    types::policy_chunk::PolicyChunk,
    utils::config::AppConfig,
};
use tracing::info;

/// Operations the pipeline needs from the index backend. Kept behind a
/// trait so the stages can be driven in tests without a remote index.
#[async_trait]
pub trait PipelineServices: Send + Sync {
    /// Whether a remote backend is configured. When false the pipeline
    /// prepares records without uploading them.
    fn backend_configured(&self) -> bool;

    /// Idempotent: creates the index bound to the embedding model unless
    /// it already exists.
    async fn ensure_index(&self) -> Result<(), AppError>;

    /// Submits the batch as a single logical write to the ingestion
    /// namespace.
    async fn submit_chunks(&self, chunks: &[PolicyChunk]) -> Result<(), AppError>;

    /// Current vector count for the ingestion namespace; an absent
    /// namespace reads as 0.
    async fn namespace_vector_count(&self) -> Result<u64, AppError>;
}

pub struct DefaultPipelineServices {
    backend: IndexBackend,
    config: AppConfig,
}

impl DefaultPipelineServices {
    pub fn new(backend: IndexBackend, config: AppConfig) -> Self {
        Self { backend, config }
    }

    fn provider(&self) -> Result<&dyn VectorIndexProvider, AppError> {
        self.backend
            .provider()
            .ok_or_else(|| AppError::InternalError("index backend is not configured".into()))
    }
}

#[async_trait]
impl PipelineServices for DefaultPipelineServices {
    fn backend_configured(&self) -> bool {
        self.backend.is_configured()
    }

    async fn ensure_index(&self) -> Result<(), AppError> {
        let provider = self.provider()?;
        if provider.has_index(&self.config.index_name).await? {
            return Ok(());
        }

        info!(
            index = %self.config.index_name,
            model = %self.config.embedding_model,
            "creating index bound to embedding model"
        );
        provider
            .create_index_for_model(
                &self.config.index_name,
                &self.config.index_cloud,
                &self.config.index_region,
                IndexEmbedConfig::for_chunk_text(&self.config.embedding_model),
            )
            .await
    }

    async fn submit_chunks(&self, chunks: &[PolicyChunk]) -> Result<(), AppError> {
        self.provider()?
            .upsert_records(
                &self.config.index_name,
                &self.config.index_namespace,
                chunks,
            )
            .await
    }

    async fn namespace_vector_count(&self) -> Result<u64, AppError> {
        let stats = self
            .provider()?
            .describe_index_stats(&self.config.index_name)
            .await?;

        Ok(stats.namespace_vector_count(&self.config.index_namespace))
    }
}
