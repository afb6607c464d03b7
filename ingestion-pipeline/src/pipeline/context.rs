use common::{error::AppError, types::policy_chunk::PolicyChunk};
use serde::Serialize;
use tracing::error;

use crate::parser::RawRecord;

use super::{config::IngestionConfig, services::PipelineServices};

/// Locally observable outcome of one ingestion run.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct IngestionReport {
    pub parsed: usize,
    pub normalized: usize,
    pub dropped: usize,
    pub submitted: usize,
    pub converged: bool,
}

pub struct PipelineContext<'a> {
    pub run_id: String,
    pub pipeline_config: &'a IngestionConfig,
    pub services: &'a dyn PipelineServices,
    pub raw_records: Vec<RawRecord>,
    pub chunks: Vec<PolicyChunk>,
    pub report: IngestionReport,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        run_id: String,
        pipeline_config: &'a IngestionConfig,
        services: &'a dyn PipelineServices,
    ) -> Self {
        Self {
            run_id,
            pipeline_config,
            services,
            raw_records: Vec::new(),
            chunks: Vec::new(),
            report: IngestionReport::default(),
        }
    }

    /// Whether any chunks survived filtering; nothing to submit otherwise.
    pub fn has_indexable_chunks(&self) -> bool {
        !self.chunks.is_empty()
    }

    pub fn abort(&mut self, err: AppError) -> AppError {
        error!(
            run_id = %self.run_id,
            error = %err,
            "ingestion pipeline aborted"
        );
        err
    }
}
