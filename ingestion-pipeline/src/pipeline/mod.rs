mod config;
mod context;
mod services;
mod stages;
mod state;

pub use config::{IngestionConfig, IngestionTuning};
pub use context::{IngestionReport, PipelineContext};
#[allow(clippy::module_name_repetitions)]
pub use services::{DefaultPipelineServices, PipelineServices};

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use common::error::AppError;
use tracing::info;
use uuid::Uuid;

use self::{
    stages::{await_convergence, ensure_index, filter_records, normalize, parse, submit},
    state::ready,
};

/// Drives one ingestion run through its stages:
/// parse, normalize, filter, ensure index, submit, await convergence.
#[allow(clippy::module_name_repetitions)]
pub struct IngestionPipeline {
    pipeline_config: IngestionConfig,
    services: Arc<dyn PipelineServices>,
}

impl IngestionPipeline {
    pub fn new(services: Arc<dyn PipelineServices>) -> Self {
        Self::with_config(IngestionConfig::default(), services)
    }

    pub fn with_config(pipeline_config: IngestionConfig, services: Arc<dyn PipelineServices>) -> Self {
        Self {
            pipeline_config,
            services,
        }
    }

    /// Runs one full ingestion pass over raw file contents.
    ///
    /// The run is a single forward pass with no retries beyond the
    /// convergence poll; a timeout there is terminal for the run. Aborting
    /// before submission has no side effects. Aborting the poll after
    /// submission stops the waiting, not the write.
    #[tracing::instrument(skip_all)]
    pub async fn run(&self, raw: &str) -> Result<IngestionReport, AppError> {
        let run_id = format!("ingestion-run-{}", Uuid::new_v4());
        let mut ctx = PipelineContext::new(run_id, &self.pipeline_config, self.services.as_ref());

        let machine = ready();
        let pipeline_started = Instant::now();

        let stage_start = Instant::now();
        let machine = parse(machine, &mut ctx, raw).map_err(|err| ctx.abort(err))?;
        let machine = normalize(machine, &mut ctx).map_err(|err| ctx.abort(err))?;
        let machine = filter_records(machine, &mut ctx).map_err(|err| ctx.abort(err))?;
        let prepare_duration = stage_start.elapsed();

        let stage_start = Instant::now();
        let machine = ensure_index(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let machine = submit(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let submit_duration = stage_start.elapsed();

        let stage_start = Instant::now();
        let _machine = await_convergence(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let poll_duration = stage_start.elapsed();

        info!(
            run_id = %ctx.run_id,
            parsed = ctx.report.parsed,
            normalized = ctx.report.normalized,
            dropped = ctx.report.dropped,
            submitted = ctx.report.submitted,
            converged = ctx.report.converged,
            total_ms = Self::duration_millis(pipeline_started.elapsed()),
            prepare_ms = Self::duration_millis(prepare_duration),
            submit_ms = Self::duration_millis(submit_duration),
            poll_ms = Self::duration_millis(poll_duration),
            "ingestion pipeline finished"
        );

        Ok(ctx.report)
    }

    fn duration_millis(duration: Duration) -> u64 {
        u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests;
