use common::error::AppError;
use state_machines::core::GuardError;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use crate::{filter, normalizer, parser};

use super::{
    context::PipelineContext,
    state::{
        Converged, Filtered, IndexEnsured, IngestionMachine, Normalized, Parsed, Ready, Submitted,
    },
};

#[instrument(level = "trace", skip_all, fields(run_id = %ctx.run_id))]
pub fn parse(
    machine: IngestionMachine<(), Ready>,
    ctx: &mut PipelineContext<'_>,
    raw: &str,
) -> Result<IngestionMachine<(), Parsed>, AppError> {
    let records = parser::parse_records(raw);
    ctx.report.parsed = records.len();

    debug!(
        run_id = %ctx.run_id,
        record_count = records.len(),
        "parsed raw input"
    );
    ctx.raw_records = records;

    machine
        .parse()
        .map_err(|(_, guard)| map_guard_error("parse", &guard))
}

#[instrument(level = "trace", skip_all, fields(run_id = %ctx.run_id))]
pub fn normalize(
    machine: IngestionMachine<(), Parsed>,
    ctx: &mut PipelineContext<'_>,
) -> Result<IngestionMachine<(), Normalized>, AppError> {
    let raw_records = std::mem::take(&mut ctx.raw_records);
    let chunks = normalizer::normalize_records(raw_records);
    ctx.report.normalized = chunks.len();

    debug!(
        run_id = %ctx.run_id,
        chunk_count = chunks.len(),
        "normalized records into canonical chunks"
    );
    ctx.chunks = chunks;

    machine
        .normalize()
        .map_err(|(_, guard)| map_guard_error("normalize", &guard))
}

#[instrument(level = "trace", skip_all, fields(run_id = %ctx.run_id))]
pub fn filter_records(
    machine: IngestionMachine<(), Normalized>,
    ctx: &mut PipelineContext<'_>,
) -> Result<IngestionMachine<(), Filtered>, AppError> {
    let chunks = std::mem::take(&mut ctx.chunks);
    let total = chunks.len();
    let kept = filter::filter_indexable(chunks, ctx.pipeline_config.tuning.dropped_id_sample);
    ctx.report.dropped = total.saturating_sub(kept.len());
    ctx.chunks = kept;

    machine
        .filter()
        .map_err(|(_, guard)| map_guard_error("filter", &guard))
}

#[instrument(level = "trace", skip_all, fields(run_id = %ctx.run_id))]
pub async fn ensure_index(
    machine: IngestionMachine<(), Filtered>,
    ctx: &mut PipelineContext<'_>,
) -> Result<IngestionMachine<(), IndexEnsured>, AppError> {
    if !ctx.has_indexable_chunks() {
        info!(run_id = %ctx.run_id, "no indexable records; skipping index interaction");
        return machine
            .ensure()
            .map_err(|(_, guard)| map_guard_error("ensure", &guard));
    }

    if !ctx.services.backend_configured() {
        info!(
            run_id = %ctx.run_id,
            record_count = ctx.chunks.len(),
            "index backend unconfigured; records prepared but not uploaded"
        );
        return machine
            .ensure()
            .map_err(|(_, guard)| map_guard_error("ensure", &guard));
    }

    ctx.services.ensure_index().await?;

    machine
        .ensure()
        .map_err(|(_, guard)| map_guard_error("ensure", &guard))
}

#[instrument(level = "trace", skip_all, fields(run_id = %ctx.run_id))]
pub async fn submit(
    machine: IngestionMachine<(), IndexEnsured>,
    ctx: &mut PipelineContext<'_>,
) -> Result<IngestionMachine<(), Submitted>, AppError> {
    if !ctx.has_indexable_chunks() || !ctx.services.backend_configured() {
        return machine
            .submit()
            .map_err(|(_, guard)| map_guard_error("submit", &guard));
    }

    info!(
        run_id = %ctx.run_id,
        record_count = ctx.chunks.len(),
        "submitting records for embedding-backed indexing"
    );
    ctx.services.submit_chunks(&ctx.chunks).await?;
    ctx.report.submitted = ctx.chunks.len();

    machine
        .submit()
        .map_err(|(_, guard)| map_guard_error("submit", &guard))
}

/// Polls index statistics until the submitted records become visible.
///
/// The remote index is eventually consistent after a write, so callers that
/// assume read-after-write visibility would flake; this wait is part of the
/// contract. Transient polling errors are swallowed and retried until the
/// wall-clock deadline. Cancelling the wait after submission stops the
/// waiting, not the write: the index still converges on its own.
#[instrument(level = "trace", skip_all, fields(run_id = %ctx.run_id))]
pub async fn await_convergence(
    machine: IngestionMachine<(), Submitted>,
    ctx: &mut PipelineContext<'_>,
) -> Result<IngestionMachine<(), Converged>, AppError> {
    if ctx.report.submitted == 0 {
        return machine
            .converge()
            .map_err(|(_, guard)| map_guard_error("converge", &guard));
    }

    let tuning = &ctx.pipeline_config.tuning;
    let expected = ctx.report.submitted;
    let expected_vectors = u64::try_from(expected).unwrap_or(u64::MAX);
    let deadline = Instant::now() + tuning.poll_timeout;
    let mut observed = 0u64;

    info!(
        run_id = %ctx.run_id,
        expected,
        timeout_secs = tuning.poll_timeout.as_secs(),
        "waiting for submitted records to become visible"
    );

    loop {
        match ctx.services.namespace_vector_count().await {
            Ok(count) => {
                observed = count;
                debug!(run_id = %ctx.run_id, observed, expected, "polled namespace vector count");

                if observed >= expected_vectors {
                    ctx.report.converged = true;
                    info!(run_id = %ctx.run_id, observed, "index converged");
                    return machine
                        .converge()
                        .map_err(|(_, guard)| map_guard_error("converge", &guard));
                }
            }
            Err(err) => {
                warn!(
                    run_id = %ctx.run_id,
                    error = %err,
                    "polling index stats failed; retrying"
                );
            }
        }

        if Instant::now() >= deadline {
            return Err(AppError::IndexTimeout { expected, observed });
        }

        sleep(tuning.poll_interval).await;
    }
}

fn map_guard_error(event: &str, guard: &GuardError) -> AppError {
    AppError::InternalError(format!(
        "invalid ingestion pipeline transition during {event}: {guard:?}"
    ))
}
