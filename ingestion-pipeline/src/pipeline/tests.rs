use std::{
    sync::atomic::{AtomicUsize, Ordering},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use common::{error::AppError, types::policy_chunk::PolicyChunk};
use tokio::sync::Mutex;

use crate::{filter, normalizer, parser};

use super::{
    config::{IngestionConfig, IngestionTuning},
    services::PipelineServices,
    IngestionPipeline,
};

struct MockServices {
    configured: bool,
    poll_counts: Vec<u64>,
    poll_cursor: AtomicUsize,
    calls: Mutex<Vec<&'static str>>,
    submitted: Mutex<Vec<PolicyChunk>>,
}

impl MockServices {
    fn new(poll_counts: Vec<u64>) -> Self {
        Self {
            configured: true,
            poll_counts,
            poll_cursor: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new(Vec::new())
        }
    }

    async fn record(&self, call: &'static str) {
        self.calls.lock().await.push(call);
    }

    async fn poll_calls(&self) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| **call == "stats")
            .count()
    }
}

#[async_trait]
impl PipelineServices for MockServices {
    fn backend_configured(&self) -> bool {
        self.configured
    }

    async fn ensure_index(&self) -> Result<(), AppError> {
        self.record("ensure").await;
        Ok(())
    }

    async fn submit_chunks(&self, chunks: &[PolicyChunk]) -> Result<(), AppError> {
        self.record("submit").await;
        self.submitted.lock().await.extend(chunks.iter().cloned());
        Ok(())
    }

    async fn namespace_vector_count(&self) -> Result<u64, AppError> {
        self.record("stats").await;
        let cursor = self.poll_cursor.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .poll_counts
            .get(cursor)
            .or_else(|| self.poll_counts.last())
            .copied()
            .unwrap_or(0))
    }
}

fn fast_config() -> IngestionConfig {
    IngestionConfig {
        tuning: IngestionTuning {
            poll_timeout: Duration::from_millis(250),
            poll_interval: Duration::from_millis(5),
            dropped_id_sample: 5,
        },
    }
}

const POLICY_INPUT: &str = r#"[
    {"_id": "ac-1", "chunk_text": "Access control policy must be documented.", "category": "AC"},
    {"control_id": "AC-2", "requirements": ["Review accounts", "Disable stale accounts"]}
]"#;

#[tokio::test]
async fn full_run_submits_and_converges() {
    let services = Arc::new(MockServices::new(vec![0, 2]));
    let pipeline = IngestionPipeline::with_config(fast_config(), Arc::clone(&services) as Arc<dyn PipelineServices>);

    let report = pipeline.run(POLICY_INPUT).await.expect("pipeline runs");

    assert_eq!(report.parsed, 2);
    assert_eq!(report.normalized, 2);
    assert_eq!(report.dropped, 0);
    assert_eq!(report.submitted, 2);
    assert!(report.converged);

    let submitted = services.submitted.lock().await;
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].id, "ac-1");
    assert_eq!(submitted[1].text, "AC-2 Review accounts Disable stale accounts");

    let calls = services.calls.lock().await;
    assert_eq!(calls.first(), Some(&"ensure"));
    assert_eq!(calls.get(1), Some(&"submit"));
}

#[tokio::test]
async fn records_without_text_skip_every_network_call() {
    let services = Arc::new(MockServices::new(vec![0]));
    let pipeline = IngestionPipeline::with_config(fast_config(), Arc::clone(&services) as Arc<dyn PipelineServices>);

    let report = pipeline
        .run(r#"[{"_id": "a", "chunk_text": "   "}, {"_id": "b"}]"#)
        .await
        .expect("pipeline runs");

    assert_eq!(report.parsed, 2);
    assert_eq!(report.normalized, 2);
    assert_eq!(report.dropped, 2);
    assert_eq!(report.submitted, 0);
    assert!(!report.converged);
    assert!(services.calls.lock().await.is_empty());
}

#[tokio::test]
async fn unconfigured_backend_prepares_records_without_uploading() {
    let services = Arc::new(MockServices::unconfigured());
    let pipeline = IngestionPipeline::with_config(fast_config(), Arc::clone(&services) as Arc<dyn PipelineServices>);

    let report = pipeline.run(POLICY_INPUT).await.expect("pipeline runs");

    assert_eq!(report.normalized, 2);
    assert_eq!(report.submitted, 0);
    assert!(services.calls.lock().await.is_empty());
}

#[tokio::test]
async fn convergence_succeeds_on_the_third_poll() {
    let input = r#"[
        {"_id": "1", "chunk_text": "one"},
        {"_id": "2", "chunk_text": "two"},
        {"_id": "3", "chunk_text": "three"},
        {"_id": "4", "chunk_text": "four"},
        {"_id": "5", "chunk_text": "five"}
    ]"#;
    let services = Arc::new(MockServices::new(vec![0, 2, 5]));
    let pipeline = IngestionPipeline::with_config(fast_config(), Arc::clone(&services) as Arc<dyn PipelineServices>);

    let report = pipeline.run(input).await.expect("pipeline runs");

    assert!(report.converged);
    assert_eq!(services.poll_calls().await, 3);
}

#[tokio::test]
async fn convergence_timeout_carries_expected_and_observed_counts() {
    let services = Arc::new(MockServices::new(vec![0]));
    let config = IngestionConfig {
        tuning: IngestionTuning {
            poll_timeout: Duration::from_millis(30),
            poll_interval: Duration::from_millis(10),
            dropped_id_sample: 5,
        },
    };
    let pipeline = IngestionPipeline::with_config(config, Arc::clone(&services) as Arc<dyn PipelineServices>);

    let started = std::time::Instant::now();
    let result = pipeline.run(POLICY_INPUT).await;

    assert!(started.elapsed() >= Duration::from_millis(30));
    match result {
        Err(AppError::IndexTimeout { expected, observed }) => {
            assert_eq!(expected, 2);
            assert_eq!(observed, 0);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn transient_poll_errors_are_retried_within_the_deadline() {
    struct FlakyServices {
        inner: MockServices,
        failures_left: AtomicUsize,
    }

    #[async_trait]
    impl PipelineServices for FlakyServices {
        fn backend_configured(&self) -> bool {
            true
        }

        async fn ensure_index(&self) -> Result<(), AppError> {
            self.inner.ensure_index().await
        }

        async fn submit_chunks(&self, chunks: &[PolicyChunk]) -> Result<(), AppError> {
            self.inner.submit_chunks(chunks).await
        }

        async fn namespace_vector_count(&self) -> Result<u64, AppError> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                    left.checked_sub(1)
                })
                .is_ok()
            {
                return Err(AppError::InternalError("transient stats failure".into()));
            }
            self.inner.namespace_vector_count().await
        }
    }

    let services = Arc::new(FlakyServices {
        inner: MockServices::new(vec![2]),
        failures_left: AtomicUsize::new(2),
    });
    let pipeline = IngestionPipeline::with_config(fast_config(), Arc::clone(&services) as Arc<dyn PipelineServices>);

    let report = pipeline.run(POLICY_INPUT).await.expect("pipeline recovers");

    assert!(report.converged);
}

#[test]
fn repeated_local_passes_produce_identical_chunks() {
    let run_once = || {
        let records = parser::parse_records(POLICY_INPUT);
        let chunks = normalizer::normalize_records(records);
        filter::filter_indexable(chunks, 5)
    };

    assert_eq!(run_once(), run_once());
}
