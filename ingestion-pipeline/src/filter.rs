use common::types::policy_chunk::PolicyChunk;
use tracing::warn;

/// Keeps the chunks the embedding model will accept.
///
/// The index rejects empty inputs, so whitespace-only chunks are dropped
/// here with a bounded id sample for operator visibility. Dropping every
/// chunk is not an error; the caller skips submission entirely.
pub fn filter_indexable(chunks: Vec<PolicyChunk>, sample_size: usize) -> Vec<PolicyChunk> {
    let total = chunks.len();
    let (kept, dropped): (Vec<_>, Vec<_>) =
        chunks.into_iter().partition(PolicyChunk::is_indexable);

    if !dropped.is_empty() {
        let sample: Vec<&str> = dropped
            .iter()
            .take(sample_size)
            .map(|chunk| chunk.id.as_str())
            .collect();
        warn!(
            dropped = dropped.len(),
            total,
            sample = ?sample,
            "dropped records with empty text"
        );
    }

    kept
}
