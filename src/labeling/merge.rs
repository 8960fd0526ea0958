//! Reassembles per-chunk results into one ordered label list.

use crate::labeling::dispatcher::ChunkResult;
use crate::pipeline::types::LabelSegment;

/// Concatenate chunk labels in chunk-index order.
///
/// Labels within a chunk keep the order the backend returned them in. Failed
/// chunks contribute nothing. No cross-chunk deduplication or smoothing.
pub fn merge_results(mut results: Vec<ChunkResult>) -> Vec<LabelSegment> {
    results.sort_by_key(|r| r.index);
    results.into_iter().flat_map(|r| r.labels).collect()
}

/// Number of chunks whose backend call failed.
pub fn failed_chunks(results: &[ChunkResult]) -> usize {
    results.iter().filter(|r| r.is_failed()).count()
}
