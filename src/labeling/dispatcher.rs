//! Batched, concurrent labeling of transcript chunks.
//!
//! Chunks run in batches of `parallelism` workers. Every worker in a batch
//! starts together and the next batch starts only after all of them have
//! returned. Each worker owns exactly one pre-sized result slot, addressed by
//! its chunk index, so no locking is needed. A failing worker leaves an empty
//! result in its slot and never affects its siblings.
//!
//! This is the only place labeling failures are recovered: request errors,
//! timeouts and unparseable replies all arrive here as `Err` and become failed
//! slots.

use crate::labeling::backend::LabelBackend;
use crate::labeling::chunker::Chunk;
use crate::labeling::prompt::build_prompt;
use crate::pipeline::types::{LabelSegment, OcrResults};
use std::sync::Arc;
use std::thread;

/// Outcome of labeling one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkResult {
    pub index: usize,
    pub labels: Vec<LabelSegment>,
    /// Set when the backend call failed, timed out or returned no usable
    /// label array; `labels` is then empty.
    pub error: Option<String>,
}

impl ChunkResult {
    fn labeled(index: usize, labels: Vec<LabelSegment>) -> Self {
        Self {
            index,
            labels,
            error: None,
        }
    }

    fn failed(index: usize, error: impl Into<String>) -> Self {
        Self {
            index,
            labels: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Runs chunks through a labeling backend in barrier-separated batches.
pub struct ChunkDispatcher {
    backend: Arc<dyn LabelBackend>,
    parallelism: usize,
}

impl ChunkDispatcher {
    /// Create a dispatcher running up to `parallelism` workers per batch.
    ///
    /// # Panics
    /// Panics if `parallelism` is zero.
    pub fn new(backend: Arc<dyn LabelBackend>, parallelism: usize) -> Self {
        assert!(parallelism > 0, "parallelism must be positive");
        Self {
            backend,
            parallelism,
        }
    }

    /// Label every chunk; the result has one entry per chunk, in chunk order.
    pub fn dispatch(&self, chunks: &[Chunk<'_>], ocr: &OcrResults) -> Vec<ChunkResult> {
        // A slot keeps this value only if its worker died before writing.
        let mut slots: Vec<ChunkResult> = chunks
            .iter()
            .map(|chunk| ChunkResult::failed(chunk.index, "worker exited without a result"))
            .collect();

        let total_batches = chunks.len().div_ceil(self.parallelism);
        for (batch_index, (batch, batch_slots)) in chunks
            .chunks(self.parallelism)
            .zip(slots.chunks_mut(self.parallelism))
            .enumerate()
        {
            tracing::info!(
                batch = batch_index + 1,
                total_batches,
                workers = batch.len(),
                "starting labeling batch"
            );

            // The scope is the barrier: it returns only after every worker has finished.
            thread::scope(|scope| {
                let handles: Vec<_> = batch
                    .iter()
                    .zip(batch_slots.iter_mut())
                    .map(|(chunk, slot)| {
                        scope.spawn(move || {
                            *slot = self.label_chunk(chunk, ocr);
                        })
                    })
                    .collect();

                for handle in handles {
                    if handle.join().is_err() {
                        tracing::error!(batch = batch_index + 1, "labeling worker panicked");
                    }
                }
            });
        }

        slots
    }

    fn label_chunk(&self, chunk: &Chunk<'_>, ocr: &OcrResults) -> ChunkResult {
        tracing::info!(chunk = chunk.index + 1, backend = self.backend.name(), "processing chunk");
        let prompt = build_prompt(chunk.segments, ocr);
        match self.backend.label(&prompt) {
            Ok(labels) => {
                tracing::debug!(chunk = chunk.index + 1, labels = labels.len(), "chunk labeled");
                ChunkResult::labeled(chunk.index, labels)
            }
            Err(e) => {
                tracing::error!(chunk = chunk.index + 1, error = %e, "chunk labeling failed");
                ChunkResult::failed(chunk.index, e.to_string())
            }
        }
    }
}
