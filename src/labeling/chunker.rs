//! Splits an ordered transcript into fixed-size labeling chunks.

use crate::pipeline::types::TranscriptSegment;

/// A contiguous slice of the transcript submitted as one labeling unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chunk<'a> {
    /// Position of this chunk in transcript order.
    pub index: usize,
    pub segments: &'a [TranscriptSegment],
}

/// Partition `transcript` into `ceil(len / chunk_size)` ordered chunks.
///
/// Chunks do not overlap and leave no gaps; only the last one may be shorter.
/// An empty transcript yields no chunks.
///
/// # Panics
/// Panics if `chunk_size` is zero. `Config::validate` rejects that value.
pub fn chunk_transcript(transcript: &[TranscriptSegment], chunk_size: usize) -> Vec<Chunk<'_>> {
    assert!(chunk_size > 0, "chunk size must be positive");
    transcript
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, segments)| Chunk { index, segments })
        .collect()
}
