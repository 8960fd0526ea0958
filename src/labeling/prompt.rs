//! Prompt rendering for chunk labeling requests.

use crate::pipeline::types::{ChapterLabel, OcrResults, TranscriptSegment};

/// Render one timestamped line per transcript segment: `[start - end]: text`.
pub fn format_transcript(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| format!("[{:.2} - {:.2}]: {}", s.start, s.end, s.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render OCR text as `frame: text1, text2`, one frame per line in sorted order.
pub fn format_ocr(ocr: &OcrResults) -> String {
    ocr.iter()
        .map(|(frame, texts)| format!("{frame}: {}", texts.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the labeling prompt for one chunk.
///
/// Embeds the chunk's transcript, the OCR text of every frame, the closed
/// category list and the expected JSON output shape.
pub fn build_prompt(segments: &[TranscriptSegment], ocr: &OcrResults) -> String {
    let mut prompt = String::from(
        "Below is a transcript and on-screen OCR text from a news video.\n\n\
         Label the segments as one of the following:\n",
    );
    for label in ChapterLabel::ALL {
        prompt.push_str(&format!("- {label}\n"));
    }

    prompt.push_str(&format!(
        "\nTranscript:\n{}\n\nOCR from scenes:\n{}\n\n",
        format_transcript(segments),
        format_ocr(ocr)
    ));

    prompt.push_str(
        "Respond in JSON format like:\n\
         [\n  {\"start\": \"00:00\", \"end\": \"01:10\", \"label\": \"Introduction\"},\n  ...\n]\n",
    );
    prompt
}
