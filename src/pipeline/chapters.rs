//! `chapters.txt`: one `<start> - <end>: <label>` line per merged label.

use crate::error::{ChapterizeError, Result};
use crate::pipeline::cache;
use crate::pipeline::types::{ChapterLabel, LabelSegment, Timestamp};
use std::path::Path;

/// Render labels as newline-terminated chapter lines, in order.
pub fn render_chapters(labels: &[LabelSegment]) -> String {
    labels
        .iter()
        .map(|l| format!("{} - {}: {}\n", l.start, l.end, l.label))
        .collect()
}

/// Write the chapter report, creating its directory if needed.
pub fn write_chapters(path: &Path, labels: &[LabelSegment]) -> Result<()> {
    cache::store_text(path, &render_chapters(labels))?;
    tracing::info!(path = %path.display(), chapters = labels.len(), "wrote chapters");
    Ok(())
}

/// Parse one chapter line back into a label segment.
///
/// Returns `None` for lines that are not in chapter format.
pub fn parse_chapter_line(line: &str) -> Option<LabelSegment> {
    let (range, label) = line.trim().rsplit_once(": ")?;
    let (start, end) = range.split_once(" - ")?;
    let label = label.parse::<ChapterLabel>().ok()?;
    Some(LabelSegment {
        start: Timestamp::from(start),
        end: Timestamp::from(end),
        label,
    })
}

/// Load a chapter report written by `write_chapters`.
pub fn read_chapters(path: &Path) -> Result<Vec<LabelSegment>> {
    let content = cache::load_text(path)?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(n, line)| {
            parse_chapter_line(line).ok_or_else(|| {
                ChapterizeError::corrupt(path, format!("line {} is not a chapter: {line:?}", n + 1))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<LabelSegment> {
        vec![
            LabelSegment::new("00:00", "01:10", ChapterLabel::Introduction),
            LabelSegment::new("01:10", "04:30", ChapterLabel::GuestIntroduction),
            LabelSegment::new(
                Timestamp::Seconds(270.0),
                Timestamp::Seconds(300.5),
                ChapterLabel::Ad,
            ),
        ]
    }

    #[test]
    fn test_render_format() {
        assert_eq!(
            render_chapters(&labels()),
            "00:00 - 01:10: Introduction\n01:10 - 04:30: Guest Introduction\n270 - 300.5: Ad\n"
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_chapters(&[]), "");
    }

    #[test]
    fn test_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output/chapters.txt");
        write_chapters(&path, &labels()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 3);
    }

    #[test]
    fn test_read_back_written_chapters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chapters.txt");
        write_chapters(&path, &labels()).unwrap();

        let read = read_chapters(&path).unwrap();
        assert_eq!(read.len(), 3);
        assert_eq!(read[1].label, ChapterLabel::GuestIntroduction);
        assert_eq!(read[2].start, Timestamp::Seconds(270.0));
    }

    #[test]
    fn test_parse_rejects_unknown_label() {
        assert!(parse_chapter_line("00:00 - 00:10: Weather").is_none());
        assert!(parse_chapter_line("garbage").is_none());
    }

    #[test]
    fn test_malformed_report_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chapters.txt");
        std::fs::write(&path, "00:00 - 00:10: Promo\nnot a chapter\n").unwrap();
        assert!(matches!(
            read_chapters(&path),
            Err(ChapterizeError::ArtifactCorrupt { .. })
        ));
    }
}
