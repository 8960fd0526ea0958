//! Terminal rendering for stage status and run summaries.

use crate::pipeline::{RunSummary, StageOutcome, StageStatus};
use owo_colors::OwoColorize;

/// One line per stage: marker, stage name, artifact path.
pub fn render_status(statuses: &[StageStatus], color: bool) -> String {
    let mut out = String::new();
    for status in statuses {
        let marker = match (status.cached, color) {
            (true, true) => "●".green().to_string(),
            (false, true) => "○".dimmed().to_string(),
            (true, false) => "●".to_string(),
            (false, false) => "○".to_string(),
        };
        let state = if status.cached { "done" } else { "pending" };
        out.push_str(&format!(
            "  {marker} {:<10} {:<8} {}\n",
            status.stage,
            state,
            status.artifact.display()
        ));
    }
    out
}

/// Short report printed after a run.
pub fn render_summary(summary: &RunSummary, color: bool) -> String {
    let cached = summary
        .reports
        .iter()
        .filter(|r| r.outcome == StageOutcome::Cached)
        .count();
    let computed = summary.reports.len() - cached;

    let mut out = format!(
        "{} chapters written ({computed} stages computed, {cached} reused)\n",
        summary.chapters
    );
    if summary.failed_chunks > 0 {
        let warning = format!(
            "{} labeling chunks failed; their chapters are missing\n",
            summary.failed_chunks
        );
        if color {
            out.push_str(&warning.yellow().to_string());
        } else {
            out.push_str(&warning);
        }
    }
    out
}
