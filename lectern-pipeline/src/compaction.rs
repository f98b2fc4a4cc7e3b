//! Feedback compression for the edit stage.
//!
//! Full critique reports are too large to echo back at the editor, and raw
//! reviewer JSON pollutes its context. These helpers reduce each report to a
//! short ranked digest before it reaches the editor prompt.

use lectern_core::{CritiqueReport, FeedbackKind, PedagogyReport, Severity};

/// Findings forwarded to the editor, most severe first.
pub(crate) const MAX_CRITIQUE_ITEMS: usize = 5;

/// Pedagogy feedback is forwarded only below this engagement score.
pub(crate) const ENGAGEMENT_THRESHOLD: u8 = 80;

const MAX_PEDAGOGY_ITEMS: usize = 3;
const MAX_STATUS_ISSUES: usize = 3;

/// Reduce an accuracy report to its top findings, one line each.
pub(crate) fn compress_critique(report: Option<&CritiqueReport>) -> String {
    let Some(report) = report else {
        return "No issues found.".to_string();
    };
    if report.findings.is_empty() {
        return "No issues found.".to_string();
    }

    let mut ranked: Vec<_> = report.findings.iter().collect();
    // Stable sort keeps the reviewer's order within a severity.
    ranked.sort_by_key(|finding| finding.severity.rank());
    ranked.truncate(MAX_CRITIQUE_ITEMS);

    ranked
        .iter()
        .map(|finding| format!("- {}: {} -> {}", finding.section, finding.issue, finding.suggestion))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reduce a pedagogy report to a short improvements block, or nothing when
/// the draft is already engaging enough.
pub(crate) fn compress_pedagogy(report: Option<&PedagogyReport>) -> String {
    let Some(report) = report else {
        return String::new();
    };
    if report.engagement_score >= ENGAGEMENT_THRESHOLD {
        return String::new();
    }

    let picks: Vec<String> = report
        .points
        .iter()
        .filter(|point| matches!(point.kind, FeedbackKind::Engagement | FeedbackKind::Clarity))
        .take(MAX_PEDAGOGY_ITEMS)
        .map(|point| format!("- {}", point.suggestion))
        .collect();

    if picks.is_empty() {
        format!("PEDAGOGICAL NOTE: {}", report.overall_assessment)
    } else {
        format!("PEDAGOGICAL IMPROVEMENTS:\n{}", picks.join("\n"))
    }
}

/// Status line for the edit stage: name the worst problems being fixed.
pub(crate) fn edit_status(report: Option<&CritiqueReport>) -> String {
    if let Some(report) = report {
        let top_issues: Vec<String> = report
            .findings
            .iter()
            .filter(|f| matches!(f.severity, Severity::Critical | Severity::Major))
            .take(MAX_STATUS_ISSUES)
            .map(|f| format!("{} ({})", f.section, f.issue))
            .collect();
        if !top_issues.is_empty() {
            return format!("Fixing: {}", top_issues.join(" \u{2022} "));
        }
    }
    "Polishing: Improving clarity...".to_string()
}
