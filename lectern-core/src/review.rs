//! Structured reports returned by the critique and edit stages.
//!
//! These types define the JSON contract the pipeline asks reviewer models to
//! follow. Parsing a model reply into them is the validation step: a reply
//! that does not fit the shape is rejected rather than patched up.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How much a finding matters. Ordering is most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    Major,
    Minor,
    Nitpick,
}

impl Severity {
    /// Sort key: lower ranks sort ahead of higher ones.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Major => 1,
            Severity::Minor => 2,
            Severity::Nitpick => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Critical => "Critical",
            Severity::Major => "Major",
            Severity::Minor => "Minor",
            Severity::Nitpick => "Nitpick",
        };
        write!(f, "{name}")
    }
}

/// One problem the accuracy reviewer found in the draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CritiqueFinding {
    pub section: String,
    pub issue: String,
    pub severity: Severity,
    pub suggestion: String,
    /// Verbatim excerpt from the draft, when the reviewer can point at one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
}

/// Full accuracy review: findings plus an overall quality score (0-100).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CritiqueReport {
    pub findings: Vec<CritiqueFinding>,
    pub summary: String,
    pub quality_score: u8,
}

impl CritiqueReport {
    pub fn critical_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Critical)
            .count()
    }
}

/// Category of a pedagogical observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedbackKind {
    Clarity,
    Flow,
    Tone,
    Engagement,
    Difficulty,
}

/// One teaching-quality observation from the pedagogy reviewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PedagogyPoint {
    pub section: String,
    pub kind: FeedbackKind,
    pub observation: String,
    pub suggestion: String,
}

/// Full pedagogy review with an engagement score (0-100).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PedagogyReport {
    pub points: Vec<PedagogyPoint>,
    pub overall_assessment: String,
    pub engagement_score: u8,
}

/// One targeted replacement the editor wants applied to the draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditProposal {
    /// Text to locate in the current draft, quoted as exactly as the editor can.
    pub target_text: String,
    pub replacement_text: String,
    pub reason: String,
}

/// Everything the editor returned for one revision pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditBatch {
    pub replacements: Vec<EditProposal>,
    pub summary_of_changes: String,
}
