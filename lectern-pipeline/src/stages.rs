//! Prompt templates for each pipeline stage.
//!
//! Templates use `{placeholder}` markers filled by simple substitution. The
//! reviewer and editor prompts spell out the exact JSON shape the pipeline
//! parses; anything off-contract is rejected at the parse step.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of document the draft stage produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentMode {
    /// Full lesson notes for use during class.
    #[default]
    LectureNotes,
    /// Shorter primer students read before class.
    PrereadNotes,
}

impl fmt::Display for ContentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentMode::LectureNotes => "Lecture Notes",
            ContentMode::PrereadNotes => "Pre-read Notes",
        };
        write!(f, "{name}")
    }
}

pub(crate) const CREATOR_SYSTEM: &str = r#"You are an expert educational content writer. You produce clear, accurate, well-structured teaching material in Markdown. You write for students, not for other experts: define terms on first use, build from simple to complex, and prefer concrete examples over abstraction. Output only the document itself, with no preamble or commentary."#;

const CREATOR_LECTURE_USER: &str = r#"Write complete lecture notes on the topic below.

Topic: {topic}
Subtopics to cover: {subtopics}

Requirements:
- Open with a short motivation: why this topic matters to the student.
- Cover every listed subtopic under its own heading, in a sensible teaching order.
- Include at least one worked example or concrete illustration per major section.
- Close with a summary of key takeaways.
- Use Markdown headings, lists, and code blocks where appropriate."#;

const CREATOR_PREREAD_USER: &str = r#"Write concise pre-read notes on the topic below. Students read these before class, so keep them short and focused on orientation rather than mastery.

Topic: {topic}
Subtopics to cover: {subtopics}

Requirements:
- Aim for roughly a third the length of full lecture notes.
- Introduce each subtopic with its core idea and one motivating example or question.
- Flag any prerequisite knowledge the student should refresh.
- Do not include exercises or deep derivations; class will cover those.
- Use Markdown headings and lists."#;

pub(crate) const AUDITOR_SYSTEM: &str = r#"You are a meticulous technical reviewer of educational content. You check facts, dates, formulas, code samples, and document structure. You never rewrite the draft; you only report problems.

Respond with a single JSON object and nothing else, in exactly this shape:
{
  "findings": [
    {
      "section": "heading or area of the draft",
      "issue": "what is wrong",
      "severity": "Critical" | "Major" | "Minor" | "Nitpick",
      "suggestion": "how to fix it",
      "quote": "verbatim excerpt from the draft (optional)"
    }
  ],
  "summary": "one-paragraph overall assessment",
  "quality_score": 0-100
}

Severity guide: Critical = factually wrong or broken code a student would learn incorrectly from; Major = misleading or structurally off; Minor = imprecise or awkward; Nitpick = cosmetic. Score honestly: 90+ means you would hand this to students as-is. An empty findings list is a valid answer for a clean draft."#;

const AUDITOR_USER: &str = r#"Review the draft below for factual and structural problems.

<draft>
{draft}
</draft>

Source transcript, if one was provided (treat it as ground truth where it conflicts with the draft):
{transcript}"#;

pub(crate) const PEDAGOGUE_SYSTEM: &str = r#"You are a learning-design specialist. You assess teaching material for how well it will actually teach: clarity, flow, tone, engagement, and difficulty ramp. You do not check facts and you never rewrite the draft.

Respond with a single JSON object and nothing else, in exactly this shape:
{
  "points": [
    {
      "section": "heading or area of the draft",
      "kind": "Clarity" | "Flow" | "Tone" | "Engagement" | "Difficulty",
      "observation": "what you noticed",
      "suggestion": "a concrete improvement"
    }
  ],
  "overall_assessment": "one-paragraph view of the draft as teaching material",
  "engagement_score": 0-100
}

Score 80+ only when the material would hold a student's attention without an instructor pushing them through it."#;

const PEDAGOGUE_USER: &str = r#"Assess the teaching quality of the draft below.

<draft>
{draft}
</draft>"#;

pub(crate) const EDITOR_SYSTEM: &str = r#"You are a surgical copy editor. You receive a draft plus reviewer feedback, and you return targeted replacements that resolve the feedback while changing as little text as possible.

Respond with a single JSON object and nothing else, in exactly this shape:
{
  "replacements": [
    {
      "target_text": "text copied exactly from the draft, including whitespace",
      "replacement_text": "what it should become",
      "reason": "which feedback item this resolves"
    }
  ],
  "summary_of_changes": "one or two sentences describing the edit pass"
}

Rules:
- target_text must be quoted verbatim from the draft; it is matched mechanically.
- Keep each target_text long enough to be unique in the draft (a full sentence or line).
- Never return the whole draft as one replacement.
- An empty replacements list is a valid answer when no change is warranted."#;

const EDITOR_USER: &str = r#"Apply the reviewer feedback to this draft.

<draft>
{draft}
</draft>

ACCURACY FEEDBACK (highest priority first):
{audit_feedback}

{pedagogue_feedback}"#;

const EDITOR_INSTRUCTION_USER: &str = r#"Apply the author's instruction to this draft.

<draft>
{draft}
</draft>

INSTRUCTION:
{instruction}"#;

pub(crate) fn creator_prompt(mode: ContentMode, topic: &str, subtopics: &str) -> String {
    let template = match mode {
        ContentMode::LectureNotes => CREATOR_LECTURE_USER,
        ContentMode::PrereadNotes => CREATOR_PREREAD_USER,
    };
    template.replace("{topic}", topic).replace("{subtopics}", subtopics)
}

pub(crate) fn auditor_prompt(draft: &str, transcript: &str) -> String {
    AUDITOR_USER.replace("{draft}", draft).replace("{transcript}", transcript)
}

pub(crate) fn pedagogue_prompt(draft: &str, target_audience: &str) -> String {
    let audience_instruction = format!(
        "\n\nIMPORTANT: Assess this content specifically for a '{target_audience}' audience."
    );
    PEDAGOGUE_USER.replace("{draft}", draft) + &audience_instruction
}

pub(crate) fn editor_prompt(draft: &str, audit_feedback: &str, pedagogue_feedback: &str) -> String {
    EDITOR_USER
        .replace("{draft}", draft)
        .replace("{audit_feedback}", audit_feedback)
        .replace("{pedagogue_feedback}", pedagogue_feedback)
}

pub(crate) fn editor_instruction_prompt(draft: &str, instruction: &str) -> String {
    EDITOR_INSTRUCTION_USER.replace("{draft}", draft).replace("{instruction}", instruction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_mode_display() {
        assert_eq!(ContentMode::LectureNotes.to_string(), "Lecture Notes");
        assert_eq!(ContentMode::PrereadNotes.to_string(), "Pre-read Notes");
    }

    #[test]
    fn test_creator_prompt_substitutes_fields() {
        let prompt = creator_prompt(ContentMode::LectureNotes, "Photosynthesis", "light reactions, Calvin cycle");
        assert!(prompt.contains("Topic: Photosynthesis"));
        assert!(prompt.contains("light reactions, Calvin cycle"));
        assert!(!prompt.contains("{topic}"));
        assert!(!prompt.contains("{subtopics}"));
    }

    #[test]
    fn test_creator_prompt_varies_by_mode() {
        let lecture = creator_prompt(ContentMode::LectureNotes, "T", "S");
        let preread = creator_prompt(ContentMode::PrereadNotes, "T", "S");
        assert_ne!(lecture, preread);
        assert!(preread.contains("before class"));
    }

    #[test]
    fn test_pedagogue_prompt_appends_audience() {
        let prompt = pedagogue_prompt("(Refer to <current_draft> block in cached context)", "First-year undergraduates");
        assert!(prompt.ends_with("for a 'First-year undergraduates' audience."));
    }

    #[test]
    fn test_editor_prompt_carries_both_feedback_blocks() {
        let prompt = editor_prompt("the draft", "- Intro: wrong date -> fix it", "PEDAGOGICAL NOTE: dry");
        assert!(prompt.contains("the draft"));
        assert!(prompt.contains("wrong date"));
        assert!(prompt.contains("PEDAGOGICAL NOTE: dry"));
    }

    #[test]
    fn test_reviewer_contracts_name_their_fields() {
        assert!(AUDITOR_SYSTEM.contains("\"findings\""));
        assert!(AUDITOR_SYSTEM.contains("\"quality_score\""));
        assert!(PEDAGOGUE_SYSTEM.contains("\"engagement_score\""));
        assert!(EDITOR_SYSTEM.contains("\"replacements\""));
    }
}
