//! Parsing of structured model replies.
//!
//! Reviewer and editor stages ask for bare JSON, but models sometimes wrap it
//! in Markdown fences or a line of prose. Parsing tolerates both wrappers and
//! nothing else; a reply that still fails its contract is a stage failure.

use lectern_core::{LecternError, Result};
use serde::de::DeserializeOwned;

/// Remove a surrounding Markdown code fence, if present.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") up to the end of the opening line.
    let rest = match rest.find('\n') {
        Some(index) => &rest[index + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse a model reply into `T`, tolerating fences and leading/trailing prose.
pub(crate) fn parse_stage_reply<T: DeserializeOwned>(text: &str) -> Result<T> {
    let cleaned = strip_fences(text);
    match serde_json::from_str(cleaned) {
        Ok(value) => Ok(value),
        Err(first_error) => {
            // Second chance: the outermost object, in case the model added prose.
            if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
                if start < end {
                    if let Ok(value) = serde_json::from_str(&cleaned[start..=end]) {
                        return Ok(value);
                    }
                }
            }
            Err(LecternError::Parse(format!(
                "stage reply did not match its JSON contract: {first_error}"
            )))
        }
    }
}
