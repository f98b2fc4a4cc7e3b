//! Applies editor-proposed replacements to a draft.
//!
//! Model editors quote the text they want changed, but rarely quote it
//! perfectly. Each proposal is matched against the document in three tiers,
//! strictest first: an exact substring match, a whitespace-tolerant match,
//! and finally a sliding-window fuzzy match. Proposals that miss in every
//! tier are skipped rather than applied somewhere wrong.

use lectern_core::EditProposal;
use regex::Regex;
use similar::{Algorithm, capture_diff_slices, get_diff_ratio};

/// Fuzzy matching needs enough characters to score meaningfully.
const MIN_FUZZY_TARGET_LEN: usize = 10;

/// Minimum similarity ratio for a fuzzy window to count as a match.
const FUZZY_THRESHOLD: f32 = 0.80;

/// Coarse scan stride as a fraction of the target length.
const FUZZY_SCAN_DIVISOR: usize = 10;

/// Apply each proposed replacement to `document`, one occurrence per
/// proposal. Returns the patched text and how many proposals landed.
pub fn apply_edits(document: &str, edits: &[EditProposal]) -> (String, usize) {
    let mut text = document.to_string();
    let mut applied = 0;

    for edit in edits {
        if edit.target_text.is_empty() {
            tracing::warn!("editor proposed an empty target; skipping");
            continue;
        }

        if text.contains(&edit.target_text) {
            text = text.replacen(&edit.target_text, &edit.replacement_text, 1);
            applied += 1;
            continue;
        }

        if let Some(range) = whitespace_tolerant_find(&text, &edit.target_text) {
            text.replace_range(range, &edit.replacement_text);
            applied += 1;
            continue;
        }

        if let Some(range) = fuzzy_find(&text, &edit.target_text) {
            text.replace_range(range, &edit.replacement_text);
            applied += 1;
            continue;
        }

        let snippet: String = edit.target_text.chars().take(30).collect();
        tracing::warn!(snippet = %snippet, "edit target not found in draft; skipping");
    }

    (text, applied)
}

/// Match the target with any run of whitespace standing in for any other.
///
/// Reflowed quotes are the most common editor mistake: the model joins lines
/// or collapses indentation but otherwise quotes verbatim. The whole target
/// is kept, so whitespace at the edges of the quote still has to match
/// whitespace in the document, and the matched span includes it.
fn whitespace_tolerant_find(text: &str, target: &str) -> Option<std::ops::Range<usize>> {
    let mut pattern = String::with_capacity(target.len());
    let mut literal = String::new();
    let mut chars = target.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch.is_whitespace() {
            pattern.push_str(&regex::escape(&literal));
            literal.clear();
            pattern.push_str(r"\s+");
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
        } else {
            literal.push(ch);
        }
    }
    pattern.push_str(&regex::escape(&literal));
    let re = Regex::new(&pattern).ok()?;
    re.find(text).map(|m| m.range())
}

/// Slide a window the size of the target across the document and keep the
/// most similar position, if it clears [`FUZZY_THRESHOLD`].
///
/// The scan is two-pass: a coarse pass strides by a tenth of the target
/// length, then the neighborhood of the best coarse hit is rescanned one
/// character at a time.
fn fuzzy_find(text: &str, target: &str) -> Option<std::ops::Range<usize>> {
    let target_chars: Vec<char> = target.chars().collect();
    let target_len = target_chars.len();
    if target_len < MIN_FUZZY_TARGET_LEN {
        return None;
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() < target_len {
        return None;
    }
    let last_start = chars.len() - target_len;

    let ratio_at = |start: usize| {
        let ops =
            capture_diff_slices(Algorithm::Myers, &chars[start..start + target_len], &target_chars);
        get_diff_ratio(&ops, target_len, target_len)
    };

    let step = (target_len / FUZZY_SCAN_DIVISOR).max(1);
    let mut best_start = 0;
    let mut best_ratio = f32::MIN;
    let mut start = 0;
    while start <= last_start {
        let ratio = ratio_at(start);
        if ratio > best_ratio {
            best_ratio = ratio;
            best_start = start;
        }
        start += step;
    }

    // Rescan around the coarse winner at single-character resolution.
    let from = best_start.saturating_sub(step);
    let to = (best_start + step).min(last_start);
    for start in from..=to {
        let ratio = ratio_at(start);
        if ratio > best_ratio {
            best_ratio = ratio;
            best_start = start;
        }
    }

    if best_ratio < FUZZY_THRESHOLD {
        return None;
    }

    let byte_of: Vec<usize> = text
        .char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .collect();
    Some(byte_of[best_start]..byte_of[best_start + target_len])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(target: &str, replacement: &str) -> EditProposal {
        EditProposal {
            target_text: target.to_string(),
            replacement_text: replacement.to_string(),
            reason: "test".to_string(),
        }
    }

    #[test]
    fn test_exact_match_replaces_first_occurrence_only() {
        let doc = "alpha beta alpha";
        let (out, applied) = apply_edits(doc, &[edit("alpha", "gamma")]);
        assert_eq!(out, "gamma beta alpha");
        assert_eq!(applied, 1);
    }

    #[test]
    fn test_whitespace_differences_are_tolerated() {
        let doc = "The cell membrane\n  regulates transport.";
        let (out, applied) =
            apply_edits(doc, &[edit("The cell membrane regulates transport.", "Edited.")]);
        assert_eq!(out, "Edited.");
        assert_eq!(applied, 1);
    }

    #[test]
    fn test_short_targets_never_fuzzy_match() {
        let doc = "abcXefghi";
        // Nine characters: one below the fuzzy minimum, and not an exact hit.
        let (out, applied) = apply_edits(doc, &[edit("abcdefghi", "nope")]);
        assert_eq!(out, doc);
        assert_eq!(applied, 0);
    }

    #[test]
    fn test_dissimilar_target_is_skipped() {
        let doc = "completely unrelated prose about rivers and erosion patterns";
        let (out, applied) = apply_edits(doc, &[edit("quantum chromodynamics lattice", "x")]);
        assert_eq!(out, doc);
        assert_eq!(applied, 0);
    }

    #[test]
    fn test_empty_target_is_skipped() {
        let doc = "unchanged";
        let (out, applied) = apply_edits(doc, &[edit("", "boom")]);
        assert_eq!(out, "unchanged");
        assert_eq!(applied, 0);
    }

    #[test]
    fn test_fuzzy_match_survives_small_typos() {
        // The draft has a transposition typo; the editor quotes it corrected.
        let doc = "Start. The mitochondria is teh powerhouse of the cell. End.";
        let proposal = edit(
            "The mitochondria is the powerhouse of the cell.",
            "Mitochondria generate most of the cell's ATP.",
        );
        let (out, applied) = apply_edits(doc, &[proposal]);
        assert_eq!(out, "Start. Mitochondria generate most of the cell's ATP. End.");
        assert_eq!(applied, 1);
    }
}
