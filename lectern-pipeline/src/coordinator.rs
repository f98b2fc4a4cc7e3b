//! Structured model calls and the concurrent critique fan-out.

use lectern_core::{
    CritiqueReport, GenerationRequest, LanguageModel, PedagogyReport, Result, TokenUsage,
};
use lectern_model::pricing::cost_of;
use serde::de::DeserializeOwned;

use crate::config::StageModels;
use crate::parse::parse_stage_reply;
use crate::stages;

/// Stand-in for the draft inside prompts whose real text travels in the
/// cached context instead.
const DRAFT_MARKER: &str = "(Refer to <current_draft> block in cached context)";
const TRANSCRIPT_MARKER: &str = "(Refer to <transcript> block in cached context)";
const NO_TRANSCRIPT: &str = "No transcript provided.";

/// Structured replies are decoded against a JSON contract, so sampling is
/// pinned to deterministic output.
const STRUCTURED_TEMPERATURE: f32 = 0.0;

/// Call the model and decode its reply as `T`.
///
/// Returns the decoded value together with the token usage and the cost of
/// the call, so callers can account for it even when they discard the value.
pub(crate) async fn structured_call<T: DeserializeOwned>(
    model: &dyn LanguageModel,
    model_id: &str,
    system: &str,
    user: String,
    cached_context: Option<String>,
) -> Result<(T, TokenUsage, f64)> {
    let mut request = GenerationRequest::new(model_id, system, user)
        .with_temperature(STRUCTURED_TEMPERATURE);
    if let Some(context) = cached_context {
        request = request.with_cached_context(context);
    }

    let generation = model.generate(request).await?;
    let value = parse_stage_reply::<T>(&generation.text)?;
    let cost = cost_of(generation.usage, model_id);
    Ok((value, generation.usage, cost))
}

/// What the critique round produced. A failed reviewer leaves its slot
/// `None`; the round itself never fails.
#[derive(Debug, Default)]
pub(crate) struct CritiqueOutcome {
    pub accuracy: Option<CritiqueReport>,
    pub accuracy_usage: TokenUsage,
    pub accuracy_cost: f64,
    pub pedagogy: Option<PedagogyReport>,
    pub pedagogy_usage: TokenUsage,
    pub pedagogy_cost: f64,
}

/// Run the accuracy critique, and optionally the pedagogy critique, against
/// the current draft concurrently.
///
/// The draft (and transcript, when present) is sent once as cacheable
/// context shared by both reviewers; the prompts themselves only carry
/// markers pointing into it.
pub(crate) async fn run_critiques(
    model: &dyn LanguageModel,
    models: &StageModels,
    document: &str,
    reference: Option<&str>,
    audience: &str,
    run_pedagogy: bool,
) -> CritiqueOutcome {
    let cached = cached_payload(document, reference);
    let transcript_marker = if reference.is_some() { TRANSCRIPT_MARKER } else { NO_TRANSCRIPT };

    let accuracy_call = async {
        let user = stages::auditor_prompt(DRAFT_MARKER, transcript_marker);
        match structured_call::<CritiqueReport>(
            model,
            &models.accuracy,
            stages::AUDITOR_SYSTEM,
            user,
            Some(cached.clone()),
        )
        .await
        {
            Ok((report, usage, cost)) => (Some(report), usage, cost),
            Err(e) => {
                tracing::warn!(error = %e, "accuracy critique failed; continuing without it");
                (None, TokenUsage::default(), 0.0)
            }
        }
    };

    let pedagogy_call = async {
        if !run_pedagogy {
            return (None, TokenUsage::default(), 0.0);
        }
        let user = stages::pedagogue_prompt(DRAFT_MARKER, audience);
        match structured_call::<PedagogyReport>(
            model,
            &models.pedagogy,
            stages::PEDAGOGUE_SYSTEM,
            user,
            Some(cached.clone()),
        )
        .await
        {
            Ok((report, usage, cost)) => (Some(report), usage, cost),
            Err(e) => {
                tracing::warn!(error = %e, "pedagogy critique failed; continuing without it");
                (None, TokenUsage::default(), 0.0)
            }
        }
    };

    let (
        (accuracy, accuracy_usage, accuracy_cost),
        (pedagogy, pedagogy_usage, pedagogy_cost),
    ) = tokio::join!(accuracy_call, pedagogy_call);

    CritiqueOutcome {
        accuracy,
        accuracy_usage,
        accuracy_cost,
        pedagogy,
        pedagogy_usage,
        pedagogy_cost,
    }
}

fn cached_payload(document: &str, reference: Option<&str>) -> String {
    match reference {
        Some(transcript) => format!(
            "<transcript>\n{transcript}\n</transcript>\n<current_draft>\n{document}\n</current_draft>"
        ),
        None => format!("<current_draft>\n{document}\n</current_draft>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_model::MockModel;
    use serde_json::json;

    fn critique_json() -> serde_json::Value {
        json!({
            "findings": [{
                "section": "Intro",
                "issue": "wrong year",
                "severity": "Major",
                "suggestion": "use 1969"
            }],
            "summary": "One dating error.",
            "quality_score": 78
        })
    }

    fn pedagogy_json() -> serde_json::Value {
        json!({
            "points": [{
                "section": "Intro",
                "kind": "Engagement",
                "observation": "dry opening",
                "suggestion": "start with the landing itself"
            }],
            "overall_assessment": "Solid but flat.",
            "engagement_score": 70
        })
    }

    #[tokio::test]
    async fn test_critiques_run_against_cached_context() {
        let mock = MockModel::new()
            .script_json("audit-model", &critique_json())
            .script_json("ped-model", &pedagogy_json());
        let models = StageModels {
            draft: "draft-model".to_string(),
            accuracy: "audit-model".to_string(),
            pedagogy: "ped-model".to_string(),
            edit: "edit-model".to_string(),
            finalize: "edit-model".to_string(),
        };

        let outcome =
            run_critiques(&mock, &models, "the draft", Some("the source"), "Beginner", true).await;

        let accuracy = outcome.accuracy.unwrap();
        assert_eq!(accuracy.quality_score, 78);
        let pedagogy = outcome.pedagogy.unwrap();
        assert_eq!(pedagogy.engagement_score, 70);

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        for call in &calls {
            let cached = call.cached_context.as_deref().unwrap();
            assert!(cached.contains("<current_draft>\nthe draft\n</current_draft>"));
            assert!(cached.contains("<transcript>\nthe source\n</transcript>"));
            assert!(call.user.contains(DRAFT_MARKER));
            assert_eq!(call.temperature, 0.0);
        }
        let audit = calls.iter().find(|c| c.model == "audit-model").unwrap();
        assert!(audit.user.contains(TRANSCRIPT_MARKER));
        let ped = calls.iter().find(|c| c.model == "ped-model").unwrap();
        assert!(ped.user.contains("'Beginner' audience"));
    }

    #[tokio::test]
    async fn test_missing_reference_is_stated_in_the_prompt() {
        let mock = MockModel::new().script_json("audit-model", &critique_json());
        let models = StageModels {
            accuracy: "audit-model".to_string(),
            ..StageModels::default()
        };

        let outcome = run_critiques(&mock, &models, "draft", None, "General Student", false).await;

        assert!(outcome.accuracy.is_some());
        assert!(outcome.pedagogy.is_none());
        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].user.contains(NO_TRANSCRIPT));
        assert!(!calls[0].cached_context.as_deref().unwrap().contains("<transcript>"));
    }

    #[tokio::test]
    async fn test_one_failed_reviewer_does_not_sink_the_other() {
        let mock = MockModel::new()
            .script_error("audit-model", "upstream fell over")
            .script_json("ped-model", &pedagogy_json());
        let models = StageModels {
            accuracy: "audit-model".to_string(),
            pedagogy: "ped-model".to_string(),
            ..StageModels::default()
        };

        let outcome = run_critiques(&mock, &models, "draft", None, "General Student", true).await;

        assert!(outcome.accuracy.is_none());
        assert_eq!(outcome.accuracy_cost, 0.0);
        assert_eq!(outcome.accuracy_usage, TokenUsage::default());
        assert!(outcome.pedagogy.is_some());
        assert!(outcome.pedagogy_cost > 0.0);
    }

    #[tokio::test]
    async fn test_unparseable_reply_counts_as_a_failed_reviewer() {
        let mock = MockModel::new().script_text("audit-model", "I refuse to emit JSON.");
        let models = StageModels {
            accuracy: "audit-model".to_string(),
            ..StageModels::default()
        };

        let outcome = run_critiques(&mock, &models, "draft", None, "General Student", false).await;

        assert!(outcome.accuracy.is_none());
        assert_eq!(outcome.accuracy_cost, 0.0);
    }
}
