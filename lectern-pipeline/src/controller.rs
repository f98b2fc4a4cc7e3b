//! The pipeline controller: draft, critique, edit, finalize.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use async_stream::stream;
use lectern_core::{
    CritiqueReport, EditBatch, GenerationRequest, LanguageModel, PedagogyReport, ProgressEvent,
    ProgressStream, Stage, TokenUsage,
};
use lectern_model::pricing::cost_of;
use regex::Regex;
use uuid::Uuid;

use crate::compaction::{compress_critique, compress_pedagogy, edit_status};
use crate::config::PipelineConfig;
use crate::coordinator::{run_critiques, structured_call};
use crate::patch::apply_edits;
use crate::stages::{self, ContentMode};
use crate::stop::StopSignal;

/// Audience used when the caller does not name one.
pub const DEFAULT_AUDIENCE: &str = "General Student";

/// A clean critique at or above this quality score ends the loop early.
const STOP_EARLY_SCORE: u8 = 90;

const PREVIEW_SUBTOPICS: usize = 2;
const PREVIEW_CHARS: usize = 20;

/// Everything a single run needs to know about what to write.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Subject of the document.
    pub topic: String,
    /// Comma-separated list of subtopics to cover. May be empty.
    pub subtopics: String,
    /// Source material the accuracy critique checks the draft against.
    pub reference: Option<String>,
    /// Document shape to produce.
    pub mode: ContentMode,
    /// Audience the pedagogy critique assesses for.
    pub audience: String,
}

impl RunRequest {
    pub fn new(topic: impl Into<String>, subtopics: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            subtopics: subtopics.into(),
            reference: None,
            mode: ContentMode::default(),
            audience: DEFAULT_AUDIENCE.to_string(),
        }
    }

    /// Attach source material, such as a lecture transcript, for the
    /// accuracy critique to check against.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ContentMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }
}

/// Drives a draft through repeated critique-and-edit rounds until the
/// critique comes back clean or the iteration budget runs out.
///
/// A run is started with [`Pipeline::run`], which returns a stream of
/// [`ProgressEvent`]s ending in either `Completed` or `Error`. The pipeline
/// itself is cheap to clone-share via [`Arc`] and holds no per-run state.
pub struct Pipeline {
    model: Arc<dyn LanguageModel>,
    config: PipelineConfig,
    stop: StopSignal,
}

impl Pipeline {
    pub fn new(model: Arc<dyn LanguageModel>, config: PipelineConfig) -> Self {
        Self { model, config, stop: StopSignal::new() }
    }

    /// Replace the stop signal, e.g. to share one handle across runs.
    #[must_use]
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Handle the caller can raise to stop an in-flight run at the next
    /// stage boundary.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Run the full pipeline for `request`.
    ///
    /// The returned stream yields progress as it happens and finishes with a
    /// single terminal event. Reviewer failures degrade the run rather than
    /// aborting it; only a failed or empty draft is fatal.
    pub fn run(&self, request: RunRequest) -> ProgressStream {
        let model = Arc::clone(&self.model);
        let config = self.config.clone();
        let stop = self.stop.clone();

        Box::pin(stream! {
            if let Err(e) = config.validate() {
                yield ProgressEvent::error(e.to_string());
                return;
            }
            let run_id = Uuid::new_v4();
            tracing::info!(%run_id, topic = %request.topic, mode = %request.mode, "pipeline run started");

            let mut state = RunState::new();
            let models = &config.models;

            // Draft stage. Everything after this survives on a degraded
            // path, but without a draft there is nothing to iterate on.
            let preview = subtopic_preview(&request.topic, &request.subtopics);
            yield ProgressEvent::step(
                Stage::Draft,
                &models.draft,
                format!("Drafting: {} covering {}...", request.mode, preview),
            );
            let draft_request = GenerationRequest::new(
                &models.draft,
                stages::CREATOR_SYSTEM,
                stages::creator_prompt(request.mode, &request.topic, &request.subtopics),
            );
            let generation = match model.generate(draft_request).await {
                Ok(generation) => generation,
                Err(e) => {
                    tracing::error!(%run_id, error = %e, "draft generation failed");
                    yield ProgressEvent::error(format!("Critical Error in Creator: {e}"));
                    return;
                }
            };
            if generation.text.trim().is_empty() {
                yield ProgressEvent::error("Failed to generate draft.");
                return;
            }
            let draft_cost = cost_of(generation.usage, &models.draft);
            state.record_cost(&models.draft, draft_cost);
            state.document = generation.text;
            yield ProgressEvent::step_detail(
                Stage::Draft,
                &models.draft,
                "Draft Generated",
                Some(state.document.clone()),
                generation.usage,
                draft_cost,
            );

            while state.iteration < config.max_iterations {
                state.iteration += 1;
                // Engagement settles after the first round of fixes; the
                // pedagogy critique only runs on the first pass.
                let run_pedagogy = state.iteration == 1;

                yield ProgressEvent::step(
                    Stage::Pipeline,
                    "system",
                    format!("Iteration {}: Critiquing...", state.iteration),
                );
                if stop.is_raised() {
                    yield ProgressEvent::step(Stage::Pipeline, "system", "Generation stopped by user.");
                    break;
                }

                yield ProgressEvent::step(
                    Stage::AccuracyCritique,
                    &models.accuracy,
                    "Auditing: checking facts, code, and structure...",
                );
                if run_pedagogy {
                    yield ProgressEvent::step(
                        Stage::PedagogyCritique,
                        &models.pedagogy,
                        format!("Analyzing: engagement for '{}'...", request.audience),
                    );
                }

                let outcome = run_critiques(
                    model.as_ref(),
                    models,
                    &state.document,
                    request.reference.as_deref(),
                    &request.audience,
                    run_pedagogy,
                )
                .await;
                state.record_cost(&models.accuracy, outcome.accuracy_cost);
                if run_pedagogy {
                    state.record_cost(&models.pedagogy, outcome.pedagogy_cost);
                    state.pedagogy = outcome.pedagogy;
                }
                state.accuracy = outcome.accuracy;

                let score = state
                    .accuracy
                    .as_ref()
                    .map_or_else(|| "N/A".to_string(), |r| r.quality_score.to_string());
                yield ProgressEvent::step_detail(
                    Stage::AccuracyCritique,
                    &models.accuracy,
                    format!("Quality Score: {score}"),
                    state.accuracy.as_ref().and_then(|r| serde_json::to_string_pretty(r).ok()),
                    outcome.accuracy_usage,
                    outcome.accuracy_cost,
                );
                if run_pedagogy {
                    if let Some(report) = state.pedagogy.as_ref() {
                        yield ProgressEvent::step_detail(
                            Stage::PedagogyCritique,
                            &models.pedagogy,
                            format!("Engagement: {}", report.engagement_score),
                            serde_json::to_string_pretty(report).ok(),
                            outcome.pedagogy_usage,
                            outcome.pedagogy_cost,
                        );
                    }
                }

                if should_stop_early(state.accuracy.as_ref()) {
                    yield ProgressEvent::step(Stage::Pipeline, "system", "Critique Clean. Breaking loop.");
                    break;
                }
                if state.iteration == config.max_iterations {
                    yield ProgressEvent::step(
                        Stage::Pipeline,
                        "system",
                        "Max iterations reached. Skipping final edit.",
                    );
                    break;
                }

                // Edit stage.
                yield ProgressEvent::step(Stage::Edit, &models.edit, edit_status(state.accuracy.as_ref()));
                let editor_user = stages::editor_prompt(
                    &state.document,
                    &compress_critique(state.accuracy.as_ref()),
                    &compress_pedagogy(state.pedagogy.as_ref()),
                );
                let (batch, usage, cost) = match structured_call::<EditBatch>(
                    model.as_ref(),
                    &models.edit,
                    stages::EDITOR_SYSTEM,
                    editor_user,
                    None,
                )
                .await
                {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::warn!(%run_id, error = %e, "edit stage failed");
                        yield ProgressEvent::warning(Stage::Edit, "Editor API failed. Skipping iteration.");
                        continue;
                    }
                };
                state.record_cost(&models.edit, cost);

                if batch.replacements.is_empty() {
                    yield ProgressEvent::step(Stage::Edit, &models.edit, "No changes needed.");
                    continue;
                }
                let (updated, applied) = apply_edits(&state.document, &batch.replacements);
                if applied == 0 {
                    yield ProgressEvent::warning(
                        Stage::Edit,
                        "Could not apply strict edits. Keeping draft.",
                    );
                    continue;
                }
                state.document = updated;
                yield ProgressEvent::step_detail(
                    Stage::Edit,
                    &models.edit,
                    format!("Applied {applied} fixes"),
                    serde_json::to_string_pretty(&batch).ok(),
                    usage,
                    cost,
                );
                yield ProgressEvent::step_detail(
                    Stage::Pipeline,
                    "system",
                    "Draft Updated",
                    Some(state.document.clone()),
                    TokenUsage::default(),
                    0.0,
                );
            }

            state.document = normalize_blank_lines(&state.document);
            tracing::info!(
                %run_id,
                iterations = state.iteration,
                total_cost = state.cost,
                models = ?state.models_used,
                "pipeline run complete"
            );
            yield ProgressEvent::step(Stage::Finalize, "system", "Complete!");
            yield ProgressEvent::completed(state.document, state.cost);
        })
    }

    /// Apply a one-off instruction to an existing document, outside the
    /// critique loop. Returns the revised document and the cost of the call;
    /// on any failure the document comes back unchanged at zero cost.
    pub async fn refine(&self, document: &str, instruction: &str) -> (String, f64) {
        let user = stages::editor_instruction_prompt(document, instruction);
        match structured_call::<EditBatch>(
            self.model.as_ref(),
            &self.config.models.edit,
            stages::EDITOR_SYSTEM,
            user,
            None,
        )
        .await
        {
            Ok((batch, _, cost)) => {
                let (updated, applied) = apply_edits(document, &batch.replacements);
                tracing::info!(applied, "refine applied edits");
                (updated, cost)
            }
            Err(e) => {
                tracing::warn!(error = %e, "refine failed; returning document unchanged");
                (document.to_string(), 0.0)
            }
        }
    }
}

/// Mutable state threaded through one run.
struct RunState {
    document: String,
    iteration: u32,
    cost: f64,
    models_used: HashSet<String>,
    accuracy: Option<CritiqueReport>,
    pedagogy: Option<PedagogyReport>,
}

impl RunState {
    fn new() -> Self {
        Self {
            document: String::new(),
            iteration: 0,
            cost: 0.0,
            models_used: HashSet::new(),
            accuracy: None,
            pedagogy: None,
        }
    }

    fn record_cost(&mut self, model: &str, cost: f64) {
        self.models_used.insert(model.to_string());
        self.cost += cost;
    }
}

fn should_stop_early(report: Option<&CritiqueReport>) -> bool {
    report.is_some_and(|r| r.quality_score >= STOP_EARLY_SCORE && r.critical_count() == 0)
}

/// Short human-readable slice of the subtopics for the drafting status line.
fn subtopic_preview(topic: &str, subtopics: &str) -> String {
    if subtopics.trim().is_empty() {
        return topic.to_string();
    }
    subtopics
        .split(',')
        .take(PREVIEW_SUBTOPICS)
        .map(|s| s.trim().chars().take(PREVIEW_CHARS).collect::<String>())
        .collect::<Vec<_>>()
        .join(", ")
}

static BLANK_RUNS_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_blank_runs_regex() -> &'static Regex {
    BLANK_RUNS_REGEX.get_or_init(|| Regex::new(r"\n{3,}").expect("Invalid regex pattern"))
}

/// Collapse runs of three or more newlines left behind by splices.
fn normalize_blank_lines(text: &str) -> String {
    get_blank_runs_regex().replace_all(text, "\n\n").into_owned()
}
