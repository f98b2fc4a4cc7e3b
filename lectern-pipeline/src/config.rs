//! Pipeline configuration.

use lectern_core::{LecternError, Result};
use serde::{Deserialize, Serialize};

/// Model used for any stage without an explicit override.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

/// Which Claude model answers each stage. Stages may run different snapshots;
/// all calls still flow through one client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageModels {
    #[serde(default = "default_model")]
    pub draft: String,
    #[serde(default = "default_model")]
    pub accuracy: String,
    #[serde(default = "default_model")]
    pub pedagogy: String,
    #[serde(default = "default_model")]
    pub edit: String,
    #[serde(default = "default_model")]
    pub finalize: String,
}

impl Default for StageModels {
    fn default() -> Self {
        Self {
            draft: default_model(),
            accuracy: default_model(),
            pedagogy: default_model(),
            edit: default_model(),
            finalize: default_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub models: StageModels,
    /// Upper bound on critique-and-revise iterations, counting the first.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Accepted in config files for compatibility; the pipeline does not pause
    /// for approval yet.
    #[serde(default)]
    pub human_in_loop: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            models: StageModels::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            human_in_loop: false,
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Use one model for every stage.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.models = StageModels {
            draft: model.clone(),
            accuracy: model.clone(),
            pedagogy: model.clone(),
            edit: model.clone(),
            finalize: model,
        };
        self
    }

    #[must_use]
    pub fn with_models(mut self, models: StageModels) -> Self {
        self.models = models;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(LecternError::Config(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        for (stage, model) in [
            ("draft", &self.models.draft),
            ("accuracy", &self.models.accuracy),
            ("pedagogy", &self.models.pedagogy),
            ("edit", &self.models.edit),
            ("finalize", &self.models.finalize),
        ] {
            if model.trim().is_empty() {
                return Err(LecternError::Config(format!("{stage} model id must not be empty")));
            }
        }
        Ok(())
    }

    /// Parse and validate a TOML config. Missing fields take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| LecternError::Config(format!("invalid pipeline config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay `LECTERN_*` environment variables onto this config.
    ///
    /// `LECTERN_MODEL` replaces every stage id at once; the per-stage
    /// variables (`LECTERN_DRAFT_MODEL`, `LECTERN_ACCURACY_MODEL`,
    /// `LECTERN_PEDAGOGY_MODEL`, `LECTERN_EDIT_MODEL`,
    /// `LECTERN_FINALIZE_MODEL`) then win over it, and
    /// `LECTERN_MAX_ITERATIONS` replaces the iteration budget.
    pub fn apply_env_overrides(self) -> Result<Self> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    fn apply_overrides(mut self, get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(model) = get("LECTERN_MODEL") {
            self = self.with_model(model);
        }
        for (var, slot) in [
            ("LECTERN_DRAFT_MODEL", &mut self.models.draft),
            ("LECTERN_ACCURACY_MODEL", &mut self.models.accuracy),
            ("LECTERN_PEDAGOGY_MODEL", &mut self.models.pedagogy),
            ("LECTERN_EDIT_MODEL", &mut self.models.edit),
            ("LECTERN_FINALIZE_MODEL", &mut self.models.finalize),
        ] {
            if let Some(model) = get(var) {
                *slot = model;
            }
        }
        if let Some(raw) = get("LECTERN_MAX_ITERATIONS") {
            self.max_iterations = raw.parse().map_err(|_| {
                LecternError::Config(format!(
                    "LECTERN_MAX_ITERATIONS must be an integer, got {raw:?}"
                ))
            })?;
        }
        self.validate()?;
        Ok(self)
    }
}
