//! Static per-model pricing and call cost accounting.
//!
//! Rates are expressed per million tokens. Unknown model ids fall back to
//! their family rate (matched on the id substring), and unrecognized families
//! are billed at the default model's rate rather than silently costing zero.

use lectern_core::TokenUsage;

/// Per-million-token rates for one model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input: f64,
    pub output: f64,
}

const SONNET_4_5: ModelPricing = ModelPricing { input: 300.0, output: 1500.0 };
const HAIKU_4_5: ModelPricing = ModelPricing { input: 100.0, output: 500.0 };
const OPUS_4_5: ModelPricing = ModelPricing { input: 500.0, output: 2500.0 };
const HAIKU_3: ModelPricing = ModelPricing { input: 25.0, output: 125.0 };

const PRICING: &[(&str, ModelPricing)] = &[
    ("claude-sonnet-4-5-20250929", SONNET_4_5),
    ("claude-haiku-4-5-20251001", HAIKU_4_5),
    ("claude-opus-4-5-20251101", OPUS_4_5),
    ("claude-3-haiku-20240307", HAIKU_3),
];

/// Look up rates for a model id, falling back by family and then to the
/// default model's rates. Unknown haiku snapshots bill at the conservative
/// haiku-3 rate.
pub fn pricing_for(model: &str) -> ModelPricing {
    if let Some((_, pricing)) = PRICING.iter().find(|(id, _)| *id == model) {
        return *pricing;
    }
    if model.contains("opus") {
        OPUS_4_5
    } else if model.contains("sonnet") {
        SONNET_4_5
    } else if model.contains("haiku") {
        HAIKU_3
    } else {
        SONNET_4_5
    }
}

/// Cost of one call, rounded to six decimal places.
pub fn cost_of(usage: TokenUsage, model: &str) -> f64 {
    let pricing = pricing_for(model);
    let cost = (f64::from(usage.input_tokens) / 1_000_000.0) * pricing.input
        + (f64::from(usage.output_tokens) / 1_000_000.0) * pricing.output;
    round6(cost)
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}
