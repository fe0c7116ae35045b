use std::collections::HashMap;

use serde::Serialize;

/// Per-model API accounting: diagnostic only, never decision-affecting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelUsage {
    pub calls: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_ms: u128,
}

/// Append-only usage/timing accumulator for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageMeter {
    pub per_model: HashMap<String, ModelUsage>,
}

impl UsageMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        model: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
        elapsed_ms: u128,
    ) {
        let usage = self.per_model.entry(model.to_string()).or_default();
        usage.calls += 1;
        usage.prompt_tokens += prompt_tokens;
        usage.completion_tokens += completion_tokens;
        usage.total_ms += elapsed_ms;
    }

    pub fn total_calls(&self) -> u64 {
        self.per_model.values().map(|usage| usage.calls).sum()
    }
}
