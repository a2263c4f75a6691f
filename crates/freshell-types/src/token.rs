use serde::{Deserialize, Serialize};

/// Default Claude/Codex context window when a model name isn't recognized (§6).
pub const DEFAULT_CONTEXT_WINDOW: u64 = 200_000;

/// Per-session token usage snapshot (§3 `TokenSummary`).
///
/// Every numeric field is finite and non-negative by construction (all fields are unsigned
/// integers); `compact_percent` is clamped to `[0, 100]` by `TokenSummary::new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSummary {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cached_tokens: u64,
    pub total_tokens: u64,
    /// Current-turn context size; never a cumulative counter (§4.2).
    pub context_tokens: u64,
    pub model_context_window: u64,
    pub compact_threshold_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compact_percent: Option<u8>,
}

impl TokenSummary {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        input_tokens: u64,
        output_tokens: u64,
        cached_tokens: u64,
        total_tokens: u64,
        context_tokens: u64,
        model_context_window: u64,
        compact_threshold_tokens: u64,
    ) -> Self {
        let compact_percent = if compact_threshold_tokens > 0 {
            let pct = (context_tokens as f64 / compact_threshold_tokens as f64) * 100.0;
            Some(pct.round().clamp(0.0, 100.0) as u8)
        } else {
            None
        };

        Self {
            input_tokens,
            output_tokens,
            cached_tokens,
            total_tokens,
            context_tokens,
            model_context_window,
            compact_threshold_tokens,
            compact_percent,
        }
    }
}
