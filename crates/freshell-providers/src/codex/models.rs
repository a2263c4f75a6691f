//! Codex model → context-window table (§6), used only as a fallback when a `token_count`
//! event doesn't carry `model_context_window` directly. Matched by longest prefix since
//! Codex model identifiers grow suffixes (`-preview`, dated snapshots) the vendor itself
//! doesn't enumerate for us.

use freshell_types::DEFAULT_CONTEXT_WINDOW;

struct ModelSpec {
    prefix: &'static str,
    context_window: u64,
}

const MODEL_SPECS: &[ModelSpec] = &[
    ModelSpec { prefix: "gpt-5.2", context_window: 400_000 },
    ModelSpec { prefix: "gpt-5.1-codex-max", context_window: 400_000 },
    ModelSpec { prefix: "gpt-5.1-codex-mini", context_window: 400_000 },
    ModelSpec { prefix: "gpt-5.1-codex", context_window: 400_000 },
    ModelSpec { prefix: "gpt-5.1", context_window: 400_000 },
    ModelSpec { prefix: "gpt-5-codex-mini", context_window: 400_000 },
    ModelSpec { prefix: "gpt-5-codex", context_window: 400_000 },
    ModelSpec { prefix: "gpt-5", context_window: 400_000 },
];

/// Resolve a model identifier's context window by longest matching prefix, falling back to
/// the shared default when nothing in the table matches (§6).
pub fn context_window_for(model: &str) -> u64 {
    MODEL_SPECS
        .iter()
        .filter(|spec| model.starts_with(spec.prefix))
        .max_by_key(|spec| spec.prefix.len())
        .map(|spec| spec.context_window)
        .unwrap_or(DEFAULT_CONTEXT_WINDOW)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_prefixes() {
        assert_eq!(context_window_for("gpt-5.1-codex-max"), 400_000);
        assert_eq!(context_window_for("gpt-5"), 400_000);
    }

    #[test]
    fn longest_prefix_wins() {
        assert_eq!(context_window_for("gpt-5.1-codex-max-preview"), 400_000);
    }

    #[test]
    fn unknown_model_falls_back_to_default() {
        assert_eq!(context_window_for("o3-mini"), DEFAULT_CONTEXT_WINDOW);
    }
}
