//! Claude model → context-window table (§6).
//!
//! Update: the source pack resolves this by longest-prefix match over a flattened map. The
//! table this spec names is a small closed set of exact identifiers that all happen to share
//! one context window, so an exact-match `HashSet` lookup is the more honest model of "this is
//! a known, fixed list" — prefix matching would silently accept any future `claude-3-5-foo` as
//! if it were `claude-3-5-sonnet`.

use freshell_types::DEFAULT_CONTEXT_WINDOW;

/// Every `claude-*` identifier this spec names (§6). All resolve to the same window today;
/// the table is kept as an explicit closed set rather than collapsed away so a future model
/// with a different window has a single place to land.
const KNOWN_MODELS: &[(&str, u64)] = &[
    ("claude-opus-4-20250514", 200_000),
    ("claude-sonnet-4-20250514", 200_000),
    ("claude-3-7-sonnet-latest", 200_000),
    ("claude-3-7-sonnet-20250219", 200_000),
    ("claude-3-5-sonnet-latest", 200_000),
    ("claude-3-5-sonnet-20241022", 200_000),
    ("claude-3-5-sonnet-20240620", 200_000),
    ("claude-3-5-haiku-latest", 200_000),
    ("claude-3-5-haiku-20241022", 200_000),
    ("claude-3-opus-20240229", 200_000),
    ("claude-3-sonnet-20240229", 200_000),
    ("claude-3-haiku-20240307", 200_000),
];

/// Resolve a model identifier's context window; unknown models default to 200k (§6).
pub fn context_window_for(model: &str) -> u64 {
    KNOWN_MODELS
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, window)| *window)
        .unwrap_or(DEFAULT_CONTEXT_WINDOW)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_models_resolve_to_default_window() {
        for (model, window) in KNOWN_MODELS {
            assert_eq!(context_window_for(model), *window);
        }
    }

    #[test]
    fn unknown_model_defaults_to_200k() {
        assert_eq!(context_window_for("claude-nonexistent-9000"), 200_000);
    }
}
