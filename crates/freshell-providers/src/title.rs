//! Shared title/summary extraction heuristics (§4.2), used by every provider's meta-parser.

const MODE_TAG_PREFIX: char = '[';

const REJECT_PREAMBLES: &[&str] = &["# AGENTS.md", "# System", "# Instructions"];

const REJECT_XML_WRAPPERS: &[&str] = &[
    "<system_context>",
    "<environment_context>",
    "<user_instructions>",
    "<INSTRUCTIONS>",
];

const AGENT_BOILERPLATE_PREFIX: &str = "You are an automated";

const IDE_CONTEXT_MARKER: &str = "My request:";

/// Attempt to derive a human-facing title from a raw user-message text block. Returns `None`
/// when the text is obviously not user intent (system preambles, pasted shell output, …).
pub fn extract_title(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if is_bracketed_mode_tag(trimmed) {
        return None;
    }
    if REJECT_PREAMBLES.iter().any(|p| trimmed.starts_with(p)) {
        return None;
    }
    if REJECT_XML_WRAPPERS.iter().any(|p| trimmed.contains(p)) {
        return None;
    }
    if looks_like_shell_transcript(trimmed) {
        return None;
    }
    if trimmed.starts_with(AGENT_BOILERPLATE_PREFIX) {
        return None;
    }
    if looks_like_digit_comma_dump(trimmed) {
        return None;
    }

    let extracted = extract_ide_request(trimmed).unwrap_or(trimmed);
    Some(clean_and_truncate(extracted, 200))
}

/// Same rejection rules, truncated to summary length (240 chars) instead of title length.
pub fn extract_summary(raw: &str) -> Option<String> {
    extract_title(raw).map(|_| clean_and_truncate(raw.trim(), 240))
}

fn is_bracketed_mode_tag(text: &str) -> bool {
    let Some(stripped) = text.strip_prefix(MODE_TAG_PREFIX) else {
        return false;
    };
    let Some(end) = stripped.find(']') else {
        return false;
    };
    let inner = &stripped[..end];
    !inner.is_empty() && inner.chars().all(|c| c.is_ascii_uppercase() || c == ' ' || c == ':')
}

fn looks_like_shell_transcript(text: &str) -> bool {
    text.lines()
        .next()
        .map(|line| {
            let line = line.trim_start();
            line.starts_with("> ") || line.starts_with("$ ")
        })
        .unwrap_or(false)
}

fn looks_like_digit_comma_dump(text: &str) -> bool {
    let sample: String = text.chars().take(64).collect();
    let relevant: String = sample.chars().filter(|c| !c.is_whitespace()).collect();
    if relevant.is_empty() {
        return false;
    }
    relevant.chars().all(|c| c.is_ascii_digit() || c == ',')
}

fn extract_ide_request(text: &str) -> Option<&str> {
    let idx = text.find(IDE_CONTEXT_MARKER)?;
    let after = &text[idx + IDE_CONTEXT_MARKER.len()..];
    let trimmed = after.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn clean_and_truncate(text: &str, max_len: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_len {
        collapsed
    } else {
        collapsed.chars().take(max_len).collect()
    }
}
