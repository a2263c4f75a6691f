//! Transcript parsing and event normalization for Claude Code (§4.2, §4.4).

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use freshell_core::is_path_like;
use freshell_types::{
    EventKind, MessagePayload, MessageRole, NormalizedEvent, ParsedSessionMeta, ProviderId,
    ReasoningPayload, SessionEndPayload, SessionInfoPayload, ToolCallPayload, ToolResultPayload,
    TokenSummary, UNKNOWN_SESSION_ID,
};
use sha1::{Digest, Sha1};

use crate::gitinfo::split_dirty_suffix;
use super::debug_cache;
use super::io::claude_home;
use super::models::context_window_for;
use super::schema::{AssistantContent, ClaudeRecord, UserContent};

const DEFAULT_AUTOCOMPACT_PCT: f64 = 95.0;

/// Parse a whole transcript file into its session-level summary (§4.2).
pub fn parse_session_file(content: &str, _file_path: &Path) -> ParsedSessionMeta {
    let mut meta = ParsedSessionMeta::default();
    let mut seen_usage_keys: HashSet<String> = HashSet::new();
    let mut last_usage: Option<super::schema::TokenUsage> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        meta.message_count += 1;

        let Ok(record) = serde_json::from_str::<ClaudeRecord>(trimmed) else {
            continue;
        };

        match record {
            ClaudeRecord::System(sys) => {
                if meta.session_id.is_none() {
                    meta.session_id = sys.session_id;
                }
                if meta.cwd.is_none() {
                    meta.cwd = sys.cwd.filter(|c| is_path_like(c));
                }
                if meta.model.is_none() {
                    meta.model = sys.model;
                }
            }
            ClaudeRecord::User(user) => {
                if meta.session_id.is_none() {
                    meta.session_id = Some(user.session_id.clone());
                }
                if meta.cwd.is_none() {
                    meta.cwd = user.cwd.clone().filter(|c| is_path_like(c));
                }
                if meta.git_branch.is_none()
                    && let Some(branch) = &user.git_branch
                {
                    let (branch, dirty) = split_dirty_suffix(branch);
                    meta.git_branch = Some(branch);
                    meta.git_dirty = Some(dirty);
                }

                if !user.is_meta && !user.is_sidechain {
                    for block in &user.message.content {
                        if let UserContent::Text { text } = block {
                            if meta.first_user_message.is_none() {
                                meta.first_user_message = Some(text.clone());
                            }
                            if meta.title.is_none() {
                                meta.title = crate::title::extract_title(text);
                            }
                            if meta.summary.is_none() {
                                meta.summary = crate::title::extract_summary(text);
                            }
                        }
                    }
                }
            }
            ClaudeRecord::Assistant(asst) => {
                if meta.session_id.is_none() {
                    meta.session_id = Some(asst.session_id.clone());
                }
                if meta.cwd.is_none() {
                    meta.cwd = asst.cwd.clone().filter(|c| is_path_like(c));
                }
                if meta.git_branch.is_none()
                    && let Some(branch) = &asst.git_branch
                {
                    let (branch, dirty) = split_dirty_suffix(branch);
                    meta.git_branch = Some(branch);
                    meta.git_dirty = Some(dirty);
                }
                if meta.model.is_none() {
                    meta.model = Some(asst.message.model.clone());
                }

                if let Some(usage) = &asst.message.usage {
                    let key = asst
                        .uuid
                        .clone()
                        .or_else(|| asst.message.id.clone())
                        .unwrap_or_else(|| raw_line_hash(trimmed));
                    if seen_usage_keys.insert(key) {
                        last_usage = Some(usage.clone());
                    }
                }
            }
            ClaudeRecord::Summary(summary) => {
                if meta.summary.is_none() {
                    meta.summary = crate::title::extract_summary(&summary.summary);
                }
            }
            ClaudeRecord::Result(_) | ClaudeRecord::Unknown => {}
        }
    }

    if meta.session_id.is_none() {
        if let Some(stem) = _file_path.file_stem().and_then(|s| s.to_str())
            && super::io::is_valid_session_id(stem)
        {
            meta.session_id = Some(stem.to_string());
        }
    }

    if let Some(usage) = last_usage {
        meta.token_usage = Some(build_token_summary(
            &usage,
            meta.model.as_deref(),
            meta.session_id.as_deref(),
        ));
    }

    meta
}

fn raw_line_hash(line: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(line.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn autocompact_pct() -> f64 {
    match std::env::var("CLAUDE_AUTOCOMPACT_PCT_OVERRIDE") {
        Ok(raw) => match raw.trim().parse::<f64>() {
            Ok(pct) if pct.is_finite() && pct >= 1.0 => pct.round().min(95.0),
            _ => DEFAULT_AUTOCOMPACT_PCT,
        },
        Err(_) => DEFAULT_AUTOCOMPACT_PCT,
    }
}

fn build_token_summary(
    usage: &super::schema::TokenUsage,
    model: Option<&str>,
    session_id: Option<&str>,
) -> TokenSummary {
    let cached =
        usage.cache_read_input_tokens.unwrap_or(0) + usage.cache_creation_input_tokens.unwrap_or(0);
    let input = usage.input_tokens;
    let output = usage.output_tokens;
    let total = input + output + cached;
    let window = model.map(context_window_for).unwrap_or(freshell_types::DEFAULT_CONTEXT_WINDOW);
    let threshold = (window as f64 * autocompact_pct() / 100.0).round() as u64;

    let (context_tokens, threshold) = match session_id
        .and_then(|id| debug_cache::lookup(&claude_home(), id))
    {
        Some(over) => (over.tokens, over.threshold),
        None => (input + output + cached, threshold),
    };

    TokenSummary::new(input, output, cached, total, context_tokens, window, threshold)
}

/// Normalize a single transcript line into zero or more `NormalizedEvent`s (§4.4).
pub fn parse_event_line(line: &str) -> Vec<NormalizedEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let Ok(record) = serde_json::from_str::<ClaudeRecord>(trimmed) else {
        return Vec::new();
    };

    let mut events = Vec::new();

    match record {
        ClaudeRecord::System(sys) => {
            if sys.subtype.as_deref() == Some("init") {
                let session_id = sys.session_id.clone().unwrap_or_else(|| UNKNOWN_SESSION_ID.to_string());
                let timestamp = parse_timestamp(sys.timestamp.as_deref());
                events.push(NormalizedEvent::new(
                    timestamp,
                    session_id,
                    ProviderId::Claude,
                    EventKind::SessionStart(SessionInfoPayload {
                        cwd: sys.cwd,
                        model: sys.model,
                    }),
                ));
            }
        }
        ClaudeRecord::User(user) => {
            let session_id = user.session_id.clone();
            let timestamp = parse_timestamp(Some(&user.timestamp));
            let mut has_text_block = false;

            for block in &user.message.content {
                match block {
                    UserContent::Text { text } => {
                        has_text_block = true;
                        events.push(NormalizedEvent::new(
                            timestamp,
                            session_id.clone(),
                            ProviderId::Claude,
                            EventKind::MessageUser(MessagePayload {
                                role: MessageRole::User,
                                content: text.clone(),
                            }),
                        ));
                    }
                    UserContent::ToolResult {
                        tool_use_id,
                        content,
                        is_error,
                    } => {
                        let output = content.clone().unwrap_or(serde_json::Value::Null);
                        events.push(NormalizedEvent::new(
                            timestamp,
                            session_id.clone(),
                            ProviderId::Claude,
                            EventKind::ToolResult(ToolResultPayload {
                                call_id: tool_use_id.clone(),
                                output,
                                is_error: *is_error,
                            }),
                        ));
                    }
                    UserContent::Unknown => {}
                }
            }

            if !has_text_block && user.message.content.is_empty() {
                events.push(NormalizedEvent::new(
                    timestamp,
                    session_id,
                    ProviderId::Claude,
                    EventKind::MessageUser(MessagePayload {
                        role: MessageRole::User,
                        content: String::new(),
                    }),
                ));
            }
        }
        ClaudeRecord::Assistant(asst) => {
            let session_id = asst.session_id.clone();
            let timestamp = parse_timestamp(Some(&asst.timestamp));
            let mut has_text_block = false;

            for block in &asst.message.content {
                match block {
                    AssistantContent::Text { text } => {
                        has_text_block = true;
                        events.push(NormalizedEvent::new(
                            timestamp,
                            session_id.clone(),
                            ProviderId::Claude,
                            EventKind::MessageAssistant(MessagePayload {
                                role: MessageRole::Assistant,
                                content: text.clone(),
                            }),
                        ));
                    }
                    AssistantContent::Thinking { thinking } => {
                        events.push(NormalizedEvent::new(
                            timestamp,
                            session_id.clone(),
                            ProviderId::Claude,
                            EventKind::Reasoning(ReasoningPayload {
                                text: thinking.clone(),
                            }),
                        ));
                    }
                    AssistantContent::ToolUse { id, name, input } => {
                        events.push(NormalizedEvent::new(
                            timestamp,
                            session_id.clone(),
                            ProviderId::Claude,
                            EventKind::ToolCall(ToolCallPayload {
                                call_id: id.clone(),
                                name: name.clone(),
                                arguments: input.clone(),
                            }),
                        ));
                    }
                    AssistantContent::Unknown => {}
                }
            }

            if !has_text_block && asst.message.content.is_empty() {
                events.push(NormalizedEvent::new(
                    timestamp,
                    session_id,
                    ProviderId::Claude,
                    EventKind::MessageAssistant(MessagePayload {
                        role: MessageRole::Assistant,
                        content: String::new(),
                    }),
                ));
            }
        }
        ClaudeRecord::Result(result) => {
            let session_id = result.session_id.clone().unwrap_or_else(|| UNKNOWN_SESSION_ID.to_string());
            let timestamp = parse_timestamp(result.timestamp.as_deref());
            let (message, recoverable) = if result.is_error {
                (Some("Claude reported an error result".to_string()), Some(false))
            } else {
                (None, None)
            };
            events.push(NormalizedEvent::new(
                timestamp,
                session_id,
                ProviderId::Claude,
                EventKind::SessionEnd(SessionEndPayload {
                    message,
                    recoverable,
                    input_tokens: result.usage.as_ref().map(|u| u.input_tokens),
                    output_tokens: result.usage.as_ref().map(|u| u.output_tokens),
                }),
            ));
        }
        ClaudeRecord::Summary(_) | ClaudeRecord::Unknown => {}
    }

    events
}

fn parse_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_start_from_system_init() {
        let line = r#"{"type":"system","subtype":"init","sessionId":"s1","cwd":"/p","model":"claude-3-5-sonnet-latest"}"#;
        let events = parse_event_line(line);
        assert_eq!(events.len(), 1);
        match &events[0].kind {
            EventKind::SessionStart(info) => assert_eq!(info.cwd.as_deref(), Some("/p")),
            _ => panic!("expected session.start"),
        }
    }

    #[test]
    fn emits_message_and_token_usage_for_assistant_text_with_usage() {
        let line = r#"{"type":"assistant","sessionId":"s1","timestamp":"2024-01-01T00:00:00Z","message":{"model":"claude-3-5-sonnet-latest","content":[{"type":"text","text":"hi"}],"usage":{"input_tokens":10,"output_tokens":5}}}"#;
        let events = parse_event_line(line);
        assert_eq!(events.len(), 1);
        match &events[0].kind {
            EventKind::MessageAssistant(payload) => assert_eq!(payload.content, "hi"),
            _ => panic!("expected message.assistant"),
        }
    }

    #[test]
    fn emits_tool_call_for_tool_use_block() {
        let line = r#"{"type":"assistant","sessionId":"s1","timestamp":"2024-01-01T00:00:00Z","message":{"model":"m","content":[{"type":"tool_use","id":"t1","name":"bash","input":{"command":"ls"}}]}}"#;
        let events = parse_event_line(line);
        assert_eq!(events.len(), 1);
        match &events[0].kind {
            EventKind::ToolCall(call) => {
                assert_eq!(call.call_id, "t1");
                assert_eq!(call.name, "bash");
            }
            _ => panic!("expected tool.call"),
        }
    }

    #[test]
    fn result_record_emits_session_end_with_tokens() {
        let line = r#"{"type":"result","sessionId":"s1","is_error":false,"usage":{"input_tokens":3,"output_tokens":4}}"#;
        let events = parse_event_line(line);
        assert_eq!(events.len(), 1);
        match &events[0].kind {
            EventKind::SessionEnd(payload) => {
                assert_eq!(payload.input_tokens, Some(3));
                assert_eq!(payload.output_tokens, Some(4));
            }
            _ => panic!("expected session.end"),
        }
    }

    #[test]
    fn malformed_line_yields_no_events() {
        assert!(parse_event_line("not json").is_empty());
    }

    #[test]
    fn token_usage_dedupes_by_uuid_keeping_latest() {
        let content = format!(
            "{}\n{}\n",
            r#"{"type":"assistant","uuid":"u1","sessionId":"s1","timestamp":"2024-01-01T00:00:00Z","message":{"model":"claude-3-5-sonnet-latest","content":[],"usage":{"input_tokens":100,"output_tokens":10}}}"#,
            r#"{"type":"assistant","uuid":"u1","sessionId":"s1","timestamp":"2024-01-01T00:00:01Z","message":{"model":"claude-3-5-sonnet-latest","content":[],"usage":{"input_tokens":200,"output_tokens":20}}}"#
        );
        let meta = parse_session_file(&content, Path::new("/tmp/s1.jsonl"));
        let usage = meta.token_usage.expect("usage present");
        assert_eq!(usage.input_tokens, 100);
    }
}
