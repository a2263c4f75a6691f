//! Transcript parsing and event normalization for Codex (§4.2, §4.4).
//!
//! `event_msg` carries a `user_message` variant that duplicates the richer `response_item`
//! record for the same turn (the vendor emits both to the same stream), so `user_message` is
//! skipped here in favor of `response_item{message}`. `agent_message` and `agent_reasoning`
//! are normalized directly off `event_msg` per the vendor mapping table, alongside
//! `token_count`.

use std::path::Path;

use chrono::{DateTime, Utc};
use freshell_core::is_path_like;
use freshell_types::{
    EventKind, MessagePayload, MessageRole, NormalizedEvent, ParsedSessionMeta, ProviderId,
    ReasoningPayload, SessionInfoPayload, ToolCallPayload, ToolResultPayload, TokenSummary,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::gitinfo::split_dirty_suffix;
use super::models::context_window_for;
use super::schema::{
    CodexRecord, EventMsgPayload, FunctionCallOutputPayload, FunctionCallPayload, MessageContent,
    MessagePayload as CodexMessagePayload, ReasoningPayload as CodexReasoningPayload,
    SessionSource, SummaryText, TokenCountPayload, TokenInfo,
};

const CODEX_COMPACT_RATIO: f64 = 90.0 / 95.0;

static EXIT_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Exit [Cc]ode:\s*(\d+)").unwrap());

/// Parse a whole transcript file into its session-level summary (§4.2).
pub fn parse_session_file(content: &str, file_path: &Path) -> ParsedSessionMeta {
    let mut meta = ParsedSessionMeta::default();
    let mut last_token_count: Option<TokenCountPayload> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        meta.message_count += 1;

        let Ok(record) = serde_json::from_str::<CodexRecord>(trimmed) else {
            continue;
        };

        match record {
            CodexRecord::SessionMeta(rec) => {
                if meta.session_id.is_none() {
                    meta.session_id = Some(rec.payload.id.clone());
                }
                if meta.cwd.is_none() {
                    meta.cwd = Some(rec.payload.cwd.clone()).filter(|c| is_path_like(c));
                }
                if meta.git_branch.is_none()
                    && let Some(branch) = rec.payload.git.as_ref().and_then(|g| g.branch.as_deref())
                {
                    let (branch, dirty) = split_dirty_suffix(branch);
                    meta.git_branch = Some(branch);
                    meta.git_dirty = Some(dirty);
                }
                if meta.is_non_interactive.is_none() {
                    meta.is_non_interactive = Some(is_non_interactive(&rec.payload.source));
                }
            }
            CodexRecord::TurnContext(rec) => {
                if meta.cwd.is_none() {
                    meta.cwd = Some(rec.payload.cwd.clone()).filter(|c| is_path_like(c));
                }
                if meta.model.is_none() {
                    meta.model = Some(rec.payload.model.clone());
                }
            }
            CodexRecord::ResponseItem(rec) => {
                if let super::schema::ResponseItemPayload::Message(message) = &rec.payload
                    && message.role == "user"
                {
                    let text = extract_message_text(&message.content);
                    if meta.first_user_message.is_none() {
                        meta.first_user_message = Some(text.clone());
                    }
                    if meta.title.is_none() {
                        meta.title = crate::title::extract_title(&text);
                    }
                    if meta.summary.is_none() {
                        meta.summary = crate::title::extract_summary(&text);
                    }
                }
            }
            CodexRecord::EventMsg(rec) => {
                if let EventMsgPayload::TokenCount(payload) = &rec.payload {
                    last_token_count = Some(payload.clone());
                }
            }
            CodexRecord::Unknown => {}
        }
    }

    if meta.session_id.is_none()
        && let Some(stem) = file_path.file_stem().and_then(|s| s.to_str())
    {
        meta.session_id = super::io::extract_uuid(stem).or_else(|| Some(stem.to_string()));
    }

    if let Some(payload) = last_token_count {
        meta.token_usage = Some(build_token_summary(&payload, meta.model.as_deref()));
    }

    meta
}

fn is_non_interactive(source: &SessionSource) -> bool {
    match source {
        SessionSource::Subagent { .. } => true,
        SessionSource::Cli(name) => name != "cli",
    }
}

fn extract_message_text(content: &[MessageContent]) -> String {
    content
        .iter()
        .filter_map(|c| match c {
            MessageContent::InputText { text } => Some(text.as_str()),
            MessageContent::OutputText { text } => Some(text.as_str()),
            MessageContent::Unknown => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn extract_reasoning_text(reasoning: &CodexReasoningPayload) -> String {
    if let Some(content) = &reasoning.content {
        return content.clone();
    }
    reasoning
        .summary
        .iter()
        .filter_map(|s| match s {
            SummaryText::SummaryText { text } => Some(text.as_str()),
            SummaryText::Unknown => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_arguments(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn exit_code_from_output(output: &str) -> Option<i64> {
    EXIT_CODE_RE
        .captures(output)
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Resolve a current-turn context-token snapshot from a `token_count` payload (§4.2). Returns
/// `None` when no candidate survives the rejection filter — i.e. no snapshot is derivable.
fn build_token_summary(payload: &TokenCountPayload, model: Option<&str>) -> TokenSummary {
    let info = payload.info.clone().unwrap_or_default();
    let window = resolve_context_window(&info, model);
    let max_allowed = if info.model_context_window > 0 {
        2 * window
    } else {
        5_000_000
    };
    let last_total = info.last_token_usage.total_tokens as u64;

    let candidates = [
        payload.current_context_tokens,
        payload.context_tokens,
        payload.context_token_count,
        Some(last_total),
        payload.total_usage_tokens,
    ];

    let context_tokens = candidates
        .into_iter()
        .flatten()
        .find(|&c| c <= max_allowed && (last_total == 0 || c <= 8 * last_total))
        .unwrap_or(0);

    let threshold = payload
        .auto_compact_token_limit
        .unwrap_or_else(|| (window as f64 * CODEX_COMPACT_RATIO).round() as u64);

    let total = &info.total_token_usage;
    let explicit_total = total.total_tokens as u64;
    let computed_total = total.input_tokens as u64 + total.output_tokens as u64;
    let total_tokens = if explicit_total > 0 { explicit_total } else { computed_total };

    TokenSummary::new(
        total.input_tokens as u64,
        total.output_tokens as u64,
        total.cached_input_tokens as u64,
        total_tokens,
        context_tokens,
        window,
        threshold,
    )
}

fn resolve_context_window(info: &TokenInfo, model: Option<&str>) -> u64 {
    if info.model_context_window > 0 {
        return info.model_context_window as u64;
    }
    model.map(context_window_for).unwrap_or(freshell_types::DEFAULT_CONTEXT_WINDOW)
}

/// Normalize a single transcript line into zero or more `NormalizedEvent`s (§4.4).
pub fn parse_event_line(line: &str) -> Vec<NormalizedEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let Ok(record) = serde_json::from_str::<CodexRecord>(trimmed) else {
        return Vec::new();
    };

    let mut events = Vec::new();

    match record {
        CodexRecord::SessionMeta(rec) => {
            let timestamp = parse_timestamp(&rec.timestamp);
            events.push(NormalizedEvent::new(
                timestamp,
                rec.payload.id.clone(),
                ProviderId::Codex,
                EventKind::SessionStart(SessionInfoPayload {
                    cwd: Some(rec.payload.cwd.clone()).filter(|c| is_path_like(c)),
                    model: None,
                }),
            ));
        }
        CodexRecord::ResponseItem(rec) => {
            let timestamp = parse_timestamp(&rec.timestamp);
            events.extend(normalize_response_item(timestamp, &rec.payload));
        }
        CodexRecord::EventMsg(rec) => {
            let timestamp = parse_timestamp(&rec.timestamp);
            match &rec.payload {
                EventMsgPayload::TokenCount(payload) => {
                    if let Some(info) = &payload.info {
                        events.push(NormalizedEvent::unknown_session(
                            timestamp,
                            ProviderId::Codex,
                            EventKind::TokenUsage(freshell_types::TokenUsagePayload {
                                input_tokens: Some(info.last_token_usage.input_tokens as u64),
                                output_tokens: Some(info.last_token_usage.output_tokens as u64),
                            }),
                        ));
                    }
                }
                EventMsgPayload::AgentReasoning(reasoning) => {
                    events.push(NormalizedEvent::unknown_session(
                        timestamp,
                        ProviderId::Codex,
                        EventKind::Reasoning(ReasoningPayload {
                            text: reasoning.text.clone(),
                        }),
                    ));
                }
                EventMsgPayload::AgentMessage(message) => {
                    events.push(NormalizedEvent::unknown_session(
                        timestamp,
                        ProviderId::Codex,
                        EventKind::MessageAssistant(MessagePayload {
                            role: MessageRole::Assistant,
                            content: message.message.clone(),
                        }),
                    ));
                }
                EventMsgPayload::UserMessage(_) | EventMsgPayload::Unknown => {}
            }
        }
        CodexRecord::TurnContext(_) | CodexRecord::Unknown => {}
    }

    events
}

fn normalize_response_item(
    timestamp: DateTime<Utc>,
    payload: &super::schema::ResponseItemPayload,
) -> Vec<NormalizedEvent> {
    use super::schema::ResponseItemPayload;

    match payload {
        ResponseItemPayload::Message(message) => {
            vec![normalize_message(timestamp, message)]
        }
        ResponseItemPayload::Reasoning(reasoning) => {
            vec![NormalizedEvent::unknown_session(
                timestamp,
                ProviderId::Codex,
                EventKind::Reasoning(ReasoningPayload {
                    text: extract_reasoning_text(reasoning),
                }),
            )]
        }
        ResponseItemPayload::FunctionCall(call) => {
            vec![normalize_function_call(timestamp, call)]
        }
        ResponseItemPayload::FunctionCallOutput(output) => {
            vec![normalize_function_call_output(timestamp, output)]
        }
        ResponseItemPayload::CustomToolCall(tool_call) => {
            vec![NormalizedEvent::unknown_session(
                timestamp,
                ProviderId::Codex,
                EventKind::ToolCall(ToolCallPayload {
                    call_id: tool_call.call_id.clone(),
                    name: tool_call.name.clone(),
                    arguments: decode_arguments(&tool_call.input),
                }),
            )]
        }
        ResponseItemPayload::CustomToolCallOutput(output) => {
            let exit_code = exit_code_from_output(&output.output);
            vec![NormalizedEvent::unknown_session(
                timestamp,
                ProviderId::Codex,
                EventKind::ToolResult(ToolResultPayload {
                    call_id: output.call_id.clone(),
                    output: Value::String(output.output.clone()),
                    is_error: exit_code.map(|c| c != 0).unwrap_or(false),
                }),
            )]
        }
        ResponseItemPayload::GhostSnapshot(_) | ResponseItemPayload::Unknown => Vec::new(),
    }
}

fn normalize_message(timestamp: DateTime<Utc>, message: &CodexMessagePayload) -> NormalizedEvent {
    let text = extract_message_text(&message.content);
    let kind = if message.role == "user" {
        EventKind::MessageUser(MessagePayload {
            role: MessageRole::User,
            content: text,
        })
    } else {
        EventKind::MessageAssistant(MessagePayload {
            role: MessageRole::Assistant,
            content: text,
        })
    };
    NormalizedEvent::unknown_session(timestamp, ProviderId::Codex, kind)
}

fn normalize_function_call(timestamp: DateTime<Utc>, call: &FunctionCallPayload) -> NormalizedEvent {
    NormalizedEvent::unknown_session(
        timestamp,
        ProviderId::Codex,
        EventKind::ToolCall(ToolCallPayload {
            call_id: call.call_id.clone(),
            name: call.name.clone(),
            arguments: decode_arguments(&call.arguments),
        }),
    )
}

fn normalize_function_call_output(
    timestamp: DateTime<Utc>,
    output: &FunctionCallOutputPayload,
) -> NormalizedEvent {
    let exit_code = exit_code_from_output(&output.output);
    NormalizedEvent::unknown_session(
        timestamp,
        ProviderId::Codex,
        EventKind::ToolResult(ToolResultPayload {
            call_id: output.call_id.clone(),
            output: Value::String(output.output.clone()),
            is_error: exit_code.map(|c| c != 0).unwrap_or(false),
        }),
    )
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
