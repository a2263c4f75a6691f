use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::provider::ProviderId;

/// One role-tagged chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Session-level info carried by `session.start`/`session.init`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionInfoPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// One vendor tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallPayload {
    pub call_id: String,
    pub name: String,
    pub arguments: Value,
}

/// The result of a tool invocation previously announced by a `tool.call` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultPayload {
    pub call_id: String,
    pub output: Value,
    #[serde(default)]
    pub is_error: bool,
}

/// Free-text model reasoning/thinking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningPayload {
    pub text: String,
}

/// A point-in-time token usage snapshot emitted mid-stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsagePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
}

/// Carried by `session.end`: an optional error (non-zero exit, spawn failure, kill) and
/// input/output token counts when the vendor's final record reported them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEndPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recoverable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
}

/// The provider-independent event schema (§3 `NormalizedEvent`).
///
/// `type`/payload are modeled as a tagged enum rather than one struct with every field
/// optional: a normalizer builds exactly one `EventKind` per event, so there is never a
/// moment where e.g. a `tool.call` event is missing its `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventKind {
    #[serde(rename = "session.start")]
    SessionStart(SessionInfoPayload),
    #[serde(rename = "session.init")]
    SessionInit(SessionInfoPayload),
    #[serde(rename = "message.user")]
    MessageUser(MessagePayload),
    #[serde(rename = "message.assistant")]
    MessageAssistant(MessagePayload),
    #[serde(rename = "tool.call")]
    ToolCall(ToolCallPayload),
    #[serde(rename = "tool.result")]
    ToolResult(ToolResultPayload),
    #[serde(rename = "reasoning")]
    Reasoning(ReasoningPayload),
    #[serde(rename = "token.usage")]
    TokenUsage(TokenUsagePayload),
    #[serde(rename = "session.end")]
    SessionEnd(SessionEndPayload),
}

impl EventKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            EventKind::SessionStart(_) => "session.start",
            EventKind::SessionInit(_) => "session.init",
            EventKind::MessageUser(_) => "message.user",
            EventKind::MessageAssistant(_) => "message.assistant",
            EventKind::ToolCall(_) => "tool.call",
            EventKind::ToolResult(_) => "tool.result",
            EventKind::Reasoning(_) => "reasoning",
            EventKind::TokenUsage(_) => "token.usage",
            EventKind::SessionEnd(_) => "session.end",
        }
    }
}

/// Vendor session id before it has been discovered in the event stream (§3).
pub const UNKNOWN_SESSION_ID: &str = "unknown";

/// A single normalized event, provider-agnostic, emitted by a `freshell-providers` normalizer.
///
/// `legacy` carries the at-most-one-release-cycle compatibility aliases (§3): callers must not
/// rely on them, but an implementation must pass them through whenever it knows them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub provider: ProviderId,
    #[serde(flatten)]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy: Option<LegacyAliases>,
}

/// Deprecated field names mirrored beside the canonical schema for one release cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyAliases {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_info: Option<SessionInfoPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCallPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<ToolResultPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsagePayload>,
}

impl NormalizedEvent {
    pub fn new(timestamp: DateTime<Utc>, session_id: impl Into<String>, provider: ProviderId, kind: EventKind) -> Self {
        let legacy = match &kind {
            EventKind::SessionStart(info) | EventKind::SessionInit(info) => Some(LegacyAliases {
                session_info: Some(info.clone()),
                ..Default::default()
            }),
            EventKind::ToolCall(call) => Some(LegacyAliases {
                tool_call: Some(call.clone()),
                ..Default::default()
            }),
            EventKind::ToolResult(result) => Some(LegacyAliases {
                tool_result: Some(result.clone()),
                ..Default::default()
            }),
            EventKind::TokenUsage(usage) => Some(LegacyAliases {
                token_usage: Some(usage.clone()),
                ..Default::default()
            }),
            _ => None,
        };

        Self {
            timestamp,
            session_id: session_id.into(),
            provider,
            kind,
            legacy,
        }
    }

    pub fn unknown_session(timestamp: DateTime<Utc>, provider: ProviderId, kind: EventKind) -> Self {
        Self::new(timestamp, UNKNOWN_SESSION_ID, provider, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_start_carries_legacy_session_info_alias() {
        let event = NormalizedEvent::unknown_session(
            Utc::now(),
            ProviderId::Claude,
            EventKind::SessionStart(SessionInfoPayload {
                cwd: Some("/p".into()),
                model: Some("m".into()),
            }),
        );
        let legacy = event.legacy.expect("legacy alias present");
        assert_eq!(legacy.session_info.unwrap().cwd.as_deref(), Some("/p"));
    }

    #[test]
    fn serializes_with_flattened_type_tag() {
        let event = NormalizedEvent::new(
            Utc::now(),
            "sess-1",
            ProviderId::Codex,
            EventKind::MessageAssistant(MessagePayload {
                role: MessageRole::Assistant,
                content: "hi".into(),
            }),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "message.assistant");
        assert_eq!(json["sessionId"], "sess-1");
    }
}
