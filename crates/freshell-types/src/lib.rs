//! Shared data model for the freshell supervisor: the vendor-agnostic event schema,
//! token accounting, and spawn/parse request-response types.
//!
//! This crate has no knowledge of any particular vendor CLI, no process handling, and no
//! filesystem access; it exists so `freshell-providers` and `freshell-runtime` agree on one
//! wire format.

pub mod event;
pub mod provider;
pub mod session;
pub mod token;

pub use event::{
    EventKind, LegacyAliases, MessagePayload, MessageRole, NormalizedEvent, ReasoningPayload,
    SessionEndPayload, SessionInfoPayload, ToolCallPayload, ToolResultPayload, TokenUsagePayload,
    UNKNOWN_SESSION_ID,
};
pub use provider::ProviderId;
pub use session::{ParsedSessionMeta, PermissionMode, SandboxMode, SpawnOptions};
pub use token::{TokenSummary, DEFAULT_CONTEXT_WINDOW};
