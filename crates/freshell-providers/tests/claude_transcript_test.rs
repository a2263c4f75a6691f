//! End-to-end transcript parsing through the public `Provider` trait, not the internal parser
//! module directly — exercises the same path a caller listing sessions would take.

use std::path::Path;

use freshell_providers::claude::ClaudeProvider;
use freshell_providers::Provider;

/// Scenario 1 (§8): duplicate usage records keyed by `uuid`/`message.id`/raw-line hash must
/// fold to the latest non-duplicate entry, not an aggregate across the whole transcript.
#[test]
fn claude_usage_dedupe_matches_literal_scenario() {
    let content = concat!(
        r#"{"type":"assistant","uuid":"A","sessionId":"s1","timestamp":"2024-01-01T00:00:00Z","message":{"model":"claude-3-5-sonnet-latest","content":[],"usage":{"input_tokens":10,"output_tokens":4,"cache_read_input_tokens":5,"cache_creation_input_tokens":0}}}"#, "\n",
        r#"{"type":"assistant","uuid":"A","sessionId":"s1","timestamp":"2024-01-01T00:00:01Z","message":{"model":"claude-3-5-sonnet-latest","content":[],"usage":{"input_tokens":99,"output_tokens":99,"cache_read_input_tokens":99,"cache_creation_input_tokens":99}}}"#, "\n",
        r#"{"type":"assistant","sessionId":"s1","timestamp":"2024-01-01T00:00:02Z","message":{"id":"B","model":"claude-3-5-sonnet-latest","content":[],"usage":{"input_tokens":6,"output_tokens":3,"cache_read_input_tokens":0,"cache_creation_input_tokens":4}}}"#, "\n",
        r#"{"type":"assistant","sessionId":"s1","timestamp":"2024-01-01T00:00:03Z","message":{"id":"B","model":"claude-3-5-sonnet-latest","content":[],"usage":{"input_tokens":1000,"output_tokens":1000,"cache_read_input_tokens":1000,"cache_creation_input_tokens":1000}}}"#, "\n",
        r#"{"type":"assistant","sessionId":"s1","timestamp":"2024-01-01T00:00:04Z","message":{"model":"claude-3-5-sonnet-latest","content":[],"usage":{"input_tokens":4,"output_tokens":2,"cache_read_input_tokens":1,"cache_creation_input_tokens":2}}}"#, "\n",
    );

    let provider = ClaudeProvider;
    let meta = provider.parse_session_file(content, Path::new("/tmp/s1.jsonl"));
    let usage = meta.token_usage.expect("usage present");

    assert_eq!(usage.input_tokens, 4);
    assert_eq!(usage.output_tokens, 2);
    assert_eq!(usage.cached_tokens, 3);
    assert_eq!(usage.total_tokens, 9);
    assert_eq!(usage.context_tokens, 9);
    assert_eq!(usage.model_context_window, 200_000);
    assert_eq!(usage.compact_threshold_tokens, 190_000);
    assert_eq!(usage.compact_percent, Some(0));
    assert_eq!(meta.message_count, 5);
}

#[test]
fn falls_back_to_uuid_basename_when_transcript_never_names_a_session_id() {
    let content = "not json at all\n{\"type\":\"unknown_record\"}\n";
    let provider = ClaudeProvider;
    let meta = provider.parse_session_file(
        content,
        Path::new("/home/u/.claude/projects/p/550e8400-e29b-41d4-a716-446655440000.jsonl"),
    );
    assert_eq!(
        meta.session_id.as_deref(),
        Some("550e8400-e29b-41d4-a716-446655440000")
    );
    assert_eq!(meta.message_count, 2);
}

#[test]
fn invalid_basename_is_not_used_as_a_session_id_fallback() {
    let content = "garbage\n";
    let provider = ClaudeProvider;
    let meta = provider.parse_session_file(content, Path::new("/tmp/not-a-uuid.jsonl"));
    assert_eq!(meta.session_id, None);
}

#[test]
fn dirty_suffix_on_git_branch_is_split_into_its_own_flag() {
    let content = concat!(
        r#"{"type":"user","sessionId":"s1","timestamp":"2024-01-01T00:00:00Z","gitBranch":"worktrees/feature-cli (dirty)","message":{"content":"hi"}}"#, "\n",
    );
    let provider = ClaudeProvider;
    let meta = provider.parse_session_file(content, Path::new("/tmp/s1.jsonl"));
    assert_eq!(meta.git_branch.as_deref(), Some("worktrees/feature-cli"));
    assert_eq!(meta.git_dirty, Some(true));
}

#[test]
fn clean_git_branch_has_no_dirty_flag() {
    let content = concat!(
        r#"{"type":"user","sessionId":"s1","timestamp":"2024-01-01T00:00:00Z","gitBranch":"main","message":{"content":"hi"}}"#, "\n",
    );
    let provider = ClaudeProvider;
    let meta = provider.parse_session_file(content, Path::new("/tmp/s1.jsonl"));
    assert_eq!(meta.git_branch.as_deref(), Some("main"));
    assert_eq!(meta.git_dirty, Some(false));
}

#[test]
fn parsing_the_same_transcript_twice_is_idempotent() {
    let content = concat!(
        r#"{"type":"system","subtype":"init","sessionId":"s1","cwd":"/p","model":"m"}"#, "\n",
        r#"{"type":"user","sessionId":"s1","timestamp":"2024-01-01T00:00:00Z","message":{"content":"fix the bug in a.rs"}}"#, "\n",
    );
    let provider = ClaudeProvider;
    let first = provider.parse_session_file(content, Path::new("/tmp/s1.jsonl"));
    let second = provider.parse_session_file(content, Path::new("/tmp/s1.jsonl"));
    assert_eq!(first, second);
    assert_eq!(first.title.as_deref(), Some("fix the bug in a.rs"));
}
