//! The Claude Code provider: argv synthesis, transcript discovery, and normalization (§4.1).

pub mod debug_cache;
pub mod io;
pub mod models;
pub mod parser;
pub mod schema;

use std::path::{Path, PathBuf};

use freshell_types::{NormalizedEvent, ParsedSessionMeta, ProviderId, SpawnOptions};

use crate::traits::Provider;

pub struct ClaudeProvider;

impl Provider for ClaudeProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Claude
    }

    fn session_roots(&self) -> Vec<PathBuf> {
        io::session_roots()
    }

    fn list_session_files(&self) -> Vec<PathBuf> {
        io::list_session_files()
    }

    fn parse_session_file(&self, content: &str, file_path: &Path) -> ParsedSessionMeta {
        parser::parse_session_file(content, file_path)
    }

    fn extract_session_id(&self, file_path: &Path, _meta: Option<&ParsedSessionMeta>) -> String {
        file_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string()
    }

    fn command(&self) -> String {
        std::env::var("CLAUDE_CMD").unwrap_or_else(|_| "claude".to_string())
    }

    fn stream_args(&self, opts: &SpawnOptions) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            opts.prompt.clone(),
            "--output-format".to_string(),
            "stream-json".to_string(),
            "--verbose".to_string(),
        ];

        if let Some(id) = &opts.resume_session_id
            && io::is_valid_session_id(id)
        {
            args.push("--resume".to_string());
            args.push(id.clone());
        }
        if let Some(model) = &opts.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        if let Some(max_turns) = opts.max_turns {
            args.push("--max-turns".to_string());
            args.push(max_turns.to_string());
        }
        if let Some(mode) = &opts.permission_mode {
            args.push("--permission-mode".to_string());
            args.push(mode.0.clone());
        }
        for tool in &opts.allowed_tools {
            args.push("--allowedTools".to_string());
            args.push(tool.clone());
        }
        for tool in &opts.disallowed_tools {
            args.push("--disallowedTools".to_string());
            args.push(tool.clone());
        }

        args
    }

    fn resume_args(&self, session_id: &str, _opts: &SpawnOptions) -> Vec<String> {
        if io::is_valid_session_id(session_id) {
            vec!["--resume".to_string(), session_id.to_string()]
        } else {
            Vec::new()
        }
    }

    fn parse_event(&self, line: &str) -> Vec<NormalizedEvent> {
        parser::parse_event_line(line)
    }

    fn supports_live_streaming(&self) -> bool {
        true
    }

    fn supports_session_resume(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freshell_types::PermissionMode;

    #[test]
    fn stream_args_include_required_flags_in_order() {
        let provider = ClaudeProvider;
        let opts = SpawnOptions::new("hi");
        let args = provider.stream_args(&opts);
        assert_eq!(
            args,
            vec!["-p", "hi", "--output-format", "stream-json", "--verbose"]
        );
    }

    #[test]
    fn stream_args_omit_resume_for_invalid_id() {
        let provider = ClaudeProvider;
        let mut opts = SpawnOptions::new("hi");
        opts.resume_session_id = Some("not-a-uuid".to_string());
        let args = provider.stream_args(&opts);
        assert!(!args.contains(&"--resume".to_string()));
    }

    #[test]
    fn stream_args_include_resume_for_valid_uuid() {
        let provider = ClaudeProvider;
        let mut opts = SpawnOptions::new("hi");
        opts.resume_session_id = Some("550e8400-e29b-41d4-a716-446655440000".to_string());
        let args = provider.stream_args(&opts);
        assert!(
            args.windows(2)
                .any(|w| w == ["--resume", "550e8400-e29b-41d4-a716-446655440000"])
        );
    }

    #[test]
    fn resume_args_empty_for_invalid_id() {
        let provider = ClaudeProvider;
        assert!(provider.resume_args("nope", &SpawnOptions::new("hi")).is_empty());
    }

    #[test]
    fn permission_mode_flag_passthrough() {
        let provider = ClaudeProvider;
        let mut opts = SpawnOptions::new("hi");
        opts.permission_mode = Some(PermissionMode("plan".to_string()));
        let args = provider.stream_args(&opts);
        assert!(
            args.windows(2)
                .any(|w| w == ["--permission-mode", "plan"])
        );
    }

    #[test]
    fn extract_session_id_is_basename_minus_extension() {
        let provider = ClaudeProvider;
        let id = provider.extract_session_id(
            Path::new("/home/u/.claude/projects/p1/550e8400-e29b-41d4-a716-446655440000.jsonl"),
            None,
        );
        assert_eq!(id, "550e8400-e29b-41d4-a716-446655440000");
    }
}
