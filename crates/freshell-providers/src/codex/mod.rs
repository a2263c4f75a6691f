//! The Codex CLI provider: argv synthesis, transcript discovery, and normalization (§4.1).

pub mod io;
pub mod models;
pub mod parser;
pub mod schema;

use std::path::{Path, PathBuf};

use freshell_types::{NormalizedEvent, ParsedSessionMeta, ProviderId, SpawnOptions};

use crate::traits::Provider;

pub struct CodexProvider;

impl Provider for CodexProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Codex
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

    fn extract_session_id(&self, file_path: &Path, meta: Option<&ParsedSessionMeta>) -> String {
        if let Some(id) = meta.and_then(|m| m.session_id.clone()) {
            return id;
        }
        let stem = file_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        io::extract_uuid(stem).unwrap_or_else(|| stem.to_string())
    }

    fn command(&self) -> String {
        std::env::var("CODEX_CMD").unwrap_or_else(|_| "codex".to_string())
    }

    fn stream_args(&self, opts: &SpawnOptions) -> Vec<String> {
        let mut args = vec!["exec".to_string(), "--json".to_string()];

        if let Some(model) = &opts.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        if let Some(sandbox) = &opts.sandbox_mode {
            args.push("--sandbox".to_string());
            args.push(sandbox.0.clone());
        }

        args.push(opts.prompt.clone());
        args
    }

    /// Codex's resume-only invocation does not stream `--json`; the supervisor never issues
    /// it since `supports_session_resume` is false (§9), but the argv is defined for symmetry
    /// (e.g. a caller handing the session off to an interactive terminal).
    fn resume_args(&self, session_id: &str, opts: &SpawnOptions) -> Vec<String> {
        let mut args = vec!["resume".to_string(), session_id.to_string()];
        if let Some(model) = &opts.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        if let Some(sandbox) = &opts.sandbox_mode {
            args.push("--sandbox".to_string());
            args.push(sandbox.0.clone());
        }
        args
    }

    fn parse_event(&self, line: &str) -> Vec<NormalizedEvent> {
        parser::parse_event_line(line)
    }

    fn supports_live_streaming(&self) -> bool {
        true
    }

    fn supports_session_resume(&self) -> bool {
        false
    }
}
