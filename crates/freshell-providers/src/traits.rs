//! The provider contract (§4.1): one implementation per vendor CLI, no shared base class.

use std::path::{Path, PathBuf};

use freshell_types::{NormalizedEvent, ParsedSessionMeta, ProviderId, SpawnOptions};

/// Bundle of {home directory, command, argv synthesis, stream/resume rules, transcript
/// discovery, parser, normalizer, capability flags} for one vendor CLI.
pub trait Provider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Roots under which this vendor's transcripts live.
    fn session_roots(&self) -> Vec<PathBuf>;

    /// All transcript files currently on disk for this provider. A missing root yields an
    /// empty result, never an error.
    fn list_session_files(&self) -> Vec<PathBuf>;

    /// Parse one transcript file's already-read contents into session metadata (§4.2).
    /// Infallible: malformed lines are skipped, never propagated as an error.
    fn parse_session_file(&self, content: &str, file_path: &Path) -> ParsedSessionMeta;

    /// Resolve a transcript's project path: `"unknown"` when `meta.cwd` is missing, else the
    /// enclosing source-control checkout root, falling back to the raw cwd outside one (§C1).
    fn resolve_project_path(&self, _file_path: &Path, meta: &ParsedSessionMeta) -> String {
        match &meta.cwd {
            None => "unknown".to_string(),
            Some(cwd) => freshell_core::resolve_repo_root(Path::new(cwd))
                .map(|root| root.display().to_string())
                .unwrap_or_else(|| cwd.clone()),
        }
    }

    /// The vendor session id for a transcript file, given its already-parsed metadata.
    fn extract_session_id(&self, file_path: &Path, meta: Option<&ParsedSessionMeta>) -> String;

    /// The executable to spawn: an environment override, else the vendor's conventional name.
    fn command(&self) -> String;

    /// Argv for a new run (§4.5).
    fn stream_args(&self, opts: &SpawnOptions) -> Vec<String>;

    /// Argv for a resume-only invocation, outside the live-streaming supervisor (§4.5).
    /// `opts` supplies the model/sandbox selection a resume call may still want to carry;
    /// its `prompt` and `resume_session_id` are ignored in favor of `session_id`.
    fn resume_args(&self, session_id: &str, opts: &SpawnOptions) -> Vec<String>;

    /// Normalize one raw stdout line into zero or more events (§4.4). Never panics on
    /// malformed input; unrecognized records yield no events.
    fn parse_event(&self, line: &str) -> Vec<NormalizedEvent>;

    fn supports_live_streaming(&self) -> bool;
    fn supports_session_resume(&self) -> bool;
}
