//! Filesystem discovery for Claude transcripts (§6).

use std::path::PathBuf;
use walkdir::WalkDir;

/// `<CLAUDE_HOME>` root, defaulting to `~/.claude`.
pub fn claude_home() -> PathBuf {
    if let Ok(home) = std::env::var("CLAUDE_HOME") {
        return PathBuf::from(home);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".claude")
}

pub fn session_roots() -> Vec<PathBuf> {
    vec![claude_home().join("projects")]
}

/// One level under each project directory (`<project-slug>/<uuid>.jsonl`), plus an optional
/// `subagents/` subdirectory nested one level further down
/// (`<project-slug>/<anything>/subagents/<uuid>.jsonl`, §6). Non-existent directories yield an
/// empty result, never an error.
pub fn list_session_files() -> Vec<PathBuf> {
    let mut out = Vec::new();
    let projects_root = claude_home().join("projects");

    let Ok(entries) = std::fs::read_dir(&projects_root) else {
        return out;
    };

    for entry in entries.flatten() {
        let project_dir = entry.path();
        if !project_dir.is_dir() {
            continue;
        }
        collect_jsonl(&project_dir, &mut out);

        let Ok(children) = std::fs::read_dir(&project_dir) else {
            continue;
        };
        for child in children.flatten() {
            let subdir = child.path();
            if subdir.is_dir() {
                collect_jsonl(&subdir.join("subagents"), &mut out);
            }
        }
    }

    out
}

fn collect_jsonl(dir: &std::path::Path, out: &mut Vec<PathBuf>) {
    if !dir.is_dir() {
        return;
    }
    for entry in WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "jsonl") {
            out.push(path.to_path_buf());
        }
    }
}

/// A Claude session id is valid iff it is a canonical UUID (§6): hex, case-insensitive,
/// `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`.
pub fn is_valid_session_id(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    if bytes.len() != 36 {
        return false;
    }
    for (i, b) in bytes.iter().enumerate() {
        let expect_dash = matches!(i, 8 | 13 | 18 | 23);
        if expect_dash {
            if *b != b'-' {
                return false;
            }
        } else if !b.is_ascii_hexdigit() {
            return false;
        }
    }
    true
}
