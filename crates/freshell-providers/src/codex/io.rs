//! Filesystem discovery for Codex transcripts (§6).

use std::path::PathBuf;
use walkdir::WalkDir;

/// `<CODEX_HOME>` root, defaulting to `~/.codex`.
pub fn codex_home() -> PathBuf {
    if let Ok(home) = std::env::var("CODEX_HOME") {
        return PathBuf::from(home);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".codex")
}

pub fn session_roots() -> Vec<PathBuf> {
    vec![codex_home().join("sessions")]
}

/// Recursive walk of `<CODEX_HOME>/sessions/**/*.jsonl` (§6): every subdirectory is followed,
/// any regular file with the `.jsonl` suffix counts regardless of its basename. A missing root
/// yields an empty result, never an error.
pub fn list_session_files() -> Vec<PathBuf> {
    let root = codex_home().join("sessions");
    if !root.is_dir() {
        return Vec::new();
    }

    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            let path = e.path();
            path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl")
        })
        .map(|e| e.path().to_path_buf())
        .collect()
}

/// The first canonical-UUID substring in a string, case-insensitively (§6): Codex filenames
/// embed the session id as `rollout-<timestamp>-<uuid>.jsonl`.
pub fn extract_uuid(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    if bytes.len() < 36 {
        return None;
    }
    for start in 0..=bytes.len() - 36 {
        if !raw.is_char_boundary(start) || !raw.is_char_boundary(start + 36) {
            continue;
        }
        let candidate = &raw[start..start + 36];
        if is_uuid(candidate) {
            return Some(candidate.to_string());
        }
    }
    None
}

fn is_uuid(candidate: &str) -> bool {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_uuid_substring() {
        let name = "rollout-2025-05-07T17-24-21-5973b6c0-94b8-487b-a530-2aeb6098ae0e.jsonl";
        assert_eq!(
            extract_uuid(name).as_deref(),
            Some("5973b6c0-94b8-487b-a530-2aeb6098ae0e")
        );
    }

    #[test]
    fn returns_none_when_no_uuid_present() {
        assert_eq!(extract_uuid("plain-file-name"), None);
    }
}
