//! Resolves a working directory to its enclosing source-control checkout root (§C1).
//!
//! Shells out to `git rev-parse --show-toplevel` the first time a given `cwd` is seen and
//! remembers the answer for the lifetime of the process; repeat lookups for the same `cwd`
//! never spawn a second `git` process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use once_cell::sync::Lazy;

static REPO_ROOT_CACHE: Lazy<Mutex<HashMap<PathBuf, Option<PathBuf>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Resolve the git checkout root containing `cwd`, or `None` if `cwd` is not inside a git
/// repository (or `git` could not be located). Write-once per `cwd`: once a key is populated
/// the cached answer is returned forever, even if the caller's filesystem later changes.
pub fn resolve_repo_root(cwd: &Path) -> Option<PathBuf> {
    let key = normalize(cwd);

    if let Some(cached) = REPO_ROOT_CACHE.lock().unwrap().get(&key) {
        return cached.clone();
    }

    let root = git_show_toplevel(&key);

    REPO_ROOT_CACHE
        .lock()
        .unwrap()
        .entry(key)
        .or_insert_with(|| root.clone());

    root
}

fn git_show_toplevel(cwd: &Path) -> Option<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .current_dir(cwd)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return None;
    }

    Some(PathBuf::from(trimmed))
}

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

/// Clear the process-wide cache. Test-only: production code never needs to forget a checkout
/// root once it has found one.
#[cfg(test)]
pub fn reset() {
    REPO_ROOT_CACHE.lock().unwrap().clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use tempfile::TempDir;

    #[test]
    fn non_git_directory_resolves_to_none() {
        reset();
        let tmp = TempDir::new().unwrap();
        assert_eq!(resolve_repo_root(tmp.path()), None);
    }

    #[test]
    fn finds_the_checkout_root_from_a_nested_directory() {
        reset();
        let tmp = TempDir::new().unwrap();
        let repo = tmp.path().join("repo");
        std::fs::create_dir_all(repo.join("a/b")).unwrap();

        let init = Command::new("git").arg("init").current_dir(&repo).output().unwrap();
        if !init.status.success() {
            eprintln!("git not available, skipping");
            return;
        }

        let nested = repo.join("a/b");
        let root = resolve_repo_root(&nested).expect("should find repo root");
        assert_eq!(root, normalize(&repo));
    }

    #[test]
    fn repeat_lookups_for_the_same_cwd_are_cached() {
        reset();
        let tmp = TempDir::new().unwrap();
        let first = resolve_repo_root(tmp.path());
        let second = resolve_repo_root(tmp.path());
        assert_eq!(first, second);
    }
}
